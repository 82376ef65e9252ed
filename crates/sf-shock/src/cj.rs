//! Chapman-Jouguet detonation speed.
//!
//! The CJ point is where the Rayleigh line is tangent to the equilibrium
//! Hugoniot, i.e. where the shock speed needed to reach a given density
//! ratio is smallest. The search samples the Hugoniot over a density-ratio
//! bracket, fits speed against ratio with a parabola, and re-centres a
//! narrowed bracket on the fitted minimum until the fit is good enough.

use crate::config::{CjConfig, ShockConfig};
use crate::error::{ShockError, ShockResult};
use crate::evaluator::ThermoMode;
use crate::fit::QuadraticFit;
use crate::incident::{ShockSolution, post_shock_equilibrium};
use crate::jump::{JumpKind, JumpSystem};
use crate::newton::newton_solve_2x2;
use nalgebra::Vector2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sf_gas::{GasModel, GasState};

/// How the refinement loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CjStatus {
    /// R² target met after the minimum number of refinements.
    Converged,
    /// Refinement cap reached first; the last fit is still reported.
    FitToleranceNotMet { r_squared: f64 },
}

impl CjStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, CjStatus::Converged)
    }
}

/// Equilibrium Hugoniot samples of the last refinement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CjSamples {
    pub density_ratios: Vec<f64>,
    pub speeds: Vec<f64>,
    /// Ratios whose jump solve failed and were left out of the fit
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CjResult {
    /// CJ speed including the configured offset [m/s]
    pub speed: f64,
    /// Fitted density ratio ρ2/ρ1 at the CJ point
    pub density_ratio: f64,
    /// One-sided 95 % prediction half-width on the fitted speed [m/s]
    pub uncertainty: f64,
    pub fit: QuadraticFit,
    pub refinements: usize,
    pub status: CjStatus,
    pub samples: CjSamples,
}

fn linspace(lo: f64, hi: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = (hi - lo) / (n - 1) as f64;
    (0..n).map(move |i| lo + step * i as f64)
}

/// Shock speed that produces density ratio `ratio` on the equilibrium
/// Hugoniot, or `None` when the solve does not converge.
fn hugoniot_speed(
    model: &dyn GasModel,
    state1: &GasState,
    ratio: f64,
    config: &CjConfig,
) -> Option<f64> {
    let density = ratio * state1.density();
    let solve = || -> ShockResult<_> {
        let mut system = JumpSystem::new(
            model,
            state1,
            ThermoMode::Equilibrium,
            JumpKind::FixedDensity { density },
        )?;
        let x0 = Vector2::new(config.temperature_guess, config.speed_guess);
        newton_solve_2x2(&mut system, x0, &config.newton)
    };
    match solve() {
        Ok(out) if out.converged => Some(out.x[1]),
        Ok(out) => {
            tracing::debug!(ratio, iterations = out.iterations, "CJ sample did not converge");
            None
        }
        Err(e) => {
            tracing::debug!(ratio, error = %e, "CJ sample failed");
            None
        }
    }
}

fn sample_bracket(
    model: &dyn GasModel,
    state1: &GasState,
    bracket: [f64; 2],
    config: &CjConfig,
) -> CjSamples {
    let mut samples = CjSamples::default();
    for ratio in linspace(bracket[0], bracket[1], config.samples) {
        match hugoniot_speed(model, state1, ratio, config) {
            Some(w) => {
                samples.density_ratios.push(ratio);
                samples.speeds.push(w);
            }
            None => samples.skipped += 1,
        }
    }
    samples
}

fn validate(state1: &GasState, config: &CjConfig) -> ShockResult<()> {
    let [lo, hi] = config.initial_bracket;
    if config.samples < 4 {
        return Err(ShockError::InvalidInput {
            what: format!("CJ search needs at least 4 samples, got {}", config.samples),
        });
    }
    if !(lo > 1.0 && hi > lo) {
        return Err(ShockError::InvalidInput {
            what: format!("CJ bracket [{lo}, {hi}] must satisfy 1 < lo < hi"),
        });
    }
    if !(config.bracket_half_width > 0.0 && config.bracket_half_width < 1.0) {
        return Err(ShockError::InvalidInput {
            what: format!("bracket half width {} outside (0, 1)", config.bracket_half_width),
        });
    }
    if config.max_refinements == 0 {
        return Err(ShockError::InvalidInput {
            what: "max_refinements must be at least 1".to_string(),
        });
    }
    if !(state1.density() > 0.0) {
        return Err(ShockError::InvalidInput {
            what: "upstream density must be positive".to_string(),
        });
    }
    Ok(())
}

/// Search for the CJ speed of the mixture in `state1`.
///
/// Deterministic: the same inputs always produce the same samples and fit.
/// Reaching `max_refinements` without meeting the R² target is reported in
/// [`CjResult::status`], with the speed from the last fit.
pub fn cj_speed(
    model: &dyn GasModel,
    state1: &GasState,
    config: &CjConfig,
) -> ShockResult<CjResult> {
    validate(state1, config)?;

    let mut bracket = config.initial_bracket;
    let mut refinements = 0;
    loop {
        let samples = sample_bracket(model, state1, bracket, config);
        refinements += 1;
        if samples.density_ratios.len() < 4 {
            return Err(ShockError::CjSampling {
                failed: samples.skipped,
                total: config.samples,
            });
        }

        let fit = QuadraticFit::fit(&samples.density_ratios, &samples.speeds)?;
        let r_star = fit.vertex()?;
        tracing::debug!(
            refinement = refinements,
            lo = bracket[0],
            hi = bracket[1],
            r_star,
            r_squared = fit.r_squared,
            skipped = samples.skipped,
            "CJ refinement"
        );

        let target_met =
            refinements >= config.min_refinements && fit.r_squared >= config.r_squared_target;
        let capped = refinements >= config.max_refinements;

        if target_met || capped {
            let status = if target_met {
                CjStatus::Converged
            } else {
                tracing::warn!(
                    refinements,
                    r_squared = fit.r_squared,
                    target = config.r_squared_target,
                    "CJ fit quality not reached before the refinement cap"
                );
                CjStatus::FitToleranceNotMet {
                    r_squared: fit.r_squared,
                }
            };
            let uncertainty = fit.prediction_half_width(r_star)?;
            return Ok(CjResult {
                speed: fit.eval(r_star) + config.speed_offset,
                density_ratio: r_star,
                uncertainty,
                fit,
                refinements,
                status,
                samples,
            });
        }

        bracket = [
            r_star * (1.0 - config.bracket_half_width),
            r_star * (1.0 + config.bracket_half_width),
        ];
    }
}

/// Equilibrium post-shock state at the CJ speed.
pub fn cj_state(
    model: &dyn GasModel,
    state1: &GasState,
    cj: &CjResult,
    config: &ShockConfig,
) -> ShockResult<ShockSolution> {
    post_shock_equilibrium(model, state1, cj.speed, config)
}

/// CJ speeds for many initial states in parallel.
///
/// Each point runs its own solve on its own working states; one failing
/// point does not affect the others.
pub fn cj_speed_batch(
    model: &dyn GasModel,
    states: &[GasState],
    config: &CjConfig,
) -> Vec<ShockResult<CjResult>> {
    states
        .par_iter()
        .map(|state| cj_speed(model, state, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::units::{k, pa};
    use sf_gas::{Composition, IdealGasMixture};

    #[test]
    fn linspace_includes_end_points() {
        let v: Vec<f64> = linspace(1.5, 2.0, 6).collect();
        assert_eq!(v.len(), 6);
        assert_eq!(v[0], 1.5);
        assert!((v[5] - 2.0).abs() < 1e-15);
    }

    #[test]
    fn bad_configs_rejected() {
        let gas = IdealGasMixture::hydrogen_air().unwrap();
        let s1 = gas
            .state_tpx(k(300.0), pa(101_325.0), &Composition::parse("H2:2 O2:1").unwrap())
            .unwrap();
        let few = CjConfig {
            samples: 3,
            ..CjConfig::default()
        };
        assert!(cj_speed(&gas, &s1, &few).is_err());
        let inverted = CjConfig {
            initial_bracket: [2.0, 1.5],
            ..CjConfig::default()
        };
        assert!(cj_speed(&gas, &s1, &inverted).is_err());
    }
}
