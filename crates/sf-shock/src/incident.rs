//! Incident shock solver.

use crate::config::ShockConfig;
use crate::error::{ShockError, ShockResult};
use crate::evaluator::ThermoMode;
use crate::jump::{JumpKind, JumpSystem};
use crate::newton::{JumpResidual, newton_solve_2x2};
use nalgebra::Vector2;
use sf_gas::{GasModel, GasState};

/// Post-shock state and Newton diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ShockSolution {
    /// Lab-frame shock speed [m/s]
    pub shock_speed: f64,
    /// Post-shock state (the last iterate when not converged)
    pub state: GasState,
    pub mode: ThermoMode,
    pub converged: bool,
    pub iterations: usize,
    /// Jump residuals `[FH, FP]` at `state`
    pub residual: [f64; 2],
}

impl ShockSolution {
    pub(crate) fn from_outcome(
        shock_speed: f64,
        state: GasState,
        mode: ThermoMode,
        outcome: &crate::newton::NewtonOutcome,
    ) -> Self {
        Self {
            shock_speed,
            state,
            mode,
            converged: outcome.converged,
            iterations: outcome.iterations,
            residual: [outcome.residual[0], outcome.residual[1]],
        }
    }

    /// Downstream gas speed in the wave frame, `w2 = U ρ1/ρ2` [m/s].
    pub fn wave_frame_speed(&self, upstream: &GasState) -> f64 {
        self.shock_speed * upstream.density() / self.state.density()
    }

    /// Lab-frame particle speed behind the shock, `U - w2` [m/s].
    pub fn particle_speed(&self, upstream: &GasState) -> f64 {
        self.shock_speed - self.wave_frame_speed(upstream)
    }

    pub fn pressure_ratio(&self, upstream: &GasState) -> f64 {
        self.state.pressure() / upstream.pressure()
    }

    pub fn density_ratio(&self, upstream: &GasState) -> f64 {
        self.state.density() / upstream.density()
    }
}

/// Initial (T, v) guess for an incident shock.
///
/// The volume ratio is the perfect-gas jump at the frozen `gamma1`, floored
/// at `volume_guess`; pressure follows from the momentum balance and
/// temperature from the ideal-gas scaling.
fn incident_guess(
    upstream: &GasState,
    shock_speed: f64,
    gamma1: f64,
    a1: f64,
    volume_guess: f64,
) -> Vector2<f64> {
    let v1 = upstream.specific_volume();
    let p1 = upstream.pressure();
    let m2 = (shock_speed / a1).powi(2);
    let perfect_gas = ((gamma1 - 1.0) * m2 + 2.0) / ((gamma1 + 1.0) * m2);
    let v = perfect_gas.max(volume_guess) * v1;
    let p = p1 + upstream.density() * shock_speed * shock_speed * (1.0 - v / v1);
    let t = upstream.temperature() * p * v / (p1 * v1);
    Vector2::new(t, v)
}

/// Solve the incident shock jump at `shock_speed` into `upstream`.
///
/// `upstream` is only read; the solve works on its own copy. A solve that
/// hits the iteration cap, or that settles on the upstream state itself,
/// comes back with `converged == false`.
pub fn post_shock(
    model: &dyn GasModel,
    upstream: &GasState,
    shock_speed: f64,
    mode: ThermoMode,
    config: &ShockConfig,
) -> ShockResult<ShockSolution> {
    let a1 = model.sound_speed_frozen(upstream)?;
    if !(shock_speed > a1) {
        return Err(ShockError::InvalidInput {
            what: format!("shock speed {shock_speed} m/s is not supersonic (a1 = {a1:.2} m/s)"),
        });
    }

    let mut system = JumpSystem::new(model, upstream, mode, JumpKind::Incident { shock_speed })?;
    let gamma1 = model.gamma_frozen(upstream)?;
    let x0 = incident_guess(upstream, shock_speed, gamma1, a1, config.incident_volume_guess);
    tracing::debug!(
        shock_speed,
        mode = mode.label(),
        t_guess = x0[0],
        v_guess = x0[1],
        "incident shock solve"
    );

    let mut outcome = newton_solve_2x2(&mut system, x0, &config.newton)?;
    let compression = 1.0 - outcome.x[1] / upstream.specific_volume();
    if outcome.converged && compression <= 2.0 * config.newton.second_tol {
        tracing::warn!(
            shock_speed,
            compression,
            "incident shock collapsed onto the upstream state"
        );
        outcome.converged = false;
    } else if !outcome.converged {
        tracing::warn!(
            shock_speed,
            iterations = outcome.iterations,
            fh = outcome.residual[0],
            fp = outcome.residual[1],
            "incident shock did not converge"
        );
    }
    let state = system.into_state_at(outcome.x)?;
    Ok(ShockSolution::from_outcome(shock_speed, state, mode, &outcome))
}

/// Frozen post-shock state; the ZND initial condition.
pub fn post_shock_frozen(
    model: &dyn GasModel,
    upstream: &GasState,
    shock_speed: f64,
    config: &ShockConfig,
) -> ShockResult<ShockSolution> {
    post_shock(model, upstream, shock_speed, ThermoMode::Frozen, config)
}

/// Equilibrium post-shock state.
pub fn post_shock_equilibrium(
    model: &dyn GasModel,
    upstream: &GasState,
    shock_speed: f64,
    config: &ShockConfig,
) -> ShockResult<ShockSolution> {
    post_shock(model, upstream, shock_speed, ThermoMode::Equilibrium, config)
}

/// Re-evaluate the jump residuals of an arbitrary post-shock state.
pub fn incident_residual(
    model: &dyn GasModel,
    upstream: &GasState,
    solution: &ShockSolution,
) -> ShockResult<[f64; 2]> {
    let mut system = JumpSystem::new(
        model,
        upstream,
        solution.mode,
        JumpKind::Incident {
            shock_speed: solution.shock_speed,
        },
    )?;
    let x = Vector2::new(solution.state.temperature(), solution.state.specific_volume());
    let r = system.residual(x)?;
    Ok([r[0], r[1]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::units::{k, pa};
    use sf_gas::{Composition, IdealGasMixture};

    fn nitrogen() -> (IdealGasMixture, GasState) {
        let gas = IdealGasMixture::hydrogen_air().unwrap();
        let comp = Composition::pure("N2");
        let state = gas.state_tpx(k(300.0), pa(101_325.0), &comp).unwrap();
        (gas, state)
    }

    #[test]
    fn subsonic_speed_rejected() {
        let (gas, up) = nitrogen();
        let err = post_shock_frozen(&gas, &up, 200.0, &ShockConfig::default()).unwrap_err();
        assert!(matches!(err, ShockError::InvalidInput { .. }));
    }

    #[test]
    fn weak_nitrogen_shock_near_perfect_gas() {
        // Mach 2 in N2 with gamma close to 1.4: P2/P1 = 4.5, rho2/rho1 = 2.667
        let (gas, up) = nitrogen();
        let a1 = gas.sound_speed_frozen(&up).unwrap();
        let sol = post_shock_frozen(&gas, &up, 2.0 * a1, &ShockConfig::default()).unwrap();
        assert!(sol.converged);
        assert!((sol.pressure_ratio(&up) - 4.5).abs() < 0.05);
        assert!((sol.density_ratio(&up) - 2.667).abs() < 0.03);
        assert!(sol.particle_speed(&up) > 0.0);
        // caller's state is untouched
        assert_eq!(up.temperature(), 300.0);
    }

    #[test]
    fn barely_supersonic_shock_still_compresses() {
        let (gas, up) = nitrogen();
        let a1 = gas.sound_speed_frozen(&up).unwrap();
        let gamma = gas.gamma_frozen(&up).unwrap();
        for mach in [1.001, 1.01] {
            let sol = post_shock_frozen(&gas, &up, mach * a1, &ShockConfig::default()).unwrap();
            assert!(sol.converged, "M = {mach}");
            let m2 = mach * mach;
            let expected = (gamma + 1.0) * m2 / ((gamma - 1.0) * m2 + 2.0);
            let ratio = sol.density_ratio(&up);
            assert!(ratio > 1.0, "M = {mach}: rho2/rho1 = {ratio}");
            assert!(ratio > 1.0 + 0.5 * (expected - 1.0), "M = {mach}: {ratio} vs {expected}");
            assert!(sol.pressure_ratio(&up) > 1.0);
        }
    }

    #[test]
    fn residual_recomputed_matches_reported() {
        let (gas, up) = nitrogen();
        let sol = post_shock_frozen(&gas, &up, 1200.0, &ShockConfig::default()).unwrap();
        let r = incident_residual(&gas, &up, &sol).unwrap();
        assert!((r[0] - sol.residual[0]).abs() <= 1e-6 * r[0].abs().max(1.0));
        assert!((r[1] - sol.residual[1]).abs() <= 1e-6 * r[1].abs().max(1.0));
    }
}
