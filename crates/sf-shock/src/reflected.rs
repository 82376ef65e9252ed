//! Shock reflected off a stationary closed end.

use crate::config::ShockConfig;
use crate::error::{ShockError, ShockResult};
use crate::evaluator::ThermoMode;
use crate::incident::ShockSolution;
use crate::jump::{JumpKind, JumpSystem};
use crate::newton::{NewtonOutcome, newton_solve_2x2};
use nalgebra::Vector2;
use sf_gas::{GasModel, GasState};

/// Reflected shock result.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedSolution {
    /// State 3, at rest behind the reflected wave
    pub state: GasState,
    /// Lab-frame reflected wave speed `UR` [m/s]
    pub reflected_speed: f64,
    /// Gas speed `u2` behind the incident shock [m/s]
    pub particle_speed: f64,
    pub mode: ThermoMode,
    pub converged: bool,
    pub iterations: usize,
    pub residual: [f64; 2],
}

impl ReflectedSolution {
    pub fn pressure(&self) -> f64 {
        self.state.pressure()
    }
}

/// Gas speed behind the incident shock from the jump between states 1 and 2.
pub fn incident_particle_speed(state1: &GasState, state2: &GasState) -> ShockResult<f64> {
    let dp = state2.pressure() - state1.pressure();
    let dv = state1.specific_volume() - state2.specific_volume();
    if !(dp > 0.0 && dv > 0.0) {
        return Err(ShockError::InvalidInput {
            what: format!("state 2 is not compressed relative to state 1 (dp = {dp}, dv = {dv})"),
        });
    }
    Ok((dp * dv).sqrt())
}

fn reflected_guess(
    state2: &GasState,
    gamma2: f64,
    u2: f64,
    min_volume_ratio: f64,
) -> Vector2<f64> {
    let v2 = state2.specific_volume();
    let p2 = state2.pressure();
    let ratio = ((gamma2 - 1.0) / (gamma2 + 1.0)).max(min_volume_ratio);
    let v = v2 * ratio;
    let p = p2 + state2.density() * u2 * u2 / (1.0 - v / v2);
    let t = state2.temperature() * p * v / (p2 * v2);
    Vector2::new(t, v)
}

/// Solve for the reflected state given the pre-shock state and a solved
/// incident shock.
///
/// The reflected volume is kept strictly below the incident post-shock
/// volume. The returned `reflected_speed` is `(p3 - p2) / (u2 ρ2) - u2`.
pub fn reflected_shock(
    model: &dyn GasModel,
    state1: &GasState,
    incident: &ShockSolution,
    mode: ThermoMode,
    config: &ShockConfig,
) -> ShockResult<ReflectedSolution> {
    if !incident.converged {
        tracing::warn!(
            shock_speed = incident.shock_speed,
            "reflecting off an incident shock that did not converge"
        );
    }
    let state2 = &incident.state;
    let u2 = incident_particle_speed(state1, state2)?;
    let gamma2 = model.gamma_frozen(state2)?;
    let x0 = reflected_guess(state2, gamma2, u2, config.reflected_min_volume_ratio);

    let mut system = JumpSystem::new(
        model,
        state2,
        mode,
        JumpKind::Reflected { particle_speed: u2 },
    )?;
    let outcome: NewtonOutcome = newton_solve_2x2(&mut system, x0, &config.newton)?;
    if !outcome.converged {
        tracing::warn!(
            particle_speed = u2,
            iterations = outcome.iterations,
            fh = outcome.residual[0],
            fp = outcome.residual[1],
            "reflected shock did not converge"
        );
    }

    let state = system.into_state_at(outcome.x)?;
    let reflected_speed = (state.pressure() - state2.pressure()) / (u2 * state2.density()) - u2;

    Ok(ReflectedSolution {
        state,
        reflected_speed,
        particle_speed: u2,
        mode,
        converged: outcome.converged,
        iterations: outcome.iterations,
        residual: [outcome.residual[0], outcome.residual[1]],
    })
}
