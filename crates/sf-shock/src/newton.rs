//! Damped Newton iteration for two-unknown jump systems.

use crate::config::NewtonConfig;
use crate::error::{ShockError, ShockResult};
use crate::jacobian::one_sided_2x2;
use nalgebra::Vector2;

/// A square 2x2 residual system driven by [`newton_solve_2x2`].
///
/// `residual` takes `&mut self` so implementors can reuse a working gas state
/// owned by the solve.
pub trait JumpResidual {
    fn residual(&mut self, x: Vector2<f64>) -> ShockResult<Vector2<f64>>;

    /// Strict upper bound on unknown `i`, if any.
    fn upper_bound(&self, _i: usize) -> Option<f64> {
        None
    }
}

/// Newton iteration result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonOutcome {
    /// Final iterate
    pub x: Vector2<f64>,
    /// Residual evaluated at `x`
    pub residual: Vector2<f64>,
    /// Number of iterations
    pub iterations: usize,
    /// Step tolerances met before the iteration cap
    pub converged: bool,
}

/// Clip a raw Newton step.
///
/// Each component is limited to `max_fraction * |x|`. A component with an
/// upper bound that the raw step would cross is limited to half the remaining
/// distance instead, so the iterate approaches the bound without reaching it.
pub fn limit_step(
    x: Vector2<f64>,
    dx: Vector2<f64>,
    max_fraction: f64,
    bounds: [Option<f64>; 2],
) -> Vector2<f64> {
    let mut out = dx;
    for i in 0..2 {
        let mut limit = max_fraction * x[i].abs();
        if let Some(bound) = bounds[i] {
            if x[i] + dx[i] >= bound {
                limit = 0.5 * (bound - x[i]).max(0.0);
            }
        }
        if out[i].abs() > limit {
            out[i] = limit.copysign(dx[i]);
        }
    }
    out
}

/// Solve `F(x) = 0` from `x0`.
///
/// Each iteration builds a one-sided finite-difference Jacobian, solves for the full
/// step, clips it with [`limit_step`] and applies it. Iteration stops when
/// `|dx_i| < tol_i |x_i|` holds for both unknowns. Running out of iterations
/// returns the last iterate with `converged == false`.
pub fn newton_solve_2x2<R: JumpResidual + ?Sized>(
    system: &mut R,
    x0: Vector2<f64>,
    config: &NewtonConfig,
) -> ShockResult<NewtonOutcome> {
    let tol = Vector2::new(config.temperature_tol, config.second_tol);
    let bounds = [system.upper_bound(0), system.upper_bound(1)];
    let mut x = x0;

    for iter in 0..config.max_iterations {
        let f = system.residual(x)?;
        let jac = one_sided_2x2(x, f, config.perturbation, bounds, |xp| system.residual(xp))?;

        let dx = jac
            .lu()
            .solve(&(-f))
            .filter(|d| d.iter().all(|v| v.is_finite()))
            .ok_or(ShockError::SingularJacobian { iteration: iter })?;

        let step = limit_step(x, dx, config.max_step_fraction, bounds);
        x += step;

        let converged = (0..2).all(|i| step[i].abs() < tol[i] * x[i].abs());
        if converged {
            let residual = system.residual(x)?;
            return Ok(NewtonOutcome {
                x,
                residual,
                iterations: iter + 1,
                converged: true,
            });
        }
    }

    let residual = system.residual(x)?;
    tracing::warn!(
        iterations = config.max_iterations,
        x0 = x[0],
        x1 = x[1],
        "jump solve reached the iteration cap"
    );
    Ok(NewtonOutcome {
        x,
        residual,
        iterations: config.max_iterations,
        converged: false,
    })
}
