//! Finite difference Jacobian for two-unknown jump systems.

use crate::error::ShockResult;
use nalgebra::{Matrix2, Vector2};

/// One-sided finite-difference Jacobian with a relative perturbation.
///
/// Column j perturbs `x[j]` by `rel * |x[j]|` (falling back to `rel` when
/// `x[j]` is zero) and divides the residual change by that step. The
/// perturbation is taken downward when stepping up would reach the upper
/// bound in `bounds[j]`. `f_x` is the already-evaluated residual at `x`.
pub fn one_sided_2x2<F>(
    x: Vector2<f64>,
    f_x: Vector2<f64>,
    rel: f64,
    bounds: [Option<f64>; 2],
    mut f: F,
) -> ShockResult<Matrix2<f64>>
where
    F: FnMut(Vector2<f64>) -> ShockResult<Vector2<f64>>,
{
    let mut jac = Matrix2::zeros();

    for j in 0..2 {
        let mut x_perturbed = x;
        let mut dx = if x[j] != 0.0 { rel * x[j].abs() } else { rel };
        if bounds[j].is_some_and(|b| x[j] + dx >= b) {
            dx = -dx;
        }
        x_perturbed[j] += dx;

        let f_perturbed = f(x_perturbed)?;
        jac.set_column(j, &((f_perturbed - f_x) / dx));
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jacobian_linear() {
        // f = A x, J = A exactly
        let f = |x: Vector2<f64>| -> ShockResult<Vector2<f64>> {
            Ok(Vector2::new(2.0 * x[0] - x[1], 0.5 * x[1]))
        };
        let x = Vector2::new(3.0, -4.0);
        let jac = one_sided_2x2(x, f(x).unwrap(), 0.02, [None, None], f).unwrap();

        assert!((jac[(0, 0)] - 2.0).abs() < 1e-10);
        assert!((jac[(0, 1)] + 1.0).abs() < 1e-10);
        assert!(jac[(1, 0)].abs() < 1e-10);
        assert!((jac[(1, 1)] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn jacobian_quadratic_has_first_order_bias() {
        // f = x^2: forward difference gives 2x + dx
        let f = |x: Vector2<f64>| -> ShockResult<Vector2<f64>> {
            Ok(Vector2::new(x[0] * x[0], x[1]))
        };
        let x = Vector2::new(3.0, 1.0);
        let jac = one_sided_2x2(x, f(x).unwrap(), 0.02, [None, None], f).unwrap();
        assert!((jac[(0, 0)] - (6.0 + 0.06)).abs() < 1e-10);
    }

    #[test]
    fn perturbation_turns_back_at_bound() {
        // f = x^2 near an upper bound at 3.01: backward difference gives 2x - dx
        let f = |x: Vector2<f64>| -> ShockResult<Vector2<f64>> {
            Ok(Vector2::new(x[0] * x[0], x[1]))
        };
        let x = Vector2::new(3.0, 1.0);
        let mut seen = Vec::new();
        let jac = one_sided_2x2(x, f(x).unwrap(), 0.02, [Some(3.01), None], |xp| {
            seen.push(xp);
            f(xp)
        })
        .unwrap();
        assert!((jac[(0, 0)] - (6.0 - 0.06)).abs() < 1e-10);
        assert!(seen.iter().all(|xp| xp[0] < 3.01));
    }
}
