//! Linearly implicit Rosenbrock stepper for stiff chemistry.
//!
//! Second-order Rosenbrock method with an embedded third-order error
//! estimate (the `ode23s` scheme of Shampine and Reichelt). One LU
//! factorisation of `W = I - h d J` per step; `J` comes from forward
//! differences and is reused across rejected attempts from the same point.

use crate::error::{ZoneError, ZoneResult};
use crate::model::OdeModel;
use nalgebra::{DMatrix, DVector};

/// Method constants.
#[derive(Clone, Copy, Debug)]
pub struct Rosenbrock23 {
    d: f64,
    e32: f64,
}

impl Default for Rosenbrock23 {
    fn default() -> Self {
        let sqrt2 = std::f64::consts::SQRT_2;
        Self {
            d: 1.0 / (2.0 + sqrt2),
            e32: 6.0 + sqrt2,
        }
    }
}

/// Result of one attempted step.
#[derive(Clone, Debug)]
pub struct StepAttempt {
    pub y_new: DVector<f64>,
    /// Right-hand side at `y_new`
    pub f_new: DVector<f64>,
    /// Scaled max-norm error; accept when `<= 1`
    pub error: f64,
    k1: DVector<f64>,
    k2: DVector<f64>,
}

/// Forward-difference Jacobian of `model` at `y`, given `f0 = f(y)`.
/// `t` is only used to report a non-finite column.
pub fn finite_difference_jacobian<M: OdeModel + ?Sized>(
    model: &mut M,
    t: f64,
    y: &DVector<f64>,
    f0: &DVector<f64>,
) -> ZoneResult<DMatrix<f64>> {
    let n = y.len();
    let mut jac = DMatrix::zeros(n, n);
    let mut yp = y.clone();
    let mut fp = DVector::zeros(n);
    for j in 0..n {
        let delta = 1e-7 * y[j].abs().max(1e-3);
        yp[j] = y[j] + delta;
        model.rhs(&yp, &mut fp)?;
        yp[j] = y[j];
        let column = (&fp - f0) / delta;
        jac.set_column(j, &column);
    }
    if jac.iter().any(|v| !v.is_finite()) {
        return Err(ZoneError::NonFiniteRhs { t });
    }
    Ok(jac)
}

fn finite_or(v: &DVector<f64>, t: f64) -> ZoneResult<()> {
    if v.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(ZoneError::NonFiniteRhs { t })
    }
}

impl Rosenbrock23 {
    /// Attempt one step of size `h` from `y` at time `t`.
    #[allow(clippy::too_many_arguments)]
    pub fn attempt<M: OdeModel + ?Sized>(
        &self,
        model: &mut M,
        t: f64,
        y: &DVector<f64>,
        f0: &DVector<f64>,
        jac: &DMatrix<f64>,
        h: f64,
        rtol: f64,
        atol: f64,
    ) -> ZoneResult<StepAttempt> {
        let n = y.len();
        let w = DMatrix::identity(n, n) - jac * (h * self.d);
        let lu = w.lu();
        let solve = |rhs: DVector<f64>| {
            lu.solve(&rhs)
                .ok_or(ZoneError::SingularMatrix { t, h })
        };

        let k1 = solve(f0.clone())?;
        let mut f1 = DVector::zeros(n);
        model.rhs(&(y + &k1 * (0.5 * h)), &mut f1)?;
        finite_or(&f1, t)?;

        let k2 = solve(&f1 - &k1)? + &k1;
        let y_new = y + &k2 * h;
        let mut f_new = DVector::zeros(n);
        model.rhs(&y_new, &mut f_new)?;
        finite_or(&f_new, t + h)?;

        let k3 = solve(&f_new - (&k2 - &f1) * self.e32 - (&k1 - f0) * 2.0)?;

        let mut error: f64 = 0.0;
        for i in 0..n {
            let e = h / 6.0 * (k1[i] - 2.0 * k2[i] + k3[i]);
            let scale = (rtol * y[i].abs().max(y_new[i].abs())).max(atol);
            error = error.max(e.abs() / scale);
        }
        if !error.is_finite() {
            return Err(ZoneError::NonFiniteRhs { t: t + h });
        }

        Ok(StepAttempt {
            y_new,
            f_new,
            error,
            k1,
            k2,
        })
    }

    /// Continuous extension over an accepted step, `0 <= s <= 1`.
    pub fn interpolate(&self, y: &DVector<f64>, step: &StepAttempt, h: f64, s: f64) -> DVector<f64> {
        let denom = 1.0 - 2.0 * self.d;
        let c1 = s * (1.0 - s) / denom;
        let c2 = s * (s - 2.0 * self.d) / denom;
        y + (&step.k1 * c1 + &step.k2 * c2) * h
    }
}

/// Step-size factor from a scaled error, limited to `[0.5, 5]`.
pub fn step_factor(error: f64) -> f64 {
    if error <= 0.0 {
        return 5.0;
    }
    (0.8 * error.powf(-1.0 / 3.0)).clamp(0.5, 5.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `y' = -k y`, very stiff for large k.
    struct Decay(f64);

    impl OdeModel for Decay {
        fn dim(&self) -> usize {
            1
        }

        fn rhs(&mut self, y: &DVector<f64>, dydt: &mut DVector<f64>) -> ZoneResult<()> {
            dydt[0] = -self.0 * y[0];
            Ok(())
        }
    }

    #[test]
    fn jacobian_of_linear_decay() {
        let mut m = Decay(3.0);
        let y = DVector::from_element(1, 2.0);
        let mut f = DVector::zeros(1);
        m.rhs(&y, &mut f).unwrap();
        let j = finite_difference_jacobian(&mut m, 0.0, &y, &f).unwrap();
        assert!((j[(0, 0)] + 3.0).abs() < 1e-6);
    }

    #[test]
    fn stiff_step_is_stable() {
        // explicit methods blow up at h k = 1e4; a Rosenbrock step decays
        let mut m = Decay(1e6);
        let method = Rosenbrock23::default();
        let y = DVector::from_element(1, 1.0);
        let mut f = DVector::zeros(1);
        m.rhs(&y, &mut f).unwrap();
        let j = finite_difference_jacobian(&mut m, 0.0, &y, &f).unwrap();
        let step = method.attempt(&mut m, 0.0, &y, &f, &j, 1e-2, 1e-3, 1e-6).unwrap();
        assert!(step.y_new[0].abs() < 1.0);
    }

    #[test]
    fn small_step_accuracy_and_interpolation_end_points() {
        let mut m = Decay(1.0);
        let method = Rosenbrock23::default();
        let y = DVector::from_element(1, 1.0);
        let mut f = DVector::zeros(1);
        m.rhs(&y, &mut f).unwrap();
        let j = finite_difference_jacobian(&mut m, 0.0, &y, &f).unwrap();
        let h = 1e-2;
        let step = method.attempt(&mut m, 0.0, &y, &f, &j, h, 1e-6, 1e-10).unwrap();
        assert!((step.y_new[0] - (-h).exp()).abs() < 1e-6);

        let start = method.interpolate(&y, &step, h, 0.0);
        let end = method.interpolate(&y, &step, h, 1.0);
        assert_eq!(start[0], y[0]);
        assert!((end[0] - step.y_new[0]).abs() < 1e-15);
        let mid = method.interpolate(&y, &step, h, 0.5);
        assert!((mid[0] - (-0.5 * h).exp()).abs() < 1e-6);
    }

    #[test]
    fn factor_limits() {
        assert_eq!(step_factor(0.0), 5.0);
        assert_eq!(step_factor(1e-12), 5.0);
        assert_eq!(step_factor(1e9), 0.5);
        assert!((step_factor(1.0) - 0.8).abs() < 1e-15);
    }
}
