//! Least-squares quadratic fit used by the CJ search.

use crate::error::{ShockError, ShockResult};
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use sf_core::student_t_95;

/// `y = a x² + b x + c` fitted by least squares.
///
/// The normal equations are formed in the centred and scaled variable
/// `z = (x - mean) / scale`, which keeps them well conditioned over the very
/// narrow brackets the CJ search produces. Coefficients are reported in `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    pub n_points: usize,
    /// Sum of squared residuals
    pub sse: f64,
    mean: f64,
    scale: f64,
    /// Coefficients in the scaled variable
    scaled: [f64; 3],
    /// `(ZᵀZ)⁻¹` in the scaled variable
    normal_inverse: [[f64; 3]; 3],
}

impl QuadraticFit {
    /// Fit at least four points with distinct abscissae.
    pub fn fit(x: &[f64], y: &[f64]) -> ShockResult<Self> {
        if x.len() != y.len() {
            return Err(ShockError::Fit {
                what: format!("{} abscissae for {} ordinates", x.len(), y.len()),
            });
        }
        let n = x.len();
        if n < 4 {
            return Err(ShockError::Fit {
                what: format!("{n} points; at least 4 are needed"),
            });
        }

        let mean = x.iter().sum::<f64>() / n as f64;
        let scale = x.iter().map(|v| (v - mean).abs()).fold(0.0, f64::max);
        if !(scale > 0.0) || !scale.is_finite() {
            return Err(ShockError::Fit {
                what: "abscissae are all equal".to_string(),
            });
        }

        let mut ztz = Matrix3::<f64>::zeros();
        let mut zty = Vector3::<f64>::zeros();
        for (&xi, &yi) in x.iter().zip(y) {
            let z = (xi - mean) / scale;
            let row = Vector3::new(z * z, z, 1.0);
            ztz += row * row.transpose();
            zty += row * yi;
        }
        let inv = ztz.try_inverse().ok_or_else(|| ShockError::Fit {
            what: "singular normal equations".to_string(),
        })?;
        let coef = inv * zty;
        let (aa, bb, cc) = (coef[0], coef[1], coef[2]);

        let y_mean = y.iter().sum::<f64>() / n as f64;
        let mut sse = 0.0;
        let mut sst = 0.0;
        for (&xi, &yi) in x.iter().zip(y) {
            let z = (xi - mean) / scale;
            let r = yi - (aa * z * z + bb * z + cc);
            sse += r * r;
            sst += (yi - y_mean) * (yi - y_mean);
        }
        let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { 1.0 };

        let s2 = scale * scale;
        let mut normal_inverse = [[0.0; 3]; 3];
        for (i, row) in normal_inverse.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = inv[(i, j)];
            }
        }

        Ok(Self {
            a: aa / s2,
            b: -2.0 * aa * mean / s2 + bb / scale,
            c: aa * mean * mean / s2 - bb * mean / scale + cc,
            r_squared,
            n_points: n,
            sse,
            mean,
            scale,
            scaled: [aa, bb, cc],
            normal_inverse,
        })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.scale;
        let [aa, bb, cc] = self.scaled;
        aa * z * z + bb * z + cc
    }

    /// Abscissa of the minimum. Fails when the parabola opens downward.
    pub fn vertex(&self) -> ShockResult<f64> {
        let [aa, bb, _] = self.scaled;
        if !(aa > 0.0) {
            return Err(ShockError::Fit {
                what: format!("parabola has no minimum (a = {:e})", self.a),
            });
        }
        Ok(self.mean + self.scale * (-bb / (2.0 * aa)))
    }

    /// One-sided 95 % prediction-interval half-width at `x`.
    pub fn prediction_half_width(&self, x: f64) -> ShockResult<f64> {
        let dof = self.n_points - 3;
        let t = student_t_95(dof)?;
        let z = (x - self.mean) / self.scale;
        let z0 = Vector3::new(z * z, z, 1.0);
        let inv = Matrix3::from_fn(|i, j| self.normal_inverse[i][j]);
        let leverage = (z0.transpose() * inv * z0)[(0, 0)];
        let variance = self.sse / dof as f64;
        Ok(t * (variance * (1.0 + leverage)).max(0.0).sqrt())
    }
}
