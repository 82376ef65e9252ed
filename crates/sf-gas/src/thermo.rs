//! NASA 7-coefficient species thermodynamics.

use serde::{Deserialize, Serialize};

/// Two-range NASA polynomial: `temperature_ranges = [T_low, T_mid, T_high]`,
/// `pieces[0]` valid on `[T_low, T_mid]`, `pieces[1]` on `[T_mid, T_high]`.
///
/// Outside the nominal range the nearest piece is extrapolated.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Nasa7 {
    pub temperature_ranges: [f64; 3],
    pub pieces: [[f64; 7]; 2],
}

impl Nasa7 {
    pub fn new(temperature_ranges: [f64; 3], low: [f64; 7], high: [f64; 7]) -> Self {
        Self {
            temperature_ranges,
            pieces: [low, high],
        }
    }

    fn piece(&self, t: f64) -> &[f64; 7] {
        if t < self.temperature_ranges[1] {
            &self.pieces[0]
        } else {
            &self.pieces[1]
        }
    }

    /// cp / R
    pub fn cp_r(&self, t: f64) -> f64 {
        let a = self.piece(t);
        a[0] + t * (a[1] + t * (a[2] + t * (a[3] + t * a[4])))
    }

    /// h / (R T)
    pub fn h_rt(&self, t: f64) -> f64 {
        let a = self.piece(t);
        a[0] + t * (a[1] / 2.0 + t * (a[2] / 3.0 + t * (a[3] / 4.0 + t * a[4] / 5.0))) + a[5] / t
    }

    /// s° / R at the reference pressure
    pub fn s_r(&self, t: f64) -> f64 {
        let a = self.piece(t);
        a[0] * t.ln() + t * (a[1] + t * (a[2] / 2.0 + t * (a[3] / 3.0 + t * a[4] / 4.0))) + a[6]
    }

    /// g° / (R T)
    pub fn g_rt(&self, t: f64) -> f64 {
        self.h_rt(t) - self.s_r(t)
    }

    /// Largest mismatch of (cp/R, h/RT, s/R) between the two pieces at `T_mid`.
    pub fn midpoint_mismatch(&self) -> f64 {
        let t = self.temperature_ranges[1];
        let eval = |a: &[f64; 7]| {
            let cp = a[0] + t * (a[1] + t * (a[2] + t * (a[3] + t * a[4])));
            let h = a[0]
                + t * (a[1] / 2.0 + t * (a[2] / 3.0 + t * (a[3] / 4.0 + t * a[4] / 5.0)))
                + a[5] / t;
            let s = a[0] * t.ln()
                + t * (a[1] + t * (a[2] / 2.0 + t * (a[3] / 3.0 + t * a[4] / 4.0)))
                + a[6];
            [cp, h, s]
        };
        let lo = eval(&self.pieces[0]);
        let hi = eval(&self.pieces[1]);
        lo.iter()
            .zip(hi.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}
