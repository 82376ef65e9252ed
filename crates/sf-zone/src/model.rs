//! OdeModel trait for reaction-zone systems.

use crate::error::ZoneResult;
use nalgebra::DVector;

/// Why a model asked the integrator to stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Sonic parameter fell below the cutoff
    Sonic,
}

/// Autonomous first-order system `dy/dt = f(y)`.
///
/// `rhs` takes `&mut self` so a model can re-use one working gas state
/// across evaluations.
pub trait OdeModel {
    fn dim(&self) -> usize;

    fn rhs(&mut self, y: &DVector<f64>, dydt: &mut DVector<f64>) -> ZoneResult<()>;

    /// Checked after every accepted step.
    fn stop_condition(&mut self, _y: &DVector<f64>) -> ZoneResult<Option<StopReason>> {
        Ok(None)
    }
}
