//! Error types for shock and CJ solves.

use sf_core::SfError;
use sf_gas::GasError;
use thiserror::Error;

/// Errors that stop a jump-condition solve outright.
///
/// Running out of iterations is not an error: it is reported through the
/// `converged` flag of the returned solution so batch runs can continue.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShockError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: String },

    #[error("Singular jump Jacobian at iteration {iteration}")]
    SingularJacobian { iteration: usize },

    #[error("CJ sampling failed: {failed} of {total} density ratios did not converge")]
    CjSampling { failed: usize, total: usize },

    #[error("Least-squares fit failed: {what}")]
    Fit { what: String },

    #[error("Gas error: {0}")]
    Gas(#[from] GasError),
}

pub type ShockResult<T> = Result<T, ShockError>;

impl From<SfError> for ShockError {
    fn from(e: SfError) -> Self {
        ShockError::InvalidInput {
            what: e.to_string(),
        }
    }
}
