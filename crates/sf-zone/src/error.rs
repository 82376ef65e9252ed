//! Error types for reaction-zone integration.

use sf_core::SfError;
use sf_gas::GasError;
use sf_shock::ShockError;
use thiserror::Error;

/// Errors that stop an integration before it produces a profile.
///
/// Tolerance trouble, step caps and deadlines are not errors; they are
/// reported through [`crate::IntegrationStatus`] and the profile flags.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZoneError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Non-finite right-hand side at t = {t:e}")]
    NonFiniteRhs { t: f64 },

    #[error("Singular iteration matrix at t = {t:e}, h = {h:e}")]
    SingularMatrix { t: f64, h: f64 },

    #[error("Gas error: {0}")]
    Gas(#[from] GasError),

    #[error("Shock error: {0}")]
    Shock(#[from] ShockError),
}

pub type ZoneResult<T> = Result<T, ZoneError>;

impl ZoneError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        ZoneError::InvalidArg { what: what.into() }
    }
}

impl From<SfError> for ZoneError {
    fn from(e: SfError) -> Self {
        ZoneError::invalid(e.to_string())
    }
}
