//! Gas-state errors.

use sf_core::SfError;
use thiserror::Error;

/// Result type for gas-state operations.
pub type GasResult<T> = Result<T, GasError>;

/// Errors that can occur while evaluating a gas state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GasError {
    /// Non-physical values (negative density, pressure, etc.).
    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Species name not present in the mechanism.
    #[error("Unknown species '{name}'")]
    UnknownSpecies { name: String },

    /// Mole or mass fraction vector does not match the mechanism.
    #[error("Expected {expected} species fractions, got {got}")]
    SpeciesCount { expected: usize, got: usize },

    /// Mechanism definition is malformed.
    #[error("Invalid mechanism: {message}")]
    Mechanism { message: String },

    /// Composition string could not be parsed.
    #[error("Cannot parse composition '{input}': {reason}")]
    Parse { input: String, reason: &'static str },

    /// Equilibrium iteration failed to settle.
    #[error("Equilibrium did not converge after {sweeps} sweeps (max extent change {change:e})")]
    EquilibriumFailed { sweeps: usize, change: f64 },

    /// Mechanism file could not be read or decoded.
    #[error("Mechanism file error: {message}")]
    File { message: String },
}

impl From<SfError> for GasError {
    fn from(err: SfError) -> Self {
        match err {
            SfError::NonFinite { what, value } | SfError::NonPositive { what, value } => {
                GasError::NonPhysical { what, value }
            }
            SfError::InvalidArg { what } | SfError::Invariant { what } => {
                GasError::InvalidArg { what }
            }
        }
    }
}
