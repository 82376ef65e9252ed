//! sf-core: stable foundation for shockflow.
//!
//! Contains:
//! - units (uom SI types + constructors + physical constants)
//! - numeric (Real + tolerances + float helpers + small statistics)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{SfError, SfResult};
pub use numeric::*;
pub use units::*;
