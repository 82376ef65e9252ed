//! Reaction-zone integration for shockflow.
//!
//! Provides:
//! - ZND detonation structure behind a frozen shock
//! - Constant-volume and constant-pressure explosions
//! - Stagnation-point flow behind a bow shock
//! - Adaptive stiff integration (Rosenbrock 2(3)) with step caps and deadlines
//! - Induction and exothermic timescales from the sampled profile

pub mod error;
pub mod integrator;
pub mod model;
pub mod profile;
pub mod sim;
pub mod solve;
pub mod systems;
pub mod timescales;

pub use error::{ZoneError, ZoneResult};
pub use integrator::Rosenbrock23;
pub use model::{OdeModel, StopReason};
pub use profile::{ProfileSample, ReactionZoneProfile};
pub use sim::{IntegrationOptions, IntegrationStatus, Trajectory, TruncationCause, integrate};
pub use solve::{
    cp_explosion, cv_explosion, solve_reaction_zone, stagnation, znd, znd_behind_shock,
};
pub use systems::{Auxiliary, ReactionZoneKind, ReactionZoneSystem};
pub use timescales::{
    Boundary, DerivedTimescales, ExothermicPulse, InductionPoint, PeakLocation,
};
