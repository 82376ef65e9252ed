//! Shock jump conditions and Chapman-Jouguet detonation speed.
//!
//! Every solve here is a two-unknown Newton iteration on the Rankine-Hugoniot
//! equations. The unknowns are the downstream temperature and either the
//! downstream specific volume (incident and reflected shocks) or the shock
//! speed (fixed-density Hugoniot samples for the CJ search). Thermodynamic
//! states come from any [`sf_gas::GasModel`], evaluated with frozen or
//! equilibrium composition.
//!
//! Iteration caps are not errors: solutions carry `converged` flags and the
//! CJ search reports a [`CjStatus`], so sweeps over many operating points can
//! keep going past individual failures.

pub mod cj;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod fit;
pub mod incident;
pub mod jacobian;
pub mod jump;
pub mod newton;
pub mod reflected;

pub use cj::{CjResult, CjSamples, CjStatus, cj_speed, cj_speed_batch, cj_state};
pub use config::{CjConfig, NewtonConfig, ShockConfig};
pub use error::{ShockError, ShockResult};
pub use evaluator::{StatePoint, ThermoMode, evaluate};
pub use fit::QuadraticFit;
pub use incident::{
    ShockSolution, incident_residual, post_shock, post_shock_equilibrium, post_shock_frozen,
};
pub use jump::{JumpKind, JumpSystem, Upstream, fhfp, reflected_residual};
pub use newton::{JumpResidual, NewtonOutcome, newton_solve_2x2};
pub use reflected::{ReflectedSolution, incident_particle_speed, reflected_shock};
