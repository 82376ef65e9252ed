//! sf-gas: gas-state provider for shockflow.
//!
//! Provides:
//! - Composition handling (mole fractions, `"H2:2 O2:1 N2:3.76"` strings)
//! - NASA-7 species thermodynamics and a small built-in species catalog
//! - Serde-loadable reaction mechanisms
//! - `GasState`, the per-solve working state
//! - `GasModel` trait consumed by the shock and reaction-zone solvers
//! - `IdealGasMixture` reference provider (frozen thermo, mass-action
//!   kinetics, constant-volume equilibrium)
//!
//! # Example
//!
//! ```no_run
//! use sf_gas::{Composition, GasModel, IdealGasMixture};
//! use sf_core::units::{k, pa};
//!
//! let gas = IdealGasMixture::hydrogen_air().unwrap();
//! let comp = Composition::parse("H2:2 O2:1 N2:3.76").unwrap();
//! let state = gas.state_tpx(k(298.15), pa(101_325.0), &comp).unwrap();
//! println!("a_fr = {} m/s", gas.sound_speed_frozen(&state).unwrap());
//! ```

pub mod composition;
pub mod error;
pub mod ideal;
pub mod mechanism;
pub mod model;
pub mod species;
pub mod state;
pub mod thermo;

// Re-exports for ergonomics
pub use composition::Composition;
pub use error::{GasError, GasResult};
pub use ideal::{EquilibriumOptions, IdealGasMixture};
pub use mechanism::{Mechanism, RateConstant, Reaction, ReactionModel};
pub use model::GasModel;
pub use species::{BUILTIN_SPECIES, SpeciesData};
pub use state::GasState;
pub use thermo::Nasa7;
