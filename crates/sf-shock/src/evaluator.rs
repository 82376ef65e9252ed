//! State evaluation at (ρ, T) for the jump residuals.

use serde::{Deserialize, Serialize};
use sf_gas::{GasError, GasModel, GasResult, GasState};

/// Composition treatment behind a shock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermoMode {
    /// Composition carried unchanged across the jump.
    #[default]
    Frozen,
    /// Composition relaxed to chemical equilibrium at (T, ρ).
    Equilibrium,
}

impl ThermoMode {
    pub fn label(&self) -> &'static str {
        match self {
            ThermoMode::Frozen => "frozen",
            ThermoMode::Equilibrium => "equilibrium",
        }
    }
}

/// Pressure [Pa] and specific enthalpy [J/kg] of an evaluated state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatePoint {
    pub pressure: f64,
    pub enthalpy: f64,
}

/// Put `working` at (ρ, T) starting from `reference_y`, relax it if the mode
/// asks for equilibrium, and return (P, h).
///
/// Restarting from the reference composition each time keeps the result a
/// function of (ρ, T) alone, independent of the Newton path.
pub fn evaluate(
    model: &dyn GasModel,
    working: &mut GasState,
    reference_y: &[f64],
    rho: f64,
    t: f64,
    mode: ThermoMode,
) -> GasResult<StatePoint> {
    if working.n_species() != reference_y.len() {
        return Err(GasError::SpeciesCount {
            expected: working.n_species(),
            got: reference_y.len(),
        });
    }
    working.mass_fractions_mut().copy_from_slice(reference_y);
    model.set_td(working, t, rho)?;
    if mode == ThermoMode::Equilibrium {
        model.equilibrate_tv(working)?;
    }
    Ok(StatePoint {
        pressure: working.pressure(),
        enthalpy: model.enthalpy_mass(working)?,
    })
}
