//! Mutable working gas state.

use crate::error::{GasError, GasResult};
use serde::{Deserialize, Serialize};
use sf_core::units::{Density, Pressure, Temperature, k, kgpm3, pa};

/// Temperature, density, pressure and species mass fractions of one gas
/// sample.
///
/// A `GasState` is plain data: the [`GasModel`](crate::GasModel) that
/// produced it keeps (T, ρ, P) consistent through its `set_*` methods.
/// Every solve owns its working state exclusively and mutates it in place;
/// clone to hand a snapshot to another solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasState {
    temperature: f64,
    density: f64,
    pressure: f64,
    mass_fractions: Vec<f64>,
}

impl GasState {
    /// Assemble a state from already-consistent parts.
    pub fn from_parts(
        temperature: f64,
        density: f64,
        pressure: f64,
        mass_fractions: Vec<f64>,
    ) -> GasResult<Self> {
        let mut state = Self {
            temperature: 0.0,
            density: 0.0,
            pressure: 0.0,
            mass_fractions,
        };
        state.assign(temperature, density, pressure)?;
        Ok(state)
    }

    /// Overwrite (T, ρ, P); composition is unchanged.
    pub fn assign(&mut self, temperature: f64, density: f64, pressure: f64) -> GasResult<()> {
        validation::positive(temperature, "temperature")?;
        validation::positive(density, "density")?;
        validation::positive(pressure, "pressure")?;
        self.temperature = temperature;
        self.density = density;
        self.pressure = pressure;
        Ok(())
    }

    /// Temperature [K].
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Density [kg/m³].
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Pressure [Pa].
    pub fn pressure(&self) -> f64 {
        self.pressure
    }

    /// Specific volume [m³/kg].
    pub fn specific_volume(&self) -> f64 {
        1.0 / self.density
    }

    pub fn mass_fractions(&self) -> &[f64] {
        &self.mass_fractions
    }

    /// Mutable access for providers; callers must re-establish (T, ρ, P)
    /// through the model afterwards.
    pub fn mass_fractions_mut(&mut self) -> &mut [f64] {
        &mut self.mass_fractions
    }

    pub fn n_species(&self) -> usize {
        self.mass_fractions.len()
    }

    pub fn temperature_q(&self) -> Temperature {
        k(self.temperature)
    }

    pub fn pressure_q(&self) -> Pressure {
        pa(self.pressure)
    }

    pub fn density_q(&self) -> Density {
        kgpm3(self.density)
    }
}

/// Validation helpers for gas properties.
pub(crate) mod validation {
    use super::*;

    /// Ensure a state variable is positive and finite.
    pub fn positive(v: f64, what: &'static str) -> GasResult<f64> {
        if !v.is_finite() || v <= 0.0 {
            return Err(GasError::NonPhysical { what, value: v });
        }
        Ok(v)
    }

    /// Ensure a derived property is finite (enthalpy and entropy may be negative).
    pub fn finite(v: f64, what: &'static str) -> GasResult<f64> {
        if !v.is_finite() {
            return Err(GasError::NonPhysical { what, value: v });
        }
        Ok(v)
    }

    /// Ensure a fraction vector matches the mechanism and has a positive sum.
    pub fn fractions(y: &[f64], expected: usize) -> GasResult<f64> {
        if y.len() != expected {
            return Err(GasError::SpeciesCount {
                expected,
                got: y.len(),
            });
        }
        let mut sum = 0.0;
        for &v in y {
            finite(v, "species fraction")?;
            sum += v;
        }
        if sum <= 0.0 {
            return Err(GasError::NonPhysical {
                what: "species fraction sum",
                value: sum,
            });
        }
        Ok(sum)
    }
}
