//! Gas-State Provider trait.

use crate::composition::Composition;
use crate::error::{GasError, GasResult};
use crate::state::{GasState, validation};
use sf_core::units::constants::GAS_CONSTANT;
use sf_core::units::{Pressure, Temperature};

/// Trait for gas property and kinetics providers.
///
/// Solvers never see a concrete thermochemistry backend: they consume this
/// trait, hand it a [`GasState`] they own, and let it fill in the remaining
/// state variables. Implementations must be thread-safe (Send + Sync) so
/// independent operating points can be evaluated in parallel; all per-solve
/// mutability lives in the `GasState`.
///
/// Units: K, kg/m³, Pa, J/kg, kg/kmol, kmol/(m³·s).
pub trait GasModel: Send + Sync {
    /// Get the model name (for debugging/logging).
    fn name(&self) -> &str;

    fn n_species(&self) -> usize;

    fn species_name(&self, k: usize) -> &str;

    fn species_index(&self, name: &str) -> Option<usize>;

    /// Species molar masses [kg/kmol].
    fn molar_masses(&self) -> &[f64];

    /// Re-establish pressure from (T, ρ).
    fn set_td(&self, state: &mut GasState, t: f64, rho: f64) -> GasResult<()>;

    /// Re-establish density from (T, P).
    fn set_tp(&self, state: &mut GasState, t: f64, p: f64) -> GasResult<()>;

    /// Re-establish temperature from (ρ, P).
    fn set_dp(&self, state: &mut GasState, rho: f64, p: f64) -> GasResult<()>;

    /// Specific enthalpy [J/kg].
    fn enthalpy_mass(&self, state: &GasState) -> GasResult<f64>;

    /// Specific internal energy [J/kg].
    fn int_energy_mass(&self, state: &GasState) -> GasResult<f64>;

    /// Specific entropy [J/(kg·K)].
    fn entropy_mass(&self, state: &GasState) -> GasResult<f64>;

    /// Frozen cp [J/(kg·K)].
    fn cp_mass(&self, state: &GasState) -> GasResult<f64>;

    /// Frozen cv [J/(kg·K)].
    fn cv_mass(&self, state: &GasState) -> GasResult<f64>;

    /// Species h°/(RT) at temperature `t`.
    fn standard_enthalpies_rt(&self, t: f64, out: &mut [f64]);

    /// Net molar production rates [kmol/(m³·s)].
    fn net_production_rates(&self, state: &GasState, out: &mut [f64]) -> GasResult<()>;

    /// Chemical equilibrium at fixed (T, ρ); composition is updated in place.
    fn equilibrate_tv(&self, state: &mut GasState) -> GasResult<()>;

    /// Replace the composition (normalized) keeping T and ρ.
    fn set_mass_fractions(&self, state: &mut GasState, y: &[f64]) -> GasResult<()> {
        let sum = validation::fractions(y, self.n_species())?;
        for (dst, src) in state.mass_fractions_mut().iter_mut().zip(y) {
            *dst = src / sum;
        }
        let (t, rho) = (state.temperature(), state.density());
        self.set_td(state, t, rho)
    }

    /// Mass fractions for a mole-fraction composition.
    fn mass_fractions_of(&self, comp: &Composition) -> GasResult<Vec<f64>> {
        let mw = self.molar_masses();
        let mut y = vec![0.0; self.n_species()];
        for (name, x) in comp.iter() {
            let k = self
                .species_index(name)
                .ok_or_else(|| GasError::UnknownSpecies {
                    name: name.to_string(),
                })?;
            y[k] += x * mw[k];
        }
        let total: f64 = y.iter().sum();
        validation::positive(total, "mixture molar mass")?;
        y.iter_mut().for_each(|v| *v /= total);
        Ok(y)
    }

    /// Build a state from pressure, temperature and mole fractions.
    fn state_tpx(&self, t: Temperature, p: Pressure, comp: &Composition) -> GasResult<GasState> {
        let y = self.mass_fractions_of(comp)?;
        let t = validation::positive(t.value, "temperature")?;
        let p = validation::positive(p.value, "pressure")?;
        // placeholder density, replaced by set_tp
        let mut state = GasState::from_parts(t, 1.0, p, y)?;
        self.set_tp(&mut state, t, p)?;
        Ok(state)
    }

    /// Mean molar mass [kg/kmol].
    fn mean_molar_mass(&self, state: &GasState) -> f64 {
        let inv: f64 = state
            .mass_fractions()
            .iter()
            .zip(self.molar_masses())
            .map(|(y, w)| y / w)
            .sum();
        1.0 / inv
    }

    /// Mole fractions of the current composition.
    fn mole_fractions(&self, state: &GasState) -> Vec<f64> {
        let w = self.mean_molar_mass(state);
        state
            .mass_fractions()
            .iter()
            .zip(self.molar_masses())
            .map(|(y, wk)| y * w / wk)
            .collect()
    }

    /// Frozen heat capacity ratio.
    fn gamma_frozen(&self, state: &GasState) -> GasResult<f64> {
        let gamma = self.cp_mass(state)? / self.cv_mass(state)?;
        if !gamma.is_finite() || gamma < 1.0 {
            return Err(GasError::NonPhysical {
                what: "frozen gamma",
                value: gamma,
            });
        }
        Ok(gamma)
    }

    /// Frozen sound speed `sqrt(γ_fr P / ρ)` [m/s].
    fn sound_speed_frozen(&self, state: &GasState) -> GasResult<f64> {
        let gamma = self.gamma_frozen(state)?;
        let a = (gamma * state.pressure() / state.density()).sqrt();
        validation::positive(a, "frozen sound speed")
    }

    /// Thermicity `σ̇ = Σ (W/W_k − h_k/(cp T)) dY_k/dt` [1/s].
    fn thermicity(&self, state: &GasState) -> GasResult<f64> {
        let n = self.n_species();
        let mut wdot = vec![0.0; n];
        self.net_production_rates(state, &mut wdot)?;
        let mut h_rt = vec![0.0; n];
        let t = state.temperature();
        self.standard_enthalpies_rt(t, &mut h_rt);
        let cp = self.cp_mass(state)?;
        let w = self.mean_molar_mass(state);
        let rho = state.density();
        let mw = self.molar_masses();
        let mut sigma = 0.0;
        for k in 0..n {
            let dydt = wdot[k] * mw[k] / rho;
            let h_k = h_rt[k] * GAS_CONSTANT * t / mw[k];
            sigma += (w / mw[k] - h_k / (cp * t)) * dydt;
        }
        validation::finite(sigma, "thermicity")
    }
}
