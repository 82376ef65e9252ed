//! Right-hand sides of the reaction-zone systems.
//!
//! | kind               | state vector                   |
//! |--------------------|--------------------------------|
//! | constant volume    | `[T, Y..]`                     |
//! | constant pressure  | `[T, Y..]`                     |
//! | ZND                | `[P/Ps, ρ, x, Y..]`            |
//! | stagnation         | `[P/Ps, ρ, w, x, Y..]`         |
//!
//! `Ps` is the initial pressure, used to bring the pressure entry to order
//! one. ZND and stagnation flow are steady in the wave frame and integrated
//! in the particle time of the element leaving the shock.

use crate::error::{ZoneError, ZoneResult};
use crate::model::{OdeModel, StopReason};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use sf_core::constants::GAS_CONSTANT;
use sf_core::numeric::ensure_positive;
use sf_gas::{GasModel, GasState};

/// Which reaction-zone system to integrate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReactionZoneKind {
    ConstantVolume,
    ConstantPressure,
    /// Steady planar reaction zone behind a shock moving at `shock_speed`
    /// into gas of density `upstream_density`.
    Znd {
        upstream_density: f64,
        shock_speed: f64,
    },
    /// Flow behind a bow shock decelerating towards a blunt body at
    /// distance `standoff` behind the shock.
    Stagnation {
        upstream_density: f64,
        shock_speed: f64,
        standoff: f64,
    },
}

impl ReactionZoneKind {
    pub fn label(&self) -> &'static str {
        match self {
            ReactionZoneKind::ConstantVolume => "constant volume explosion",
            ReactionZoneKind::ConstantPressure => "constant pressure explosion",
            ReactionZoneKind::Znd { .. } => "ZND",
            ReactionZoneKind::Stagnation { .. } => "stagnation point",
        }
    }

    pub fn default_t_end(&self) -> f64 {
        1e-3
    }

    pub fn default_max_step(&self) -> f64 {
        match self {
            ReactionZoneKind::ConstantVolume | ReactionZoneKind::ConstantPressure => 1e-5,
            ReactionZoneKind::Znd { .. } | ReactionZoneKind::Stagnation { .. } => 1e-4,
        }
    }

    /// Index of the first mass fraction in the state vector.
    pub fn species_offset(&self) -> usize {
        match self {
            ReactionZoneKind::ConstantVolume | ReactionZoneKind::ConstantPressure => 1,
            ReactionZoneKind::Znd { .. } => 3,
            ReactionZoneKind::Stagnation { .. } => 4,
        }
    }

    /// Whether timescales come from thermicity (flow systems) or from the
    /// temperature gradient (explosions).
    pub fn uses_thermicity(&self) -> bool {
        matches!(
            self,
            ReactionZoneKind::Znd { .. } | ReactionZoneKind::Stagnation { .. }
        )
    }

    pub(crate) fn validate(&self) -> ZoneResult<()> {
        match *self {
            ReactionZoneKind::ConstantVolume | ReactionZoneKind::ConstantPressure => {}
            ReactionZoneKind::Znd {
                upstream_density,
                shock_speed,
            } => {
                ensure_positive(upstream_density, "ZND upstream density")?;
                ensure_positive(shock_speed, "ZND shock speed")?;
            }
            ReactionZoneKind::Stagnation {
                upstream_density,
                shock_speed,
                standoff,
            } => {
                ensure_positive(upstream_density, "stagnation upstream density")?;
                ensure_positive(shock_speed, "stagnation shock speed")?;
                ensure_positive(standoff, "stagnation standoff distance")?;
            }
        }
        Ok(())
    }
}

/// Auxiliary quantities at one state, recomputed from the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Auxiliary {
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
    /// Gas speed relative to the shock (zero for explosions)
    pub speed: f64,
    pub distance: f64,
    pub sound_speed: f64,
    pub gamma: f64,
    pub molar_mass: f64,
    pub mach: f64,
    pub thermicity: f64,
    pub dtdt: f64,
}

/// A reaction-zone system bound to a gas model and its own working state.
pub struct ReactionZoneSystem<'a> {
    model: &'a dyn GasModel,
    kind: ReactionZoneKind,
    working: GasState,
    /// Fixed density (CV) or pressure (CP); pressure scale for the flows
    reference: f64,
    sonic_cutoff: f64,
    wdot: Vec<f64>,
    h_rt: Vec<f64>,
    dydt: DVector<f64>,
}

impl<'a> ReactionZoneSystem<'a> {
    pub fn new(
        model: &'a dyn GasModel,
        initial: &GasState,
        kind: ReactionZoneKind,
        sonic_cutoff: f64,
    ) -> ZoneResult<Self> {
        kind.validate()?;
        if initial.n_species() != model.n_species() {
            return Err(ZoneError::invalid(format!(
                "state has {} species, model has {}",
                initial.n_species(),
                model.n_species()
            )));
        }
        let reference = match kind {
            ReactionZoneKind::ConstantVolume => initial.density(),
            _ => initial.pressure(),
        };
        let n = model.n_species();
        Ok(Self {
            model,
            kind,
            working: initial.clone(),
            reference,
            sonic_cutoff,
            wdot: vec![0.0; n],
            h_rt: vec![0.0; n],
            dydt: DVector::zeros(n + kind.species_offset()),
        })
    }

    pub fn kind(&self) -> ReactionZoneKind {
        self.kind
    }

    /// State vector at the initial condition.
    pub fn initial_vector(&self) -> DVector<f64> {
        let s = &self.working;
        let head: Vec<f64> = match self.kind {
            ReactionZoneKind::ConstantVolume | ReactionZoneKind::ConstantPressure => {
                vec![s.temperature()]
            }
            ReactionZoneKind::Znd { .. } => vec![s.pressure() / self.reference, s.density(), 0.0],
            ReactionZoneKind::Stagnation {
                upstream_density,
                shock_speed,
                ..
            } => {
                let w = shock_speed * upstream_density / s.density();
                vec![s.pressure() / self.reference, s.density(), w, 0.0]
            }
        };
        DVector::from_iterator(
            head.len() + s.n_species(),
            head.into_iter().chain(s.mass_fractions().iter().copied()),
        )
    }

    /// Put the working state at `y`.
    pub fn load(&mut self, y: &DVector<f64>) -> ZoneResult<()> {
        let offset = self.kind.species_offset();
        self.working
            .mass_fractions_mut()
            .copy_from_slice(&y.as_slice()[offset..]);
        match self.kind {
            ReactionZoneKind::ConstantVolume => {
                self.model.set_td(&mut self.working, y[0], self.reference)?
            }
            ReactionZoneKind::ConstantPressure => {
                self.model.set_tp(&mut self.working, y[0], self.reference)?
            }
            ReactionZoneKind::Znd { .. } | ReactionZoneKind::Stagnation { .. } => {
                self.model
                    .set_dp(&mut self.working, y[1], y[0] * self.reference)?
            }
        }
        Ok(())
    }

    /// Working state after the last [`Self::load`] or RHS evaluation.
    pub fn working(&self) -> &GasState {
        &self.working
    }

    /// Gas speed relative to the shock at `y`.
    fn flow_speed(&self, y: &DVector<f64>) -> f64 {
        match self.kind {
            ReactionZoneKind::Znd {
                upstream_density,
                shock_speed,
            } => shock_speed * upstream_density / y[1],
            ReactionZoneKind::Stagnation { .. } => y[2],
            _ => 0.0,
        }
    }

    /// Production rates into `self.wdot`, dY/dt into `out`.
    fn species_rates(&mut self, offset: usize, out: &mut DVector<f64>) -> ZoneResult<()> {
        self.model.net_production_rates(&self.working, &mut self.wdot)?;
        let rho = self.working.density();
        for (k, (w, mw)) in self.wdot.iter().zip(self.model.molar_masses()).enumerate() {
            out[offset + k] = w * mw / rho;
        }
        Ok(())
    }

    fn evaluate(&mut self, y: &DVector<f64>, out: &mut DVector<f64>) -> ZoneResult<()> {
        self.load(y)?;
        let offset = self.kind.species_offset();
        self.species_rates(offset, out)?;
        let rho = self.working.density();
        let t = self.working.temperature();

        match self.kind {
            ReactionZoneKind::ConstantVolume | ReactionZoneKind::ConstantPressure => {
                self.model.standard_enthalpies_rt(t, &mut self.h_rt);
                let cv_kind = self.kind == ReactionZoneKind::ConstantVolume;
                // molar internal energy is (h/RT - 1) RT
                let shift = if cv_kind { 1.0 } else { 0.0 };
                let release: f64 = self
                    .h_rt
                    .iter()
                    .zip(&self.wdot)
                    .map(|(h, w)| (h - shift) * GAS_CONSTANT * t * w)
                    .sum();
                let c = if cv_kind {
                    self.model.cv_mass(&self.working)?
                } else {
                    self.model.cp_mass(&self.working)?
                };
                out[0] = -release / (rho * c);
            }
            ReactionZoneKind::Znd { .. } => {
                let u = self.flow_speed(y);
                let a = self.model.sound_speed_frozen(&self.working)?;
                let eta = 1.0 - (u / a).powi(2);
                let sigma = self.model.thermicity(&self.working)?;
                out[0] = -rho * u * u * sigma / eta / self.reference;
                out[1] = -rho * sigma / eta;
                out[2] = u;
            }
            ReactionZoneKind::Stagnation {
                upstream_density,
                shock_speed,
                standoff,
            } => {
                let w = y[2];
                let a = self.model.sound_speed_frozen(&self.working)?;
                let m2 = (w / a).powi(2);
                let eta = 1.0 - m2;
                let sigma = self.model.thermicity(&self.working)?;
                let lambda = upstream_density * shock_speed / (rho * standoff);
                out[0] = -rho * w * w * (sigma - lambda) / eta / self.reference;
                out[1] = -rho * (sigma - m2 * lambda) / eta;
                out[2] = w * (sigma - lambda) / eta;
                out[3] = w;
            }
        }
        Ok(())
    }

    /// Recompute the quantities not carried in the state vector.
    pub fn auxiliary(&mut self, y: &DVector<f64>) -> ZoneResult<Auxiliary> {
        let mut dydt = std::mem::take(&mut self.dydt);
        let result = self.evaluate(y, &mut dydt);
        let aux = result.and_then(|_| {
            let s = &self.working;
            let speed = self.flow_speed(y);
            let sound_speed = self.model.sound_speed_frozen(s)?;
            let molar_mass = self.model.mean_molar_mass(s);
            let offset = self.kind.species_offset();
            let dtdt = match self.kind {
                ReactionZoneKind::ConstantVolume | ReactionZoneKind::ConstantPressure => dydt[0],
                _ => {
                    // T = P W / (ρ R): log-derivative of the equation of state
                    let dlnw = -molar_mass
                        * dydt
                            .iter()
                            .skip(offset)
                            .zip(self.model.molar_masses())
                            .map(|(dy, mw)| dy / mw)
                            .sum::<f64>();
                    s.temperature() * (dydt[0] / y[0] - dydt[1] / y[1] + dlnw)
                }
            };
            let distance = match self.kind {
                ReactionZoneKind::Znd { .. } => y[2],
                ReactionZoneKind::Stagnation { .. } => y[3],
                _ => 0.0,
            };
            Ok(Auxiliary {
                temperature: s.temperature(),
                pressure: s.pressure(),
                density: s.density(),
                speed,
                distance,
                sound_speed,
                gamma: self.model.gamma_frozen(s)?,
                molar_mass,
                mach: speed / sound_speed,
                thermicity: self.model.thermicity(s)?,
                dtdt,
            })
        });
        self.dydt = dydt;
        aux
    }
}

impl OdeModel for ReactionZoneSystem<'_> {
    fn dim(&self) -> usize {
        self.kind.species_offset() + self.model.n_species()
    }

    fn rhs(&mut self, y: &DVector<f64>, dydt: &mut DVector<f64>) -> ZoneResult<()> {
        self.evaluate(y, dydt)
    }

    fn stop_condition(&mut self, y: &DVector<f64>) -> ZoneResult<Option<StopReason>> {
        if !self.kind.uses_thermicity() {
            return Ok(None);
        }
        self.load(y)?;
        let a = self.model.sound_speed_frozen(&self.working)?;
        let eta = 1.0 - (self.flow_speed(y) / a).powi(2);
        Ok((eta < self.sonic_cutoff).then_some(StopReason::Sonic))
    }
}
