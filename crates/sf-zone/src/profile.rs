//! Sampled reaction-zone profiles.

use crate::error::ZoneResult;
use crate::sim::{IntegrationStatus, Trajectory};
use crate::systems::{ReactionZoneKind, ReactionZoneSystem};
use crate::timescales::{self, DerivedTimescales};
use serde::{Deserialize, Serialize};
use sf_gas::{GasModel, GasState};

/// One recorded point of a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    /// Time since the start (particle time for the flow systems)
    pub time: f64,
    /// Distance behind the shock; zero for explosions
    pub distance: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
    /// Gas speed relative to the shock; zero for explosions
    pub speed: f64,
    /// Gas speed in the lab frame, `U - w`; zero for explosions
    pub lab_speed: f64,
    pub mach: f64,
    pub sound_speed: f64,
    pub gamma: f64,
    pub molar_mass: f64,
    pub thermicity: f64,
    pub dtdt: f64,
    pub mass_fractions: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionZoneProfile {
    pub kind: ReactionZoneKind,
    pub species: Vec<String>,
    pub samples: Vec<ProfileSample>,
    pub status: IntegrationStatus,
    /// Some step was accepted at the minimum step size
    pub tolerance_not_met: bool,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
}

impl ReactionZoneProfile {
    /// Rebuild every sample's auxiliary quantities from the trajectory.
    pub(crate) fn from_trajectory(
        model: &dyn GasModel,
        system: &mut ReactionZoneSystem<'_>,
        trajectory: Trajectory,
    ) -> ZoneResult<Self> {
        let kind = system.kind();
        let shock_speed = match kind {
            ReactionZoneKind::Znd { shock_speed, .. }
            | ReactionZoneKind::Stagnation { shock_speed, .. } => Some(shock_speed),
            _ => None,
        };
        let offset = kind.species_offset();
        let mut samples = Vec::with_capacity(trajectory.t.len());
        for (&time, y) in trajectory.t.iter().zip(&trajectory.y) {
            let aux = system.auxiliary(y)?;
            samples.push(ProfileSample {
                time,
                distance: aux.distance,
                temperature: aux.temperature,
                pressure: aux.pressure,
                density: aux.density,
                speed: aux.speed,
                lab_speed: shock_speed.map_or(0.0, |u| u - aux.speed),
                mach: aux.mach,
                sound_speed: aux.sound_speed,
                gamma: aux.gamma,
                molar_mass: aux.molar_mass,
                thermicity: aux.thermicity,
                dtdt: aux.dtdt,
                mass_fractions: y.as_slice()[offset..].to_vec(),
            });
        }
        Ok(Self {
            kind,
            species: (0..model.n_species())
                .map(|k| model.species_name(k).to_string())
                .collect(),
            samples,
            status: trajectory.status,
            tolerance_not_met: trajectory.tolerance_not_met,
            accepted_steps: trajectory.accepted_steps,
            rejected_steps: trajectory.rejected_steps,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&ProfileSample> {
        self.samples.last()
    }

    pub fn times(&self) -> Vec<f64> {
        self.column(|s| s.time)
    }

    pub fn distances(&self) -> Vec<f64> {
        self.column(|s| s.distance)
    }

    pub fn column(&self, f: impl Fn(&ProfileSample) -> f64) -> Vec<f64> {
        self.samples.iter().map(f).collect()
    }

    /// Thermicity for the flow systems, dT/dt for the explosions.
    pub fn signal(&self) -> Vec<f64> {
        if self.kind.uses_thermicity() {
            self.column(|s| s.thermicity)
        } else {
            self.column(|s| s.dtdt)
        }
    }

    pub fn timescales(&self) -> ZoneResult<DerivedTimescales> {
        timescales::derive(&self.times(), &self.distances(), &self.signal())
    }

    /// Mass fractions of `species` along the profile.
    pub fn species_column(&self, species: &str) -> Option<Vec<f64>> {
        let k = self.species.iter().position(|s| s == species)?;
        Some(self.column(|s| s.mass_fractions[k]))
    }

    /// Gas state at the last sample.
    pub fn final_state(&self, model: &dyn GasModel, template: &GasState) -> ZoneResult<Option<GasState>> {
        let Some(last) = self.last() else {
            return Ok(None);
        };
        let mut state = template.clone();
        state.mass_fractions_mut().copy_from_slice(&last.mass_fractions);
        model.set_td(&mut state, last.temperature, last.density)?;
        Ok(Some(state))
    }
}
