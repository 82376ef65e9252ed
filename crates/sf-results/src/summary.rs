//! JSON summaries of single solves.

use crate::ResultsResult;
use crate::report::InitialConditions;
use serde::{Deserialize, Serialize};
use sf_shock::{CjResult, CjStatus, ReflectedSolution, ShockSolution, ThermoMode};
use sf_zone::{DerivedTimescales, IntegrationStatus, ReactionZoneKind, ReactionZoneProfile};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockSummary {
    pub mode: ThermoMode,
    pub shock_speed: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
    pub converged: bool,
    pub iterations: usize,
    pub residual: [f64; 2],
}

impl ShockSummary {
    pub fn incident(solution: &ShockSolution) -> Self {
        Self {
            mode: solution.mode,
            shock_speed: solution.shock_speed,
            temperature: solution.state.temperature(),
            pressure: solution.state.pressure(),
            density: solution.state.density(),
            converged: solution.converged,
            iterations: solution.iterations,
            residual: solution.residual,
        }
    }

    /// `shock_speed` is the reflected wave speed in the lab frame.
    pub fn reflected(solution: &ReflectedSolution) -> Self {
        Self {
            mode: solution.mode,
            shock_speed: solution.reflected_speed,
            temperature: solution.state.temperature(),
            pressure: solution.state.pressure(),
            density: solution.state.density(),
            converged: solution.converged,
            iterations: solution.iterations,
            residual: solution.residual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CjSummary {
    pub speed: f64,
    pub uncertainty: f64,
    pub density_ratio: f64,
    pub r_squared: f64,
    pub refinements: usize,
    pub skipped_samples: usize,
    pub status: CjStatus,
}

impl From<&CjResult> for CjSummary {
    fn from(cj: &CjResult) -> Self {
        Self {
            speed: cj.speed,
            uncertainty: cj.uncertainty,
            density_ratio: cj.density_ratio,
            r_squared: cj.fit.r_squared,
            refinements: cj.refinements,
            skipped_samples: cj.samples.skipped,
            status: cj.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub kind: ReactionZoneKind,
    pub initial: InitialConditions,
    pub status: IntegrationStatus,
    pub tolerance_not_met: bool,
    pub samples: usize,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub timescales: DerivedTimescales,
    pub final_time: f64,
    pub final_distance: f64,
    pub final_temperature: f64,
    pub final_pressure: f64,
}

impl ZoneSummary {
    pub fn new(
        profile: &ReactionZoneProfile,
        initial: InitialConditions,
        timescales: DerivedTimescales,
    ) -> Self {
        let (final_time, final_distance, final_temperature, final_pressure) = profile
            .last()
            .map_or((0.0, 0.0, f64::NAN, f64::NAN), |s| {
                (s.time, s.distance, s.temperature, s.pressure)
            });
        Self {
            kind: profile.kind,
            initial,
            status: profile.status,
            tolerance_not_met: profile.tolerance_not_met,
            samples: profile.len(),
            accepted_steps: profile.accepted_steps,
            rejected_steps: profile.rejected_steps,
            timescales,
            final_time,
            final_distance,
            final_temperature,
            final_pressure,
        }
    }
}

pub fn to_json<T: Serialize>(value: &T) -> ResultsResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn save_json<T: Serialize>(value: &T, path: &Path) -> ResultsResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, to_json(value)?)?;
    Ok(())
}

pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> ResultsResult<T> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
