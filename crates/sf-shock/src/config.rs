//! Solver configuration passed explicitly into every solve.

use serde::{Deserialize, Serialize};

/// Newton engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Relative step tolerance on temperature
    pub temperature_tol: f64,
    /// Relative step tolerance on the second unknown (volume or wave speed)
    pub second_tol: f64,
    /// Relative one-sided perturbation for the finite-difference Jacobian
    pub perturbation: f64,
    /// Largest step as a fraction of the current value
    pub max_step_fraction: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            temperature_tol: 1e-4,
            second_tol: 1e-4,
            perturbation: 0.02,
            max_step_fraction: 0.2,
        }
    }
}

impl NewtonConfig {
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.temperature_tol = tol;
        self.second_tol = tol;
        self
    }
}

/// Incident and reflected shock configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockConfig {
    pub newton: NewtonConfig,
    /// Floor on the initial post-shock volume guess as a fraction of the
    /// upstream volume
    pub incident_volume_guess: f64,
    /// Lower bound on the reflected initial guess `v3 / v2`
    pub reflected_min_volume_ratio: f64,
}

impl Default for ShockConfig {
    fn default() -> Self {
        Self {
            newton: NewtonConfig::default(),
            incident_volume_guess: 0.2,
            reflected_min_volume_ratio: 0.1,
        }
    }
}

/// CJ speed search configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CjConfig {
    /// Newton settings for each density-ratio sample
    pub newton: NewtonConfig,
    /// Density ratios per sweep, end points included
    pub samples: usize,
    /// First bracket on ρ2/ρ1
    pub initial_bracket: [f64; 2],
    /// Refined bracket is `r* (1 ± bracket_half_width)`
    pub bracket_half_width: f64,
    /// Fits required before the R² test may stop the search
    pub min_refinements: usize,
    pub r_squared_target: f64,
    /// Hard cap on fits; reaching it is reported, not thrown
    pub max_refinements: usize,
    pub temperature_guess: f64,
    pub speed_guess: f64,
    /// Added to the fitted minimum speed [m/s]
    pub speed_offset: f64,
}

impl Default for CjConfig {
    fn default() -> Self {
        Self {
            newton: NewtonConfig::default().with_tolerance(1e-8),
            samples: 20,
            initial_bracket: [1.5, 2.0],
            bracket_half_width: 1e-3,
            min_refinements: 4,
            r_squared_target: 0.99999,
            max_refinements: 30,
            temperature_guess: 2000.0,
            speed_guess: 2000.0,
            speed_offset: 1e-3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = NewtonConfig::default();
        assert_eq!(cfg.max_iterations, 500);
        assert_eq!(cfg.perturbation, 0.02);
        let cj = CjConfig::default();
        assert_eq!(cj.samples, 20);
        assert_eq!(cj.initial_bracket, [1.5, 2.0]);
        assert_eq!(cj.min_refinements, 4);
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg: ShockConfig =
            serde_json::from_str(r#"{"reflected_min_volume_ratio": 0.3}"#).unwrap();
        assert_eq!(cfg.reflected_min_volume_ratio, 0.3);
        assert_eq!(cfg.newton, NewtonConfig::default());

        let cj: CjConfig = serde_json::from_str(r#"{"newton": {"max_iterations": 50}}"#).unwrap();
        assert_eq!(cj.newton.max_iterations, 50);
        assert_eq!(cj.newton.perturbation, 0.02);
    }
}
