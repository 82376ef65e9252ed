//! YAML case files.
//!
//! ```yaml
//! mechanism: h2-air          # built-in name, or a path to a YAML/JSON mechanism
//! mixture: "H2:2 O2:1 N2:3.76"
//! pressure_pa: 101325
//! temperature_k: 298.15
//! shock_speed: 2100
//! integration:
//!   rtol: 1.0e-6
//!   t_end: 2.0e-4
//! ```
//!
//! Every key is optional; command-line flags override the file.

use crate::error::{CliError, CliResult};
use serde::{Deserialize, Serialize};
use sf_core::units::{k, pa};
use sf_gas::{Composition, GasModel, GasState, IdealGasMixture, Mechanism};
use sf_shock::{CjConfig, ShockConfig, ThermoMode};
use sf_zone::IntegrationOptions;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Case {
    pub mechanism: String,
    pub mixture: String,
    pub pressure_pa: f64,
    pub temperature_k: f64,
    pub shock_speed: Option<f64>,
    pub mode: ThermoMode,
    pub standoff_m: Option<f64>,
    /// Report and summary path prefix
    pub output: Option<PathBuf>,
    pub shock: ShockConfig,
    pub cj: CjConfig,
    pub integration: IntegrationOptions,
}

impl Default for Case {
    fn default() -> Self {
        Self {
            mechanism: "h2-air".to_string(),
            mixture: "H2:2 O2:1 N2:3.76".to_string(),
            pressure_pa: 101_325.0,
            temperature_k: 298.15,
            shock_speed: None,
            mode: ThermoMode::Frozen,
            standoff_m: None,
            output: None,
            shock: ShockConfig::default(),
            cj: CjConfig::default(),
            integration: IntegrationOptions::default(),
        }
    }
}

impl Case {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::CaseIo {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&text)?)
    }

    pub fn gas(&self) -> CliResult<IdealGasMixture> {
        let mechanism = match Mechanism::builtin(&self.mechanism) {
            Some(m) => m,
            None => Mechanism::load(Path::new(&self.mechanism))?,
        };
        Ok(IdealGasMixture::new(mechanism)?)
    }

    pub fn initial_state(&self, gas: &IdealGasMixture) -> CliResult<GasState> {
        let comp = Composition::parse(&self.mixture)?;
        Ok(gas.state_tpx(k(self.temperature_k), pa(self.pressure_pa), &comp)?)
    }

    pub fn shock_speed(&self) -> CliResult<f64> {
        self.shock_speed.ok_or(CliError::Missing("shock speed (--speed or shock_speed)"))
    }

    pub fn output_path(&self, suffix: &str) -> Option<PathBuf> {
        self.output.as_ref().map(|prefix| {
            let mut name = prefix.as_os_str().to_owned();
            name.push(suffix);
            PathBuf::from(name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "mixture: \"H2:1 AR:4\"\nshock_speed: 1500\nintegration:\n  rtol: 1.0e-6\n";
        let case: Case = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(case.mixture, "H2:1 AR:4");
        assert_eq!(case.shock_speed, Some(1500.0));
        assert_eq!(case.integration.rtol, 1e-6);
        assert_eq!(case.integration.atol, IntegrationOptions::default().atol);
        assert_eq!(case.cj, CjConfig::default());
        assert_eq!(case.mechanism, "h2-air");
    }

    #[test]
    fn builds_the_default_state() {
        let case = Case::default();
        let gas = case.gas().unwrap();
        let state = case.initial_state(&gas).unwrap();
        assert!((state.pressure() - 101_325.0).abs() < 1e-6);
        assert!(case.shock_speed().is_err());
    }

    #[test]
    fn output_suffix() {
        let case = Case {
            output: Some(PathBuf::from("out/h2air")),
            ..Case::default()
        };
        assert_eq!(case.output_path("_znd.txt"), Some(PathBuf::from("out/h2air_znd.txt")));
        assert_eq!(Case::default().output_path("_znd.txt"), None);
    }
}
