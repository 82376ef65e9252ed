//! Reaction mechanism definition (serde-loadable).
//!
//! Units follow the kmol / m³ / s / K convention: concentrations are
//! kmol/m³, so a reaction of total forward order `n` has a pre-exponential
//! factor in (m³/kmol)^(n-1)/s, times an extra m³/kmol for third-body
//! reactions.

use crate::error::{GasError, GasResult};
use crate::species::SpeciesData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Modified Arrhenius rate `k(T) = A T^b exp(-Ta / T)`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct RateConstant {
    #[serde(rename = "A")]
    pub preexponential_factor: f64,
    #[serde(rename = "b", default)]
    pub temperature_exponent: f64,
    #[serde(rename = "Ta")]
    pub activation_temperature: f64,
}

impl RateConstant {
    pub fn evaluate(&self, t: f64) -> f64 {
        let mut k = self.preexponential_factor * (-self.activation_temperature / t).exp();
        if self.temperature_exponent != 0.0 {
            k *= t.powf(self.temperature_exponent);
        }
        k
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReactionModel {
    /// Reversible mass-action reaction; reverse rate from the equilibrium constant.
    #[default]
    Elementary,
    /// Forward direction only.
    Irreversible,
    /// Reversible, multiplied by the third-body concentration
    /// `[M] = Σ eff_k c_k` (unlisted species have efficiency 1).
    ThreeBody {
        #[serde(default)]
        efficiencies: BTreeMap<String, f64>,
    },
}

impl ReactionModel {
    pub fn is_reversible(&self) -> bool {
        !matches!(self, ReactionModel::Irreversible)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// `[reactants, products]` with stoichiometric coefficients.
    pub equation: [BTreeMap<String, f64>; 2],
    pub rate_constant: RateConstant,
    #[serde(default)]
    pub model: ReactionModel,
}

impl Reaction {
    /// Human-readable equation, e.g. `2 H2 + O2 <=> 2 H2O`.
    pub fn label(&self) -> String {
        let side = |m: &BTreeMap<String, f64>| {
            m.iter()
                .map(|(name, nu)| {
                    if *nu == 1.0 {
                        name.clone()
                    } else {
                        format!("{nu} {name}")
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        };
        let arrow = if self.model.is_reversible() {
            "<=>"
        } else {
            "=>"
        };
        format!("{} {arrow} {}", side(&self.equation[0]), side(&self.equation[1]))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Mechanism {
    pub name: String,
    pub species: Vec<SpeciesData>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl Mechanism {
    /// Hydrogen-air with one global reversible step `2 H2 + O2 <=> 2 H2O`,
    /// N2 and AR inert.
    ///
    /// The rate is calibrated for microsecond induction at typical von Neumann
    /// conditions (about 1500 K, 28 bar); it reproduces the thermal-runaway
    /// shape of a reaction zone but not detailed radical chemistry.
    pub fn hydrogen_air() -> Self {
        let species = ["H2", "O2", "H2O", "N2", "AR"]
            .iter()
            .filter_map(|n| SpeciesData::builtin(n))
            .collect();
        let reactants = BTreeMap::from([("H2".to_string(), 2.0), ("O2".to_string(), 1.0)]);
        let products = BTreeMap::from([("H2O".to_string(), 2.0)]);
        Self {
            name: "h2-air-global".to_string(),
            species,
            reactions: vec![Reaction {
                equation: [reactants, products],
                rate_constant: RateConstant {
                    preexponential_factor: 2.5e11,
                    temperature_exponent: 0.0,
                    activation_temperature: 15_000.0,
                },
                model: ReactionModel::Elementary,
            }],
        }
    }

    /// Resolve a mechanism by name: currently `"h2-air"` (alias `"h2-air-global"`).
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "h2-air" | "h2-air-global" => Some(Self::hydrogen_air()),
            _ => None,
        }
    }

    pub fn from_yaml_str(text: &str) -> GasResult<Self> {
        let mech: Self = serde_yaml::from_str(text).map_err(|e| GasError::File {
            message: e.to_string(),
        })?;
        mech.validate()?;
        Ok(mech)
    }

    pub fn from_json_str(text: &str) -> GasResult<Self> {
        let mech: Self = serde_json::from_str(text).map_err(|e| GasError::File {
            message: e.to_string(),
        })?;
        mech.validate()?;
        Ok(mech)
    }

    /// Load from a `.json` file, anything else is read as YAML.
    pub fn load(path: &Path) -> GasResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| GasError::File {
            message: format!("{}: {e}", path.display()),
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species.iter().position(|s| s.name == name)
    }

    /// Structural checks: unique species, positive molar masses, known
    /// reaction participants, positive coefficients and mass balance.
    pub fn validate(&self) -> GasResult<()> {
        if self.species.is_empty() {
            return Err(GasError::Mechanism {
                message: format!("mechanism '{}' has no species", self.name),
            });
        }
        for (i, sp) in self.species.iter().enumerate() {
            if self.species[..i].iter().any(|o| o.name == sp.name) {
                return Err(GasError::Mechanism {
                    message: format!("duplicate species '{}'", sp.name),
                });
            }
            if !(sp.molar_mass.is_finite() && sp.molar_mass > 0.0) {
                return Err(GasError::Mechanism {
                    message: format!("species '{}' has non-positive molar mass", sp.name),
                });
            }
        }

        for rxn in &self.reactions {
            let mut mass = [0.0; 2];
            for (side, terms) in rxn.equation.iter().enumerate() {
                if terms.is_empty() {
                    return Err(GasError::Mechanism {
                        message: format!("reaction '{}' has an empty side", rxn.label()),
                    });
                }
                for (name, nu) in terms {
                    let k = self
                        .species_index(name)
                        .ok_or_else(|| GasError::UnknownSpecies { name: name.clone() })?;
                    if !(nu.is_finite() && *nu > 0.0) {
                        return Err(GasError::Mechanism {
                            message: format!(
                                "reaction '{}' has a non-positive coefficient for {name}",
                                rxn.label()
                            ),
                        });
                    }
                    mass[side] += nu * self.species[k].molar_mass;
                }
            }
            if (mass[0] - mass[1]).abs() > 1e-3 * mass[0].max(mass[1]) {
                return Err(GasError::Mechanism {
                    message: format!("reaction '{}' does not conserve mass", rxn.label()),
                });
            }
            if let ReactionModel::ThreeBody { efficiencies } = &rxn.model {
                for name in efficiencies.keys() {
                    if self.species_index(name).is_none() {
                        return Err(GasError::UnknownSpecies { name: name.clone() });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_hydrogen_air_is_valid() {
        let mech = Mechanism::hydrogen_air();
        mech.validate().unwrap();
        assert_eq!(mech.species.len(), 5);
        assert_eq!(mech.reactions[0].label(), "2 H2 + O2 <=> 2 H2O");
        assert!(Mechanism::builtin("h2-air").is_some());
        assert!(Mechanism::builtin("gri30").is_none());
    }

    #[test]
    fn arrhenius_evaluation() {
        let k = RateConstant {
            preexponential_factor: 2.0,
            temperature_exponent: 1.0,
            activation_temperature: 1000.0,
        };
        let expected = 2.0 * 500.0 * (-2.0f64).exp();
        assert!((k.evaluate(500.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn yaml_round_trip_preserves_mechanism() {
        let mech = Mechanism::hydrogen_air();
        let text = serde_yaml::to_string(&mech).unwrap();
        let back = Mechanism::from_yaml_str(&text).unwrap();
        assert_eq!(mech, back);
    }

    #[test]
    fn unknown_species_rejected() {
        let mut mech = Mechanism::hydrogen_air();
        mech.reactions[0].equation[1].insert("XE".to_string(), 1.0);
        assert!(matches!(
            mech.validate(),
            Err(GasError::UnknownSpecies { .. })
        ));
    }

    #[test]
    fn mass_imbalance_rejected() {
        let mut mech = Mechanism::hydrogen_air();
        mech.reactions[0].equation[1].insert("H2O".to_string(), 3.0);
        assert!(matches!(mech.validate(), Err(GasError::Mechanism { .. })));
    }

    #[test]
    fn three_body_model_parses_from_yaml() {
        let text = r#"
name: dissociation
species:
  - name: H2
    molar_mass: 2.01588
    thermo:
      temperature_ranges: [200.0, 1000.0, 3500.0]
      pieces:
        - [2.34433112, 0.00798052075, -1.9478151e-05, 2.01572094e-08, -7.37611761e-12, -917.935173, 0.683010238]
        - [3.3372792, -4.94024731e-05, 4.99456778e-07, -1.79566394e-10, 2.00255376e-14, -950.158922, -3.20502331]
  - name: H
    molar_mass: 1.00794
    thermo:
      temperature_ranges: [200.0, 1000.0, 3500.0]
      pieces:
        - [2.5, 0.0, 0.0, 0.0, 0.0, 25473.6599, -0.446682853]
        - [2.5, 0.0, 0.0, 0.0, 0.0, 25473.6599, -0.446682853]
reactions:
  - equation: [{H2: 1.0}, {H: 2.0}]
    rate_constant: {A: 4.6e16, b: -1.4, Ta: 52530.0}
    model:
      type: three_body
      efficiencies: {H2: 2.5}
"#;
        let mech = Mechanism::from_yaml_str(text).unwrap();
        assert_eq!(mech.reactions.len(), 1);
        assert!(matches!(
            mech.reactions[0].model,
            ReactionModel::ThreeBody { .. }
        ));
        assert_eq!(mech.reactions[0].label(), "H2 <=> 2 H");
    }
}
