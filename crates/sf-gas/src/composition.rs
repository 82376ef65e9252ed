//! Gas composition by mole fraction.

use crate::error::{GasError, GasResult};
use sf_core::numeric::{Tolerances, nearly_equal};
use std::fmt;
use std::str::FromStr;

/// Mixture composition defined by normalized mole fractions.
///
/// The composition is always normalized (mole fractions sum to 1.0).
/// Species are referenced by name and resolved against a mechanism when a
/// [`GasState`](crate::GasState) is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    /// Species and their mole fractions (always normalized to sum=1).
    items: Vec<(String, f64)>,
}

impl Composition {
    /// Create a pure-species composition.
    pub fn pure(species: impl Into<String>) -> Self {
        Self {
            items: vec![(species.into(), 1.0)],
        }
    }

    /// Create a composition from relative mole amounts.
    ///
    /// Validates that all amounts are finite, non-negative, and have a positive sum,
    /// then normalizes to sum=1. Repeated species are merged.
    pub fn new_mole_fractions<S: Into<String>>(fractions: Vec<(S, f64)>) -> GasResult<Self> {
        if fractions.is_empty() {
            return Err(GasError::InvalidArg {
                what: "empty composition",
            });
        }

        let mut merged: Vec<(String, f64)> = Vec::with_capacity(fractions.len());
        let mut sum = 0.0;
        for (name, frac) in fractions {
            if !frac.is_finite() {
                return Err(GasError::NonPhysical {
                    what: "mole fraction",
                    value: frac,
                });
            }
            if frac < 0.0 {
                return Err(GasError::NonPhysical {
                    what: "mole fraction",
                    value: frac,
                });
            }
            sum += frac;
            let name = name.into();
            match merged.iter_mut().find(|(n, _)| *n == name) {
                Some((_, f)) => *f += frac,
                None => merged.push((name, frac)),
            }
        }

        if sum <= 0.0 || !sum.is_finite() {
            return Err(GasError::NonPhysical {
                what: "mole fraction sum",
                value: sum,
            });
        }

        // Normalize
        let normalized: Vec<(String, f64)> = merged
            .into_iter()
            .map(|(s, f)| (s, f / sum))
            .filter(|(_, f)| *f > 1e-15) // Drop negligible species
            .collect();

        Ok(Self { items: normalized })
    }

    /// Parse `"H2:2 O2:1 N2:3.76"` (separators: whitespace or commas).
    /// A bare name such as `"N2"` counts as one mole.
    pub fn parse(input: &str) -> GasResult<Self> {
        let mut items = Vec::new();
        for token in input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            let (name, amount) = token.split_once(':').unwrap_or((token, "1"));
            if name.is_empty() {
                return Err(GasError::Parse {
                    input: input.to_string(),
                    reason: "empty species name",
                });
            }
            if !name.chars().all(|c| c.is_ascii_alphanumeric() || "()-+*_".contains(c)) {
                return Err(GasError::Parse {
                    input: input.to_string(),
                    reason: "expected NAME or NAME:AMOUNT",
                });
            }
            let amount: f64 = amount.parse().map_err(|_| GasError::Parse {
                input: input.to_string(),
                reason: "amount is not a number",
            })?;
            items.push((name.to_string(), amount));
        }
        Self::new_mole_fractions(items)
    }

    /// Get mole fraction of a species (0.0 if not present).
    pub fn mole_fraction(&self, species: &str) -> f64 {
        self.items
            .iter()
            .find(|(s, _)| s == species)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    /// Check if this is a pure-species composition.
    ///
    /// Returns `Some(species)` if exactly one species has fraction ≈1.0.
    pub fn is_pure(&self) -> Option<&str> {
        if self.items.len() == 1 {
            let (species, frac) = &self.items[0];
            let tol = Tolerances {
                abs: 1e-10,
                rel: 1e-10,
            };
            if nearly_equal(*frac, 1.0, tol) {
                return Some(species);
            }
        }
        None
    }

    /// Iterate over all species with non-zero mole fractions.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.items.iter().map(|(s, f)| (s.as_str(), *f))
    }
}

impl FromStr for Composition {
    type Err = GasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, frac) in &self.items {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{name}:{frac:.6}")?;
            first = false;
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_sum_is_one(fracs in prop::collection::vec(0.0_f64..1.0_f64, 1..5)) {
            let species = ["O2", "N2", "H2", "H2O", "AR"];
            let composition_input: Vec<(&str, f64)> = fracs
                .iter()
                .enumerate()
                .map(|(i, &f)| (species[i % species.len()], f))
                .collect();

            if let Ok(comp) = Composition::new_mole_fractions(composition_input) {
                let sum: f64 = comp.iter().map(|(_, f)| f).sum();
                let tol = Tolerances { abs: 1e-9, rel: 1e-9 };
                prop_assert!(nearly_equal(sum, 1.0, tol));
            }
        }

        #[test]
        fn display_parses_back(h2 in 0.01_f64..5.0, o2 in 0.01_f64..5.0) {
            let comp = Composition::new_mole_fractions(vec![("H2", h2), ("O2", o2)]).unwrap();
            let back = Composition::parse(&comp.to_string()).unwrap();
            let tol = Tolerances { abs: 1e-5, rel: 1e-5 };
            prop_assert!(nearly_equal(back.mole_fraction("H2"), comp.mole_fraction("H2"), tol));
        }
    }
}
