//! Mutable per-game species state: opinions of empires and of each other.
//!
//! Species definitions themselves are immutable content and live in
//! `ContentRegistry`.

use std::collections::BTreeMap;

use crate::core::EmpireId;

/// Species opinions, defaulting to 0 when never set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpeciesOpinions {
    of_empires: BTreeMap<String, BTreeMap<EmpireId, f64>>,
    of_species: BTreeMap<String, BTreeMap<String, f64>>,
}

impl SpeciesOpinions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn empire_opinion(&self, species: &str, empire: EmpireId) -> f64 {
        self.of_empires
            .get(species)
            .and_then(|opinions| opinions.get(&empire))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set_empire_opinion(&mut self, species: &str, empire: EmpireId, opinion: f64) {
        self.of_empires
            .entry(species.to_string())
            .or_default()
            .insert(empire, opinion);
    }

    #[must_use]
    pub fn species_opinion(&self, opinionated: &str, rated: &str) -> f64 {
        self.of_species
            .get(opinionated)
            .and_then(|opinions| opinions.get(rated))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set_species_opinion(&mut self, opinionated: &str, rated: &str, opinion: f64) {
        self.of_species
            .entry(opinionated.to_string())
            .or_default()
            .insert(rated.to_string(), opinion);
    }

    pub fn clear(&mut self) {
        self.of_empires.clear();
        self.of_species.clear();
    }
}
