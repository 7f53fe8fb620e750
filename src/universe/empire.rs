//! Empires and the diplomatic relationships between them.
//!
//! ## Diplomacy
//!
//! Statuses are symmetric and ordered `War < Peace < Allied`, so "at least
//! allied" is a plain comparison. Pairs with no recorded status are at war.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::{EmpireId, Meter, ObjectId, INVALID_OBJECT_ID};

use super::sitrep::SitRepEntry;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiplomaticStatus {
    #[default]
    War,
    Peace,
    Allied,
}

/// Stockpiled resource kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Industry,
    Influence,
    Research,
    Stockpile,
}

/// A player or AI empire.
#[derive(Clone, Debug, PartialEq)]
pub struct Empire {
    id: EmpireId,
    name: String,
    human: bool,
    capital: ObjectId,
    meters: BTreeMap<String, Meter>,
    stockpiles: BTreeMap<ResourceType, f64>,
    researched_techs: BTreeMap<String, i32>,
    research_progress: BTreeMap<String, f64>,
    pending_techs: BTreeSet<String>,
    sitreps: Vec<SitRepEntry>,
    explored_systems: BTreeSet<ObjectId>,
    known_designs: BTreeSet<i32>,
    victories: Vec<String>,
    ships_named: u32,
}

impl Empire {
    #[must_use]
    pub fn new(id: EmpireId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            human: false,
            capital: INVALID_OBJECT_ID,
            meters: BTreeMap::new(),
            stockpiles: BTreeMap::new(),
            researched_techs: BTreeMap::new(),
            research_progress: BTreeMap::new(),
            pending_techs: BTreeSet::new(),
            sitreps: Vec::new(),
            explored_systems: BTreeSet::new(),
            known_designs: BTreeSet::new(),
            victories: Vec::new(),
            ships_named: 0,
        }
    }

    #[must_use]
    pub fn with_human(mut self, human: bool) -> Self {
        self.human = human;
        self
    }

    /// Declare a named empire meter with an initial value.
    #[must_use]
    pub fn with_meter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.meters.insert(name.into(), Meter::new(value));
        self
    }

    #[must_use]
    pub fn id(&self) -> EmpireId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_human(&self) -> bool {
        self.human
    }

    #[must_use]
    pub fn capital(&self) -> ObjectId {
        self.capital
    }

    pub fn set_capital(&mut self, planet: ObjectId) {
        self.capital = planet;
    }

    // === Meters and stockpiles ===

    #[must_use]
    pub fn meter(&self, name: &str) -> Option<&Meter> {
        self.meters.get(name)
    }

    pub fn meter_mut(&mut self, name: &str) -> Option<&mut Meter> {
        self.meters.get_mut(name)
    }

    #[must_use]
    pub fn stockpile(&self, resource: ResourceType) -> f64 {
        self.stockpiles.get(&resource).copied().unwrap_or(0.0)
    }

    pub fn set_stockpile(&mut self, resource: ResourceType, amount: f64) {
        self.stockpiles.insert(resource, amount);
    }

    // === Research ===

    #[must_use]
    pub fn tech_researched(&self, tech: &str) -> bool {
        self.researched_techs.contains_key(tech)
    }

    /// Fraction of `tech` researched, in `[0, 1]`.
    #[must_use]
    pub fn research_progress(&self, tech: &str) -> f64 {
        self.research_progress.get(tech).copied().unwrap_or(0.0)
    }

    pub fn set_research_progress(&mut self, tech: impl Into<String>, progress: f64) {
        self.research_progress.insert(tech.into(), progress.clamp(0.0, 1.0));
    }

    /// Queue `tech` to be granted at the start of the next turn.
    pub fn add_new_tech(&mut self, tech: impl Into<String>) {
        self.pending_techs.insert(tech.into());
    }

    #[must_use]
    pub fn pending_techs(&self) -> &BTreeSet<String> {
        &self.pending_techs
    }

    /// Grant every queued tech as researched on `turn`.
    pub fn grant_pending_techs(&mut self, turn: i32) {
        for tech in std::mem::take(&mut self.pending_techs) {
            self.research_progress.remove(&tech);
            self.researched_techs.entry(tech).or_insert(turn);
        }
    }

    // === Knowledge ===

    pub fn record_explored_system(&mut self, system: ObjectId) {
        self.explored_systems.insert(system);
    }

    #[must_use]
    pub fn has_explored(&self, system: ObjectId) -> bool {
        self.explored_systems.contains(&system)
    }

    pub fn add_known_design(&mut self, design_id: i32) {
        self.known_designs.insert(design_id);
    }

    #[must_use]
    pub fn knows_design(&self, design_id: i32) -> bool {
        self.known_designs.contains(&design_id)
    }

    // === Messages and outcomes ===

    pub fn add_sitrep(&mut self, entry: SitRepEntry) {
        self.sitreps.push(entry);
    }

    #[must_use]
    pub fn sitreps(&self) -> &[SitRepEntry] {
        &self.sitreps
    }

    pub fn win(&mut self, reason: impl Into<String>) {
        self.victories.push(reason.into());
    }

    #[must_use]
    pub fn victories(&self) -> &[String] {
        &self.victories
    }

    /// Next auto-generated ship name for this empire.
    pub fn new_ship_name(&mut self) -> String {
        self.ships_named += 1;
        format!("{} Ship {}", self.name, self.ships_named)
    }
}

/// All empires plus their pairwise diplomatic statuses.
#[derive(Clone, Debug, Default)]
pub struct EmpireManager {
    empires: BTreeMap<EmpireId, Empire>,
    statuses: BTreeMap<(EmpireId, EmpireId), DiplomaticStatus>,
}

impl EmpireManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, empire: Empire) {
        self.empires.insert(empire.id(), empire);
    }

    #[must_use]
    pub fn get(&self, id: EmpireId) -> Option<&Empire> {
        self.empires.get(&id)
    }

    pub fn get_mut(&mut self, id: EmpireId) -> Option<&mut Empire> {
        self.empires.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: EmpireId) -> bool {
        self.empires.contains_key(&id)
    }

    /// Empire ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = EmpireId> + '_ {
        self.empires.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Empire> {
        self.empires.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.empires.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.empires.is_empty()
    }

    fn key(a: EmpireId, b: EmpireId) -> (EmpireId, EmpireId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn set_status(&mut self, a: EmpireId, b: EmpireId, status: DiplomaticStatus) {
        self.statuses.insert(Self::key(a, b), status);
    }

    #[must_use]
    pub fn status(&self, a: EmpireId, b: EmpireId) -> DiplomaticStatus {
        self.statuses
            .get(&Self::key(a, b))
            .copied()
            .unwrap_or_default()
    }
}
