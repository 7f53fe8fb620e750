//! Immutable content definitions effects refer to by name or id.
//!
//! The `ContentRegistry` stores species, building types, ship parts, ship
//! designs, techs and field types. Content is loaded once (by an external
//! parser) and never mutated during a turn.
//!
//! ## Example
//!
//! ```
//! use effect_engine::universe::{ContentRegistry, BuildingType};
//!
//! let mut content = ContentRegistry::new();
//! content.register_building_type(BuildingType::new("BLD_SHIPYARD_BASE"));
//!
//! assert!(content.building_type("BLD_SHIPYARD_BASE").is_some());
//! assert!(content.building_type("BLD_MISSING").is_none());
//! ```

use std::collections::BTreeSet;
use std::hash::Hasher;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::checksum::{combine_serialized, CheckSum, FnvHasher};

/// A species definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDef {
    pub name: String,
    /// Foci a planet of this species may use, in preference order.
    pub foci: Vec<String>,
    pub default_focus: String,
    pub tags: BTreeSet<String>,
}

impl SpeciesDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            foci: Vec::new(),
            default_focus: String::new(),
            tags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_foci<I, S>(mut self, foci: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.foci = foci.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_default_focus(mut self, focus: impl Into<String>) -> Self {
        self.default_focus = focus.into();
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn has_focus(&self, focus: &str) -> bool {
        self.foci.iter().any(|f| f == focus)
    }
}

impl CheckSum for SpeciesDef {
    const KIND: &'static str = "Species";

    fn combine_into(&self, hasher: &mut FnvHasher) {
        combine_serialized(hasher, self);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingType {
    pub name: String,
    pub description: String,
}

impl BuildingType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }
}

impl CheckSum for BuildingType {
    const KIND: &'static str = "BuildingType";

    fn combine_into(&self, hasher: &mut FnvHasher) {
        combine_serialized(hasher, self);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartClass {
    /// Direct-fire weapon; capacity is damage per shot.
    ShortRange,
    Armour,
    Shield,
    Detector,
    Stealth,
    Fuel,
    Speed,
    General,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartType {
    pub name: String,
    pub class: PartClass,
    pub capacity: f64,
}

impl PartType {
    #[must_use]
    pub fn new(name: impl Into<String>, class: PartClass, capacity: f64) -> Self {
        Self {
            name: name.into(),
            class,
            capacity,
        }
    }

    #[must_use]
    pub fn is_weapon(&self) -> bool {
        self.class == PartClass::ShortRange
    }
}

impl CheckSum for PartType {
    const KIND: &'static str = "PartType";

    fn combine_into(&self, hasher: &mut FnvHasher) {
        combine_serialized(hasher, self);
    }
}

/// A ship design: hull stats plus a part list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShipDesign {
    pub id: i32,
    pub name: String,
    pub hull: String,
    pub parts: Vec<String>,
    pub monster: bool,
    pub structure: f64,
    pub speed: f64,
    pub fuel: f64,
    pub shields: f64,
    pub detection: f64,
    pub stealth: f64,
}

impl ShipDesign {
    #[must_use]
    pub fn new(id: i32, name: impl Into<String>, hull: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hull: hull.into(),
            parts: Vec::new(),
            monster: false,
            structure: 0.0,
            speed: 0.0,
            fuel: 0.0,
            shields: 0.0,
            detection: 0.0,
            stealth: 0.0,
        }
    }

    #[must_use]
    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.parts.push(part.into());
        self
    }

    #[must_use]
    pub fn with_monster(mut self, monster: bool) -> Self {
        self.monster = monster;
        self
    }

    #[must_use]
    pub fn with_structure(mut self, structure: f64) -> Self {
        self.structure = structure;
        self
    }

    #[must_use]
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn with_fuel(mut self, fuel: f64) -> Self {
        self.fuel = fuel;
        self
    }

    /// A design is valid when it has a hull.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.hull.is_empty()
    }
}

impl CheckSum for ShipDesign {
    const KIND: &'static str = "ShipDesign";

    fn combine_into(&self, hasher: &mut FnvHasher) {
        combine_serialized(hasher, self);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tech {
    pub name: String,
    pub category: String,
    pub research_cost: f64,
    pub prerequisites: BTreeSet<String>,
}

impl Tech {
    #[must_use]
    pub fn new(name: impl Into<String>, category: impl Into<String>, research_cost: f64) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            research_cost,
            prerequisites: BTreeSet::new(),
        }
    }
}

impl CheckSum for Tech {
    const KIND: &'static str = "Tech";

    fn combine_into(&self, hasher: &mut FnvHasher) {
        combine_serialized(hasher, self);
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldType {
    pub name: String,
    pub description: String,
    pub stealth: f64,
}

impl FieldType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            stealth: 0.0,
        }
    }
}

impl CheckSum for FieldType {
    const KIND: &'static str = "FieldType";

    fn combine_into(&self, hasher: &mut FnvHasher) {
        combine_serialized(hasher, self);
    }
}

/// Lookup tables for all content.
#[derive(Clone, Debug, Default)]
pub struct ContentRegistry {
    species: FxHashMap<String, SpeciesDef>,
    building_types: FxHashMap<String, BuildingType>,
    parts: FxHashMap<String, PartType>,
    designs: FxHashMap<i32, ShipDesign>,
    design_ids_by_name: FxHashMap<String, i32>,
    techs: FxHashMap<String, Tech>,
    field_types: FxHashMap<String, FieldType>,
}

impl ContentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_species(&mut self, species: SpeciesDef) {
        if self.species.contains_key(&species.name) {
            tracing::warn!(species = %species.name, "replacing species definition");
        }
        self.species.insert(species.name.clone(), species);
    }

    pub fn register_building_type(&mut self, building_type: BuildingType) {
        self.building_types
            .insert(building_type.name.clone(), building_type);
    }

    pub fn register_part(&mut self, part: PartType) {
        self.parts.insert(part.name.clone(), part);
    }

    pub fn register_design(&mut self, design: ShipDesign) {
        if let Some(old) = self.designs.get(&design.id) {
            tracing::warn!(design_id = design.id, old = %old.name, "replacing ship design");
            self.design_ids_by_name.remove(&old.name);
        }
        self.design_ids_by_name.insert(design.name.clone(), design.id);
        self.designs.insert(design.id, design);
    }

    pub fn register_tech(&mut self, tech: Tech) {
        self.techs.insert(tech.name.clone(), tech);
    }

    pub fn register_field_type(&mut self, field_type: FieldType) {
        self.field_types.insert(field_type.name.clone(), field_type);
    }

    #[must_use]
    pub fn species(&self, name: &str) -> Option<&SpeciesDef> {
        self.species.get(name)
    }

    #[must_use]
    pub fn building_type(&self, name: &str) -> Option<&BuildingType> {
        self.building_types.get(name)
    }

    #[must_use]
    pub fn part(&self, name: &str) -> Option<&PartType> {
        self.parts.get(name)
    }

    #[must_use]
    pub fn design(&self, id: i32) -> Option<&ShipDesign> {
        self.designs.get(&id)
    }

    #[must_use]
    pub fn design_by_name(&self, name: &str) -> Option<&ShipDesign> {
        self.design_ids_by_name
            .get(name)
            .and_then(|id| self.designs.get(id))
    }

    #[must_use]
    pub fn tech(&self, name: &str) -> Option<&Tech> {
        self.techs.get(name)
    }

    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.field_types.get(name)
    }

    /// Checksum over all content, independent of registration order.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        fn sorted<K: Ord, V: CheckSum>(map: &FxHashMap<K, V>) -> Vec<u64> {
            let mut entries: Vec<(&K, &V)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            entries.into_iter().map(|(_, v)| v.checksum()).collect()
        }

        let mut hasher = FnvHasher::new();
        for sums in [
            sorted(&self.species),
            sorted(&self.building_types),
            sorted(&self.parts),
            sorted(&self.designs),
            sorted(&self.techs),
            sorted(&self.field_types),
        ] {
            hasher.write_usize(sums.len());
            for sum in sums {
                hasher.write_u64(sum);
            }
        }
        hasher.finish()
    }
}
