//! The universe: every object, empire and per-game registry effects mutate.
//!
//! ## Ownership
//!
//! `Universe` owns the object arena, empires, species opinions, visibility
//! state, the RNG and the engine configuration. Effects receive it through
//! a `ScriptingContext`; nothing is global.
//!
//! ## Containment
//!
//! Structural relationships (ship in fleet, building on planet, object in
//! system) are kept consistent by the helpers in `containment`. Effects
//! never edit those id links directly.

pub mod object;
pub mod objects;
pub mod empire;
pub mod species;
pub mod content;
pub mod visibility;
pub mod sitrep;
pub mod pathfinder;
mod containment;

use std::collections::BTreeMap;

use crate::core::{EmpireId, EngineConfig, GameRng, ObjectId};

pub use object::{
    Building, Container, Field, Fleet, FleetAggression, ObjectKind, Planet, PlanetSize,
    PlanetType, Ship, Special, StarType, System, UniverseObject, UniverseObjectType,
};
pub use objects::ObjectMap;
pub use empire::{DiplomaticStatus, Empire, EmpireManager, ResourceType};
pub use species::SpeciesOpinions;
pub use content::{
    BuildingType, ContentRegistry, FieldType, PartClass, PartType, ShipDesign, SpeciesDef, Tech,
};
pub use visibility::{EffectVisibility, Visibility, VisibilityState};
pub use sitrep::SitRepEntry;
pub use pathfinder::{Pathfinder, StarlanePathfinder};

/// The mutable game world.
#[derive(Clone, Debug)]
pub struct Universe {
    pub objects: ObjectMap,
    pub empires: EmpireManager,
    pub species: SpeciesOpinions,
    pub visibility: VisibilityState,
    config: EngineConfig,
    rng: GameRng,
    current_turn: i32,
    next_object_id: i32,
    destroyed_by: BTreeMap<ObjectId, ObjectId>,
    latest_known: BTreeMap<EmpireId, ObjectMap>,
    monsters_named: u32,
}

impl Universe {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            objects: ObjectMap::new(),
            empires: EmpireManager::new(),
            species: SpeciesOpinions::new(),
            visibility: VisibilityState::new(),
            rng: GameRng::new(config.seed),
            config,
            current_turn: 0,
            next_object_id: 0,
            destroyed_by: BTreeMap::new(),
            latest_known: BTreeMap::new(),
            monsters_named: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rng_mut(&mut self) -> &mut GameRng {
        &mut self.rng
    }

    #[must_use]
    pub fn current_turn(&self) -> i32 {
        self.current_turn
    }

    pub fn set_current_turn(&mut self, turn: i32) {
        self.current_turn = turn;
    }

    /// Move to the next turn, granting techs queued during the last one.
    pub fn advance_turn(&mut self) {
        self.current_turn += 1;
        let turn = self.current_turn;
        let ids: Vec<EmpireId> = self.empires.ids().collect();
        for id in ids {
            if let Some(empire) = self.empires.get_mut(id) {
                empire.grant_pending_techs(turn);
            }
        }
    }

    // === Objects ===

    /// Insert a new object, assigning its id and creation turn.
    pub fn insert(&mut self, mut object: UniverseObject) -> ObjectId {
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;
        object.id = id;
        object.created_turn = self.current_turn;
        tracing::trace!(object = %id, kind = %object.object_type(), name = %object.name, "inserted object");
        self.objects.insert(object);
        id
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&UniverseObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut UniverseObject> {
        self.objects.get_mut(id)
    }

    /// The object that destroyed `id`, if it was destroyed.
    #[must_use]
    pub fn destroyed_by(&self, id: ObjectId) -> Option<ObjectId> {
        self.destroyed_by.get(&id).copied()
    }

    /// Ids of every object destroyed so far, ascending.
    pub fn destroyed_object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.destroyed_by.keys().copied()
    }

    // === Naming ===

    pub fn new_monster_name(&mut self) -> String {
        self.monsters_named += 1;
        format!("{} {}", self.config.monster_name_prefix, self.monsters_named)
    }

    /// First configured star name no system uses yet, else a numbered name.
    pub fn generate_system_name(&mut self) -> String {
        let used: std::collections::BTreeSet<&str> = self
            .objects
            .iter()
            .filter(|obj| obj.as_system().is_some())
            .map(|obj| obj.name.as_str())
            .collect();

        if let Some(name) = self
            .config
            .star_names
            .iter()
            .find(|name| !used.contains(name.as_str()))
        {
            return name.clone();
        }

        let base = self.config.star_names.len() as i32;
        let number = self.rng.gen_range(base..base + 10000);
        format!("{} {}", self.config.system_name_prefix, number)
    }

    // === Meter phases ===

    /// Reset target, max and unpaired meters before effects run.
    pub fn reset_meters_for_effects(&mut self) {
        self.objects
            .update_all(UniverseObject::reset_target_max_unpaired_meters);
    }

    pub fn clamp_meters(&mut self) {
        self.objects.update_all(UniverseObject::clamp_meters);
    }

    pub fn back_propagate_meters(&mut self) {
        self.objects.update_all(UniverseObject::back_propagate_meters);
    }

    // === Fleets ===

    /// Slowest ship speed in the fleet; 0 for missing or empty fleets.
    #[must_use]
    pub fn fleet_speed(&self, fleet: ObjectId) -> f64 {
        let Some(data) = self.objects.get(fleet).and_then(UniverseObject::as_fleet) else {
            return 0.0;
        };
        data.ships
            .iter()
            .filter_map(|&ship| self.objects.get(ship))
            .filter_map(|ship| ship.meter_value(crate::core::MeterType::Speed))
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    // === Empire knowledge ===

    /// `empire`'s latest censored copies of objects it has observed.
    #[must_use]
    pub fn latest_known(&self, empire: EmpireId) -> Option<&ObjectMap> {
        self.latest_known.get(&empire)
    }

    /// Refresh each empire's latest-known copies from current visibility.
    pub fn update_empire_latest_known_objects(&mut self) {
        let empire_ids: Vec<EmpireId> = self.empires.ids().collect();
        for empire in empire_ids {
            let known = self.latest_known.entry(empire).or_default();
            for (id, vis) in self.visibility.objects_of(empire) {
                if vis < Visibility::Basic {
                    continue;
                }
                let Some(source) = self.objects.get(id) else {
                    continue;
                };
                let revealed = if vis >= Visibility::Full {
                    source.specials.keys().cloned().collect()
                } else {
                    self.visibility.revealed_specials(empire, id)
                };

                match known.get_mut(id) {
                    Some(copy) => copy.copy_from(source, vis, &revealed),
                    None => {
                        let mut copy = UniverseObject::blank(source.kind.placeholder());
                        copy.id = id;
                        copy.copy_from(source, vis, &revealed);
                        known.insert(copy);
                    }
                }
            }
        }
    }
}
