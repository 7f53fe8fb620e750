//! Universe objects: a shared base record plus a per-kind payload.
//!
//! ## Layout
//!
//! `UniverseObject` carries everything every object has (id, name,
//! position, owner, containing system, creation turn, specials, meters).
//! `ObjectKind` carries what only one kind has: a ship's fleet and part
//! meters, a fleet's route, a planet's type and buildings, and so on.
//!
//! Cross references between objects are `ObjectId`s into the universe's
//! object arena, never pointers.
//!
//! ## Censoring
//!
//! `copy_from` copies another object's state at a given visibility tier.
//! Empires keep such censored copies as their latest-known view of objects
//! they cannot fully observe.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{EmpireId, Meter, MeterType, ObjectId, ALL_EMPIRES, INVALID_OBJECT_ID};

use super::visibility::Visibility;

/// Discriminant of `ObjectKind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UniverseObjectType {
    Building,
    Ship,
    Fleet,
    Planet,
    System,
    Field,
}

impl UniverseObjectType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Ship => "ship",
            Self::Fleet => "fleet",
            Self::Planet => "planet",
            Self::System => "system",
            Self::Field => "field",
        }
    }
}

impl std::fmt::Display for UniverseObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlanetType {
    Swamp,
    Toxic,
    Inferno,
    Radiated,
    Barren,
    Tundra,
    Desert,
    Terran,
    Ocean,
    Asteroids,
    GasGiant,
    Invalid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlanetSize {
    Invalid,
    NoWorld,
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
    Asteroids,
    GasGiant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StarType {
    Blue,
    White,
    Yellow,
    Orange,
    Red,
    Neutron,
    BlackHole,
    NoStar,
    Invalid,
}

impl StarType {
    /// Every star type a generated system may have.
    pub const GENERATABLE: [StarType; 8] = [
        StarType::Blue,
        StarType::White,
        StarType::Yellow,
        StarType::Orange,
        StarType::Red,
        StarType::Neutron,
        StarType::BlackHole,
        StarType::NoStar,
    ];
}

/// How willing a fleet is to start or block combat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FleetAggression {
    Passive,
    Defensive,
    Obstructive,
    Aggressive,
}

/// A special attached to an object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Special {
    /// Turn the special was added.
    pub added_turn: i32,
    pub capacity: f64,
}

/// Objects that hold other objects by id.
pub trait Container {
    /// Ids of directly contained objects, ascending.
    fn contained(&self) -> Vec<ObjectId>;

    fn contains(&self, id: ObjectId) -> bool;
}

// === Kind payloads ===

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub fleet_id: ObjectId,
    pub design_id: i32,
    pub species: String,
    /// Meters per ship part, keyed by part name.
    pub part_meters: BTreeMap<String, BTreeMap<MeterType, Meter>>,
    /// Parts whose capacity is weapon damage.
    pub weapon_parts: BTreeSet<String>,
    pub monster: bool,
}

impl Ship {
    #[must_use]
    pub fn new(design_id: i32) -> Self {
        Self {
            fleet_id: INVALID_OBJECT_ID,
            design_id,
            species: String::new(),
            part_meters: BTreeMap::new(),
            weapon_parts: BTreeSet::new(),
            monster: false,
        }
    }

    #[must_use]
    pub fn part_meter(&self, meter: MeterType, part: &str) -> Option<&Meter> {
        self.part_meters.get(part).and_then(|meters| meters.get(&meter))
    }

    pub fn part_meter_mut(&mut self, meter: MeterType, part: &str) -> Option<&mut Meter> {
        self.part_meters
            .get_mut(part)
            .and_then(|meters| meters.get_mut(&meter))
    }

    /// Armed when any weapon part has positive capacity.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.weapon_parts.iter().any(|part| {
            self.part_meter(MeterType::Capacity, part)
                .is_some_and(|meter| meter.current() > 0.0)
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
    pub ships: BTreeSet<ObjectId>,
    pub aggression: FleetAggression,
    pub prev_system: ObjectId,
    pub next_system: ObjectId,
    pub final_destination: ObjectId,
    /// Systems still to visit, in order.
    pub route: SmallVec<[ObjectId; 8]>,
}

impl Fleet {
    #[must_use]
    pub fn new(aggression: FleetAggression) -> Self {
        Self {
            ships: BTreeSet::new(),
            aggression,
            prev_system: INVALID_OBJECT_ID,
            next_system: INVALID_OBJECT_ID,
            final_destination: INVALID_OBJECT_ID,
            route: SmallVec::new(),
        }
    }
}

impl Container for Fleet {
    fn contained(&self) -> Vec<ObjectId> {
        self.ships.iter().copied().collect()
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.ships.contains(&id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub planet_type: PlanetType,
    pub size: PlanetSize,
    pub species: String,
    pub focus: String,
    pub buildings: BTreeSet<ObjectId>,
    pub surface_texture: String,
}

impl Planet {
    #[must_use]
    pub fn new(planet_type: PlanetType, size: PlanetSize) -> Self {
        Self {
            planet_type,
            size,
            species: String::new(),
            focus: String::new(),
            buildings: BTreeSet::new(),
            surface_texture: String::new(),
        }
    }

    /// Change the type, keeping the size consistent with it.
    pub fn set_type(&mut self, planet_type: PlanetType) {
        self.planet_type = planet_type;
        match planet_type {
            PlanetType::Asteroids => self.size = PlanetSize::Asteroids,
            PlanetType::GasGiant => self.size = PlanetSize::GasGiant,
            _ => match self.size {
                PlanetSize::Asteroids => self.size = PlanetSize::Tiny,
                PlanetSize::GasGiant => self.size = PlanetSize::Huge,
                _ => {}
            },
        }
    }

    /// Change the size, keeping the type consistent with it.
    pub fn set_size(&mut self, size: PlanetSize) {
        self.size = size;
        match size {
            PlanetSize::Asteroids => self.planet_type = PlanetType::Asteroids,
            PlanetSize::GasGiant => self.planet_type = PlanetType::GasGiant,
            _ => {
                if matches!(self.planet_type, PlanetType::Asteroids | PlanetType::GasGiant) {
                    self.planet_type = PlanetType::Barren;
                }
            }
        }
    }
}

impl Container for Planet {
    fn contained(&self) -> Vec<ObjectId> {
        self.buildings.iter().copied().collect()
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.buildings.contains(&id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub building_type: String,
    pub planet_id: ObjectId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct System {
    pub star: StarType,
    /// Orbit slots; `INVALID_OBJECT_ID` marks a free slot.
    pub orbits: Vec<ObjectId>,
    pub objects: BTreeSet<ObjectId>,
    pub starlanes: BTreeSet<ObjectId>,
    pub overlay_texture: String,
    pub overlay_size: f64,
}

impl System {
    #[must_use]
    pub fn new(star: StarType, orbits: usize) -> Self {
        Self {
            star,
            orbits: vec![INVALID_OBJECT_ID; orbits],
            objects: BTreeSet::new(),
            starlanes: BTreeSet::new(),
            overlay_texture: String::new(),
            overlay_size: 1.0,
        }
    }

    /// Indices of unoccupied orbits, ascending.
    #[must_use]
    pub fn free_orbits(&self) -> Vec<usize> {
        self.orbits
            .iter()
            .enumerate()
            .filter(|(_, id)| !id.is_valid())
            .map(|(orbit, _)| orbit)
            .collect()
    }

    #[must_use]
    pub fn orbit_of(&self, planet: ObjectId) -> Option<usize> {
        self.orbits.iter().position(|&id| id == planet)
    }

    /// Place `planet` in the lowest free orbit. Returns the orbit used.
    pub fn assign_free_orbit(&mut self, planet: ObjectId) -> Option<usize> {
        if let Some(orbit) = self.orbit_of(planet) {
            return Some(orbit);
        }
        let orbit = self.orbits.iter().position(|id| !id.is_valid())?;
        self.orbits[orbit] = planet;
        Some(orbit)
    }

    pub fn release_orbit(&mut self, planet: ObjectId) {
        for slot in self.orbits.iter_mut().filter(|id| **id == planet) {
            *slot = INVALID_OBJECT_ID;
        }
    }
}

impl Container for System {
    fn contained(&self) -> Vec<ObjectId> {
        self.objects.iter().copied().collect()
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains(&id)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub field_type: String,
}

/// Per-kind payload of a universe object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Ship(Ship),
    Fleet(Fleet),
    Planet(Planet),
    Building(Building),
    System(System),
    Field(Field),
}

impl ObjectKind {
    #[must_use]
    pub fn object_type(&self) -> UniverseObjectType {
        match self {
            Self::Ship(_) => UniverseObjectType::Ship,
            Self::Fleet(_) => UniverseObjectType::Fleet,
            Self::Planet(_) => UniverseObjectType::Planet,
            Self::Building(_) => UniverseObjectType::Building,
            Self::System(_) => UniverseObjectType::System,
            Self::Field(_) => UniverseObjectType::Field,
        }
    }

    #[must_use]
    pub fn as_container(&self) -> Option<&dyn Container> {
        match self {
            Self::Fleet(fleet) => Some(fleet),
            Self::Planet(planet) => Some(planet),
            Self::System(system) => Some(system),
            _ => None,
        }
    }

    /// A payload of the same kind with nothing known about it.
    #[must_use]
    pub fn placeholder(&self) -> ObjectKind {
        match self {
            Self::Ship(_) => Self::Ship(Ship::new(-1)),
            Self::Fleet(_) => Self::Fleet(Fleet::new(FleetAggression::Passive)),
            Self::Planet(_) => Self::Planet(Planet::new(PlanetType::Invalid, PlanetSize::Invalid)),
            Self::Building(_) => Self::Building(Building {
                building_type: String::new(),
                planet_id: INVALID_OBJECT_ID,
            }),
            Self::System(_) => Self::System(System::new(StarType::Invalid, 0)),
            Self::Field(_) => Self::Field(Field {
                field_type: String::new(),
            }),
        }
    }

    /// Meters every object of this kind starts with (besides stealth).
    fn initial_meters(&self) -> &'static [MeterType] {
        use MeterType::*;
        match self {
            Self::Ship(_) => &[
                Fuel, MaxFuel, Shield, MaxShield, Structure, MaxStructure, Detection, Speed,
            ],
            Self::Planet(_) => &[
                Population, TargetPopulation, Industry, TargetIndustry, Research,
                TargetResearch, Influence, TargetInfluence, Construction,
                TargetConstruction, Happiness, TargetHappiness, Supply, MaxSupply,
                Stockpile, MaxStockpile, Troops, MaxTroops, RebelTroops, Defense,
                MaxDefense, Shield, MaxShield, Detection,
            ],
            Self::Field(_) => &[Size, Speed],
            Self::Fleet(_) | Self::Building(_) | Self::System(_) => &[],
        }
    }
}

/// A universe object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniverseObject {
    pub id: ObjectId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub owner: EmpireId,
    pub system_id: ObjectId,
    pub created_turn: i32,
    pub specials: BTreeMap<String, Special>,
    pub meters: BTreeMap<MeterType, Meter>,
    pub kind: ObjectKind,
}

impl UniverseObject {
    /// A new, not yet inserted object with its kind's default meters.
    #[must_use]
    pub fn new(name: impl Into<String>, x: f64, y: f64, kind: ObjectKind) -> Self {
        let mut meters = BTreeMap::new();
        meters.insert(MeterType::Stealth, Meter::default());
        for &meter in kind.initial_meters() {
            meters.insert(meter, Meter::default());
        }
        Self {
            id: INVALID_OBJECT_ID,
            name: name.into(),
            x,
            y,
            owner: ALL_EMPIRES,
            system_id: INVALID_OBJECT_ID,
            created_turn: 0,
            specials: BTreeMap::new(),
            meters,
            kind,
        }
    }

    /// An object with no known state besides its kind payload.
    #[must_use]
    pub fn blank(kind: ObjectKind) -> Self {
        Self {
            meters: BTreeMap::new(),
            ..Self::new(String::new(), 0.0, 0.0, kind)
        }
    }

    #[must_use]
    pub fn with_owner(mut self, owner: EmpireId) -> Self {
        self.owner = owner;
        self
    }

    #[must_use]
    pub fn object_type(&self) -> UniverseObjectType {
        self.kind.object_type()
    }

    #[must_use]
    pub fn is_unowned(&self) -> bool {
        self.owner.is_none()
    }

    #[must_use]
    pub fn owned_by(&self, empire: EmpireId) -> bool {
        !empire.is_none() && self.owner == empire
    }

    // === Meters ===

    #[must_use]
    pub fn meter(&self, meter: MeterType) -> Option<&Meter> {
        self.meters.get(&meter)
    }

    pub fn meter_mut(&mut self, meter: MeterType) -> Option<&mut Meter> {
        self.meters.get_mut(&meter)
    }

    /// Current value of `meter`, if the object has it.
    #[must_use]
    pub fn meter_value(&self, meter: MeterType) -> Option<f64> {
        self.meters.get(&meter).map(Meter::current)
    }

    /// Clamp meters to their legal range, and active meters to their max.
    pub fn clamp_meters(&mut self) {
        for meter in self.meters.values_mut() {
            meter.clamp_current_to_range();
        }
        let bounded: Vec<(MeterType, f64)> = self
            .meters
            .keys()
            .filter_map(|&ty| {
                let max = ty.max_counterpart()?;
                Some((ty, self.meter_value(max)?))
            })
            .collect();
        for (ty, max) in bounded {
            if let Some(meter) = self.meters.get_mut(&ty) {
                meter.clamp_current(Meter::DEFAULT_VALUE, max);
            }
        }

        if let ObjectKind::Ship(ship) = &mut self.kind {
            for meters in ship.part_meters.values_mut() {
                let max = meters.get(&MeterType::MaxCapacity).map(Meter::current);
                for (ty, meter) in meters.iter_mut() {
                    meter.clamp_current_to_range();
                    if *ty == MeterType::Capacity {
                        if let Some(max) = max {
                            meter.clamp_current(Meter::DEFAULT_VALUE, max);
                        }
                    }
                }
            }
        }
    }

    /// Copy every current meter value into its initial value.
    pub fn back_propagate_meters(&mut self) {
        for meter in self.meters.values_mut() {
            meter.back_propagate();
        }
        if let ObjectKind::Ship(ship) = &mut self.kind {
            for meter in ship.part_meters.values_mut().flat_map(|m| m.values_mut()) {
                meter.back_propagate();
            }
        }
    }

    /// Reset the meters effects recompute every turn.
    pub fn reset_target_max_unpaired_meters(&mut self) {
        for (_, meter) in self
            .meters
            .iter_mut()
            .filter(|(ty, _)| ty.resets_before_effects())
        {
            meter.reset_current();
        }
        if let ObjectKind::Ship(ship) = &mut self.kind {
            for meters in ship.part_meters.values_mut() {
                if let Some(max) = meters.get_mut(&MeterType::MaxCapacity) {
                    max.reset_current();
                }
            }
        }
    }

    // === Specials ===

    #[must_use]
    pub fn has_special(&self, name: &str) -> bool {
        self.specials.contains_key(name)
    }

    #[must_use]
    pub fn special_capacity(&self, name: &str) -> Option<f64> {
        self.specials.get(name).map(|special| special.capacity)
    }

    /// Add a special, or update the capacity of an existing one.
    pub fn add_special(&mut self, name: impl Into<String>, turn: i32, capacity: f64) {
        self.specials
            .entry(name.into())
            .and_modify(|special| special.capacity = capacity)
            .or_insert(Special {
                added_turn: turn,
                capacity,
            });
    }

    pub fn remove_special(&mut self, name: &str) -> bool {
        self.specials.remove(name).is_some()
    }

    // === Kind access ===

    #[must_use]
    pub fn as_ship(&self) -> Option<&Ship> {
        match &self.kind {
            ObjectKind::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    pub fn as_ship_mut(&mut self) -> Option<&mut Ship> {
        match &mut self.kind {
            ObjectKind::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_fleet(&self) -> Option<&Fleet> {
        match &self.kind {
            ObjectKind::Fleet(fleet) => Some(fleet),
            _ => None,
        }
    }

    pub fn as_fleet_mut(&mut self) -> Option<&mut Fleet> {
        match &mut self.kind {
            ObjectKind::Fleet(fleet) => Some(fleet),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_planet(&self) -> Option<&Planet> {
        match &self.kind {
            ObjectKind::Planet(planet) => Some(planet),
            _ => None,
        }
    }

    pub fn as_planet_mut(&mut self) -> Option<&mut Planet> {
        match &mut self.kind {
            ObjectKind::Planet(planet) => Some(planet),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_building(&self) -> Option<&Building> {
        match &self.kind {
            ObjectKind::Building(building) => Some(building),
            _ => None,
        }
    }

    pub fn as_building_mut(&mut self) -> Option<&mut Building> {
        match &mut self.kind {
            ObjectKind::Building(building) => Some(building),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_system(&self) -> Option<&System> {
        match &self.kind {
            ObjectKind::System(system) => Some(system),
            _ => None,
        }
    }

    pub fn as_system_mut(&mut self) -> Option<&mut System> {
        match &mut self.kind {
            ObjectKind::System(system) => Some(system),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_field(&self) -> Option<&Field> {
        match &self.kind {
            ObjectKind::Field(field) => Some(field),
            _ => None,
        }
    }

    /// Species living on a planet or crewing a ship.
    #[must_use]
    pub fn species(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::Ship(ship) => Some(ship.species.as_str()),
            ObjectKind::Planet(planet) => Some(planet.species.as_str()),
            _ => None,
        }
    }

    /// Ids of directly contained objects (empty for non-containers).
    #[must_use]
    pub fn contained_ids(&self) -> Vec<ObjectId> {
        self.kind
            .as_container()
            .map(Container::contained)
            .unwrap_or_default()
    }

    /// Ids of objects that directly contain this one.
    #[must_use]
    pub fn container_ids(&self) -> Vec<ObjectId> {
        let mut ids = Vec::with_capacity(2);
        if self.system_id.is_valid() && self.system_id != self.id {
            ids.push(self.system_id);
        }
        match &self.kind {
            ObjectKind::Ship(ship) if ship.fleet_id.is_valid() => ids.push(ship.fleet_id),
            ObjectKind::Building(building) if building.planet_id.is_valid() => {
                ids.push(building.planet_id)
            }
            _ => {}
        }
        ids
    }

    /// Distance to a point.
    #[must_use]
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }

    // === Censoring ===

    /// Meters an observer at `vis` may learn about.
    ///
    /// Basic visibility only reveals that a stealth meter exists, with the
    /// hidden sentinel in place of its value.
    #[must_use]
    pub fn censored_meters(&self, vis: Visibility) -> BTreeMap<MeterType, Meter> {
        match vis {
            Visibility::None => BTreeMap::new(),
            Visibility::Basic => self
                .meters
                .keys()
                .filter(|&&ty| ty == MeterType::Stealth)
                .map(|&ty| (ty, Meter::hidden()))
                .collect(),
            Visibility::Partial | Visibility::Full => self.meters.clone(),
        }
    }

    /// Copy what an observer at `vis` may learn from `source`.
    ///
    /// A hidden meter never replaces a meter value already known.
    pub fn copy_from(
        &mut self,
        source: &UniverseObject,
        vis: Visibility,
        revealed_specials: &BTreeSet<String>,
    ) {
        if vis < Visibility::Basic {
            return;
        }

        for (ty, meter) in source.censored_meters(vis) {
            match self.meters.get_mut(&ty) {
                Some(_) if meter.is_hidden() => {}
                Some(existing) => *existing = meter,
                None => {
                    self.meters.insert(ty, meter);
                }
            }
        }

        if vis >= Visibility::Partial {
            self.id = source.id;
            self.system_id = source.system_id;
            self.x = source.x;
            self.y = source.y;
            self.owner = source.owner;
            self.created_turn = source.created_turn;
            self.specials = source
                .specials
                .iter()
                .filter(|(name, _)| revealed_specials.contains(*name))
                .map(|(name, special)| (name.clone(), *special))
                .collect();
            self.kind = source.kind.clone();
        }

        if vis >= Visibility::Full {
            self.name = source.name.clone();
        }
    }
}
