//! Effect definitions.
//!
//! Effects are the atomic operations content uses to change the universe.
//! Each variant owns only the expression and condition trees it needs.
//! Execution lives in `execute`; this module covers construction,
//! classification and structural identity.

use serde::{Deserialize, Serialize};

use crate::core::checksum::{combine_serialized, CheckSum, FnvHasher};
use crate::core::MeterType;
use crate::scripting::{Condition, EmpireAffiliation, Property, ValueRef};
use crate::universe::{FleetAggression, PlanetSize, PlanetType, ResourceType, StarType, Visibility};

/// How `CreateShip` picks its design.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ShipDesignRef {
    Id(ValueRef<i32>),
    Name(ValueRef<String>),
}

/// A point to orbit around or move towards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FocalPoint {
    /// Position of the first matching object.
    Object(Condition),
    /// Explicit coordinates; each evaluates with the target's own coordinate
    /// as current value and defaults to 0.
    Position {
        x: Option<ValueRef<f64>>,
        y: Option<ValueRef<f64>>,
    },
}

/// An atomic universe mutation.
///
/// ## Meters
///
/// `SetMeter`, `SetPartMeter` and `SetEmpireMeter` compute a new value with
/// the old one as current value. Batches of them take the fast paths
/// described in `batch`.
///
/// ## Creation
///
/// `Create*` effects insert a new object near the target and then run
/// `effects_after` with the new object as target.
///
/// ## Composite
///
/// `Conditional` splits its targets by a condition and runs one branch on
/// each half.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    NoOp,

    // === Meters ===

    SetMeter {
        meter: MeterType,
        value: ValueRef<f64>,
        /// Overrides the cause's label in accounting records.
        accounting_label: Option<String>,
    },

    /// Set a meter of one named part on a ship.
    SetPartMeter {
        meter: MeterType,
        part_name: ValueRef<String>,
        value: ValueRef<f64>,
    },

    SetEmpireMeter {
        empire: ValueRef<i32>,
        meter: String,
        value: ValueRef<f64>,
    },

    SetEmpireStockpile {
        empire: ValueRef<i32>,
        resource: ResourceType,
        value: ValueRef<f64>,
    },

    // === Object Properties ===

    /// Make the target planet the empire's capital.
    SetEmpireCapital {
        empire: ValueRef<i32>,
    },

    SetPlanetType {
        planet_type: ValueRef<PlanetType>,
    },

    SetPlanetSize {
        size: ValueRef<PlanetSize>,
    },

    SetSpecies {
        species: ValueRef<String>,
    },

    SetOwner {
        empire: ValueRef<i32>,
    },

    SetStarType {
        star_type: ValueRef<StarType>,
    },

    SetSpeciesEmpireOpinion {
        species: ValueRef<String>,
        empire: ValueRef<i32>,
        opinion: ValueRef<f64>,
    },

    SetSpeciesSpeciesOpinion {
        opinionated_species: ValueRef<String>,
        rated_species: ValueRef<String>,
        opinion: ValueRef<f64>,
    },

    // === Creation ===

    /// New planet in the target's system.
    CreatePlanet {
        planet_type: ValueRef<PlanetType>,
        size: ValueRef<PlanetSize>,
        name: Option<ValueRef<String>>,
        effects_after: Vec<Effect>,
    },

    /// New building on the target planet.
    CreateBuilding {
        building_type: ValueRef<String>,
        name: Option<ValueRef<String>>,
        effects_after: Vec<Effect>,
    },

    /// New ship, in a new fleet, in the target's system.
    CreateShip {
        design: ShipDesignRef,
        empire: Option<ValueRef<i32>>,
        species: Option<ValueRef<String>>,
        name: Option<ValueRef<String>>,
        effects_after: Vec<Effect>,
    },

    CreateField {
        field_type: ValueRef<String>,
        x: Option<ValueRef<f64>>,
        y: Option<ValueRef<f64>>,
        size: Option<ValueRef<f64>>,
        name: Option<ValueRef<String>>,
        effects_after: Vec<Effect>,
    },

    CreateSystem {
        star_type: Option<ValueRef<StarType>>,
        x: Option<ValueRef<f64>>,
        y: Option<ValueRef<f64>>,
        name: Option<ValueRef<String>>,
        effects_after: Vec<Effect>,
    },

    // === Destruction and Specials ===

    Destroy,

    AddSpecial {
        name: ValueRef<String>,
        capacity: Option<ValueRef<f64>>,
    },

    RemoveSpecial {
        name: ValueRef<String>,
    },

    /// Link the target's system to the systems of every matching object.
    AddStarlanes {
        endpoints: Condition,
    },

    RemoveStarlanes {
        endpoints: Condition,
    },

    // === Movement ===

    /// Move to the first object matching `destination`.
    MoveTo {
        destination: Condition,
    },

    MoveInOrbit {
        speed: Option<ValueRef<f64>>,
        focus: FocalPoint,
    },

    MoveTowards {
        speed: Option<ValueRef<f64>>,
        destination: FocalPoint,
    },

    /// Route the target fleet to a random matching object's system.
    SetDestination {
        destination: Condition,
    },

    SetAggression {
        aggression: FleetAggression,
    },

    // === Empire ===

    Victory {
        reason: String,
    },

    SetEmpireTechProgress {
        tech: ValueRef<String>,
        progress: ValueRef<f64>,
        empire: ValueRef<i32>,
    },

    GiveEmpireTech {
        tech: ValueRef<String>,
        empire: ValueRef<i32>,
    },

    // === Notification and Visibility ===

    GenerateSitRepMessage {
        message: String,
        icon: String,
        parameters: Vec<(String, ValueRef<String>)>,
        recipient: Option<ValueRef<i32>>,
        /// Objects `CanSee` recipients are judged against.
        condition: Option<Condition>,
        affiliation: EmpireAffiliation,
        label: String,
        stringtable_lookup: bool,
    },

    /// Register an effect-derived visibility for each recipient empire.
    SetVisibility {
        visibility: ValueRef<Visibility>,
        affiliation: EmpireAffiliation,
        empire: Option<ValueRef<i32>>,
        condition: Option<Condition>,
    },

    // === Appearance ===

    SetOverlayTexture {
        texture: String,
        size: Option<ValueRef<f64>>,
    },

    SetTexture {
        texture: String,
    },

    // === Composite ===

    /// Run `if_true` on targets matching `condition` (all targets if
    /// `None`) and `if_false` on the rest.
    Conditional {
        condition: Option<Condition>,
        if_true: Vec<Effect>,
        if_false: Vec<Effect>,
    },
}

/// Owner of the effect target; the default empire for empire effects.
pub fn target_owner() -> ValueRef<i32> {
    ValueRef::target(Property::Owner)
}

impl Effect {
    /// Set a meter to a value.
    pub fn set_meter(meter: MeterType, value: ValueRef<f64>) -> Self {
        Self::SetMeter {
            meter,
            value,
            accounting_label: None,
        }
    }

    /// Add `amount` to a meter.
    pub fn increment_meter(meter: MeterType, amount: ValueRef<f64>) -> Self {
        Self::set_meter(meter, ValueRef::increment(amount))
    }

    pub fn set_part_meter(meter: MeterType, part: impl Into<String>, value: ValueRef<f64>) -> Self {
        Self::SetPartMeter {
            meter,
            part_name: ValueRef::Constant(part.into()),
            value,
        }
    }

    /// Set a meter of the target owner's empire.
    pub fn set_empire_meter(meter: impl Into<String>, value: ValueRef<f64>) -> Self {
        Self::SetEmpireMeter {
            empire: target_owner(),
            meter: meter.into(),
            value,
        }
    }

    pub fn set_owner(empire: ValueRef<i32>) -> Self {
        Self::SetOwner { empire }
    }

    pub fn add_special(name: impl Into<String>) -> Self {
        Self::AddSpecial {
            name: ValueRef::Constant(name.into()),
            capacity: None,
        }
    }

    pub fn remove_special(name: impl Into<String>) -> Self {
        Self::RemoveSpecial {
            name: ValueRef::Constant(name.into()),
        }
    }

    pub fn create_building(building_type: impl Into<String>) -> Self {
        Self::CreateBuilding {
            building_type: ValueRef::Constant(building_type.into()),
            name: None,
            effects_after: Vec::new(),
        }
    }

    /// Create a ship of a named design, owned by the target's owner.
    pub fn create_ship(design: impl Into<String>) -> Self {
        Self::CreateShip {
            design: ShipDesignRef::Name(ValueRef::Constant(design.into())),
            empire: Some(target_owner()),
            species: None,
            name: None,
            effects_after: Vec::new(),
        }
    }

    pub fn move_to(destination: Condition) -> Self {
        Self::MoveTo { destination }
    }

    pub fn give_tech(tech: impl Into<String>) -> Self {
        Self::GiveEmpireTech {
            tech: ValueRef::Constant(tech.into()),
            empire: target_owner(),
        }
    }

    /// A sitrep for the target's owner.
    pub fn sitrep(message: impl Into<String>) -> Self {
        Self::GenerateSitRepMessage {
            message: message.into(),
            icon: String::new(),
            parameters: Vec::new(),
            recipient: Some(target_owner()),
            condition: None,
            affiliation: EmpireAffiliation::TheEmpire,
            label: String::new(),
            stringtable_lookup: true,
        }
    }

    pub fn conditional(condition: Condition, if_true: impl IntoIterator<Item = Effect>) -> Self {
        Self::Conditional {
            condition: Some(condition),
            if_true: if_true.into_iter().collect(),
            if_false: Vec::new(),
        }
    }

    /// Add effects for the non-matching branch of a `Conditional`.
    #[must_use]
    pub fn otherwise(self, effects: impl IntoIterator<Item = Effect>) -> Self {
        match self {
            Self::Conditional {
                condition,
                if_true,
                mut if_false,
            } => {
                if_false.extend(effects);
                Self::Conditional {
                    condition,
                    if_true,
                    if_false,
                }
            }
            other => other,
        }
    }

    /// Attach follow-up effects to a creation effect.
    #[must_use]
    pub fn then(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        if let Some(after) = self.effects_after_mut() {
            after.extend(effects);
        }
        self
    }

    fn effects_after_mut(&mut self) -> Option<&mut Vec<Effect>> {
        match self {
            Self::CreatePlanet { effects_after, .. }
            | Self::CreateBuilding { effects_after, .. }
            | Self::CreateShip { effects_after, .. }
            | Self::CreateField { effects_after, .. }
            | Self::CreateSystem { effects_after, .. } => Some(effects_after),
            _ => None,
        }
    }

    /// Variant name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoOp => "NoOp",
            Self::SetMeter { .. } => "SetMeter",
            Self::SetPartMeter { .. } => "SetPartMeter",
            Self::SetEmpireMeter { .. } => "SetEmpireMeter",
            Self::SetEmpireStockpile { .. } => "SetEmpireStockpile",
            Self::SetEmpireCapital { .. } => "SetEmpireCapital",
            Self::SetPlanetType { .. } => "SetPlanetType",
            Self::SetPlanetSize { .. } => "SetPlanetSize",
            Self::SetSpecies { .. } => "SetSpecies",
            Self::SetOwner { .. } => "SetOwner",
            Self::SetStarType { .. } => "SetStarType",
            Self::SetSpeciesEmpireOpinion { .. } => "SetSpeciesEmpireOpinion",
            Self::SetSpeciesSpeciesOpinion { .. } => "SetSpeciesSpeciesOpinion",
            Self::CreatePlanet { .. } => "CreatePlanet",
            Self::CreateBuilding { .. } => "CreateBuilding",
            Self::CreateShip { .. } => "CreateShip",
            Self::CreateField { .. } => "CreateField",
            Self::CreateSystem { .. } => "CreateSystem",
            Self::Destroy => "Destroy",
            Self::AddSpecial { .. } => "AddSpecial",
            Self::RemoveSpecial { .. } => "RemoveSpecial",
            Self::AddStarlanes { .. } => "AddStarlanes",
            Self::RemoveStarlanes { .. } => "RemoveStarlanes",
            Self::MoveTo { .. } => "MoveTo",
            Self::MoveInOrbit { .. } => "MoveInOrbit",
            Self::MoveTowards { .. } => "MoveTowards",
            Self::SetDestination { .. } => "SetDestination",
            Self::SetAggression { .. } => "SetAggression",
            Self::Victory { .. } => "Victory",
            Self::SetEmpireTechProgress { .. } => "SetEmpireTechProgress",
            Self::GiveEmpireTech { .. } => "GiveEmpireTech",
            Self::GenerateSitRepMessage { .. } => "GenerateSitRepMessage",
            Self::SetVisibility { .. } => "SetVisibility",
            Self::SetOverlayTexture { .. } => "SetOverlayTexture",
            Self::SetTexture { .. } => "SetTexture",
            Self::Conditional { .. } => "Conditional",
        }
    }

    // === Categories ===

    fn branches(&self) -> impl Iterator<Item = &Effect> {
        let (if_true, if_false): (&[Effect], &[Effect]) = match self {
            Self::Conditional {
                if_true, if_false, ..
            } => (if_true.as_slice(), if_false.as_slice()),
            _ => (&[], &[]),
        };
        if_true.iter().chain(if_false)
    }

    /// Changes object or empire meters.
    pub fn is_meter_effect(&self) -> bool {
        match self {
            Self::SetMeter { .. } | Self::SetPartMeter { .. } | Self::SetEmpireMeter { .. } => true,
            Self::Conditional { .. } => self.branches().any(Effect::is_meter_effect),
            _ => false,
        }
    }

    pub fn is_empire_meter_effect(&self) -> bool {
        match self {
            Self::SetEmpireMeter { .. } => true,
            Self::Conditional { .. } => self.branches().any(Effect::is_empire_meter_effect),
            _ => false,
        }
    }

    pub fn is_appearance_effect(&self) -> bool {
        match self {
            Self::SetOverlayTexture { .. } | Self::SetTexture { .. } => true,
            Self::Conditional { .. } => self.branches().any(Effect::is_appearance_effect),
            _ => false,
        }
    }

    pub fn is_sitrep_effect(&self) -> bool {
        match self {
            Self::GenerateSitRepMessage { .. } => true,
            Self::Conditional { .. } => self.branches().any(Effect::is_sitrep_effect),
            _ => false,
        }
    }

    /// Check construction-time constraints, logging violations.
    ///
    /// A `Conditional` whose condition depends on the target cannot be
    /// evaluated once per batch.
    pub fn validate(&self) -> bool {
        match self {
            Self::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                let mut ok = true;
                if condition.as_ref().is_some_and(|c| !c.target_invariant()) {
                    tracing::error!("Conditional effect has a target-dependent condition");
                    ok = false;
                }
                if_true.iter().chain(if_false).fold(ok, |ok, e| e.validate() && ok)
            }
            _ => self
                .effects_after()
                .iter()
                .fold(true, |ok, e| e.validate() && ok),
        }
    }

    fn effects_after(&self) -> &[Effect] {
        match self {
            Self::CreatePlanet { effects_after, .. }
            | Self::CreateBuilding { effects_after, .. }
            | Self::CreateShip { effects_after, .. }
            | Self::CreateField { effects_after, .. }
            | Self::CreateSystem { effects_after, .. } => effects_after,
            _ => &[],
        }
    }

    // === Provenance ===

    /// Attach the owning content name to every expression and condition.
    pub fn set_top_level_content(&mut self, name: &str) {
        fn opt<T: crate::scripting::ValueType>(v: &mut Option<ValueRef<T>>, name: &str) {
            if let Some(v) = v {
                v.set_top_level_content(name);
            }
        }
        fn cond(c: &mut Option<Condition>, name: &str) {
            if let Some(c) = c {
                c.set_top_level_content(name);
            }
        }
        fn focal(f: &mut FocalPoint, name: &str) {
            match f {
                FocalPoint::Object(c) => c.set_top_level_content(name),
                FocalPoint::Position { x, y } => {
                    opt(x, name);
                    opt(y, name);
                }
            }
        }
        fn all(effects: &mut [Effect], name: &str) {
            for effect in effects {
                effect.set_top_level_content(name);
            }
        }

        match self {
            Self::NoOp | Self::Destroy | Self::SetAggression { .. } | Self::Victory { .. } => {}
            Self::SetTexture { .. } => {}
            Self::SetMeter { value, .. } => value.set_top_level_content(name),
            Self::SetPartMeter { part_name, value, .. } => {
                part_name.set_top_level_content(name);
                value.set_top_level_content(name);
            }
            Self::SetEmpireMeter { empire, value, .. }
            | Self::SetEmpireStockpile { empire, value, .. } => {
                empire.set_top_level_content(name);
                value.set_top_level_content(name);
            }
            Self::SetEmpireCapital { empire } | Self::SetOwner { empire } => {
                empire.set_top_level_content(name);
            }
            Self::SetPlanetType { planet_type } => planet_type.set_top_level_content(name),
            Self::SetPlanetSize { size } => size.set_top_level_content(name),
            Self::SetSpecies { species } => species.set_top_level_content(name),
            Self::SetStarType { star_type } => star_type.set_top_level_content(name),
            Self::SetSpeciesEmpireOpinion {
                species,
                empire,
                opinion,
            } => {
                species.set_top_level_content(name);
                empire.set_top_level_content(name);
                opinion.set_top_level_content(name);
            }
            Self::SetSpeciesSpeciesOpinion {
                opinionated_species,
                rated_species,
                opinion,
            } => {
                opinionated_species.set_top_level_content(name);
                rated_species.set_top_level_content(name);
                opinion.set_top_level_content(name);
            }
            Self::CreatePlanet {
                planet_type,
                size,
                name: planet_name,
                effects_after,
            } => {
                planet_type.set_top_level_content(name);
                size.set_top_level_content(name);
                opt(planet_name, name);
                all(effects_after, name);
            }
            Self::CreateBuilding {
                building_type,
                name: building_name,
                effects_after,
            } => {
                building_type.set_top_level_content(name);
                opt(building_name, name);
                all(effects_after, name);
            }
            Self::CreateShip {
                design,
                empire,
                species,
                name: ship_name,
                effects_after,
            } => {
                match design {
                    ShipDesignRef::Id(id) => id.set_top_level_content(name),
                    ShipDesignRef::Name(design) => design.set_top_level_content(name),
                }
                opt(empire, name);
                opt(species, name);
                opt(ship_name, name);
                all(effects_after, name);
            }
            Self::CreateField {
                field_type,
                x,
                y,
                size,
                name: field_name,
                effects_after,
            } => {
                field_type.set_top_level_content(name);
                opt(x, name);
                opt(y, name);
                opt(size, name);
                opt(field_name, name);
                all(effects_after, name);
            }
            Self::CreateSystem {
                star_type,
                x,
                y,
                name: system_name,
                effects_after,
            } => {
                opt(star_type, name);
                opt(x, name);
                opt(y, name);
                opt(system_name, name);
                all(effects_after, name);
            }
            Self::AddSpecial {
                name: special,
                capacity,
            } => {
                special.set_top_level_content(name);
                opt(capacity, name);
            }
            Self::RemoveSpecial { name: special } => special.set_top_level_content(name),
            Self::AddStarlanes { endpoints } | Self::RemoveStarlanes { endpoints } => {
                endpoints.set_top_level_content(name);
            }
            Self::MoveTo { destination } | Self::SetDestination { destination } => {
                destination.set_top_level_content(name);
            }
            Self::MoveInOrbit { speed, focus } => {
                opt(speed, name);
                focal(focus, name);
            }
            Self::MoveTowards { speed, destination } => {
                opt(speed, name);
                focal(destination, name);
            }
            Self::SetEmpireTechProgress {
                tech,
                progress,
                empire,
            } => {
                tech.set_top_level_content(name);
                progress.set_top_level_content(name);
                empire.set_top_level_content(name);
            }
            Self::GiveEmpireTech { tech, empire } => {
                tech.set_top_level_content(name);
                empire.set_top_level_content(name);
            }
            Self::GenerateSitRepMessage {
                parameters,
                recipient,
                condition,
                ..
            } => {
                for (_, value) in parameters {
                    value.set_top_level_content(name);
                }
                opt(recipient, name);
                cond(condition, name);
            }
            Self::SetVisibility {
                visibility,
                empire,
                condition,
                ..
            } => {
                visibility.set_top_level_content(name);
                opt(empire, name);
                cond(condition, name);
            }
            Self::SetOverlayTexture { size, .. } => opt(size, name),
            Self::Conditional {
                condition,
                if_true,
                if_false,
            } => {
                cond(condition, name);
                all(if_true, name);
                all(if_false, name);
            }
        }
    }
}

impl CheckSum for Effect {
    const KIND: &'static str = "Effect";

    fn combine_into(&self, hasher: &mut FnvHasher) {
        combine_serialized(hasher, self);
    }
}
