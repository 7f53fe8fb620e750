//! Object selection predicates.
//!
//! A `Condition` decides, for each candidate object, whether it matches in
//! the current context. Expressions inside a condition are evaluated
//! against the context's source and target, never against the candidate.

use serde::{Deserialize, Serialize};

use crate::core::{EmpireId, MeterType, ObjectId};
use crate::universe::{
    PlanetSize, PlanetType, StarType, UniverseObject, UniverseObjectType, Visibility,
};

use super::context::ScriptingContext;
use super::valueref::ValueRef;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    // === Basic ===

    /// Every object.
    All,

    /// No object.
    NoObjects,

    /// The context source.
    Source,

    /// The context target.
    Target,

    /// The object with the evaluated id.
    ObjectId(ValueRef<i32>),

    /// Objects of one kind.
    Type(UniverseObjectType),

    // === Ownership ===

    /// Objects owned by the evaluated empire.
    OwnedBy(ValueRef<i32>),

    Unowned,

    // === Properties ===

    HasSpecial(String),

    /// Planets or ships with one of the species; any species if empty.
    Species(Vec<String>),

    PlanetType(Vec<PlanetType>),

    PlanetSize(Vec<PlanetSize>),

    /// Systems, or objects in systems, with one of the star colours.
    StarType(Vec<StarType>),

    /// Buildings of one of the types; any building if empty.
    Building(Vec<String>),

    /// Objects whose current meter value lies in `[low, high]`.
    MeterValue {
        meter: MeterType,
        low: Option<ValueRef<f64>>,
        high: Option<ValueRef<f64>>,
    },

    /// Armed ships, or fleets containing one.
    Armed,

    /// Monster ships, or fleets containing one.
    Monster,

    // === Location ===

    /// Objects in the evaluated system, or in any system if `None`.
    InSystem(Option<ValueRef<i32>>),

    /// Objects directly contained by something matching the inner condition.
    ContainedBy(Box<Condition>),

    /// Objects directly containing something matching the inner condition.
    Contains(Box<Condition>),

    /// Objects within `distance` of something matching the inner condition.
    WithinDistance {
        distance: ValueRef<f64>,
        condition: Box<Condition>,
    },

    // === Visibility ===

    /// Objects the evaluated empire can see at basic visibility or better.
    VisibleToEmpire(ValueRef<i32>),

    // === Combinators ===

    And(Vec<Condition>),

    Or(Vec<Condition>),

    Not(Box<Condition>),
}

impl Condition {
    pub fn object_id(id: ObjectId) -> Self {
        Self::ObjectId(ValueRef::Constant(id.raw()))
    }

    pub fn owned_by(empire: EmpireId) -> Self {
        Self::OwnedBy(ValueRef::Constant(empire.raw()))
    }

    /// All conditions must match.
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::And(conditions.into_iter().collect())
    }

    /// At least one condition must match.
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Or(conditions.into_iter().collect())
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn and(self, other: Condition) -> Self {
        match self {
            Self::And(mut conditions) => {
                conditions.push(other);
                Self::And(conditions)
            }
            _ => Self::And(vec![self, other]),
        }
    }

    pub fn or(self, other: Condition) -> Self {
        match self {
            Self::Or(mut conditions) => {
                conditions.push(other);
                Self::Or(conditions)
            }
            _ => Self::Or(vec![self, other]),
        }
    }

    /// Ids of matching objects in ascending order.
    ///
    /// With a `domain`, only those candidates are considered; ids that no
    /// longer exist are skipped.
    pub fn eval(&self, ctx: &ScriptingContext<'_>, domain: Option<&[ObjectId]>) -> Vec<ObjectId> {
        let mut matched: Vec<ObjectId> = match (self, domain) {
            (Self::NoObjects, _) => Vec::new(),
            (Self::Source, None) => self.single(ctx, ctx.source),
            (Self::Target, None) => self.single(ctx, ctx.target),
            (_, None) => ctx
                .universe
                .objects
                .iter()
                .filter(|obj| self.matches_object(ctx, obj))
                .map(|obj| obj.id)
                .collect(),
            (_, Some(ids)) => ids
                .iter()
                .filter_map(|&id| ctx.universe.get(id))
                .filter(|obj| self.matches_object(ctx, obj))
                .map(|obj| obj.id)
                .collect(),
        };
        matched.sort_unstable();
        matched.dedup();
        matched
    }

    fn single(&self, ctx: &ScriptingContext<'_>, id: ObjectId) -> Vec<ObjectId> {
        ctx.universe.get(id).map(|obj| obj.id).into_iter().collect()
    }

    /// Whether the object `id` exists and matches.
    pub fn matches(&self, ctx: &ScriptingContext<'_>, id: ObjectId) -> bool {
        ctx.universe
            .get(id)
            .is_some_and(|obj| self.matches_object(ctx, obj))
    }

    /// Split `ids` into (matching, non-matching), preserving order.
    pub fn partition(&self, ctx: &ScriptingContext<'_>, ids: &[ObjectId]) -> (Vec<ObjectId>, Vec<ObjectId>) {
        ids.iter().partition(|&&id| self.matches(ctx, id))
    }

    /// Whether matching never depends on the context target.
    pub fn target_invariant(&self) -> bool {
        match self {
            Self::Target => false,
            Self::ObjectId(v) | Self::OwnedBy(v) | Self::VisibleToEmpire(v) => v.target_invariant(),
            Self::InSystem(v) => v.as_ref().map_or(true, ValueRef::target_invariant),
            Self::MeterValue { low, high, .. } => [low, high]
                .into_iter()
                .flatten()
                .all(ValueRef::target_invariant),
            Self::WithinDistance { distance, condition } => {
                distance.target_invariant() && condition.target_invariant()
            }
            Self::ContainedBy(inner) | Self::Contains(inner) | Self::Not(inner) => {
                inner.target_invariant()
            }
            Self::And(conditions) | Self::Or(conditions) => {
                conditions.iter().all(Self::target_invariant)
            }
            _ => true,
        }
    }

    /// Attach the owning content name to every expression in the tree.
    pub fn set_top_level_content(&mut self, name: &str) {
        match self {
            Self::ObjectId(v) | Self::OwnedBy(v) | Self::VisibleToEmpire(v) => {
                v.set_top_level_content(name);
            }
            Self::InSystem(Some(v)) => v.set_top_level_content(name),
            Self::MeterValue { low, high, .. } => {
                for bound in [low, high].into_iter().flatten() {
                    bound.set_top_level_content(name);
                }
            }
            Self::WithinDistance { distance, condition } => {
                distance.set_top_level_content(name);
                condition.set_top_level_content(name);
            }
            Self::ContainedBy(inner) | Self::Contains(inner) | Self::Not(inner) => {
                inner.set_top_level_content(name);
            }
            Self::And(conditions) | Self::Or(conditions) => {
                for condition in conditions {
                    condition.set_top_level_content(name);
                }
            }
            _ => {}
        }
    }

    fn matches_object(&self, ctx: &ScriptingContext<'_>, candidate: &UniverseObject) -> bool {
        match self {
            Self::All => true,
            Self::NoObjects => false,
            Self::Source => candidate.id == ctx.source,
            Self::Target => candidate.id == ctx.target,
            Self::ObjectId(id) => candidate.id == ObjectId(id.eval(ctx)),
            Self::Type(object_type) => candidate.object_type() == *object_type,

            Self::OwnedBy(empire) => {
                let empire = EmpireId(empire.eval(ctx));
                !empire.is_none() && candidate.owned_by(empire)
            }
            Self::Unowned => candidate.is_unowned(),

            Self::HasSpecial(name) => candidate.has_special(name),
            Self::Species(names) => candidate
                .species()
                .filter(|species| !species.is_empty())
                .is_some_and(|species| names.is_empty() || names.iter().any(|n| n == species)),
            Self::PlanetType(types) => candidate
                .as_planet()
                .is_some_and(|planet| types.contains(&planet.planet_type)),
            Self::PlanetSize(sizes) => candidate
                .as_planet()
                .is_some_and(|planet| sizes.contains(&planet.size)),
            Self::StarType(stars) => candidate
                .as_system()
                .or_else(|| {
                    ctx.universe
                        .get(candidate.system_id)
                        .and_then(UniverseObject::as_system)
                })
                .is_some_and(|system| stars.contains(&system.star)),
            Self::Building(types) => candidate.as_building().is_some_and(|building| {
                types.is_empty() || types.contains(&building.building_type)
            }),
            Self::MeterValue { meter, low, high } => {
                let Some(value) = candidate.meter_value(*meter) else {
                    return false;
                };
                let low = low.as_ref().map_or(f64::MIN, |v| v.eval(ctx));
                let high = high.as_ref().map_or(f64::MAX, |v| v.eval(ctx));
                low <= value && value <= high
            }
            Self::Armed => Self::any_ship(ctx, candidate, |ship| {
                ship.as_ship().is_some_and(|data| data.is_armed())
            }),
            Self::Monster => Self::any_ship(ctx, candidate, |ship| {
                ship.as_ship().is_some_and(|data| data.monster)
            }),

            Self::InSystem(system) => match system {
                Some(system) => {
                    let system = ObjectId(system.eval(ctx));
                    system.is_valid() && candidate.system_id == system
                }
                None => candidate.system_id.is_valid(),
            },
            Self::ContainedBy(inner) => candidate
                .container_ids()
                .into_iter()
                .any(|id| inner.matches(ctx, id)),
            Self::Contains(inner) => candidate
                .contained_ids()
                .into_iter()
                .any(|id| inner.matches(ctx, id)),
            Self::WithinDistance { distance, condition } => {
                let distance = distance.eval(ctx);
                condition
                    .eval(ctx, None)
                    .into_iter()
                    .filter_map(|id| ctx.universe.get(id))
                    .any(|other| candidate.distance_to(other.x, other.y) <= distance)
            }

            Self::VisibleToEmpire(empire) => {
                let empire = EmpireId(empire.eval(ctx));
                candidate.owned_by(empire) || ctx.visibility(empire, candidate.id) >= Visibility::Basic
            }

            Self::And(conditions) => conditions.iter().all(|c| c.matches_object(ctx, candidate)),
            Self::Or(conditions) => conditions.iter().any(|c| c.matches_object(ctx, candidate)),
            Self::Not(inner) => !inner.matches_object(ctx, candidate),
        }
    }

    /// Apply `test` to a ship candidate, or to each ship of a fleet.
    fn any_ship(
        ctx: &ScriptingContext<'_>,
        candidate: &UniverseObject,
        test: impl Fn(&UniverseObject) -> bool,
    ) -> bool {
        match candidate.as_fleet() {
            Some(fleet) => fleet
                .ships
                .iter()
                .filter_map(|&id| ctx.universe.get(id))
                .any(test),
            None => test(candidate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EngineConfig;
    use crate::scripting::Property;
    use crate::universe::{
        Building, ContentRegistry, ObjectKind, Planet, StarlanePathfinder, System, Universe,
    };

    struct Fixture {
        universe: Universe,
        system: ObjectId,
        terran: ObjectId,
        barren: ObjectId,
        shipyard: ObjectId,
    }

    fn fixture() -> Fixture {
        let mut universe = Universe::new(EngineConfig::default());
        let system = universe.insert(UniverseObject::new(
            "Sol",
            0.0,
            0.0,
            ObjectKind::System(System::new(StarType::Yellow, 5)),
        ));
        let terran = universe.insert(
            UniverseObject::new(
                "Earth",
                0.0,
                0.0,
                ObjectKind::Planet(Planet::new(PlanetType::Terran, PlanetSize::Medium)),
            )
            .with_owner(EmpireId(1)),
        );
        let barren = universe.insert(UniverseObject::new(
            "Moon",
            30.0,
            40.0,
            ObjectKind::Planet(Planet::new(PlanetType::Barren, PlanetSize::Tiny)),
        ));
        universe.add_to_system(system, terran);
        universe.add_to_system(system, barren);
        // far away, outside the system
        universe.set_position(barren, 30.0, 40.0);

        let shipyard = universe.insert(
            UniverseObject::new(
                "Yard",
                0.0,
                0.0,
                ObjectKind::Building(Building {
                    building_type: "BLD_SHIPYARD_BASE".into(),
                    planet_id: ObjectId(-1),
                }),
            )
            .with_owner(EmpireId(1)),
        );
        universe.add_to_system(system, shipyard);
        universe.add_building_to_planet(terran, shipyard);
        universe.get_mut(terran).unwrap().add_special("GAIA_SPECIAL", 0, 0.0);

        Fixture {
            universe,
            system,
            terran,
            barren,
            shipyard,
        }
    }

    #[test]
    fn test_basic_conditions() {
        let mut f = fixture();
        let content = ContentRegistry::new();
        let ctx = ScriptingContext::new(&mut f.universe, &content, &StarlanePathfinder)
            .with_source(f.terran)
            .with_target(f.barren);

        assert_eq!(Condition::Source.eval(&ctx, None), vec![f.terran]);
        assert_eq!(Condition::Target.eval(&ctx, None), vec![f.barren]);
        assert!(Condition::NoObjects.eval(&ctx, None).is_empty());
        assert_eq!(Condition::All.eval(&ctx, None).len(), 4);
        assert_eq!(
            Condition::Type(UniverseObjectType::Planet).eval(&ctx, None),
            vec![f.terran, f.barren]
        );
        assert_eq!(Condition::object_id(f.system).eval(&ctx, None), vec![f.system]);
    }

    #[test]
    fn test_ownership_and_properties() {
        let mut f = fixture();
        let content = ContentRegistry::new();
        let ctx = ScriptingContext::new(&mut f.universe, &content, &StarlanePathfinder)
            .with_source(f.terran);

        let owned = Condition::OwnedBy(ValueRef::source(Property::Owner));
        assert_eq!(owned.eval(&ctx, None), vec![f.terran, f.shipyard]);
        assert_eq!(
            Condition::HasSpecial("GAIA_SPECIAL".into()).eval(&ctx, None),
            vec![f.terran]
        );
        assert_eq!(
            Condition::PlanetType(vec![PlanetType::Barren]).eval(&ctx, None),
            vec![f.barren]
        );
        assert_eq!(
            Condition::Building(Vec::new()).eval(&ctx, None),
            vec![f.shipyard]
        );
        assert!(Condition::StarType(vec![StarType::Yellow]).matches(&ctx, f.barren));
    }

    #[test]
    fn test_containment_conditions() {
        let mut f = fixture();
        let content = ContentRegistry::new();
        let ctx = ScriptingContext::new(&mut f.universe, &content, &StarlanePathfinder);

        let on_terran = Condition::ContainedBy(Box::new(Condition::object_id(f.terran)));
        assert_eq!(on_terran.eval(&ctx, None), vec![f.shipyard]);

        let has_building = Condition::Contains(Box::new(Condition::Building(Vec::new())));
        assert_eq!(has_building.eval(&ctx, None), vec![f.system, f.terran]);

        let in_sol = Condition::InSystem(Some(ValueRef::Constant(f.system.raw())));
        assert_eq!(in_sol.eval(&ctx, None), vec![f.terran, f.barren, f.shipyard]);
    }

    #[test]
    fn test_within_distance() {
        let mut f = fixture();
        let content = ContentRegistry::new();
        let ctx = ScriptingContext::new(&mut f.universe, &content, &StarlanePathfinder);

        let near = Condition::WithinDistance {
            distance: ValueRef::Constant(10.0),
            condition: Box::new(Condition::object_id(f.barren)),
        };
        assert_eq!(near.eval(&ctx, None), vec![f.barren]);

        let far = Condition::WithinDistance {
            distance: ValueRef::Constant(50.0),
            condition: Box::new(Condition::object_id(f.barren)),
        };
        assert_eq!(far.eval(&ctx, None).len(), 4);
    }

    #[test]
    fn test_combinators_and_domain() {
        let mut f = fixture();
        let content = ContentRegistry::new();
        let ctx = ScriptingContext::new(&mut f.universe, &content, &StarlanePathfinder);

        let owned_planets = Condition::Type(UniverseObjectType::Planet).and(Condition::owned_by(EmpireId(1)));
        assert_eq!(owned_planets.eval(&ctx, None), vec![f.terran]);

        let unowned = Condition::owned_by(EmpireId(1)).negate();
        assert_eq!(unowned.eval(&ctx, Some(&[f.barren, f.terran, ObjectId(99)])), vec![f.barren]);

        let (yes, no) = Condition::Unowned.partition(&ctx, &[f.terran, f.barren]);
        assert_eq!(yes, vec![f.barren]);
        assert_eq!(no, vec![f.terran]);
    }

    #[test]
    fn test_target_invariance() {
        assert!(Condition::All.target_invariant());
        assert!(!Condition::Target.target_invariant());
        assert!(!Condition::OwnedBy(ValueRef::target(Property::Owner)).target_invariant());
        assert!(Condition::OwnedBy(ValueRef::source(Property::Owner)).target_invariant());
        assert!(!Condition::all([Condition::All, Condition::Target.negate()]).target_invariant());
    }

    #[test]
    fn test_meter_value() {
        let mut f = fixture();
        f.universe
            .get_mut(f.terran)
            .unwrap()
            .meters
            .insert(MeterType::Population, crate::core::Meter::new(12.0));
        let content = ContentRegistry::new();
        let ctx = ScriptingContext::new(&mut f.universe, &content, &StarlanePathfinder);

        let condition = Condition::MeterValue {
            meter: MeterType::Population,
            low: Some(ValueRef::Constant(10.0)),
            high: None,
        };
        assert_eq!(condition.eval(&ctx, None), vec![f.terran]);
    }
}
