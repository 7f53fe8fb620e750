//! Shared fixture for integration tests.
//!
//! Builds a small three-system universe through the public API only.
#![allow(dead_code)]

use effect_engine::universe::{
    BuildingType, FieldType, PartClass, PartType, Planet, ShipDesign, SpeciesDef, System, Tech,
};
use effect_engine::{
    ContentRegistry, Effect, Empire, EmpireId, EngineConfig, ObjectId, ObjectKind, PlanetSize,
    PlanetType, ScriptingContext, ShipDesignRef, StarType, StarlanePathfinder, Universe,
    UniverseObject, UniverseObjectType, ValueRef,
};

use tracing_subscriber::EnvFilter;

pub const TERRANS: EmpireId = EmpireId(1);
pub const KLINGONS: EmpireId = EmpireId(2);

pub struct Galaxy {
    pub universe: Universe,
    pub content: ContentRegistry,
    /// (0, 0), linked to `vega`.
    pub sol: ObjectId,
    /// (100, 0), linked to `sol` and `rigel`.
    pub vega: ObjectId,
    /// (200, 0), linked to `vega`.
    pub rigel: ObjectId,
    /// Terran homeworld in `sol`.
    pub earth: ObjectId,
    /// Klingon homeworld in `rigel`.
    pub kronos: ObjectId,
    /// Unowned planet in `vega`.
    pub tau: ObjectId,
}

pub fn content() -> ContentRegistry {
    let mut content = ContentRegistry::new();
    content.register_species(
        SpeciesDef::new("SP_HUMAN")
            .with_foci(["FOCUS_INDUSTRY", "FOCUS_RESEARCH"])
            .with_default_focus("FOCUS_INDUSTRY"),
    );
    content.register_species(SpeciesDef::new("SP_KLINGON"));
    content.register_building_type(BuildingType::new("BLD_SHIPYARD_BASE"));
    content.register_part(PartType::new("SR_WEAPON_1_1", PartClass::ShortRange, 18.0));
    content.register_design(
        ShipDesign::new(1, "SD_SCOUT", "SH_BASIC_SMALL")
            .with_structure(8.0)
            .with_speed(75.0),
    );
    content.register_design(
        ShipDesign::new(2, "SD_WARSHIP", "SH_BASIC_MEDIUM")
            .with_part("SR_WEAPON_1_1")
            .with_structure(40.0)
            .with_speed(75.0),
    );
    content.register_design(
        ShipDesign::new(3, "SM_KRAKEN_1", "SH_KRAKEN_BODY")
            .with_part("SR_WEAPON_1_1")
            .with_monster(true)
            .with_structure(200.0)
            .with_speed(30.0),
    );
    content.register_tech(Tech::new("SHP_ZORTRIUM_PLATE", "SHIPS_CATEGORY", 24.0));
    content.register_field_type(FieldType::new("FLD_NEBULA_1"));
    content
}

fn system(universe: &mut Universe, name: &str, x: f64, star: StarType) -> ObjectId {
    universe.insert(UniverseObject::new(name, x, 0.0, ObjectKind::System(System::new(star, 4))))
}

fn planet(
    universe: &mut Universe,
    system: ObjectId,
    name: &str,
    planet_type: PlanetType,
    species: &str,
    owner: Option<EmpireId>,
) -> ObjectId {
    let (x, y) = universe
        .get(system)
        .map_or((0.0, 0.0), |sys| (sys.x, sys.y));
    let mut data = Planet::new(planet_type, PlanetSize::Medium);
    data.species = species.into();
    let mut obj = UniverseObject::new(name, x, y, ObjectKind::Planet(data));
    if let Some(owner) = owner {
        obj = obj.with_owner(owner);
    }
    let id = universe.insert(obj);
    universe.add_to_system(system, id);
    id
}

/// Route engine logs to the test harness; `RUST_LOG=effect_engine=debug`
/// shows skipped effects.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn galaxy(seed: u64) -> Galaxy {
    init_tracing();
    let config = EngineConfig::new(seed).with_star_names(["Sol", "Vega", "Rigel", "Deneb"]);
    let mut universe = Universe::new(config);
    universe.empires.insert(Empire::new(TERRANS, "Terrans").with_human(true));
    universe.empires.insert(Empire::new(KLINGONS, "Klingons"));

    let sol = system(&mut universe, "Sol", 0.0, StarType::Yellow);
    let vega = system(&mut universe, "Vega", 100.0, StarType::White);
    let rigel = system(&mut universe, "Rigel", 200.0, StarType::Blue);
    universe.add_starlane(sol, vega);
    universe.add_starlane(vega, rigel);

    let earth = planet(&mut universe, sol, "Earth", PlanetType::Terran, "SP_HUMAN", Some(TERRANS));
    let kronos = planet(&mut universe, rigel, "Kronos", PlanetType::Desert, "SP_KLINGON", Some(KLINGONS));
    let tau = planet(&mut universe, vega, "Tau", PlanetType::Barren, "", None);

    Galaxy {
        universe,
        content: content(),
        sol,
        vega,
        rigel,
        earth,
        kronos,
        tau,
    }
}

impl Galaxy {
    /// Run `effect` on `target` with `source` as source object.
    pub fn run_from(&mut self, effect: &Effect, source: ObjectId, target: ObjectId) {
        let mut ctx = ScriptingContext::new(&mut self.universe, &self.content, &StarlanePathfinder)
            .with_source(source)
            .with_target(target);
        effect.execute(&mut ctx);
    }

    /// Run `effect` on `target` with the Terran homeworld as source.
    pub fn run(&mut self, effect: &Effect, target: ObjectId) {
        self.run_from(effect, self.earth, target);
    }

    pub fn obj(&self, id: ObjectId) -> &UniverseObject {
        self.universe.get(id).expect("object exists")
    }

    /// Ids of every object of `kind`, ascending.
    pub fn ids_of(&self, kind: UniverseObjectType) -> Vec<ObjectId> {
        self.universe.objects.ids_of_type(kind).collect()
    }

    /// Create a ship of `design` for `owner` at `at` through `CreateShip`.
    /// Returns the new ship's id.
    pub fn create_ship(&mut self, design: &str, owner: EmpireId, at: ObjectId) -> ObjectId {
        let before = self.ids_of(UniverseObjectType::Ship);
        let effect = Effect::CreateShip {
            design: ShipDesignRef::Name(ValueRef::Constant(design.into())),
            empire: Some(ValueRef::Constant(owner.raw())),
            species: None,
            name: None,
            effects_after: Vec::new(),
        };
        self.run(&effect, at);
        self.ids_of(UniverseObjectType::Ship)
            .into_iter()
            .find(|id| !before.contains(id))
            .expect("ship created")
    }

    /// The fleet holding `ship`.
    pub fn fleet_of(&self, ship: ObjectId) -> ObjectId {
        self.obj(ship).as_ship().expect("is a ship").fleet_id
    }
}

/// Check that containment is consistent in both directions and that no
/// fleet is empty.
pub fn assert_containment_consistent(universe: &Universe) {
    for obj in universe.objects.iter() {
        if obj.system_id.is_valid() {
            let system = universe
                .get(obj.system_id)
                .and_then(UniverseObject::as_system)
                .unwrap_or_else(|| panic!("{} names a missing system", obj.id));
            assert!(system.objects.contains(&obj.id), "{} missing from its system", obj.id);
        }

        match &obj.kind {
            ObjectKind::System(system) => {
                for &contained in &system.objects {
                    let inner = universe.get(contained).expect("contained object exists");
                    assert_eq!(inner.system_id, obj.id, "{} disagrees about its system", contained);
                }
                for &lane in &system.starlanes {
                    let other = universe
                        .get(lane)
                        .and_then(UniverseObject::as_system)
                        .expect("lane endpoint is a system");
                    assert!(other.starlanes.contains(&obj.id), "starlane not symmetric");
                }
            }
            ObjectKind::Fleet(fleet) => {
                assert!(!fleet.ships.is_empty(), "fleet {} is empty", obj.id);
                for &ship in &fleet.ships {
                    let data = universe
                        .get(ship)
                        .and_then(UniverseObject::as_ship)
                        .expect("fleet member is a ship");
                    assert_eq!(data.fleet_id, obj.id);
                }
            }
            ObjectKind::Ship(ship) => {
                let fleet = universe
                    .get(ship.fleet_id)
                    .unwrap_or_else(|| panic!("ship {} has no fleet", obj.id));
                assert!(fleet.as_fleet().expect("is a fleet").ships.contains(&obj.id));
                assert_eq!(fleet.system_id, obj.system_id);
                assert_eq!((fleet.x, fleet.y), (obj.x, obj.y));
            }
            ObjectKind::Planet(planet) => {
                for &building in &planet.buildings {
                    let data = universe
                        .get(building)
                        .and_then(UniverseObject::as_building)
                        .expect("planet holds a building");
                    assert_eq!(data.planet_id, obj.id);
                }
            }
            ObjectKind::Building(building) => {
                let planet = universe
                    .get(building.planet_id)
                    .and_then(UniverseObject::as_planet)
                    .expect("building is on a planet");
                assert!(planet.buildings.contains(&obj.id));
            }
            ObjectKind::Field(_) => {}
        }
    }
}
