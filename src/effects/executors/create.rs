//! Creation effects. Each inserts one object near the target and then runs
//! its follow-up effects with the new object as target.

use crate::core::{EffectError, EmpireId, Meter, MeterType, ObjectId, ALL_EMPIRES};
use crate::scripting::{ScriptingContext, Value, ValueRef};
use crate::universe::{
    Building, Field, ObjectKind, Planet, PlanetSize, PlanetType, Ship, ShipDesign, StarType, System,
    UniverseObject,
};

use super::super::effect::{Effect, ShipDesignRef};
use super::{eval_empire, run_effects_after, system_of, target, wrong_kind};

/// Upper-case roman numeral for `n` (1-based).
fn roman_numeral(mut n: usize) -> String {
    const NUMERALS: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// The target's system, or `NotInSystem`.
fn target_system(ctx: &ScriptingContext<'_>) -> Result<ObjectId, EffectError> {
    let obj = target(ctx)?;
    let system = system_of(obj);
    match ctx.universe.get(system) {
        Some(sys) if sys.as_system().is_some() => Ok(system),
        _ => Err(EffectError::NotInSystem(obj.id)),
    }
}

pub(crate) fn create_planet(
    ctx: &mut ScriptingContext<'_>,
    planet_type: &ValueRef<PlanetType>,
    size: &ValueRef<PlanetSize>,
    name: Option<&ValueRef<String>>,
    effects_after: &[Effect],
) -> Result<(), EffectError> {
    let system = target_system(ctx)?;
    let id = ctx.target;
    let (current_type, current_size) = ctx
        .target_object()
        .and_then(UniverseObject::as_planet)
        .map_or((PlanetType::Invalid, PlanetSize::Invalid), |p| (p.planet_type, p.size));

    let size = ctx.scoped(id, Some(Value::PlanetSize(current_size)), |ctx| size.eval(ctx));
    let planet_type = ctx.scoped(id, Some(Value::PlanetType(current_type)), |ctx| planet_type.eval(ctx));
    if size == PlanetSize::Invalid || planet_type == PlanetType::Invalid {
        return Err(EffectError::InvalidParameter(format!(
            "cannot create planet of type {planet_type:?} and size {size:?}"
        )));
    }

    let (system_name, orbit, x, y) = {
        let sys = ctx.universe.get(system).ok_or(EffectError::NotInSystem(id))?;
        let orbit = sys
            .as_system()
            .and_then(|data| data.free_orbits().first().copied())
            .ok_or(EffectError::NoFreeOrbit(system))?;
        (sys.name.clone(), orbit, sys.x, sys.y)
    };

    let name = match name {
        Some(name) => name.eval(ctx),
        None => format!("{system_name} {}", roman_numeral(orbit + 1)),
    };
    let planet = ctx
        .universe
        .insert(UniverseObject::new(name, x, y, ObjectKind::Planet(Planet::new(planet_type, size))));
    ctx.universe.add_to_system(system, planet);
    tracing::debug!(planet = %planet, system = %system, ?planet_type, ?size, "created planet");

    run_effects_after(ctx, planet, effects_after);
    Ok(())
}

pub(crate) fn create_building(
    ctx: &mut ScriptingContext<'_>,
    building_type: &ValueRef<String>,
    name: Option<&ValueRef<String>>,
    effects_after: &[Effect],
) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    let location = match (&obj.kind, obj.as_building()) {
        (ObjectKind::Planet(_), _) => obj.id,
        (_, Some(building)) if ctx.universe.get(building.planet_id).is_some_and(|p| p.as_planet().is_some()) => {
            building.planet_id
        }
        _ => return Err(wrong_kind("CreateBuilding", obj)),
    };

    let type_name = building_type.eval(ctx);
    let content = ctx.content;
    let Some(definition) = content.building_type(&type_name) else {
        return Err(EffectError::missing_content("building type", type_name));
    };

    let (owner, system) = ctx
        .universe
        .get(location)
        .map(|planet| (planet.owner, planet.system_id))
        .ok_or(EffectError::MissingTarget(location))?;
    let name = match name {
        Some(name) => name.eval(ctx),
        None => definition.name.clone(),
    };

    let data = Building {
        building_type: definition.name.clone(),
        planet_id: location,
    };
    let (x, y) = ctx.universe.get(location).map_or((0.0, 0.0), |p| (p.x, p.y));
    let building = ctx
        .universe
        .insert(UniverseObject::new(name, x, y, ObjectKind::Building(data)).with_owner(owner));
    ctx.universe.add_building_to_planet(location, building);
    if system.is_valid() {
        ctx.universe.add_to_system(system, building);
    }
    tracing::debug!(building = %building, planet = %location, building_type = %type_name, "created building");

    run_effects_after(ctx, building, effects_after);
    Ok(())
}

/// Ship meters initialised from a design's base stats.
fn design_meters(design: &ShipDesign) -> [(MeterType, f64); 9] {
    [
        (MeterType::MaxStructure, design.structure),
        (MeterType::Structure, design.structure),
        (MeterType::MaxFuel, design.fuel),
        (MeterType::Fuel, design.fuel),
        (MeterType::MaxShield, design.shields),
        (MeterType::Shield, design.shields),
        (MeterType::Detection, design.detection),
        (MeterType::Speed, design.speed),
        (MeterType::Stealth, design.stealth),
    ]
}

pub(crate) fn create_ship(
    ctx: &mut ScriptingContext<'_>,
    design: &ShipDesignRef,
    empire: Option<&ValueRef<i32>>,
    species: Option<&ValueRef<String>>,
    name: Option<&ValueRef<String>>,
    effects_after: &[Effect],
) -> Result<(), EffectError> {
    let system = target_system(ctx)?;
    let content = ctx.content;

    let design = match design {
        ShipDesignRef::Id(id) => {
            let id = id.eval(ctx);
            content
                .design(id)
                .ok_or_else(|| EffectError::missing_content("ship design", id.to_string()))?
        }
        ShipDesignRef::Name(name) => {
            let name = name.eval(ctx);
            content
                .design_by_name(&name)
                .ok_or_else(|| EffectError::missing_content("ship design", name))?
        }
    };

    let owner = empire.map_or(ALL_EMPIRES, |empire| eval_empire(ctx, empire));
    if owner != ALL_EMPIRES && !ctx.universe.empires.contains(owner) {
        return Err(EffectError::UnknownEmpire(owner));
    }

    let species = species.map(|species| species.eval(ctx)).unwrap_or_default();
    if !species.is_empty() && content.species(&species).is_none() {
        return Err(EffectError::missing_content("species", species));
    }

    let mut data = Ship::new(design.id);
    data.species = species;
    data.monster = design.monster;
    for part_name in &design.parts {
        let Some(part) = content.part(part_name) else {
            tracing::warn!(design = %design.name, part = %part_name, "design names an unknown part");
            continue;
        };
        if part.is_weapon() {
            data.weapon_parts.insert(part.name.clone());
        }
        data.part_meters.insert(
            part.name.clone(),
            [
                (MeterType::MaxCapacity, Meter::new(part.capacity)),
                (MeterType::Capacity, Meter::new(part.capacity)),
            ]
            .into_iter()
            .collect(),
        );
    }

    let name = match name {
        Some(name) => name.eval(ctx),
        None => new_ship_name(ctx, design, owner),
    };

    let (x, y) = ctx.universe.get(system).map_or((0.0, 0.0), |sys| (sys.x, sys.y));
    let mut ship = UniverseObject::new(name, x, y, ObjectKind::Ship(data)).with_owner(owner);
    for (meter, value) in design_meters(design) {
        ship.meters.entry(meter).or_default().set_current(value);
    }
    ship.back_propagate_meters();

    let ship = ctx.universe.insert(ship);
    if let Some(empire) = ctx.universe.empires.get_mut(owner) {
        empire.add_known_design(design.id);
    }
    let fleet = ctx.universe.create_new_fleet_in_system(system, ship, None);
    tracing::debug!(ship = %ship, ?fleet, design = %design.name, owner = %owner, "created ship");

    run_effects_after(ctx, ship, effects_after);
    Ok(())
}

fn new_ship_name(ctx: &mut ScriptingContext<'_>, design: &ShipDesign, owner: EmpireId) -> String {
    if design.monster {
        return ctx.universe.new_monster_name();
    }
    match ctx.universe.empires.get_mut(owner) {
        Some(empire) => empire.new_ship_name(),
        None => design.name.clone(),
    }
}

pub(crate) fn create_field(
    ctx: &mut ScriptingContext<'_>,
    field_type: &ValueRef<String>,
    x: Option<&ValueRef<f64>>,
    y: Option<&ValueRef<f64>>,
    size: Option<&ValueRef<f64>>,
    name: Option<&ValueRef<String>>,
    effects_after: &[Effect],
) -> Result<(), EffectError> {
    let (target_id, target_x, target_y, target_is_system) = {
        let obj = target(ctx)?;
        (obj.id, obj.x, obj.y, obj.as_system().is_some())
    };

    let type_name = field_type.eval(ctx);
    let content = ctx.content;
    let Some(definition) = content.field_type(&type_name) else {
        return Err(EffectError::missing_content("field type", type_name));
    };

    let config = ctx.universe.config();
    let (min, max) = (config.field_min_size, config.field_max_size);
    let requested = size.map_or(config.field_default_size, |size| size.eval(ctx));
    let size = requested.clamp(min, max);
    if size != requested {
        tracing::warn!(requested, size, "field size out of range; clamped");
    }

    let fx = x.map_or(target_x, |x| x.eval(ctx));
    let fy = y.map_or(target_y, |y| y.eval(ctx));
    let name = match name {
        Some(name) => name.eval(ctx),
        None => definition.name.clone(),
    };

    let mut field = UniverseObject::new(
        name,
        fx,
        fy,
        ObjectKind::Field(Field {
            field_type: definition.name.clone(),
        }),
    );
    if let Some(meter) = field.meter_mut(MeterType::Size) {
        *meter = Meter::new(size);
    }
    if let Some(meter) = field.meter_mut(MeterType::Stealth) {
        *meter = Meter::new(definition.stealth);
    }
    let field = ctx.universe.insert(field);

    if target_is_system && fx == target_x && fy == target_y {
        ctx.universe.add_to_system(target_id, field);
    }
    tracing::debug!(field = %field, field_type = %definition.name, size, "created field");

    run_effects_after(ctx, field, effects_after);
    Ok(())
}

pub(crate) fn create_system(
    ctx: &mut ScriptingContext<'_>,
    star_type: Option<&ValueRef<StarType>>,
    x: Option<&ValueRef<f64>>,
    y: Option<&ValueRef<f64>>,
    name: Option<&ValueRef<String>>,
    effects_after: &[Effect],
) -> Result<(), EffectError> {
    let star = match star_type {
        Some(star_type) => star_type.eval(ctx),
        None => {
            let types = StarType::GENERATABLE;
            let index = ctx.universe.rng_mut().gen_range_usize(0..types.len());
            types[index]
        }
    };
    let sx = x.map_or(0.0, |x| x.eval(ctx));
    let sy = y.map_or(0.0, |y| y.eval(ctx));
    let name = match name {
        Some(name) => name.eval(ctx),
        None => ctx.universe.generate_system_name(),
    };

    let orbits = ctx.universe.config().default_orbits;
    let system = ctx
        .universe
        .insert(UniverseObject::new(name, sx, sy, ObjectKind::System(System::new(star, orbits))));
    tracing::debug!(system = %system, ?star, x = sx, y = sy, "created system");

    run_effects_after(ctx, system, effects_after);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::fixture::{world, TERRANS};
    use super::*;
    use crate::core::INVALID_OBJECT_ID;
    use crate::effects::Effect;
    use crate::scripting::Property;
    use crate::universe::FleetAggression;

    #[test]
    fn test_roman_numerals() {
        assert_eq!(roman_numeral(1), "I");
        assert_eq!(roman_numeral(4), "IV");
        assert_eq!(roman_numeral(9), "IX");
        assert_eq!(roman_numeral(14), "XIV");
    }

    fn planet_effect() -> Effect {
        Effect::CreatePlanet {
            planet_type: ValueRef::Constant(PlanetType::Tundra),
            size: ValueRef::Constant(PlanetSize::Large),
            name: None,
            effects_after: Vec::new(),
        }
    }

    #[test]
    fn test_create_planet_takes_free_orbit() {
        let mut w = world();
        w.run(&planet_effect(), w.earth);

        let sol = w.obj(w.sol).as_system().unwrap();
        let new = sol.orbits[2];
        assert!(new.is_valid());
        assert_eq!(w.obj(new).name, "Sol III");
        assert_eq!(w.obj(new).system_id, w.sol);

        // Sol is now full.
        let before = w.universe.objects.len();
        w.run(&planet_effect(), w.sol);
        assert_eq!(w.universe.objects.len(), before);
    }

    #[test]
    fn test_create_planet_uses_target_as_current_value() {
        let mut w = world();
        let effect = Effect::CreatePlanet {
            planet_type: ValueRef::CurrentValue,
            size: ValueRef::CurrentValue,
            name: Some(ValueRef::Constant("Twin".into())),
            effects_after: Vec::new(),
        };
        w.run(&effect, w.mars);
        let twin = w.obj(w.sol).as_system().unwrap().orbits[2];
        let data = w.obj(twin).as_planet().unwrap();
        assert_eq!((data.planet_type, data.size), (PlanetType::Barren, PlanetSize::Small));

        // A system has no planet values to copy, so nothing is created.
        let before = w.universe.objects.len();
        w.run(&effect, w.vega);
        assert_eq!(w.universe.objects.len(), before);
    }

    #[test]
    fn test_create_building() {
        let mut w = world();
        let effect = Effect::create_building("BLD_SHIPYARD_BASE")
            .then([Effect::add_special("SHIPYARD_MARKER")]);
        w.run(&effect, w.earth);

        let building = *w.obj(w.earth).as_planet().unwrap().buildings.iter().next().unwrap();
        let obj = w.obj(building);
        assert_eq!(obj.owner, TERRANS);
        assert_eq!(obj.system_id, w.sol);
        assert_eq!(obj.as_building().unwrap().planet_id, w.earth);
        assert!(obj.has_special("SHIPYARD_MARKER"));

        // On a building: same planet.
        w.run(&Effect::create_building("BLD_SHIPYARD_BASE"), building);
        assert_eq!(w.obj(w.earth).as_planet().unwrap().buildings.len(), 2);

        // Unknown type.
        w.run(&Effect::create_building("BLD_MISSING"), w.earth);
        assert_eq!(w.obj(w.earth).as_planet().unwrap().buildings.len(), 2);
    }

    #[test]
    fn test_create_ship_forms_fleet() {
        let mut w = world();
        w.run(&Effect::create_ship("SD_WARSHIP"), w.earth);

        let ships: Vec<ObjectId> = w.universe.objects.ids_of_type(crate::universe::UniverseObjectType::Ship).collect();
        let fleets: Vec<ObjectId> = w.universe.objects.ids_of_type(crate::universe::UniverseObjectType::Fleet).collect();
        assert_eq!((ships.len(), fleets.len()), (1, 1));

        let ship = w.obj(ships[0]);
        let fleet = w.obj(fleets[0]);
        assert_eq!(ship.owner, TERRANS);
        assert_eq!(ship.name, "Terrans Ship 1");
        assert_eq!(ship.meter_value(MeterType::Structure), Some(40.0));
        assert_eq!(ship.meter(MeterType::Structure).unwrap().initial(), 40.0);
        assert_eq!((fleet.x, fleet.y), (0.0, 0.0));
        assert_eq!(fleet.system_id, w.sol);
        assert_eq!(fleet.as_fleet().unwrap().aggression, FleetAggression::Aggressive);
        assert!(w.universe.empires.get(TERRANS).unwrap().knows_design(2));
    }

    #[test]
    fn test_create_ship_naming_and_validation() {
        let mut w = world();
        let monster = Effect::CreateShip {
            design: ShipDesignRef::Id(ValueRef::Constant(3)),
            empire: None,
            species: None,
            name: None,
            effects_after: Vec::new(),
        };
        w.run(&monster, w.vega);
        let kraken = w.universe.objects.ids_of_type(crate::universe::UniverseObjectType::Ship).next().unwrap();
        assert_eq!(w.obj(kraken).name, "Monster 1");
        assert!(w.obj(kraken).is_unowned());

        let before = w.universe.objects.len();
        let bad_species = Effect::CreateShip {
            design: ShipDesignRef::Name(ValueRef::Constant("SD_SCOUT".into())),
            empire: None,
            species: Some(ValueRef::Constant("SP_UNKNOWN".into())),
            name: None,
            effects_after: Vec::new(),
        };
        w.run(&bad_species, w.vega);
        let bad_empire = Effect::CreateShip {
            design: ShipDesignRef::Name(ValueRef::Constant("SD_SCOUT".into())),
            empire: Some(ValueRef::Constant(9)),
            species: None,
            name: None,
            effects_after: Vec::new(),
        };
        w.run(&bad_empire, w.vega);
        assert_eq!(w.universe.objects.len(), before);

        let scout = Effect::CreateShip {
            design: ShipDesignRef::Name(ValueRef::Constant("SD_SCOUT".into())),
            empire: None,
            species: None,
            name: None,
            effects_after: Vec::new(),
        };
        w.run(&scout, w.vega);
        let named: Vec<String> = w
            .universe
            .objects
            .iter()
            .filter(|o| o.as_ship().is_some())
            .map(|o| o.name.clone())
            .collect();
        assert!(named.contains(&"SD_SCOUT".to_string()));
    }

    #[test]
    fn test_create_field() {
        let mut w = world();
        let effect = Effect::CreateField {
            field_type: ValueRef::Constant("FLD_ION_STORM".into()),
            x: None,
            y: None,
            size: Some(ValueRef::Constant(50000.0)),
            name: None,
            effects_after: Vec::new(),
        };
        w.run(&effect, w.vega);

        let field = w.universe.objects.ids_of_type(crate::universe::UniverseObjectType::Field).next().unwrap();
        let obj = w.obj(field);
        assert_eq!(obj.name, "FLD_ION_STORM");
        assert_eq!(obj.meter_value(MeterType::Size), Some(10000.0));
        assert_eq!(obj.system_id, w.vega);

        let offset = Effect::CreateField {
            field_type: ValueRef::Constant("FLD_ION_STORM".into()),
            x: Some(ValueRef::Constant(40.0)),
            y: None,
            size: None,
            name: None,
            effects_after: Vec::new(),
        };
        w.run(&offset, w.vega);
        let outside = w
            .universe
            .objects
            .iter()
            .find(|o| o.as_field().is_some() && o.id != field)
            .unwrap();
        assert_eq!((outside.x, outside.y), (40.0, 0.0));
        assert_eq!(outside.system_id, INVALID_OBJECT_ID);
        assert_eq!(outside.meter_value(MeterType::Size), Some(10.0));
    }

    #[test]
    fn test_create_system_names_and_follow_up() {
        let mut w = world();
        let effect = Effect::CreateSystem {
            star_type: None,
            x: Some(ValueRef::Constant(50.0)),
            y: Some(ValueRef::target(Property::Y)),
            name: None,
            effects_after: vec![Effect::SetStarType {
                star_type: ValueRef::Constant(StarType::Neutron),
            }],
        };
        w.run(&effect, w.earth);

        let created = w
            .universe
            .objects
            .iter()
            .find(|o| o.as_system().is_some() && o.id != w.sol && o.id != w.vega)
            .unwrap();
        assert_eq!(created.name, "Rigel");
        assert_eq!((created.x, created.y), (50.0, 0.0));
        assert_eq!(created.as_system().unwrap().star, StarType::Neutron);
        assert_eq!(created.as_system().unwrap().orbits.len(), 7);
    }
}
