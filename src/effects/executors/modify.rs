//! In-place changes to a target's properties: type, species, owner,
//! specials, starlanes, textures, destruction.

use crate::core::{EffectError, ObjectId, ALL_EMPIRES};
use crate::scripting::{Condition, ScriptingContext, Value, ValueRef};
use crate::universe::{FleetAggression, PlanetSize, PlanetType, StarType, UniverseObject};

use super::{eval_empire, system_of, target, wrong_kind};

pub(crate) fn set_empire_capital(ctx: &mut ScriptingContext<'_>, empire: &ValueRef<i32>) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    if obj.as_planet().is_none() {
        return Err(wrong_kind("SetEmpireCapital", obj));
    }
    let planet = obj.id;
    let empire_id = eval_empire(ctx, empire);
    let empire = ctx
        .universe
        .empires
        .get_mut(empire_id)
        .ok_or(EffectError::UnknownEmpire(empire_id))?;
    empire.set_capital(planet);
    Ok(())
}

pub(crate) fn set_planet_type(ctx: &mut ScriptingContext<'_>, planet_type: &ValueRef<PlanetType>) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    let Some(current) = obj.as_planet().map(|p| p.planet_type) else {
        return Err(wrong_kind("SetPlanetType", obj));
    };
    let id = obj.id;
    let new_type = ctx.scoped(id, Some(Value::PlanetType(current)), |ctx| planet_type.eval(ctx));
    if new_type == PlanetType::Invalid {
        tracing::debug!(planet = %id, "not changing to an invalid planet type");
        return Ok(());
    }
    if let Some(planet) = ctx.universe.get_mut(id).and_then(UniverseObject::as_planet_mut) {
        planet.set_type(new_type);
    }
    Ok(())
}

pub(crate) fn set_planet_size(ctx: &mut ScriptingContext<'_>, size: &ValueRef<PlanetSize>) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    let Some(current) = obj.as_planet().map(|p| p.size) else {
        return Err(wrong_kind("SetPlanetSize", obj));
    };
    let id = obj.id;
    let new_size = ctx.scoped(id, Some(Value::PlanetSize(current)), |ctx| size.eval(ctx));
    if new_size == PlanetSize::Invalid {
        tracing::debug!(planet = %id, "not changing to an invalid planet size");
        return Ok(());
    }
    if let Some(planet) = ctx.universe.get_mut(id).and_then(UniverseObject::as_planet_mut) {
        planet.set_size(new_size);
    }
    Ok(())
}

/// Change a planet's or ship's species. Planets keep a focus their new
/// species allows, else switch to its default focus, else to its first.
pub(crate) fn set_species(ctx: &mut ScriptingContext<'_>, species: &ValueRef<String>) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    let Some(current) = obj.species().map(str::to_string) else {
        return Err(wrong_kind("SetSpecies", obj));
    };
    let id = obj.id;
    let name = ctx.scoped(id, Some(Value::Text(current)), |ctx| species.eval(ctx));
    let content = ctx.content;
    let definition = content.species(&name);

    let Some(obj) = ctx.universe.get_mut(id) else {
        return Err(EffectError::MissingTarget(id));
    };
    if let Some(ship) = obj.as_ship_mut() {
        ship.species = name;
        return Ok(());
    }
    if let Some(planet) = obj.as_planet_mut() {
        let foci = definition.map(|def| def.foci.as_slice()).unwrap_or_default();
        if !foci.contains(&planet.focus) {
            planet.focus = match definition {
                Some(def) if def.has_focus(&def.default_focus) => def.default_focus.clone(),
                _ => foci.first().cloned().unwrap_or_default(),
            };
        }
        planet.species = name;
    }
    Ok(())
}

pub(crate) fn set_owner(ctx: &mut ScriptingContext<'_>, empire: &ValueRef<i32>) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    let (id, initial) = (obj.id, obj.owner);
    let new_owner = ctx
        .scoped(id, Some(Value::Int(initial.raw())), |ctx| eval_empire(ctx, empire));
    if new_owner == initial {
        return Ok(());
    }
    tracing::debug!(object = %id, from = %initial, to = %new_owner, "changing owner");
    ctx.universe.set_owner(id, new_owner);
    Ok(())
}

pub(crate) fn set_star_type(ctx: &mut ScriptingContext<'_>, star_type: &ValueRef<StarType>) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    let Some(current) = obj.as_system().map(|s| s.star) else {
        return Err(wrong_kind("SetStarType", obj));
    };
    let id = obj.id;
    let star = ctx.scoped(id, Some(Value::StarType(current)), |ctx| star_type.eval(ctx));
    if star == StarType::Invalid {
        return Ok(());
    }
    if let Some(system) = ctx.universe.get_mut(id).and_then(UniverseObject::as_system_mut) {
        system.star = star;
    }
    Ok(())
}

pub(crate) fn set_species_empire_opinion(
    ctx: &mut ScriptingContext<'_>,
    species: &ValueRef<String>,
    empire: &ValueRef<i32>,
    opinion: &ValueRef<f64>,
) -> Result<(), EffectError> {
    let empire_id = eval_empire(ctx, empire);
    let species = species.eval(ctx);
    if empire_id == ALL_EMPIRES || species.is_empty() {
        return Ok(());
    }
    let current = ctx.universe.species.empire_opinion(&species, empire_id);
    let value = ctx.scoped(ctx.target, Some(Value::Double(current)), |ctx| opinion.eval(ctx));
    ctx.universe.species.set_empire_opinion(&species, empire_id, value);
    Ok(())
}

pub(crate) fn set_species_species_opinion(
    ctx: &mut ScriptingContext<'_>,
    opinionated: &ValueRef<String>,
    rated: &ValueRef<String>,
    opinion: &ValueRef<f64>,
) -> Result<(), EffectError> {
    let opinionated = opinionated.eval(ctx);
    let rated = rated.eval(ctx);
    if opinionated.is_empty() || rated.is_empty() {
        return Ok(());
    }
    let current = ctx.universe.species.species_opinion(&opinionated, &rated);
    let value = ctx.scoped(ctx.target, Some(Value::Double(current)), |ctx| opinion.eval(ctx));
    ctx.universe.species.set_species_opinion(&opinionated, &rated, value);
    Ok(())
}

pub(crate) fn destroy(ctx: &mut ScriptingContext<'_>) -> Result<(), EffectError> {
    let id = ctx.target;
    if !ctx.universe.destroy(id, ctx.source) {
        return Err(EffectError::MissingTarget(id));
    }
    Ok(())
}

// === Specials ===

pub(crate) fn add_special(
    ctx: &mut ScriptingContext<'_>,
    name: &ValueRef<String>,
    capacity: Option<&ValueRef<f64>>,
) -> Result<(), EffectError> {
    let id = target(ctx)?.id;
    let name = name.eval(ctx);
    if name.is_empty() {
        return Err(EffectError::InvalidParameter("empty special name".into()));
    }
    let existing = ctx.universe.get(id).and_then(|obj| obj.special_capacity(&name)).unwrap_or(0.0);
    let capacity = match capacity {
        Some(capacity) => ctx.scoped(id, Some(Value::Double(existing)), |ctx| capacity.eval(ctx)),
        None => existing,
    };
    let turn = ctx.current_turn();
    if let Some(obj) = ctx.universe.get_mut(id) {
        obj.add_special(name, turn, capacity);
    }
    Ok(())
}

pub(crate) fn remove_special(ctx: &mut ScriptingContext<'_>, name: &ValueRef<String>) -> Result<(), EffectError> {
    let id = target(ctx)?.id;
    let name = name.eval(ctx);
    if let Some(obj) = ctx.universe.get_mut(id) {
        obj.remove_special(&name);
    }
    Ok(())
}

// === Starlanes ===

/// Add or remove lanes between the target's system and the systems of
/// every object matching `endpoints`.
pub(crate) fn edit_starlanes(ctx: &mut ScriptingContext<'_>, endpoints: &Condition, add: bool) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    let system = system_of(obj);
    if !system.is_valid() {
        return Err(EffectError::NotInSystem(obj.id));
    }

    let others: Vec<ObjectId> = endpoints
        .eval(ctx, None)
        .into_iter()
        .filter_map(|id| ctx.universe.get(id).map(system_of))
        .filter(|&other| other.is_valid() && other != system)
        .collect();

    for other in others {
        if add {
            ctx.universe.add_starlane(system, other);
        } else {
            ctx.universe.remove_starlane(system, other);
        }
    }
    Ok(())
}

// === Fleets ===

pub(crate) fn set_aggression(ctx: &mut ScriptingContext<'_>, aggression: FleetAggression) -> Result<(), EffectError> {
    let id = ctx.target;
    let obj = ctx.universe.get_mut(id).ok_or(EffectError::MissingTarget(id))?;
    match obj.as_fleet_mut() {
        Some(fleet) => {
            fleet.aggression = aggression;
            Ok(())
        }
        None => Err(wrong_kind("SetAggression", obj)),
    }
}

// === Appearance ===

pub(crate) fn set_overlay_texture(
    ctx: &mut ScriptingContext<'_>,
    texture: &str,
    size: Option<&ValueRef<f64>>,
) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    if obj.as_system().is_none() {
        return Err(wrong_kind("SetOverlayTexture", obj));
    }
    let id = obj.id;
    let size = size.map_or(1.0, |size| size.eval(ctx));
    if let Some(system) = ctx.universe.get_mut(id).and_then(UniverseObject::as_system_mut) {
        system.overlay_texture = texture.to_string();
        system.overlay_size = size;
    }
    Ok(())
}

pub(crate) fn set_texture(ctx: &mut ScriptingContext<'_>, texture: &str) -> Result<(), EffectError> {
    let id = ctx.target;
    let obj = ctx.universe.get_mut(id).ok_or(EffectError::MissingTarget(id))?;
    match obj.as_planet_mut() {
        Some(planet) => {
            planet.surface_texture = texture.to_string();
            Ok(())
        }
        None => Err(wrong_kind("SetTexture", obj)),
    }
}
