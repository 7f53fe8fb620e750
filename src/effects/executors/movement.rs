//! Movement effects.
//!
//! Every move keeps containment consistent: objects leave the system they
//! were in unless they end up in it again, ships always end in a fleet,
//! and moved fleets have their route recomputed from where they landed.

use crate::core::{EffectError, ObjectId, RouteError, INVALID_OBJECT_ID};
use crate::scripting::{Condition, ScriptingContext, Value, ValueRef};
use crate::universe::{FleetAggression, ObjectKind, Universe, UniverseObject, UniverseObjectType};

use super::super::effect::FocalPoint;
use super::{first_match, system_of, target, wrong_kind};

fn eval_speed(ctx: &ScriptingContext<'_>, speed: Option<&ValueRef<f64>>) -> f64 {
    speed.map_or(1.0, |speed| speed.eval(ctx))
}

/// Coordinates a focal point resolves to.
fn focal_position(ctx: &mut ScriptingContext<'_>, focal: &FocalPoint) -> Result<(f64, f64), EffectError> {
    match focal {
        FocalPoint::Object(condition) => {
            let id = first_match(ctx, condition).ok_or(EffectError::NoDestination)?;
            let obj = ctx.universe.get(id).ok_or(EffectError::NoDestination)?;
            Ok((obj.x, obj.y))
        }
        FocalPoint::Position { x, y } => {
            let id = ctx.target;
            let (tx, ty) = ctx.target_object().map_or((0.0, 0.0), |obj| (obj.x, obj.y));
            let x = x
                .as_ref()
                .map_or(0.0, |x| ctx.scoped(id, Some(Value::Double(tx)), |ctx| x.eval(ctx)));
            let y = y
                .as_ref()
                .map_or(0.0, |y| ctx.scoped(id, Some(Value::Double(ty)), |ctx| y.eval(ctx)));
            Ok((x, y))
        }
    }
}

/// Take a fleet and its ships out of any system and put them at `(x, y)`.
fn move_fleet_to(universe: &mut Universe, fleet: ObjectId, x: f64, y: f64) {
    let ships: Vec<ObjectId> = universe.get(fleet).map(UniverseObject::contained_ids).unwrap_or_default();
    for id in ships.into_iter().chain([fleet]) {
        universe.remove_from_system(id);
        universe.set_position(id, x, y);
    }
}

/// Put a fleet and its ships into `system`.
fn insert_fleet(universe: &mut Universe, system: ObjectId, fleet: ObjectId) {
    let ships: Vec<ObjectId> = universe.get(fleet).map(UniverseObject::contained_ids).unwrap_or_default();
    for id in ships.into_iter().chain([fleet]) {
        universe.add_to_system(system, id);
    }
}

/// Recompute a moved fleet's route. A fleet with nowhere to start from
/// simply keeps no route.
fn reroute(ctx: &mut ScriptingContext<'_>, fleet: ObjectId, next: ObjectId, prev: ObjectId) -> Result<(), EffectError> {
    match ctx.universe.update_fleet_route(fleet, next, prev, ctx.pathfinder) {
        Err(RouteError::NoStartSystem(_)) => {
            tracing::debug!(fleet = %fleet, "fleet left its system; no route to update");
            Ok(())
        }
        other => other.map_err(EffectError::from),
    }
}

/// The aggression a split-off armed ship carries over from its old fleet.
fn inherited_aggression(universe: &Universe, ship: ObjectId) -> Option<FleetAggression> {
    let data = universe.get(ship).and_then(UniverseObject::as_ship)?;
    if !data.is_armed() {
        return None;
    }
    universe
        .get(data.fleet_id)
        .and_then(UniverseObject::as_fleet)
        .map(|fleet| fleet.aggression)
}

/// Split `ship` off into a new fleet at `(x, y)`, or in `system` if given.
fn split_ship(
    universe: &mut Universe,
    ship: ObjectId,
    system: Option<ObjectId>,
    (x, y): (f64, f64),
    aggression: Option<FleetAggression>,
) -> Option<ObjectId> {

    match system {
        Some(system) => {
            let fleet = universe.create_new_fleet_in_system(system, ship, aggression);
            universe.explore_system(system, ship);
            fleet
        }
        None => universe.create_new_fleet_at(x, y, ship, aggression),
    }
}

fn valid_system(universe: &Universe, id: ObjectId) -> Option<ObjectId> {
    universe
        .get(id)
        .filter(|obj| obj.as_system().is_some())
        .map(|obj| obj.id)
}

// === MoveTo ===

struct Destination {
    id: ObjectId,
    x: f64,
    y: f64,
    system: Option<ObjectId>,
    kind: UniverseObjectType,
    /// The destination fleet, or the fleet of a destination ship.
    fleet: Option<ObjectId>,
    /// The destination planet, or the planet of a destination building.
    planet: Option<ObjectId>,
}

impl Destination {
    fn resolve(universe: &Universe, id: ObjectId) -> Option<Self> {
        let obj = universe.get(id)?;
        let fleet = match &obj.kind {
            ObjectKind::Fleet(_) => Some(obj.id),
            ObjectKind::Ship(ship) => universe.get(ship.fleet_id).map(|fleet| fleet.id),
            _ => None,
        };
        let planet = match &obj.kind {
            ObjectKind::Planet(_) => Some(obj.id),
            ObjectKind::Building(building) => universe
                .get(building.planet_id)
                .filter(|planet| planet.as_planet().is_some())
                .map(|planet| planet.id),
            _ => None,
        };
        Some(Self {
            id,
            x: obj.x,
            y: obj.y,
            system: valid_system(universe, system_of(obj)),
            kind: obj.object_type(),
            fleet,
            planet,
        })
    }
}

pub(crate) fn move_to(ctx: &mut ScriptingContext<'_>, destination: &Condition) -> Result<(), EffectError> {
    let id = target(ctx)?.id;
    let dest_id = first_match(ctx, destination).ok_or(EffectError::NoDestination)?;
    let dest = Destination::resolve(ctx.universe, dest_id).ok_or(EffectError::NoDestination)?;

    let Some(obj) = ctx.universe.get(id) else {
        return Err(EffectError::MissingTarget(id));
    };
    match obj.object_type() {
        UniverseObjectType::Fleet => move_fleet(ctx, id, &dest),
        UniverseObjectType::Ship => move_ship(ctx, id, &dest),
        UniverseObjectType::Planet => move_planet(ctx, id, &dest),
        UniverseObjectType::Building => move_building(ctx, id, &dest),
        UniverseObjectType::System => move_system(ctx, id, &dest),
        UniverseObjectType::Field => {
            let universe = &mut *ctx.universe;
            universe.remove_from_system(id);
            universe.set_position(id, dest.x, dest.y);
            if dest.kind == UniverseObjectType::System {
                universe.add_to_system(dest.id, id);
            }
            Ok(())
        }
    }
}

fn move_fleet(ctx: &mut ScriptingContext<'_>, fleet: ObjectId, dest: &Destination) -> Result<(), EffectError> {
    let current_system = ctx.universe.get(fleet).map_or(INVALID_OBJECT_ID, |obj| obj.system_id);

    if let Some(system) = dest.system {
        if current_system == system {
            return Ok(());
        }
        insert_fleet(ctx.universe, system, fleet);
        ctx.universe.explore_system(system, fleet);
        return reroute(ctx, fleet, INVALID_OBJECT_ID, INVALID_OBJECT_ID);
    }

    move_fleet_to(ctx.universe, fleet, dest.x, dest.y);
    let lanes = dest
        .fleet
        .and_then(|id| ctx.universe.get(id))
        .and_then(UniverseObject::as_fleet)
        .map(|data| (data.next_system, data.prev_system));
    match lanes {
        Some((next, prev)) => reroute(ctx, fleet, next, prev),
        None => {
            tracing::error!(fleet = %fleet, destination = %dest.id, "moved fleet has no lane to follow");
            Ok(())
        }
    }
}

fn move_ship(ctx: &mut ScriptingContext<'_>, ship: ObjectId, dest: &Destination) -> Result<(), EffectError> {
    let (old_system, old_x, old_y, owner, old_fleet) = {
        let obj = ctx.universe.get(ship).ok_or(EffectError::MissingTarget(ship))?;
        let data = obj.as_ship().ok_or_else(|| wrong_kind("MoveTo", obj))?;
        (obj.system_id, obj.x, obj.y, obj.owner, data.fleet_id)
    };
    if dest.fleet == Some(old_fleet) {
        return Ok(());
    }
    let stays = (old_system.is_valid() && dest.system == Some(old_system))
        || (dest.system.is_none() && old_x == dest.x && old_y == dest.y);

    let universe = &mut *ctx.universe;
    if dest.system != Some(old_system) || !old_system.is_valid() {
        universe.remove_from_system(ship);
        match dest.system {
            Some(system) => {
                universe.add_to_system(system, ship);
            }
            None => universe.set_position(ship, dest.x, dest.y),
        }
    }

    let joinable = dest
        .fleet
        .filter(|&fleet| universe.get(fleet).is_some_and(|obj| obj.owner == owner));
    if let Some(fleet) = joinable {
        universe.move_ship_to_fleet(ship, fleet);
    } else if !stays {
        let aggression = inherited_aggression(universe, ship);
        split_ship(universe, ship, dest.system, (dest.x, dest.y), aggression);
    }
    universe.destroy_fleet_if_empty(old_fleet, INVALID_OBJECT_ID);
    Ok(())
}

fn move_planet(ctx: &mut ScriptingContext<'_>, planet: ObjectId, dest: &Destination) -> Result<(), EffectError> {
    let system = dest.system.ok_or(EffectError::NoDestination)?;
    let universe = &mut *ctx.universe;
    let (current, buildings) = universe
        .get(planet)
        .and_then(|obj| Some((obj.system_id, obj.as_planet()?.buildings.clone())))
        .ok_or(EffectError::MissingTarget(planet))?;
    if current == system {
        return Ok(());
    }
    let free = universe
        .get(system)
        .and_then(UniverseObject::as_system)
        .is_some_and(|data| !data.free_orbits().is_empty());
    if !free {
        return Err(EffectError::NoFreeOrbit(system));
    }

    universe.add_to_system(system, planet);
    for building in buildings {
        universe.add_to_system(system, building);
    }
    universe.explore_system(system, planet);
    Ok(())
}

fn move_building(ctx: &mut ScriptingContext<'_>, building: ObjectId, dest: &Destination) -> Result<(), EffectError> {
    let planet = dest.planet.ok_or(EffectError::NoDestination)?;
    let universe = &mut *ctx.universe;
    let current = universe
        .get(building)
        .and_then(UniverseObject::as_building)
        .map(|data| data.planet_id)
        .ok_or(EffectError::MissingTarget(building))?;
    if current == planet {
        return Ok(());
    }
    let planet_system = universe.get(planet).map_or(INVALID_OBJECT_ID, |obj| obj.system_id);
    let system = valid_system(universe, planet_system).ok_or(EffectError::NoDestination)?;

    universe.add_building_to_planet(planet, building);
    universe.add_to_system(system, building);
    universe.explore_system(system, building);
    Ok(())
}

fn move_system(ctx: &mut ScriptingContext<'_>, system: ObjectId, dest: &Destination) -> Result<(), EffectError> {
    if dest.system.is_some() {
        tracing::debug!(system = %system, destination = %dest.id, "cannot move a system into a system");
        return Ok(());
    }
    let universe = &mut *ctx.universe;
    let contents: Vec<ObjectId> = universe.get(system).map(UniverseObject::contained_ids).unwrap_or_default();
    for id in contents.into_iter().chain([system]) {
        universe.set_position(id, dest.x, dest.y);
    }

    if dest.kind == UniverseObjectType::Field {
        universe.add_to_system(system, dest.id);
    }
    let arrivals: Vec<ObjectId> = universe
        .objects
        .iter()
        .filter(|obj| matches!(obj.kind, ObjectKind::Fleet(_) | ObjectKind::Ship(_)))
        .filter(|obj| !obj.system_id.is_valid() && obj.x == dest.x && obj.y == dest.y)
        .map(|obj| obj.id)
        .collect();
    for id in arrivals {
        universe.add_to_system(system, id);
    }
    Ok(())
}

// === Continuous movement ===

#[derive(Clone, Copy, PartialEq, Eq)]
enum Motion {
    /// Systems move alone; split-off ships get default aggression.
    Orbit,
    /// Systems carry their contents; split-off armed ships keep their
    /// fleet's aggression.
    Towards,
}

impl Motion {
    fn effect(self) -> &'static str {
        match self {
            Self::Orbit => "MoveInOrbit",
            Self::Towards => "MoveTowards",
        }
    }
}

/// The next and previous systems of a fleet about to leave its position.
///
/// A fleet in transit keeps its lane. One leaving a system heads on along
/// its route with that system behind it, or back to it if it had no route.
fn lanes_after_leaving(fleet: &UniverseObject) -> (ObjectId, ObjectId) {
    let Some(data) = fleet.as_fleet() else {
        return (INVALID_OBJECT_ID, INVALID_OBJECT_ID);
    };
    let system = fleet.system_id;
    match (data.next_system.is_valid(), system.is_valid()) {
        (true, true) if data.next_system != system => (data.next_system, system),
        (true, false) => (data.next_system, data.prev_system),
        (_, true) => (system, data.prev_system),
        (false, false) => (INVALID_OBJECT_ID, data.prev_system),
    }
}

/// Apply a computed new position to the target according to its kind.
fn relocate(ctx: &mut ScriptingContext<'_>, motion: Motion, id: ObjectId, x: f64, y: f64) -> Result<(), EffectError> {
    let obj = ctx.universe.get(id).ok_or(EffectError::MissingTarget(id))?;
    match obj.object_type() {
        UniverseObjectType::System => {
            let mut moved = vec![id];
            if motion == Motion::Towards {
                moved.extend(obj.contained_ids());
            }
            for id in moved {
                ctx.universe.set_position(id, x, y);
            }
            Ok(())
        }
        UniverseObjectType::Fleet => {
            let (next, prev) = lanes_after_leaving(obj);
            move_fleet_to(ctx.universe, id, x, y);
            reroute(ctx, id, next, prev)
        }
        UniverseObjectType::Ship => {
            let aggression = match motion {
                Motion::Orbit => None,
                Motion::Towards => inherited_aggression(ctx.universe, id),
            };
            ctx.universe.remove_from_system(id);
            ctx.universe.set_position(id, x, y);
            split_ship(ctx.universe, id, None, (x, y), aggression);
            Ok(())
        }
        UniverseObjectType::Field => {
            ctx.universe.remove_from_system(id);
            ctx.universe.set_position(id, x, y);
            Ok(())
        }
        UniverseObjectType::Planet | UniverseObjectType::Building => Err(wrong_kind(motion.effect(), obj)),
    }
}

pub(crate) fn move_in_orbit(ctx: &mut ScriptingContext<'_>, speed: Option<&ValueRef<f64>>, focus: &FocalPoint) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    if matches!(obj.object_type(), UniverseObjectType::Planet | UniverseObjectType::Building) {
        return Err(wrong_kind("MoveInOrbit", obj));
    }
    let (id, x, y) = (obj.id, obj.x, obj.y);

    let speed = eval_speed(ctx, speed);
    if speed == 0.0 {
        return Ok(());
    }
    let (fx, fy) = focal_position(ctx, focus)?;

    let (dx, dy) = (x - fx, y - fy);
    let radius = dx.hypot(dy);
    if radius < 1.0 {
        return Ok(());
    }
    let angle = dy.atan2(dx) + speed / radius;
    let (new_x, new_y) = (fx + radius * angle.cos(), fy + radius * angle.sin());
    if new_x == x && new_y == y {
        return Ok(());
    }
    relocate(ctx, Motion::Orbit, id, new_x, new_y)
}

pub(crate) fn move_towards(ctx: &mut ScriptingContext<'_>, speed: Option<&ValueRef<f64>>, destination: &FocalPoint) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    if matches!(obj.object_type(), UniverseObjectType::Planet | UniverseObjectType::Building) {
        return Err(wrong_kind("MoveTowards", obj));
    }
    let (id, x, y) = (obj.id, obj.x, obj.y);

    let speed = eval_speed(ctx, speed);
    if speed == 0.0 {
        return Ok(());
    }
    let (dest_x, dest_y) = focal_position(ctx, destination)?;

    let (dx, dy) = (dest_x - x, dest_y - y);
    let distance = dx.hypot(dy);
    let (new_x, new_y) = if distance < speed {
        (dest_x, dest_y)
    } else {
        let scale = speed / distance.max(1.0);
        (x + dx * scale, y + dy * scale)
    };
    if new_x == x && new_y == y {
        return Ok(());
    }
    relocate(ctx, Motion::Towards, id, new_x, new_y)
}

// === Routes ===

/// Route the target fleet to the system of a random matching object.
pub(crate) fn set_destination(ctx: &mut ScriptingContext<'_>, destination: &Condition) -> Result<(), EffectError> {
    let obj = target(ctx)?;
    let Some(data) = obj.as_fleet() else {
        return Err(wrong_kind("SetDestination", obj));
    };
    let (fleet, owner) = (obj.id, obj.owner);
    let start = if obj.system_id.is_valid() {
        obj.system_id
    } else {
        data.next_system
    };

    let candidates = destination.eval(ctx, None);
    let Some(&chosen) = ctx.universe.rng_mut().choose(&candidates) else {
        return Err(EffectError::NoDestination);
    };
    let chosen_system = ctx.universe.get(chosen).map_or(INVALID_OBJECT_ID, system_of);
    let dest_system = valid_system(ctx.universe, chosen_system).ok_or(EffectError::NoDestination)?;
    if !start.is_valid() {
        return Err(RouteError::NoStartSystem(fleet).into());
    }

    let (route, length) = ctx
        .pathfinder
        .shortest_path(start, dest_system, owner, &ctx.universe.objects)?;
    if route.is_empty() {
        tracing::debug!(fleet = %fleet, from = %start, to = %dest_system, "no path to destination");
        return Ok(());
    }
    if ctx.universe.fleet_speed(fleet) <= 0.0 {
        tracing::debug!(fleet = %fleet, "fleet cannot move; destination not set");
        return Ok(());
    }

    tracing::debug!(fleet = %fleet, to = %dest_system, length, "setting fleet destination");
    ctx.universe.set_fleet_route(fleet, route)?;
    Ok(())
}
