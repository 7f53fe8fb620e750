//! Invariant-preserving structural edits.
//!
//! ## Invariants
//!
//! - Every ship belongs to exactly one fleet.
//! - A fleet with no ships does not exist.
//! - An object's `system_id` names a system listing it, and vice versa.
//! - A building's `planet_id` names a planet listing it, and vice versa.
//!
//! Every helper here leaves these intact when it returns.

use crate::core::{EmpireId, Meter, MeterType, ObjectId, RouteError, INVALID_OBJECT_ID};

use super::object::{Fleet, FleetAggression, ObjectKind, UniverseObject};
use super::pathfinder::Pathfinder;
use super::Universe;

impl Universe {
    // === Systems ===

    /// Place `object` in `system`, moving it to the system's position.
    ///
    /// Removes it from any previous system first. Planets also take the
    /// lowest free orbit; a planet that finds none stays where it was and
    /// `false` is returned.
    pub fn add_to_system(&mut self, system: ObjectId, object: ObjectId) -> bool {
        let Some((x, y, data)) = self
            .objects
            .get(system)
            .and_then(|obj| obj.as_system().map(|data| (obj.x, obj.y, data)))
        else {
            tracing::error!(system = %system, object = %object, "not a system");
            return false;
        };
        let Some(is_planet) = self.objects.get(object).map(|obj| obj.as_planet().is_some()) else {
            return false;
        };
        if is_planet && data.orbit_of(object).is_none() && data.free_orbits().is_empty() {
            tracing::error!(system = %system, planet = %object, "no free orbit for planet");
            return false;
        }

        self.remove_from_system(object);

        if let Some(data) = self.objects.get_mut(system).and_then(UniverseObject::as_system_mut) {
            if is_planet {
                data.assign_free_orbit(object);
            }
            data.objects.insert(object);
        }

        if let Some(obj) = self.objects.get_mut(object) {
            obj.system_id = system;
            obj.x = x;
            obj.y = y;
        }
        true
    }

    /// Take `object` out of whatever system holds it.
    pub fn remove_from_system(&mut self, object: ObjectId) {
        let Some(system) = self.objects.get(object).map(|obj| obj.system_id) else {
            return;
        };
        if !system.is_valid() || system == object {
            return;
        }
        if let Some(data) = self.objects.get_mut(system).and_then(UniverseObject::as_system_mut) {
            data.objects.remove(&object);
            data.release_orbit(object);
        }
        if let Some(obj) = self.objects.get_mut(object) {
            obj.system_id = INVALID_OBJECT_ID;
        }
    }

    /// Set an object's position without touching containment.
    pub fn set_position(&mut self, object: ObjectId, x: f64, y: f64) {
        if let Some(obj) = self.objects.get_mut(object) {
            obj.x = x;
            obj.y = y;
        }
    }

    /// Link two systems by a starlane in both directions.
    pub fn add_starlane(&mut self, a: ObjectId, b: ObjectId) -> bool {
        if a == b || self.objects.get(a).and_then(UniverseObject::as_system).is_none()
            || self.objects.get(b).and_then(UniverseObject::as_system).is_none()
        {
            return false;
        }
        for (from, to) in [(a, b), (b, a)] {
            if let Some(system) = self.objects.get_mut(from).and_then(UniverseObject::as_system_mut) {
                system.starlanes.insert(to);
            }
        }
        true
    }

    pub fn remove_starlane(&mut self, a: ObjectId, b: ObjectId) {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(system) = self.objects.get_mut(from).and_then(UniverseObject::as_system_mut) {
                system.starlanes.remove(&to);
            }
        }
    }

    /// Record `system` as explored by `object`'s owner, if it has one.
    pub fn explore_system(&mut self, system: ObjectId, object: ObjectId) {
        let Some(owner) = self.objects.get(object).map(|obj| obj.owner) else {
            return;
        };
        if owner.is_none() {
            return;
        }
        if let Some(empire) = self.empires.get_mut(owner) {
            empire.record_explored_system(system);
        }
    }

    // === Planets and buildings ===

    /// Attach `building` to `planet`, detaching it from any previous planet.
    pub fn add_building_to_planet(&mut self, planet: ObjectId, building: ObjectId) {
        self.remove_building_from_planet(building);
        if let Some(data) = self.objects.get_mut(planet).and_then(UniverseObject::as_planet_mut) {
            data.buildings.insert(building);
        }
        if let Some(data) = self.objects.get_mut(building).and_then(UniverseObject::as_building_mut) {
            data.planet_id = planet;
        }
    }

    pub fn remove_building_from_planet(&mut self, building: ObjectId) {
        let Some(planet) = self
            .objects
            .get(building)
            .and_then(UniverseObject::as_building)
            .map(|b| b.planet_id)
        else {
            return;
        };
        if let Some(data) = self.objects.get_mut(planet).and_then(UniverseObject::as_planet_mut) {
            data.buildings.remove(&building);
        }
        if let Some(data) = self.objects.get_mut(building).and_then(UniverseObject::as_building_mut) {
            data.planet_id = INVALID_OBJECT_ID;
        }
    }

    // === Fleets ===

    /// Detach `ship` from its fleet. Returns the fleet it left, which may
    /// now be empty; callers must follow with `destroy_fleet_if_empty`.
    pub(crate) fn detach_ship(&mut self, ship: ObjectId) -> Option<ObjectId> {
        let fleet = self.objects.get(ship)?.as_ship()?.fleet_id;
        if let Some(data) = self.objects.get_mut(fleet).and_then(UniverseObject::as_fleet_mut) {
            data.ships.remove(&ship);
        }
        if let Some(data) = self.objects.get_mut(ship).and_then(UniverseObject::as_ship_mut) {
            data.fleet_id = INVALID_OBJECT_ID;
        }
        fleet.is_valid().then_some(fleet)
    }

    /// Destroy `fleet` if it exists and holds no ships.
    pub fn destroy_fleet_if_empty(&mut self, fleet: ObjectId, source: ObjectId) -> bool {
        let empty = self
            .objects
            .get(fleet)
            .and_then(UniverseObject::as_fleet)
            .is_some_and(|data| data.ships.is_empty());
        if empty {
            tracing::debug!(fleet = %fleet, "destroying emptied fleet");
            self.destroy(fleet, source)
        } else {
            false
        }
    }

    /// Move `ship` into `fleet`, destroying the fleet it left if emptied.
    pub fn move_ship_to_fleet(&mut self, ship: ObjectId, fleet: ObjectId) {
        if self.objects.get(fleet).and_then(UniverseObject::as_fleet).is_none() {
            return;
        }
        let old = self.detach_ship(ship);
        if let Some(data) = self.objects.get_mut(fleet).and_then(UniverseObject::as_fleet_mut) {
            data.ships.insert(ship);
        }
        if let Some(data) = self.objects.get_mut(ship).and_then(UniverseObject::as_ship_mut) {
            data.fleet_id = fleet;
        }
        if let Some(old) = old.filter(|&old| old != fleet) {
            self.destroy_fleet_if_empty(old, INVALID_OBJECT_ID);
        }
    }

    /// Create a fleet at `(x, y)` holding only `ship`.
    ///
    /// The fleet is owned by the ship's owner, starts hidden
    /// (`LARGE_VALUE` stealth) and takes `aggression`, or aggressive if the
    /// ship is armed and defensive otherwise. The ship leaves its previous
    /// fleet, which is destroyed if emptied.
    pub fn create_new_fleet_at(
        &mut self,
        x: f64,
        y: f64,
        ship: ObjectId,
        aggression: Option<FleetAggression>,
    ) -> Option<ObjectId> {
        let (owner, armed) = {
            let obj = self.objects.get(ship)?;
            (obj.owner, obj.as_ship()?.is_armed())
        };
        let aggression = aggression.unwrap_or(if armed {
            FleetAggression::Aggressive
        } else {
            FleetAggression::Defensive
        });

        let mut fleet = UniverseObject::new("", x, y, ObjectKind::Fleet(Fleet::new(aggression)))
            .with_owner(owner);
        if let Some(stealth) = fleet.meter_mut(MeterType::Stealth) {
            *stealth = Meter::hidden();
        }
        let fleet_id = self.insert(fleet);
        let name = format!("{} {}", self.config().fleet_name_prefix, fleet_id.raw());
        if let Some(obj) = self.objects.get_mut(fleet_id) {
            obj.name = name;
        }

        self.move_ship_to_fleet(ship, fleet_id);
        tracing::debug!(fleet = %fleet_id, ship = %ship, ?aggression, "created fleet");
        Some(fleet_id)
    }

    /// Create a fleet holding only `ship` inside `system`; both are placed
    /// in the system.
    pub fn create_new_fleet_in_system(
        &mut self,
        system: ObjectId,
        ship: ObjectId,
        aggression: Option<FleetAggression>,
    ) -> Option<ObjectId> {
        let (x, y) = self
            .objects
            .get(system)
            .filter(|obj| obj.as_system().is_some())
            .map(|obj| (obj.x, obj.y))?;

        let fleet = self.create_new_fleet_at(x, y, ship, aggression)?;
        self.add_to_system(system, ship);
        self.add_to_system(system, fleet);
        Some(fleet)
    }

    /// Set `fleet`'s previous/next systems and recompute its route toward
    /// its final destination from its new position.
    ///
    /// An empty path degenerates to a route of just the next system (or
    /// the system the fleet is in). A fleet outside any system with no
    /// next system is left untouched.
    pub fn update_fleet_route(
        &mut self,
        fleet: ObjectId,
        next: ObjectId,
        prev: ObjectId,
        pathfinder: &dyn Pathfinder,
    ) -> Result<(), RouteError> {
        let (system, owner, destination) = {
            let obj = self.objects.get(fleet).ok_or(RouteError::NotAFleet(fleet))?;
            let data = obj.as_fleet().ok_or(RouteError::NotAFleet(fleet))?;
            (obj.system_id, obj.owner, data.final_destination)
        };
        let start = if system.is_valid() { system } else { next };
        if !start.is_valid() {
            return Err(RouteError::NoStartSystem(fleet));
        }

        if let Some(data) = self.objects.get_mut(fleet).and_then(UniverseObject::as_fleet_mut) {
            data.next_system = next;
            data.prev_system = prev;
        }

        let mut route = if destination.is_valid() {
            pathfinder.shortest_path(start, destination, owner, &self.objects)?.0
        } else {
            Vec::new()
        };
        if route.is_empty() {
            route.push(if next.is_valid() { next } else { start });
        }
        self.set_fleet_route(fleet, route)
    }

    /// Replace `fleet`'s route. The route must be non-empty and consist of
    /// systems; its last entry becomes the final destination.
    pub fn set_fleet_route(&mut self, fleet: ObjectId, route: Vec<ObjectId>) -> Result<(), RouteError> {
        let Some(&last) = route.last() else {
            return Err(RouteError::EmptyRoute(fleet));
        };
        if let Some(&bad) = route
            .iter()
            .find(|&&id| self.objects.get(id).and_then(UniverseObject::as_system).is_none())
        {
            return Err(RouteError::UnknownSystem(bad));
        }

        let (system, next) = {
            let obj = self.objects.get(fleet).ok_or(RouteError::NotAFleet(fleet))?;
            let data = obj.as_fleet().ok_or(RouteError::NotAFleet(fleet))?;
            (obj.system_id, data.next_system)
        };

        let data = self
            .objects
            .get_mut(fleet)
            .and_then(UniverseObject::as_fleet_mut)
            .ok_or(RouteError::NotAFleet(fleet))?;
        data.final_destination = last;
        if system.is_valid() {
            data.next_system = route
                .iter()
                .copied()
                .find(|&id| id != system)
                .unwrap_or(system);
        } else if !next.is_valid() {
            data.next_system = route[0];
        }
        data.route = route.into_iter().collect();
        Ok(())
    }

    // === Ownership ===

    /// Change `object`'s owner. Ships leave a fleet whose owner differs.
    ///
    /// A split-off ship forms a new fleet at its location, keeping the old
    /// fleet's aggression if armed and its previous/next systems.
    pub fn set_owner(&mut self, object: ObjectId, owner: EmpireId) {
        let Some(obj) = self.objects.get_mut(object) else {
            return;
        };
        obj.owner = owner;

        let Some(ship) = obj.as_ship() else {
            return;
        };
        let armed = ship.is_armed();
        let (system, x, y, fleet) = (obj.system_id, obj.x, obj.y, ship.fleet_id);

        let Some((fleet_owner, aggression, prev, next)) = self.objects.get(fleet).and_then(|f| {
            let data = f.as_fleet()?;
            Some((f.owner, data.aggression, data.prev_system, data.next_system))
        }) else {
            return;
        };
        if fleet_owner == owner {
            return;
        }

        let aggression = armed.then_some(aggression);
        let new_fleet = if system.is_valid() {
            self.create_new_fleet_in_system(system, object, aggression)
        } else {
            self.create_new_fleet_at(x, y, object, aggression)
        };
        if let Some(data) = new_fleet
            .and_then(|id| self.objects.get_mut(id))
            .and_then(UniverseObject::as_fleet_mut)
        {
            data.prev_system = prev;
            data.next_system = next;
        }
    }

    // === Destruction ===

    /// Destroy `object` and everything it contains, detaching it from its
    /// containers. `source` is recorded as the destroyer.
    ///
    /// Destroying an absent object does nothing and returns `false`.
    pub fn destroy(&mut self, object: ObjectId, source: ObjectId) -> bool {
        let Some(obj) = self.objects.get(object) else {
            return false;
        };

        match &obj.kind {
            ObjectKind::Fleet(fleet) => {
                let ships: Vec<ObjectId> = fleet.ships.iter().copied().collect();
                if let Some(data) = self.objects.get_mut(object).and_then(UniverseObject::as_fleet_mut) {
                    data.ships.clear();
                }
                for ship in ships {
                    if let Some(data) = self.objects.get_mut(ship).and_then(UniverseObject::as_ship_mut) {
                        data.fleet_id = INVALID_OBJECT_ID;
                    }
                    self.destroy(ship, source);
                }
            }
            ObjectKind::Planet(planet) => {
                let buildings: Vec<ObjectId> = planet.buildings.iter().copied().collect();
                for building in buildings {
                    self.destroy(building, source);
                }
            }
            ObjectKind::System(system) => {
                let contents: Vec<ObjectId> = system.objects.iter().copied().collect();
                let lanes: Vec<ObjectId> = system.starlanes.iter().copied().collect();
                for lane in lanes {
                    self.remove_starlane(object, lane);
                }
                for contained in contents {
                    self.destroy(contained, source);
                }
            }
            ObjectKind::Ship(_) => {
                if let Some(fleet) = self.detach_ship(object) {
                    self.destroy_fleet_if_empty(fleet, source);
                }
            }
            ObjectKind::Building(_) => self.remove_building_from_planet(object),
            ObjectKind::Field(_) => {}
        }

        // Containers destroyed above may already have taken this object.
        if !self.objects.contains(object) {
            return true;
        }
        self.remove_from_system(object);
        self.objects.remove(object);
        self.visibility.forget_object(object);
        self.destroyed_by.insert(object, source);

        let capitals: Vec<EmpireId> = self
            .empires
            .iter()
            .filter(|empire| empire.capital() == object)
            .map(|empire| empire.id())
            .collect();
        for id in capitals {
            if let Some(empire) = self.empires.get_mut(id) {
                empire.set_capital(INVALID_OBJECT_ID);
            }
        }

        tracing::debug!(object = %object, source = %source, "destroyed object");
        true
    }
}
