//! Containment tests.
//!
//! These tests drive creation, ownership changes, movement and destruction
//! through effects and check that the universe stays consistent: ships
//! always belong to a fleet, no fleet is left empty, and every object and
//! its container agree about each other.

mod common;

use common::{assert_containment_consistent, galaxy, KLINGONS, TERRANS};
use effect_engine::{
    Condition, Effect, FleetAggression, MeterType, ObjectId, UniverseObjectType, ValueRef,
};
use proptest::prelude::*;

/// Test that a created ship arrives in its own fleet in the target's system.
#[test]
fn test_created_ship_forms_fleet() {
    let mut g = galaxy(1);
    let ship = g.create_ship("SD_SCOUT", TERRANS, g.earth);
    let fleet = g.fleet_of(ship);

    assert_eq!(g.obj(ship).system_id, g.sol);
    assert_eq!(g.obj(fleet).system_id, g.sol);
    assert_eq!(g.obj(fleet).owner, TERRANS);
    assert_eq!(g.obj(ship).meter_value(MeterType::Speed), Some(75.0));
    assert_eq!(
        g.obj(fleet).as_fleet().unwrap().aggression,
        FleetAggression::Defensive
    );
    let terrans = g.universe.empires.get(TERRANS).unwrap();
    assert!(terrans.knows_design(1));
    assert!(!g.universe.empires.get(KLINGONS).unwrap().knows_design(1));
    assert_containment_consistent(&g.universe);
}

/// Test that armed ships start in aggressive fleets.
#[test]
fn test_armed_ship_fleet_is_aggressive() {
    let mut g = galaxy(1);
    let ship = g.create_ship("SD_WARSHIP", KLINGONS, g.kronos);
    let fleet = g.fleet_of(ship);

    assert!(g.obj(ship).as_ship().unwrap().is_armed());
    assert_eq!(
        g.obj(fleet).as_fleet().unwrap().aggression,
        FleetAggression::Aggressive
    );
}

/// Test that a ship joining another fleet leaves no empty fleet behind.
#[test]
fn test_merge_then_transfer_ownership() {
    let mut g = galaxy(2);
    let first = g.create_ship("SD_SCOUT", TERRANS, g.earth);
    let second = g.create_ship("SD_SCOUT", TERRANS, g.earth);
    let first_fleet = g.fleet_of(first);
    let second_fleet = g.fleet_of(second);

    g.run(&Effect::move_to(Condition::object_id(first_fleet)), second);

    assert_eq!(g.fleet_of(second), first_fleet);
    assert!(g.universe.get(second_fleet).is_none());
    assert_containment_consistent(&g.universe);

    g.run(&Effect::set_owner(ValueRef::Constant(KLINGONS.raw())), second);

    let split = g.fleet_of(second);
    assert_ne!(split, first_fleet);
    assert_eq!(g.obj(split).owner, KLINGONS);
    assert_eq!(g.obj(split).system_id, g.sol);
    assert_eq!(g.fleet_of(first), first_fleet);
    assert_containment_consistent(&g.universe);
}

/// Test that a fleet moved into another system takes its ships along.
#[test]
fn test_fleet_moves_between_systems() {
    let mut g = galaxy(3);
    let ship = g.create_ship("SD_SCOUT", TERRANS, g.earth);
    let fleet = g.fleet_of(ship);

    g.run(&Effect::move_to(Condition::object_id(g.vega)), fleet);

    for id in [ship, fleet] {
        let obj = g.obj(id);
        assert_eq!(obj.system_id, g.vega);
        assert_eq!((obj.x, obj.y), (100.0, 0.0));
    }
    let sol = g.obj(g.sol).as_system().unwrap();
    assert!(!sol.objects.contains(&ship));
    assert!(!sol.objects.contains(&fleet));
    assert!(g.universe.empires.get(TERRANS).unwrap().has_explored(g.vega));
    assert_containment_consistent(&g.universe);
}

/// Test that routing follows starlanes to the destination's system.
#[test]
fn test_set_destination_routes_over_lanes() {
    let mut g = galaxy(4);
    let ship = g.create_ship("SD_SCOUT", TERRANS, g.earth);
    let fleet = g.fleet_of(ship);

    g.run(
        &Effect::SetDestination {
            destination: Condition::object_id(g.kronos),
        },
        fleet,
    );

    let data = g.obj(fleet).as_fleet().unwrap();
    assert_eq!(data.final_destination, g.rigel);
    assert_eq!(data.next_system, g.vega);
    assert_eq!(data.route.last(), Some(&g.rigel));
}

/// Test that destroying a system destroys everything in it.
#[test]
fn test_destroy_system_is_recursive() {
    let mut g = galaxy(5);
    let ship = g.create_ship("SD_WARSHIP", KLINGONS, g.kronos);
    let fleet = g.fleet_of(ship);
    g.run(&Effect::create_building("BLD_SHIPYARD_BASE"), g.kronos);
    let building = g.ids_of(UniverseObjectType::Building)[0];

    g.run(&Effect::Destroy, g.rigel);

    for id in [g.rigel, g.kronos, ship, fleet, building] {
        assert!(g.universe.get(id).is_none(), "{id} survived");
        assert_eq!(g.universe.destroyed_by(id), Some(g.earth));
    }
    assert!(!g.obj(g.vega).as_system().unwrap().starlanes.contains(&g.rigel));
    assert_containment_consistent(&g.universe);
}

/// Test that destroying the last ship of a fleet removes the fleet.
#[test]
fn test_destroy_last_ship_removes_fleet() {
    let mut g = galaxy(6);
    let ship = g.create_ship("SD_SCOUT", TERRANS, g.earth);
    let fleet = g.fleet_of(ship);

    g.run(&Effect::Destroy, ship);

    assert!(g.universe.get(fleet).is_none());
    // A second destroy has nothing left to act on.
    g.run(&Effect::Destroy, ship);
    assert_containment_consistent(&g.universe);
}

#[derive(Clone, Debug)]
enum Step {
    Create { warship: bool, klingon: bool, at: usize },
    MoveShip { ship: usize, to: usize },
    MoveFleet { fleet: usize, to: usize },
    Transfer { ship: usize },
    DestroyShip { ship: usize },
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (any::<bool>(), any::<bool>(), 0..3usize)
            .prop_map(|(warship, klingon, at)| Step::Create { warship, klingon, at }),
        (0..8usize, 0..3usize).prop_map(|(ship, to)| Step::MoveShip { ship, to }),
        (0..8usize, 0..3usize).prop_map(|(fleet, to)| Step::MoveFleet { fleet, to }),
        (0..8usize).prop_map(|ship| Step::Transfer { ship }),
        (0..8usize).prop_map(|ship| Step::DestroyShip { ship }),
    ]
}

fn pick(ids: &[ObjectId], index: usize) -> Option<ObjectId> {
    (!ids.is_empty()).then(|| ids[index % ids.len()])
}

proptest! {
    /// Any sequence of containment-changing effects keeps the universe consistent.
    #[test]
    fn prop_containment_survives_effect_sequences(steps in prop::collection::vec(step(), 1..30)) {
        let mut g = galaxy(9);
        let planets = [g.earth, g.tau, g.kronos];
        let systems = [g.sol, g.vega, g.rigel];

        for step in steps {
            let ships = g.ids_of(UniverseObjectType::Ship);
            let fleets = g.ids_of(UniverseObjectType::Fleet);
            match step {
                Step::Create { warship, klingon, at } => {
                    let design = if warship { "SD_WARSHIP" } else { "SD_SCOUT" };
                    let owner = if klingon { KLINGONS } else { TERRANS };
                    g.create_ship(design, owner, planets[at]);
                }
                Step::MoveShip { ship, to } => {
                    if let Some(ship) = pick(&ships, ship) {
                        g.run(&Effect::move_to(Condition::object_id(systems[to])), ship);
                    }
                }
                Step::MoveFleet { fleet, to } => {
                    if let Some(fleet) = pick(&fleets, fleet) {
                        g.run(&Effect::move_to(Condition::object_id(systems[to])), fleet);
                    }
                }
                Step::Transfer { ship } => {
                    if let Some(ship) = pick(&ships, ship) {
                        let owner = if g.obj(ship).owner == TERRANS { KLINGONS } else { TERRANS };
                        g.run(&Effect::set_owner(ValueRef::Constant(owner.raw())), ship);
                    }
                }
                Step::DestroyShip { ship } => {
                    if let Some(ship) = pick(&ships, ship) {
                        g.run(&Effect::Destroy, ship);
                    }
                }
            }
            assert_containment_consistent(&g.universe);
        }
    }
}
