//! Shortest routes between systems.
//!
//! Effects that move fleets only need a route and its length; how routes
//! are found is behind the `Pathfinder` trait. `StarlanePathfinder` runs A*
//! over the starlane graph, with lane length as cost and straight-line
//! distance as heuristic.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use crate::core::{EmpireId, ObjectId, RouteError};

use super::objects::ObjectMap;

/// Finds system-to-system routes.
pub trait Pathfinder {
    /// Route from `from` to `to` (both systems, inclusive) and its length.
    ///
    /// An empty route means the systems are not connected. Endpoints that
    /// are not systems are an error.
    fn shortest_path(
        &self,
        from: ObjectId,
        to: ObjectId,
        empire: EmpireId,
        objects: &ObjectMap,
    ) -> Result<(Vec<ObjectId>, f64), RouteError>;
}

/// A* over starlanes, ignoring which lanes an empire knows about.
#[derive(Clone, Copy, Debug, Default)]
pub struct StarlanePathfinder;

impl StarlanePathfinder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn position(objects: &ObjectMap, system: ObjectId) -> Result<(f64, f64), RouteError> {
        objects
            .get(system)
            .filter(|obj| obj.as_system().is_some())
            .map(|obj| (obj.x, obj.y))
            .ok_or(RouteError::UnknownSystem(system))
    }
}

impl Pathfinder for StarlanePathfinder {
    fn shortest_path(
        &self,
        from: ObjectId,
        to: ObjectId,
        _empire: EmpireId,
        objects: &ObjectMap,
    ) -> Result<(Vec<ObjectId>, f64), RouteError> {
        let goal_pos = Self::position(objects, to)?;
        let start_pos = Self::position(objects, from)?;
        let distance = |a: (f64, f64), b: (f64, f64)| ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt();

        let mut open_set = BinaryHeap::new();
        let mut came_from: BTreeMap<ObjectId, ObjectId> = BTreeMap::new();
        let mut g_score: BTreeMap<ObjectId, f64> = BTreeMap::new();
        let mut closed_set: BTreeSet<ObjectId> = BTreeSet::new();

        g_score.insert(from, 0.0);
        open_set.push(State {
            node: from,
            cost: 0.0,
            priority: distance(start_pos, goal_pos),
        });

        while let Some(State { node: current, cost: current_g, .. }) = open_set.pop() {
            if !closed_set.insert(current) {
                continue;
            }

            if current == to {
                let mut path = vec![current];
                let mut curr = current;
                while let Some(&prev) = came_from.get(&curr) {
                    path.push(prev);
                    curr = prev;
                }
                path.reverse();
                return Ok((path, current_g));
            }

            let Some(system) = objects.get(current) else {
                continue;
            };
            let current_pos = (system.x, system.y);
            let lanes = system
                .as_system()
                .map(|s| s.starlanes.iter().copied().collect::<Vec<_>>())
                .unwrap_or_default();

            for neighbor in lanes {
                if closed_set.contains(&neighbor) {
                    continue;
                }
                let Ok(neighbor_pos) = Self::position(objects, neighbor) else {
                    tracing::debug!(from = %current, to = %neighbor, "starlane to missing system");
                    continue;
                };

                let tentative_g = current_g + distance(current_pos, neighbor_pos);
                if tentative_g < g_score.get(&neighbor).copied().unwrap_or(f64::INFINITY) {
                    came_from.insert(neighbor, current);
                    g_score.insert(neighbor, tentative_g);
                    open_set.push(State {
                        node: neighbor,
                        cost: tentative_g,
                        priority: tentative_g + distance(neighbor_pos, goal_pos),
                    });
                }
            }
        }

        Ok((Vec::new(), 0.0))
    }
}

/// Priority queue entry; ordered as a min-heap on priority.
#[derive(Clone, Copy, Debug)]
struct State {
    node: ObjectId,
    cost: f64,
    priority: f64,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flipped so the heap pops the cheapest entry; ties go to the lower id.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.cost.total_cmp(&self.cost))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ALL_EMPIRES;
    use crate::universe::object::{ObjectKind, StarType, System, UniverseObject};

    fn system(id: i32, x: f64, y: f64, lanes: &[i32]) -> UniverseObject {
        let mut data = System::new(StarType::Yellow, 3);
        data.starlanes = lanes.iter().map(|&l| ObjectId(l)).collect();
        let mut obj = UniverseObject::new(format!("S{id}"), x, y, ObjectKind::System(data));
        obj.id = ObjectId(id);
        obj
    }

    // 1 -- 2 -- 3
    //  \       /
    //   `- 4 -'   (4 is far off the straight line)
    fn graph() -> ObjectMap {
        let mut objects = ObjectMap::new();
        objects.insert(system(1, 0.0, 0.0, &[2, 4]));
        objects.insert(system(2, 10.0, 0.0, &[1, 3]));
        objects.insert(system(3, 20.0, 0.0, &[2, 4]));
        objects.insert(system(4, 10.0, 50.0, &[1, 3]));
        objects.insert(system(5, 99.0, 99.0, &[]));
        objects
    }

    #[test]
    fn test_shortest_path() {
        let objects = graph();
        let (path, length) = StarlanePathfinder
            .shortest_path(ObjectId(1), ObjectId(3), ALL_EMPIRES, &objects)
            .unwrap();

        assert_eq!(path, vec![ObjectId(1), ObjectId(2), ObjectId(3)]);
        assert!((length - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_system() {
        let objects = graph();
        let (path, length) = StarlanePathfinder
            .shortest_path(ObjectId(2), ObjectId(2), ALL_EMPIRES, &objects)
            .unwrap();
        assert_eq!(path, vec![ObjectId(2)]);
        assert_eq!(length, 0.0);
    }

    #[test]
    fn test_unreachable_is_empty() {
        let objects = graph();
        let (path, _) = StarlanePathfinder
            .shortest_path(ObjectId(1), ObjectId(5), ALL_EMPIRES, &objects)
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_unknown_system_is_error() {
        let objects = graph();
        let result = StarlanePathfinder.shortest_path(ObjectId(1), ObjectId(77), ALL_EMPIRES, &objects);
        assert_eq!(result, Err(RouteError::UnknownSystem(ObjectId(77))));
    }
}
