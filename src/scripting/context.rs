//! Evaluation context for expressions, conditions and effects.

use crate::core::{EmpireId, ObjectId, INVALID_OBJECT_ID};
use crate::universe::{ContentRegistry, Pathfinder, Universe, UniverseObject, Visibility};

use super::valueref::Value;

/// Everything an effect may read or mutate while it runs.
///
/// Source, target and current value are the only per-evaluation state.
/// Nested evaluations (per-target values, follow-up effects on a newly
/// created object) switch them with [`ScriptingContext::scoped`], which
/// restores the previous values afterwards.
pub struct ScriptingContext<'a> {
    pub universe: &'a mut Universe,
    pub content: &'a ContentRegistry,
    pub pathfinder: &'a dyn Pathfinder,
    pub source: ObjectId,
    pub target: ObjectId,
    pub current_value: Option<Value>,
}

impl<'a> ScriptingContext<'a> {
    pub fn new(
        universe: &'a mut Universe,
        content: &'a ContentRegistry,
        pathfinder: &'a dyn Pathfinder,
    ) -> Self {
        Self {
            universe,
            content,
            pathfinder,
            source: INVALID_OBJECT_ID,
            target: INVALID_OBJECT_ID,
            current_value: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: ObjectId) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: ObjectId) -> Self {
        self.target = target;
        self
    }

    pub fn current_turn(&self) -> i32 {
        self.universe.current_turn()
    }

    pub fn source_object(&self) -> Option<&UniverseObject> {
        self.universe.get(self.source)
    }

    pub fn target_object(&self) -> Option<&UniverseObject> {
        self.universe.get(self.target)
    }

    /// Owner of the source object, or no empire.
    pub fn source_owner(&self) -> EmpireId {
        self.source_object()
            .map(|obj| obj.owner)
            .unwrap_or_default()
    }

    pub fn visibility(&self, empire: EmpireId, object: ObjectId) -> Visibility {
        self.universe.visibility.get(empire, object)
    }

    /// Run `f` with `target` and `current_value` swapped in, then restore
    /// the previous ones.
    pub fn scoped<R>(
        &mut self,
        target: ObjectId,
        current_value: Option<Value>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved_target = std::mem::replace(&mut self.target, target);
        let saved_value = std::mem::replace(&mut self.current_value, current_value);
        let result = f(self);
        self.target = saved_target;
        self.current_value = saved_value;
        result
    }

    /// Like [`scoped`](Self::scoped) but also swaps the source.
    pub fn scoped_with_source<R>(
        &mut self,
        source: ObjectId,
        target: ObjectId,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let saved_source = std::mem::replace(&mut self.source, source);
        let result = self.scoped(target, None, f);
        self.source = saved_source;
        result
    }
}
