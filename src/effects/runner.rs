//! Applying many effects groups in one pass.
//!
//! ## Phases
//!
//! 1. Every entry's activation is tested and its scope evaluated to a
//!    frozen target set. Nothing is executed until all sets exist.
//! 2. Entries are ordered by (priority, source id, declaration index).
//! 3. Stacking: a target already affected by a group with the same
//!    non-empty stacking key is dropped from later groups.
//! 4. Survivors execute with the shared ledger and filter.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::{ObjectId, INVALID_OBJECT_ID};
use crate::scripting::{ScriptingContext, Value};

use super::accounting::{AccountingLedger, EffectCause};
use super::batch::ExecutionFilter;
use super::group::EffectsGroup;

/// One group to apply on behalf of one source object.
#[derive(Clone, Debug)]
pub struct SourcedGroup<'g> {
    pub source: ObjectId,
    pub group: &'g EffectsGroup,
    pub cause: EffectCause,
}

/// Targets an entry resolved to before anything ran.
#[derive(Clone, Debug, PartialEq)]
pub struct TargetsAndCause {
    pub targets: Vec<ObjectId>,
    pub cause: EffectCause,
}

#[derive(Clone, Debug, Default)]
pub struct EffectsApplication<'g> {
    entries: Vec<SourcedGroup<'g>>,
    filter: ExecutionFilter,
}

impl<'g> EffectsApplication<'g> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ExecutionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn add(&mut self, source: ObjectId, group: &'g EffectsGroup, cause: EffectCause) {
        self.entries.push(SourcedGroup { source, group, cause });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `entry`'s group may act this pass.
    fn is_active(ctx: &mut ScriptingContext<'_>, entry: &SourcedGroup<'_>) -> bool {
        let Some(activation) = &entry.group.activation else {
            return true;
        };
        if ctx.universe.get(entry.source).is_none() {
            return false;
        }
        ctx.scoped_with_source(entry.source, entry.source, |ctx| {
            activation.matches(ctx, entry.source)
        })
    }

    /// Resolve every entry's targets, in execution order. Inactive entries
    /// resolve to no targets.
    pub fn resolve_targets(&self, ctx: &mut ScriptingContext<'_>) -> Vec<(usize, TargetsAndCause)> {
        let mut resolved: Vec<(usize, TargetsAndCause)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let targets = if Self::is_active(ctx, entry) {
                    ctx.scoped_with_source(entry.source, INVALID_OBJECT_ID, |ctx| {
                        entry.group.scope.eval(ctx, None)
                    })
                } else {
                    Vec::new()
                };
                let cause = entry.cause.clone();
                (index, TargetsAndCause { targets, cause })
            })
            .collect();

        resolved.sort_by_key(|(index, _)| {
            let entry = &self.entries[*index];
            (entry.group.priority, entry.source, *index)
        });

        let mut affected: BTreeMap<&str, BTreeSet<ObjectId>> = BTreeMap::new();
        for (index, entry_targets) in &mut resolved {
            let key = self.entries[*index].group.stacking_group.as_str();
            if key.is_empty() {
                continue;
            }
            let seen = affected.entry(key).or_default();
            entry_targets.targets.retain(|target| seen.insert(*target));
        }
        resolved
    }

    /// Run the whole application. Returns how many entries executed
    /// against at least one target.
    #[tracing::instrument(skip_all, fields(entries = self.entries.len()))]
    pub fn run(&self, ctx: &mut ScriptingContext<'_>, mut ledger: Option<&mut AccountingLedger>) -> usize {
        let resolved = self.resolve_targets(ctx);
        let mut executed = 0;
        for (index, TargetsAndCause { targets, cause }) in &resolved {
            if targets.is_empty() {
                continue;
            }
            let entry = &self.entries[*index];
            tracing::debug!(
                source = %entry.source,
                content = %entry.group.content_name,
                targets = targets.len(),
                "executing effects group"
            );
            ctx.scoped_with_source(entry.source, INVALID_OBJECT_ID, |ctx| {
                entry
                    .group
                    .execute(ctx, targets, cause, ledger.as_deref_mut(), self.filter);
            });
            executed += 1;
        }
        executed
    }
}

/// Evaluate every pending visibility registration and store the result.
///
/// Each expression sees the registering source as source, the object as
/// target and the empire's present visibility of it as current value.
/// Registrations apply in (empire, object, registration) order, so later
/// ones see earlier results. The result replaces the present value and may
/// lower it.
pub fn apply_effect_derived_visibilities(ctx: &mut ScriptingContext<'_>) {
    let registrations = ctx.universe.visibility.take_registrations();
    for (empire, objects) in registrations {
        for (object, entries) in objects {
            for entry in entries {
                let present = ctx.universe.visibility.get(empire, object);
                let visibility = ctx.scoped_with_source(entry.source, object, |ctx| {
                    ctx.current_value = Some(Value::Visibility(present));
                    entry.visibility.eval(ctx)
                });
                tracing::trace!(empire = %empire, object = %object, ?present, ?visibility, "effect-derived visibility");
                ctx.universe.visibility.set(empire, object, visibility);
            }
        }
    }
}
