//! Effects groups: the unit content attaches to techs, buildings,
//! specials and species.
//!
//! A group pairs a scope (which objects it affects) and an optional
//! activation (whether its source is currently able to act) with an
//! ordered list of effects.

use serde::{Deserialize, Serialize};

use crate::core::checksum::{combine_serialized, CheckSum, FnvHasher};
use crate::core::ObjectId;
use crate::scripting::{Condition, ScriptingContext};

use super::accounting::{AccountingLedger, EffectCause};
use super::batch::ExecutionFilter;
use super::effect::Effect;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectsGroup {
    pub scope: Condition,
    pub activation: Option<Condition>,
    /// Groups sharing a non-empty key affect each target at most once
    /// per application.
    pub stacking_group: String,
    pub effects: Vec<Effect>,
    pub accounting_label: String,
    /// Lower priorities run first.
    pub priority: i32,
    pub description: String,
    /// Name of the content definition this group belongs to. Provenance
    /// only; never part of the checksum.
    #[serde(skip)]
    pub content_name: String,
}

impl EffectsGroup {
    pub fn new(scope: Condition, effects: impl IntoIterator<Item = Effect>) -> Self {
        Self {
            scope,
            activation: None,
            stacking_group: String::new(),
            effects: effects.into_iter().collect(),
            accounting_label: String::new(),
            priority: 0,
            description: String::new(),
            content_name: String::new(),
        }
    }

    #[must_use]
    pub fn with_activation(mut self, activation: Condition) -> Self {
        self.activation = Some(activation);
        self
    }

    #[must_use]
    pub fn with_stacking_group(mut self, group: impl Into<String>) -> Self {
        self.stacking_group = group.into();
        self
    }

    #[must_use]
    pub fn with_accounting_label(mut self, label: impl Into<String>) -> Self {
        self.accounting_label = label.into();
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn has_meter_effects(&self) -> bool {
        self.effects.iter().any(Effect::is_meter_effect)
    }

    pub fn has_appearance_effects(&self) -> bool {
        self.effects.iter().any(Effect::is_appearance_effect)
    }

    pub fn has_sitrep_effects(&self) -> bool {
        self.effects.iter().any(Effect::is_sitrep_effect)
    }

    /// Check every effect's construction-time constraints.
    pub fn validate(&self) -> bool {
        self.effects.iter().fold(true, |ok, effect| effect.validate() && ok)
    }

    /// Record the owning content name here and in every owned tree.
    pub fn set_top_level_content(&mut self, name: &str) {
        self.content_name = name.to_string();
        self.scope.set_top_level_content(name);
        if let Some(activation) = &mut self.activation {
            activation.set_top_level_content(name);
        }
        for effect in &mut self.effects {
            effect.set_top_level_content(name);
        }
    }

    /// Run every admitted effect, in order, over the same target set.
    #[tracing::instrument(skip_all, fields(content = %self.content_name, targets = targets.len()))]
    pub fn execute(
        &self,
        ctx: &mut ScriptingContext<'_>,
        targets: &[ObjectId],
        cause: &EffectCause,
        mut ledger: Option<&mut AccountingLedger>,
        filter: ExecutionFilter,
    ) {
        if ctx.source_object().is_none() {
            tracing::warn!("effects group executed without a source object");
        }
        for effect in &self.effects {
            if !filter.admits(effect) {
                continue;
            }
            effect.execute_batch(ctx, targets, cause, ledger.as_deref_mut(), filter);
        }
    }
}

impl CheckSum for EffectsGroup {
    const KIND: &'static str = "EffectsGroup";

    fn combine_into(&self, hasher: &mut FnvHasher) {
        combine_serialized(hasher, self);
    }
}
