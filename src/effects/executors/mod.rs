//! Single-target execution of each effect kind.
//!
//! Every executor reads `ctx.target`, evaluates its expressions and applies
//! one mutation. Failures are returned as `EffectError`; the dispatcher
//! logs and swallows them.

pub(crate) mod meters;
pub(crate) mod modify;
pub(crate) mod create;
pub(crate) mod movement;
pub(crate) mod empire;
pub(crate) mod notify;

use crate::core::{EffectError, EmpireId, ObjectId, INVALID_OBJECT_ID};
use crate::scripting::{Condition, ScriptingContext, ValueRef};
use crate::universe::UniverseObject;

use super::effect::Effect;

/// The context target, or `MissingTarget`.
pub(crate) fn target<'c>(ctx: &'c ScriptingContext<'_>) -> Result<&'c UniverseObject, EffectError> {
    ctx.target_object().ok_or(EffectError::MissingTarget(ctx.target))
}

pub(crate) fn wrong_kind(effect: &'static str, obj: &UniverseObject) -> EffectError {
    EffectError::WrongKind {
        effect,
        kind: obj.object_type().name(),
        target: obj.id,
    }
}

/// The system an object is in; a system is its own system.
pub(crate) fn system_of(obj: &UniverseObject) -> ObjectId {
    if obj.as_system().is_some() {
        obj.id
    } else {
        obj.system_id
    }
}

pub(crate) fn eval_empire(ctx: &ScriptingContext<'_>, empire: &ValueRef<i32>) -> EmpireId {
    EmpireId::from(empire.eval(ctx))
}

/// Lowest-id object matching `condition`.
pub(crate) fn first_match(ctx: &ScriptingContext<'_>, condition: &Condition) -> Option<ObjectId> {
    condition.eval(ctx, None).first().copied()
}

/// Run follow-up effects with a newly created object as target.
pub(crate) fn run_effects_after(ctx: &mut ScriptingContext<'_>, created: ObjectId, effects: &[Effect]) {
    if effects.is_empty() || created == INVALID_OBJECT_ID {
        return;
    }
    ctx.scoped(created, None, |ctx| {
        for effect in effects {
            effect.execute(ctx);
        }
    });
}
