//! Victory and research.

use crate::core::EffectError;
use crate::scripting::{ScriptingContext, Value, ValueRef};

use super::{eval_empire, target};

pub(crate) fn victory(ctx: &mut ScriptingContext<'_>, reason: &str) -> Result<(), EffectError> {
    let owner = target(ctx)?.owner;
    let empire = ctx
        .universe
        .empires
        .get_mut(owner)
        .ok_or(EffectError::UnknownEmpire(owner))?;
    tracing::info!(empire = %owner, reason, "empire victorious");
    empire.win(reason);
    Ok(())
}

pub(crate) fn set_empire_tech_progress(
    ctx: &mut ScriptingContext<'_>,
    tech: &ValueRef<String>,
    progress: &ValueRef<f64>,
    empire: &ValueRef<i32>,
) -> Result<(), EffectError> {
    let name = tech.eval(ctx);
    if name.is_empty() {
        tracing::debug!("empty tech name");
        return Ok(());
    }
    if ctx.content.tech(&name).is_none() {
        return Err(EffectError::missing_content("tech", name));
    }
    let empire_id = eval_empire(ctx, empire);
    let before = ctx
        .universe
        .empires
        .get(empire_id)
        .map(|e| e.research_progress(&name))
        .ok_or(EffectError::UnknownEmpire(empire_id))?;

    let after = ctx.scoped(ctx.target, Some(Value::Double(before)), |ctx| progress.eval(ctx));
    if let Some(e) = ctx.universe.empires.get_mut(empire_id) {
        e.set_research_progress(name, after);
    }
    Ok(())
}

/// Queue `tech` for the empire; it is granted when the next turn starts.
pub(crate) fn give_empire_tech(
    ctx: &mut ScriptingContext<'_>,
    tech: &ValueRef<String>,
    empire: &ValueRef<i32>,
) -> Result<(), EffectError> {
    let name = tech.eval(ctx);
    if ctx.content.tech(&name).is_none() {
        return Err(EffectError::missing_content("tech", name));
    }
    let empire_id = eval_empire(ctx, empire);
    let e = ctx
        .universe
        .empires
        .get_mut(empire_id)
        .ok_or(EffectError::UnknownEmpire(empire_id))?;
    e.add_new_tech(name);
    Ok(())
}
