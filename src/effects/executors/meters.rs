//! Object, part and empire meters.

use crate::core::{EffectError, MeterType};
use crate::scripting::{ScriptingContext, Value, ValueRef};
use crate::universe::ResourceType;

use super::{eval_empire, target, wrong_kind};

/// Set one meter of the target. Returns `(before, after)`, or `None` when
/// the target has no such meter.
pub(crate) fn set_meter(
    ctx: &mut ScriptingContext<'_>,
    meter: MeterType,
    value: &ValueRef<f64>,
) -> Result<Option<(f64, f64)>, EffectError> {
    let id = ctx.target;
    let Some(before) = target(ctx)?.meter_value(meter) else {
        return Ok(None);
    };
    let after = ctx.scoped(id, Some(Value::Double(before)), |ctx| value.eval(ctx));
    if let Some(m) = ctx.universe.get_mut(id).and_then(|obj| obj.meter_mut(meter)) {
        m.set_current(after);
    }
    Ok(Some((before, after)))
}

pub(crate) fn set_part_meter(
    ctx: &mut ScriptingContext<'_>,
    meter: MeterType,
    part_name: &ValueRef<String>,
    value: &ValueRef<f64>,
) -> Result<(), EffectError> {
    let id = ctx.target;
    let obj = target(ctx)?;
    if obj.as_ship().is_none() {
        return Err(wrong_kind("SetPartMeter", obj));
    }
    let part = part_name.eval(ctx);
    let Some(before) = ctx
        .universe
        .get(id)
        .and_then(|obj| obj.as_ship())
        .and_then(|ship| ship.part_meter(meter, &part))
        .map(|m| m.current())
    else {
        tracing::debug!(target = %id, part = %part, %meter, "ship has no such part meter");
        return Ok(());
    };

    let after = ctx.scoped(id, Some(Value::Double(before)), |ctx| value.eval(ctx));
    if let Some(m) = ctx
        .universe
        .get_mut(id)
        .and_then(|obj| obj.as_ship_mut())
        .and_then(|ship| ship.part_meter_mut(meter, &part))
    {
        m.set_current(after);
    }
    Ok(())
}

pub(crate) fn set_empire_meter(
    ctx: &mut ScriptingContext<'_>,
    empire: &ValueRef<i32>,
    meter: &str,
    value: &ValueRef<f64>,
) -> Result<(), EffectError> {
    let empire_id = eval_empire(ctx, empire);
    let Some(before) = ctx
        .universe
        .empires
        .get(empire_id)
        .map(|e| e.meter(meter).map(|m| m.current()))
    else {
        tracing::debug!(empire = %empire_id, meter, "no such empire");
        return Ok(());
    };
    let Some(before) = before else {
        tracing::debug!(empire = %empire_id, meter, "empire has no such meter");
        return Ok(());
    };

    let after = ctx.scoped(ctx.target, Some(Value::Double(before)), |ctx| value.eval(ctx));
    if let Some(m) = ctx
        .universe
        .empires
        .get_mut(empire_id)
        .and_then(|e| e.meter_mut(meter))
    {
        m.set_current(after);
    }
    Ok(())
}

pub(crate) fn set_empire_stockpile(
    ctx: &mut ScriptingContext<'_>,
    empire: &ValueRef<i32>,
    resource: ResourceType,
    value: &ValueRef<f64>,
) -> Result<(), EffectError> {
    let empire_id = eval_empire(ctx, empire);
    let Some(before) = ctx.universe.empires.get(empire_id).map(|e| e.stockpile(resource)) else {
        tracing::debug!(empire = %empire_id, ?resource, "no such empire");
        return Ok(());
    };

    let after = ctx.scoped(ctx.target, Some(Value::Double(before)), |ctx| value.eval(ctx));
    if let Some(e) = ctx.universe.empires.get_mut(empire_id) {
        e.set_stockpile(resource, after);
    }
    Ok(())
}
