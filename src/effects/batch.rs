//! Batch execution of meter effects.
//!
//! A meter effect applied to many targets picks the cheapest tier that
//! gives the same result as evaluating it once per target:
//!
//! 1. `Invariant`: the value ignores the target; evaluate once, assign
//!    everywhere.
//! 2. `SimpleIncrement`: the value is `current ± c` with `c` invariant;
//!    evaluate `c` once, add it everywhere.
//! 3. `PerTarget`: evaluate for each target with its own current value.
//!
//! With an accounting ledger the per-target tier is always used so every
//! change can be recorded.

use crate::core::{MeterType, ObjectId, INVALID_OBJECT_ID};
use crate::scripting::{IncrementSign, ScriptingContext, Value, ValueRef};

use super::accounting::{AccountingInfo, AccountingLedger, EffectCause};
use super::effect::Effect;
use super::executors::meters;

/// Which effect categories a batch run admits.
///
/// The default admits every effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionFilter {
    pub only_meter: bool,
    pub only_appearance: bool,
    pub include_empire_meter: bool,
    pub only_sitrep: bool,
}

impl Default for ExecutionFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl ExecutionFilter {
    pub const fn all() -> Self {
        Self {
            only_meter: false,
            only_appearance: false,
            include_empire_meter: true,
            only_sitrep: false,
        }
    }

    pub const fn meters_only() -> Self {
        Self {
            only_meter: true,
            ..Self::all()
        }
    }

    pub const fn appearance_only() -> Self {
        Self {
            only_appearance: true,
            ..Self::all()
        }
    }

    pub const fn sitrep_only() -> Self {
        Self {
            only_sitrep: true,
            ..Self::all()
        }
    }

    #[must_use]
    pub const fn with_empire_meters(mut self, include: bool) -> Self {
        self.include_empire_meter = include;
        self
    }

    pub fn admits(&self, effect: &Effect) -> bool {
        !((self.only_appearance && !effect.is_appearance_effect())
            || (self.only_meter && !effect.is_meter_effect())
            || (!self.include_empire_meter && effect.is_empire_meter_effect())
            || (self.only_sitrep && !effect.is_sitrep_effect()))
    }
}

/// Tier a meter batch takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchPath {
    Invariant,
    SimpleIncrement,
    PerTarget,
}

impl BatchPath {
    pub fn for_value(value: &ValueRef<f64>, accounting: bool) -> Self {
        if accounting {
            Self::PerTarget
        } else if value.target_invariant() {
            Self::Invariant
        } else if value.simple_increment().is_some() {
            Self::SimpleIncrement
        } else {
            Self::PerTarget
        }
    }
}

fn meter_values(ctx: &ScriptingContext<'_>, meter: MeterType, targets: &[ObjectId]) -> Vec<(ObjectId, Option<f64>)> {
    targets
        .iter()
        .map(|&id| (id, ctx.universe.get(id).and_then(|obj| obj.meter_value(meter))))
        .collect()
}

/// Apply `SetMeter` to every target, recording changes in `ledger` if
/// given. Targets without the meter are skipped.
#[tracing::instrument(skip_all, fields(meter = %meter, targets = targets.len()))]
pub(crate) fn set_meter(
    ctx: &mut ScriptingContext<'_>,
    meter: MeterType,
    value: &ValueRef<f64>,
    label: Option<&str>,
    targets: &[ObjectId],
    cause: &EffectCause,
    ledger: Option<&mut AccountingLedger>,
) {
    if targets.is_empty() {
        return;
    }
    tracing::trace!(before = ?meter_values(ctx, meter, targets), "SetMeter batch");

    match ledger {
        Some(ledger) => {
            let source_id = ctx.source_object().map_or(INVALID_OBJECT_ID, |obj| obj.id);
            let info = AccountingInfo::new(cause, label, source_id);
            for &target in targets {
                let changed = ctx.scoped(target, None, |ctx| meters::set_meter(ctx, meter, value));
                match changed {
                    Ok(Some((before, after))) => {
                        ledger.record(target, meter, info.clone().with_change(before, after));
                    }
                    Ok(None) => {}
                    Err(err) => err.log("SetMeter"),
                }
            }
        }
        None => set_meter_fast(ctx, meter, value, targets),
    }

    tracing::trace!(after = ?meter_values(ctx, meter, targets), "SetMeter batch");
}

fn set_meter_fast(ctx: &mut ScriptingContext<'_>, meter: MeterType, value: &ValueRef<f64>, targets: &[ObjectId]) {
    match BatchPath::for_value(value, false) {
        BatchPath::Invariant => {
            let new_value = value.eval(ctx);
            for &target in targets {
                if let Some(m) = ctx.universe.get_mut(target).and_then(|obj| obj.meter_mut(meter)) {
                    m.set_current(new_value);
                }
            }
        }
        BatchPath::SimpleIncrement => {
            let Some((sign, rhs)) = value.simple_increment() else {
                return;
            };
            let amount = rhs.eval(ctx);
            let delta = match sign {
                IncrementSign::Add => amount,
                IncrementSign::Subtract => -amount,
            };
            for &target in targets {
                if let Some(m) = ctx.universe.get_mut(target).and_then(|obj| obj.meter_mut(meter)) {
                    m.add_to_current(delta);
                }
            }
        }
        BatchPath::PerTarget => {
            for &target in targets {
                if let Err(err) = ctx.scoped(target, None, |ctx| meters::set_meter(ctx, meter, value)) {
                    err.log("SetMeter");
                }
            }
        }
    }
}

/// Apply `SetPartMeter` to every target ship.
#[tracing::instrument(skip_all, fields(meter = %meter, targets = targets.len()))]
pub(crate) fn set_part_meter(
    ctx: &mut ScriptingContext<'_>,
    meter: MeterType,
    part_name: &ValueRef<String>,
    value: &ValueRef<f64>,
    targets: &[ObjectId],
    accounting: bool,
) {
    if targets.is_empty() {
        return;
    }
    if !part_name.target_invariant() {
        for &target in targets {
            if let Err(err) = ctx.scoped(target, None, |ctx| meters::set_part_meter(ctx, meter, part_name, value)) {
                err.log("SetPartMeter");
            }
        }
        return;
    }

    let part = part_name.eval(ctx);
    let path = BatchPath::for_value(value, accounting);
    let shared = match path {
        BatchPath::Invariant => Some(value.eval(ctx)),
        BatchPath::SimpleIncrement => value.simple_increment().map(|(sign, rhs)| match sign {
            IncrementSign::Add => rhs.eval(ctx),
            IncrementSign::Subtract => -rhs.eval(ctx),
        }),
        BatchPath::PerTarget => None,
    };

    for &target in targets {
        let Some(before) = ctx
            .universe
            .get(target)
            .and_then(|obj| obj.as_ship())
            .and_then(|ship| ship.part_meter(meter, &part))
            .map(|m| m.current())
        else {
            tracing::debug!(target = %target, part = %part, "ship has no such part meter");
            continue;
        };
        let after = match (path, shared) {
            (BatchPath::Invariant, Some(v)) => v,
            (BatchPath::SimpleIncrement, Some(delta)) => before + delta,
            _ => ctx.scoped(target, Some(Value::Double(before)), |ctx| value.eval(ctx)),
        };
        if let Some(m) = ctx
            .universe
            .get_mut(target)
            .and_then(|obj| obj.as_ship_mut())
            .and_then(|ship| ship.part_meter_mut(meter, &part))
        {
            m.set_current(after);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EngineConfig, Meter};
    use crate::scripting::{OpType, Property};
    use crate::universe::{
        ContentRegistry, ObjectKind, Planet, PlanetSize, PlanetType, StarlanePathfinder, Universe,
        UniverseObject,
    };
    use crate::effects::accounting::EffectsCauseType;

    fn universe_with(values: &[f64]) -> (Universe, Vec<ObjectId>) {
        let mut universe = Universe::new(EngineConfig::default());
        let ids = values
            .iter()
            .map(|&v| {
                let mut planet = UniverseObject::new(
                    "P",
                    0.0,
                    0.0,
                    ObjectKind::Planet(Planet::new(PlanetType::Ocean, PlanetSize::Large)),
                );
                planet.meters.insert(MeterType::Industry, Meter::new(v));
                universe.insert(planet)
            })
            .collect();
        (universe, ids)
    }

    fn industry(universe: &Universe, ids: &[ObjectId]) -> Vec<f64> {
        ids.iter()
            .map(|&id| universe.get(id).and_then(|o| o.meter_value(MeterType::Industry)).unwrap_or(-1.0))
            .collect()
    }

    #[test]
    fn test_filter_admits() {
        let meter = Effect::increment_meter(MeterType::Industry, ValueRef::Constant(1.0));
        let empire_meter = Effect::set_empire_meter("M", ValueRef::Constant(1.0));
        let sitrep = Effect::sitrep("S");

        assert!(ExecutionFilter::all().admits(&Effect::Destroy));
        assert!(!ExecutionFilter::meters_only().admits(&Effect::Destroy));
        assert!(ExecutionFilter::meters_only().admits(&meter));
        assert!(ExecutionFilter::meters_only().admits(&empire_meter));
        assert!(!ExecutionFilter::meters_only().with_empire_meters(false).admits(&empire_meter));
        assert!(ExecutionFilter::sitrep_only().admits(&sitrep));
        assert!(!ExecutionFilter::appearance_only().admits(&sitrep));
    }

    #[test]
    fn test_batch_path_selection() {
        let constant = ValueRef::Constant(3.0);
        let increment = ValueRef::increment(ValueRef::Constant(5.0));
        let scaled = ValueRef::operation(OpType::Times, ValueRef::CurrentValue, ValueRef::Constant(2.0));

        assert_eq!(BatchPath::for_value(&constant, false), BatchPath::Invariant);
        assert_eq!(BatchPath::for_value(&increment, false), BatchPath::SimpleIncrement);
        assert_eq!(BatchPath::for_value(&scaled, false), BatchPath::PerTarget);
        assert_eq!(BatchPath::for_value(&constant, true), BatchPath::PerTarget);
    }

    #[test]
    fn test_increment_paths_agree() {
        let value = ValueRef::increment(ValueRef::Constant(5.0));
        let content = ContentRegistry::new();
        let cause = EffectCause::default();

        let (mut fast, ids) = universe_with(&[10.0, 20.0, 30.0]);
        {
            let mut ctx = ScriptingContext::new(&mut fast, &content, &StarlanePathfinder);
            set_meter(&mut ctx, MeterType::Industry, &value, None, &ids, &cause, None);
        }

        let (mut accounted, ids2) = universe_with(&[10.0, 20.0, 30.0]);
        let mut ledger = AccountingLedger::new();
        {
            let mut ctx = ScriptingContext::new(&mut accounted, &content, &StarlanePathfinder);
            set_meter(&mut ctx, MeterType::Industry, &value, None, &ids2, &cause, Some(&mut ledger));
        }

        assert_eq!(industry(&fast, &ids), vec![15.0, 25.0, 35.0]);
        assert_eq!(industry(&accounted, &ids2), vec![15.0, 25.0, 35.0]);
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.entries(ids2[1], MeterType::Industry)[0].meter_change, 5.0);
    }

    #[test]
    fn test_ledger_records_cause_and_source() {
        let (mut universe, ids) = universe_with(&[1.0, 2.0]);
        let content = ContentRegistry::new();
        let cause = EffectCause::new(EffectsCauseType::Special, "MINERALS_SPECIAL").with_label("MINERALS");
        let mut ledger = AccountingLedger::new();
        let value = ValueRef::operation(OpType::Times, ValueRef::CurrentValue, ValueRef::Constant(3.0));
        {
            let mut ctx = ScriptingContext::new(&mut universe, &content, &StarlanePathfinder).with_source(ids[0]);
            set_meter(&mut ctx, MeterType::Industry, &value, Some("TRIPLED"), &ids, &cause, Some(&mut ledger));
        }

        let entry = &ledger.entries(ids[1], MeterType::Industry)[0];
        assert_eq!(entry.cause_type, EffectsCauseType::Special);
        assert_eq!(entry.specific_cause, "MINERALS_SPECIAL");
        assert_eq!(entry.custom_label, "TRIPLED");
        assert_eq!(entry.source_id, ids[0]);
        assert_eq!(entry.meter_change, 4.0);
        assert_eq!(entry.running_meter_total, 6.0);
    }

    #[test]
    fn test_targets_without_meter_are_skipped() {
        let (mut universe, ids) = universe_with(&[1.0]);
        let content = ContentRegistry::new();
        let mut ledger = AccountingLedger::new();
        {
            let mut ctx = ScriptingContext::new(&mut universe, &content, &StarlanePathfinder);
            set_meter(
                &mut ctx,
                MeterType::Fuel,
                &ValueRef::target(Property::X),
                None,
                &ids,
                &EffectCause::default(),
                Some(&mut ledger),
            );
        }
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_ledger_path_skips_missing_targets() {
        let (mut universe, mut ids) = universe_with(&[1.0, 2.0]);
        let content = ContentRegistry::new();
        let mut ledger = AccountingLedger::new();
        ids.insert(1, ObjectId(999));
        {
            let mut ctx = ScriptingContext::new(&mut universe, &content, &StarlanePathfinder);
            set_meter(
                &mut ctx,
                MeterType::Industry,
                &ValueRef::increment(ValueRef::Constant(1.0)),
                None,
                &ids,
                &EffectCause::default(),
                Some(&mut ledger),
            );
        }

        assert_eq!(ledger.len(), 2);
        assert!(ledger.entries(ObjectId(999), MeterType::Industry).is_empty());
        assert_eq!(industry(&universe, &[ids[0], ids[2]]), vec![2.0, 3.0]);
    }
}
