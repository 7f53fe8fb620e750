//! Meter change accounting.
//!
//! When a ledger is supplied, every meter change made by a `SetMeter`
//! batch is recorded with its cause, so a UI can explain how a value came
//! to be. Records for one (object, meter) pair are kept in the order the
//! changes were applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{MeterType, ObjectId, INVALID_OBJECT_ID};

/// What kind of content caused an effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectsCauseType {
    #[default]
    Unknown,
    Inherent,
    Tech,
    Building,
    Field,
    Special,
    Species,
    ShipPart,
    ShipHull,
    Policy,
}

/// Why an effects group is being executed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectCause {
    pub cause_type: EffectsCauseType,
    /// Name of the specific tech, building type, special...
    pub specific_cause: String,
    pub custom_label: String,
}

impl EffectCause {
    pub fn new(cause_type: EffectsCauseType, specific_cause: impl Into<String>) -> Self {
        Self {
            cause_type,
            specific_cause: specific_cause.into(),
            custom_label: String::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.custom_label = label.into();
        self
    }
}

/// One recorded meter change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccountingInfo {
    pub cause_type: EffectsCauseType,
    pub specific_cause: String,
    pub custom_label: String,
    pub source_id: ObjectId,
    pub meter_change: f64,
    pub running_meter_total: f64,
}

impl AccountingInfo {
    /// A record for `cause` before the change is known. `label` overrides
    /// the cause's own label when non-empty.
    pub fn new(cause: &EffectCause, label: Option<&str>, source_id: ObjectId) -> Self {
        let custom_label = label
            .filter(|label| !label.is_empty())
            .unwrap_or(&cause.custom_label)
            .to_string();
        Self {
            cause_type: cause.cause_type,
            specific_cause: cause.specific_cause.clone(),
            custom_label,
            source_id,
            meter_change: 0.0,
            running_meter_total: 0.0,
        }
    }

    #[must_use]
    pub fn with_change(mut self, before: f64, after: f64) -> Self {
        self.meter_change = after - before;
        self.running_meter_total = after;
        self
    }
}

impl Default for AccountingInfo {
    fn default() -> Self {
        Self::new(&EffectCause::default(), None, INVALID_OBJECT_ID)
    }
}

/// Append-only log of meter changes, keyed by object then meter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AccountingLedger {
    entries: BTreeMap<ObjectId, BTreeMap<MeterType, Vec<AccountingInfo>>>,
}

impl AccountingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, object: ObjectId, meter: MeterType, info: AccountingInfo) {
        self.entries
            .entry(object)
            .or_default()
            .entry(meter)
            .or_default()
            .push(info);
    }

    /// Records for one meter of one object, oldest first.
    pub fn entries(&self, object: ObjectId, meter: MeterType) -> &[AccountingInfo] {
        self.entries
            .get(&object)
            .and_then(|meters| meters.get(&meter))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All records of one object, by meter.
    pub fn object_entries(&self, object: ObjectId) -> Option<&BTreeMap<MeterType, Vec<AccountingInfo>>> {
        self.entries.get(&object)
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
