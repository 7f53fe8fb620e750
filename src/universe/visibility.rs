//! Per-empire visibility of objects.
//!
//! ## Tiers
//!
//! `None < Basic < Partial < Full`. Each tier reveals a superset of the
//! previous one (see `UniverseObject::copy_from`).
//!
//! ## Effect-derived visibility
//!
//! `SetVisibility` effects do not change visibility directly. They register
//! `{empire, object, source, expression}` here; the registrations are
//! evaluated later in the turn, when visibility is determined.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::{EmpireId, ObjectId};
use crate::scripting::ValueRef;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    None,
    Basic,
    Partial,
    Full,
}

/// A pending visibility override registered by an effect.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectVisibility {
    /// Object whose effect made the registration.
    pub source: ObjectId,
    /// Evaluated with the registered object as target and the empire's
    /// present visibility of it as current value.
    pub visibility: ValueRef<Visibility>,
}

/// Visibility each empire has of each object.
#[derive(Clone, Debug, Default)]
pub struct VisibilityState {
    objects: BTreeMap<EmpireId, BTreeMap<ObjectId, Visibility>>,
    revealed_specials: BTreeMap<EmpireId, BTreeMap<ObjectId, BTreeSet<String>>>,
    registrations: BTreeMap<EmpireId, BTreeMap<ObjectId, Vec<EffectVisibility>>>,
}

impl VisibilityState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Visibility `empire` has of `object`. Unknown pairs are `None`.
    #[must_use]
    pub fn get(&self, empire: EmpireId, object: ObjectId) -> Visibility {
        self.objects
            .get(&empire)
            .and_then(|objects| objects.get(&object))
            .copied()
            .unwrap_or_default()
    }

    pub fn set(&mut self, empire: EmpireId, object: ObjectId, vis: Visibility) {
        self.objects.entry(empire).or_default().insert(object, vis);
    }

    /// Raise visibility to at least `vis`; never lowers it.
    pub fn raise(&mut self, empire: EmpireId, object: ObjectId, vis: Visibility) {
        let entry = self
            .objects
            .entry(empire)
            .or_default()
            .entry(object)
            .or_default();
        if vis > *entry {
            *entry = vis;
        }
    }

    /// Objects `empire` has any record of, with their visibility.
    pub fn objects_of(&self, empire: EmpireId) -> impl Iterator<Item = (ObjectId, Visibility)> + '_ {
        self.objects
            .get(&empire)
            .into_iter()
            .flat_map(|objects| objects.iter().map(|(&id, &vis)| (id, vis)))
    }

    /// Empires with at least `min` visibility of `object`.
    #[must_use]
    pub fn empires_seeing(&self, object: ObjectId, min: Visibility) -> BTreeSet<EmpireId> {
        self.objects
            .iter()
            .filter(|(_, objects)| objects.get(&object).is_some_and(|&vis| vis >= min))
            .map(|(&empire, _)| empire)
            .collect()
    }

    pub fn reveal_special(&mut self, empire: EmpireId, object: ObjectId, special: impl Into<String>) {
        self.revealed_specials
            .entry(empire)
            .or_default()
            .entry(object)
            .or_default()
            .insert(special.into());
    }

    #[must_use]
    pub fn revealed_specials(&self, empire: EmpireId, object: ObjectId) -> BTreeSet<String> {
        self.revealed_specials
            .get(&empire)
            .and_then(|objects| objects.get(&object))
            .cloned()
            .unwrap_or_default()
    }

    /// Forget everything about an object (it was destroyed).
    pub fn forget_object(&mut self, object: ObjectId) {
        for specials in self.revealed_specials.values_mut() {
            specials.remove(&object);
        }
        for registrations in self.registrations.values_mut() {
            registrations.remove(&object);
        }
    }

    // === Effect registrations ===

    pub fn register(
        &mut self,
        empire: EmpireId,
        object: ObjectId,
        source: ObjectId,
        visibility: ValueRef<Visibility>,
    ) {
        self.registrations
            .entry(empire)
            .or_default()
            .entry(object)
            .or_default()
            .push(EffectVisibility { source, visibility });
    }

    /// Registrations for one (empire, object) pair, in registration order.
    #[must_use]
    pub fn registrations_for(&self, empire: EmpireId, object: ObjectId) -> &[EffectVisibility] {
        self.registrations
            .get(&empire)
            .and_then(|objects| objects.get(&object))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Remove and return every registration.
    pub fn take_registrations(&mut self) -> BTreeMap<EmpireId, BTreeMap<ObjectId, Vec<EffectVisibility>>> {
        std::mem::take(&mut self.registrations)
    }

    #[must_use]
    pub fn registration_count(&self) -> usize {
        self.registrations
            .values()
            .flat_map(|objects| objects.values())
            .map(Vec::len)
            .sum()
    }
}
