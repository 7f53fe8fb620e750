//! Sitreps and effect-derived visibility.

use std::collections::BTreeSet;

use crate::core::{EffectError, EmpireId, ObjectId, ALL_EMPIRES};
use crate::scripting::{AffiliationResolver, Condition, EmpireAffiliation, ScriptingContext, ValueRef};
use crate::universe::{SitRepEntry, Visibility};

use super::eval_empire;

/// Parameter tag naming a premade design the recipients get to know.
const PREDEFINED_SHIP_DESIGN_TAG: &str = "predefinedshipdesign";

/// Empires standing in `affiliation` to the evaluated reference empire.
fn recipients(
    ctx: &ScriptingContext<'_>,
    affiliation: EmpireAffiliation,
    empire: Option<&ValueRef<i32>>,
    condition: Option<&Condition>,
) -> BTreeSet<EmpireId> {
    let reference = empire.map_or(ALL_EMPIRES, |empire| eval_empire(ctx, empire));
    let observed = observed_objects(ctx, condition);
    AffiliationResolver::resolve(ctx.universe, affiliation, reference, &observed)
}

/// The condition's matches, or the target alone.
fn observed_objects(ctx: &ScriptingContext<'_>, condition: Option<&Condition>) -> Vec<ObjectId> {
    match condition {
        Some(condition) => condition.eval(ctx, None),
        None if ctx.target.is_valid() => vec![ctx.target],
        None => Vec::new(),
    }
}

pub(crate) struct SitRep<'e> {
    pub message: &'e str,
    pub icon: &'e str,
    pub parameters: &'e [(String, ValueRef<String>)],
    pub recipient: Option<&'e ValueRef<i32>>,
    pub condition: Option<&'e Condition>,
    pub affiliation: EmpireAffiliation,
    pub label: &'e str,
    pub stringtable_lookup: bool,
}

pub(crate) fn generate_sitrep(ctx: &mut ScriptingContext<'_>, sitrep: &SitRep<'_>) -> Result<(), EffectError> {
    let parameters: Vec<(String, String)> = sitrep
        .parameters
        .iter()
        .map(|(tag, value)| (tag.clone(), value.eval(ctx)))
        .collect();
    let empires = recipients(ctx, sitrep.affiliation, sitrep.recipient, sitrep.condition);
    if empires.is_empty() {
        tracing::debug!(message = sitrep.message, "sitrep has no recipients");
        return Ok(());
    }

    let designs: Vec<i32> = parameters
        .iter()
        .filter(|(tag, _)| tag == PREDEFINED_SHIP_DESIGN_TAG)
        .filter_map(|(_, name)| ctx.content.design_by_name(name))
        .map(|design| design.id)
        .collect();

    let entry = parameters.into_iter().fold(
        SitRepEntry::new(sitrep.message, ctx.current_turn() + 1)
            .with_icon(sitrep.icon)
            .with_label(sitrep.label)
            .with_stringtable_lookup(sitrep.stringtable_lookup),
        |entry, (tag, value)| entry.with_parameter(tag, value),
    );

    for empire_id in empires {
        let Some(empire) = ctx.universe.empires.get_mut(empire_id) else {
            continue;
        };
        for &design in &designs {
            empire.add_known_design(design);
        }
        empire.add_sitrep(entry.clone());
    }
    Ok(())
}

/// Register `visibility` for each (recipient, object) pair; it is
/// evaluated later by `apply_effect_derived_visibilities`.
pub(crate) fn set_visibility(
    ctx: &mut ScriptingContext<'_>,
    visibility: &ValueRef<Visibility>,
    affiliation: EmpireAffiliation,
    empire: Option<&ValueRef<i32>>,
    condition: Option<&Condition>,
) -> Result<(), EffectError> {
    let empires = recipients(ctx, affiliation, empire, condition);
    let objects = observed_objects(ctx, condition);
    let source = ctx.source;

    for empire_id in empires {
        if !ctx.universe.empires.contains(empire_id) {
            continue;
        }
        for &object in &objects {
            ctx.universe
                .visibility
                .register(empire_id, object, source, visibility.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::fixture::{world, KLINGONS, TERRANS};
    use super::*;
    use crate::effects::{target_owner, Effect};
    use crate::universe::DiplomaticStatus;

    fn sitrep_to(affiliation: EmpireAffiliation, recipient: Option<ValueRef<i32>>) -> Effect {
        Effect::GenerateSitRepMessage {
            message: "EFFECT_TAME_MONSTER".into(),
            icon: "icons/sitrep/monster.png".into(),
            parameters: vec![("planet".into(), ValueRef::Constant("Earth".into()))],
            recipient,
            condition: None,
            affiliation,
            label: "monsters".into(),
            stringtable_lookup: true,
        }
    }

    #[test]
    fn test_sitrep_for_owner() {
        let mut w = world();
        w.universe.set_current_turn(4);
        w.run(&sitrep_to(EmpireAffiliation::TheEmpire, Some(target_owner())), w.earth);

        let sitreps = w.universe.empires.get(TERRANS).unwrap().sitreps();
        assert_eq!(sitreps.len(), 1);
        assert_eq!(sitreps[0].turn, 5);
        assert_eq!(sitreps[0].template, "EFFECT_TAME_MONSTER");
        assert_eq!(sitreps[0].parameter("planet"), Some("Earth"));
        assert_eq!(sitreps[0].label, "monsters");
        assert!(w.universe.empires.get(KLINGONS).unwrap().sitreps().is_empty());
    }

    #[test]
    fn test_sitrep_affiliations() {
        let mut w = world();
        w.run(&sitrep_to(EmpireAffiliation::AnyEmpire, None), w.earth);
        // Enemies of the target owner; empires default to war.
        w.run(&sitrep_to(EmpireAffiliation::EnemyOf, Some(target_owner())), w.earth);
        w.universe.empires.set_status(TERRANS, KLINGONS, DiplomaticStatus::Peace);
        w.run(&sitrep_to(EmpireAffiliation::EnemyOf, Some(target_owner())), w.earth);
        // No reference empire for the unowned planet.
        w.run(&sitrep_to(EmpireAffiliation::TheEmpire, Some(target_owner())), w.mars);

        assert_eq!(w.universe.empires.get(TERRANS).unwrap().sitreps().len(), 1);
        assert_eq!(w.universe.empires.get(KLINGONS).unwrap().sitreps().len(), 2);
    }

    #[test]
    fn test_sitrep_can_see() {
        let mut w = world();
        w.universe.visibility.set(KLINGONS, w.earth, Visibility::Basic);
        w.run(&sitrep_to(EmpireAffiliation::CanSee, None), w.earth);

        assert!(w.universe.empires.get(TERRANS).unwrap().sitreps().is_empty());
        assert_eq!(w.universe.empires.get(KLINGONS).unwrap().sitreps().len(), 1);
    }

    #[test]
    fn test_sitrep_reveals_predefined_design() {
        let mut w = world();
        let effect = Effect::GenerateSitRepMessage {
            message: "SITREP_MONSTER_SIGHTED".into(),
            icon: String::new(),
            parameters: vec![(PREDEFINED_SHIP_DESIGN_TAG.into(), ValueRef::Constant("SM_KRAKEN_1".into()))],
            recipient: Some(target_owner()),
            condition: None,
            affiliation: EmpireAffiliation::TheEmpire,
            label: String::new(),
            stringtable_lookup: true,
        };
        w.run(&effect, w.earth);

        let terrans = w.universe.empires.get(TERRANS).unwrap();
        assert!(terrans.knows_design(3));
        assert!(!w.universe.empires.get(KLINGONS).unwrap().knows_design(3));
    }

    #[test]
    fn test_set_visibility_registers_per_pair() {
        let mut w = world();
        let effect = Effect::SetVisibility {
            visibility: ValueRef::Constant(Visibility::Partial),
            affiliation: EmpireAffiliation::AnyEmpire,
            empire: None,
            condition: Some(Condition::object_id(w.earth).or(Condition::object_id(w.mars))),
        };
        w.run(&effect, w.sol);

        assert_eq!(w.universe.visibility.registration_count(), 4);
        let reg = w.universe.visibility.registrations_for(KLINGONS, w.mars);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg[0].source, w.earth);
        assert_eq!(reg[0].visibility, ValueRef::Constant(Visibility::Partial));
        assert!(w.universe.visibility.registrations_for(KLINGONS, w.sol).is_empty());
    }

    #[test]
    fn test_set_visibility_defaults_to_target() {
        let mut w = world();
        let effect = Effect::SetVisibility {
            visibility: ValueRef::Constant(Visibility::Full),
            affiliation: EmpireAffiliation::TheEmpire,
            empire: Some(ValueRef::Constant(KLINGONS.raw())),
            condition: None,
        };
        w.run(&effect, w.mars);

        assert_eq!(w.universe.visibility.registration_count(), 1);
        assert_eq!(w.universe.visibility.registrations_for(KLINGONS, w.mars).len(), 1);
    }
}
