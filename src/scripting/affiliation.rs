//! Resolving empire affiliations to concrete empire sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::{EmpireId, ObjectId};
use crate::universe::{DiplomaticStatus, Universe, Visibility};

/// How a set of empires relates to a reference empire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmpireAffiliation {
    /// Only the reference empire.
    #[default]
    TheEmpire,
    /// Empires allied with the reference.
    AllyOf,
    /// Empires at peace with the reference.
    PeaceWith,
    /// Empires at war with the reference.
    EnemyOf,
    /// Empires with basic or better visibility of an observed object.
    CanSee,
    /// Empires controlled by human players.
    Human,
    NoEmpire,
    AnyEmpire,
}

pub struct AffiliationResolver;

impl AffiliationResolver {
    /// Empires that stand in `affiliation` to `reference`.
    ///
    /// `observed` lists the objects `CanSee` is judged against; the other
    /// affiliations ignore it. Diplomatic affiliations never include the
    /// reference itself and are empty without a reference empire.
    pub fn resolve(
        universe: &Universe,
        affiliation: EmpireAffiliation,
        reference: EmpireId,
        observed: &[ObjectId],
    ) -> BTreeSet<EmpireId> {
        let empires = &universe.empires;
        let related = |want: fn(DiplomaticStatus) -> bool| -> BTreeSet<EmpireId> {
            if reference.is_none() {
                return BTreeSet::new();
            }
            empires
                .ids()
                .filter(|&other| other != reference && want(empires.status(reference, other)))
                .collect()
        };

        match affiliation {
            EmpireAffiliation::TheEmpire => {
                if empires.contains(reference) {
                    BTreeSet::from([reference])
                } else {
                    BTreeSet::new()
                }
            }
            EmpireAffiliation::AllyOf => related(|status| status >= DiplomaticStatus::Allied),
            EmpireAffiliation::PeaceWith => related(|status| status == DiplomaticStatus::Peace),
            EmpireAffiliation::EnemyOf => related(|status| status == DiplomaticStatus::War),
            EmpireAffiliation::CanSee => empires
                .ids()
                .filter(|&empire| {
                    observed
                        .iter()
                        .any(|&obj| universe.visibility.get(empire, obj) >= Visibility::Basic)
                })
                .collect(),
            EmpireAffiliation::Human => empires
                .iter()
                .filter(|empire| empire.is_human())
                .map(|empire| empire.id())
                .collect(),
            EmpireAffiliation::NoEmpire => BTreeSet::new(),
            EmpireAffiliation::AnyEmpire => empires.ids().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EngineConfig, ALL_EMPIRES};
    use crate::universe::Empire;

    fn universe() -> Universe {
        let mut universe = Universe::new(EngineConfig::default());
        for id in 0..4 {
            universe
                .empires
                .insert(Empire::new(EmpireId(id), format!("E{id}")).with_human(id == 3));
        }
        universe.empires.set_status(EmpireId(0), EmpireId(1), DiplomaticStatus::Allied);
        universe.empires.set_status(EmpireId(0), EmpireId(2), DiplomaticStatus::Peace);
        universe
    }

    #[test]
    fn test_diplomatic_affiliations() {
        let universe = universe();
        let resolve = |aff| AffiliationResolver::resolve(&universe, aff, EmpireId(0), &[]);

        assert_eq!(resolve(EmpireAffiliation::TheEmpire), BTreeSet::from([EmpireId(0)]));
        assert_eq!(resolve(EmpireAffiliation::AllyOf), BTreeSet::from([EmpireId(1)]));
        assert_eq!(resolve(EmpireAffiliation::PeaceWith), BTreeSet::from([EmpireId(2)]));
        assert_eq!(resolve(EmpireAffiliation::EnemyOf), BTreeSet::from([EmpireId(3)]));
        assert_eq!(resolve(EmpireAffiliation::Human), BTreeSet::from([EmpireId(3)]));
        assert!(resolve(EmpireAffiliation::NoEmpire).is_empty());
        assert_eq!(resolve(EmpireAffiliation::AnyEmpire).len(), 4);
    }

    #[test]
    fn test_no_reference_empire() {
        let universe = universe();
        for aff in [
            EmpireAffiliation::TheEmpire,
            EmpireAffiliation::AllyOf,
            EmpireAffiliation::PeaceWith,
            EmpireAffiliation::EnemyOf,
        ] {
            assert!(AffiliationResolver::resolve(&universe, aff, ALL_EMPIRES, &[]).is_empty());
        }
    }

    #[test]
    fn test_can_see() {
        let mut universe = universe();
        universe.visibility.set(EmpireId(2), ObjectId(7), Visibility::Basic);
        universe.visibility.set(EmpireId(1), ObjectId(8), Visibility::Partial);

        let seen = AffiliationResolver::resolve(
            &universe,
            EmpireAffiliation::CanSee,
            ALL_EMPIRES,
            &[ObjectId(7)],
        );
        assert_eq!(seen, BTreeSet::from([EmpireId(2)]));

        let nothing = AffiliationResolver::resolve(&universe, EmpireAffiliation::CanSee, EmpireId(0), &[]);
        assert!(nothing.is_empty());
    }
}
