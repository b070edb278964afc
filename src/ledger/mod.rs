//! Internal damage ledger
//!
//! Per-patient record of hidden injuries: damage category → set of
//! affected body parts. Downstream consumers rely on "category present"
//! implying "at least one affected part", so empty sets are pruned on
//! every removal and never stored.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::body::BodyPartId;
use crate::core::DamageId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DamageLedger {
    entries: AHashMap<DamageId, AHashSet<BodyPartId>>,
}

impl DamageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part under a category. Idempotent: an already-present part
    /// is a no-op. Returns true if the ledger changed.
    pub fn add(&mut self, id: &DamageId, part: BodyPartId) -> bool {
        self.entries.entry(id.clone()).or_default().insert(part)
    }

    /// Remove one part from one category, pruning the category when its
    /// set empties. Returns true if the part was present.
    pub fn heal(&mut self, id: &DamageId, part: &BodyPartId) -> bool {
        let Some(parts) = self.entries.get_mut(id) else {
            return false;
        };
        let removed = parts.remove(part);
        if parts.is_empty() {
            self.entries.remove(id);
        }
        removed
    }

    pub fn contains(&self, id: &DamageId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn parts(&self, id: &DamageId) -> Option<&AHashSet<BodyPartId>> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DamageId, &AHashSet<BodyPartId>)> {
        self.entries.iter()
    }

    pub fn categories(&self) -> impl Iterator<Item = &DamageId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Invariant check: every stored category maps to a non-empty set.
    pub fn invariant_holds(&self) -> bool {
        self.entries.values().all(|parts| !parts.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::PartType;
    use proptest::prelude::*;

    fn fracture() -> DamageId {
        DamageId::from("BoneFracture")
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut ledger = DamageLedger::new();
        let part = BodyPartId::left(PartType::Leg);
        assert!(ledger.add(&fracture(), part));
        assert!(!ledger.add(&fracture(), part));
        assert_eq!(ledger.parts(&fracture()).unwrap().len(), 1);
    }

    #[test]
    fn test_heal_last_part_prunes_category() {
        let mut ledger = DamageLedger::new();
        let part = BodyPartId::left(PartType::Leg);
        ledger.add(&fracture(), part);
        assert!(ledger.heal(&fracture(), &part));
        assert!(!ledger.contains(&fracture()));
        assert!(ledger.parts(&fracture()).is_none());
    }

    #[test]
    fn test_heal_keeps_remaining_parts() {
        let mut ledger = DamageLedger::new();
        ledger.add(&fracture(), BodyPartId::left(PartType::Leg));
        ledger.add(&fracture(), BodyPartId::right(PartType::Leg));
        assert!(ledger.heal(&fracture(), &BodyPartId::left(PartType::Leg)));
        assert!(ledger.contains(&fracture()));
        assert_eq!(ledger.parts(&fracture()).unwrap().len(), 1);
    }

    #[test]
    fn test_heal_absent_is_noop() {
        let mut ledger = DamageLedger::new();
        assert!(!ledger.heal(&fracture(), &BodyPartId::left(PartType::Leg)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut ledger = DamageLedger::new();
        ledger.add(&fracture(), BodyPartId::left(PartType::Leg));
        ledger.add(&DamageId::from("SevereBurn"), BodyPartId::unpaired(PartType::Torso));
        ledger.clear();
        assert!(ledger.is_empty());
    }

    fn arb_part() -> impl Strategy<Value = BodyPartId> {
        (0u8..3, 0u8..6).prop_map(|(s, t)| {
            let symmetry = match s {
                0 => crate::body::Symmetry::None,
                1 => crate::body::Symmetry::Left,
                _ => crate::body::Symmetry::Right,
            };
            let part_type = match t {
                0 => PartType::Head,
                1 => PartType::Torso,
                2 => PartType::Arm,
                3 => PartType::Hand,
                4 => PartType::Leg,
                _ => PartType::Foot,
            };
            BodyPartId::new(symmetry, part_type)
        })
    }

    proptest! {
        /// After any interleaving of adds and heals, no category maps to
        /// an empty part set.
        #[test]
        fn prop_no_empty_categories(ops in prop::collection::vec(
            (0u8..2, 0u8..3, arb_part()), 0..64,
        )) {
            let ids = [
                DamageId::from("BoneFracture"),
                DamageId::from("ArterialBleeding"),
                DamageId::from("ShrapnelLodged"),
            ];
            let mut ledger = DamageLedger::new();
            for (op, id_idx, part) in ops {
                let id = &ids[id_idx as usize];
                if op == 0 {
                    ledger.add(id, part);
                } else {
                    ledger.heal(id, &part);
                }
                prop_assert!(ledger.invariant_holds());
            }
        }
    }
}
