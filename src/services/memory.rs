//! In-memory reference host
//!
//! A self-contained implementation of `SurgeryHost` backing the test
//! suites and demos: flat part/organ lists per patient, item metadata,
//! and counters for every presentation-side effect so assertions can see
//! exactly what the engine asked for.

use ahash::{AHashMap, AHashSet};

use crate::body::{BodyPartId, EquipSlot, PartType};
use crate::core::{DamageTypeId, EntityId, OrganId};
use crate::services::{PainChannel, SurgeryHost};
use crate::sterility::Sterility;

/// Mutable per-patient simulation state
#[derive(Debug, Clone, Default)]
pub struct PatientBody {
    pub parts: Vec<(EntityId, BodyPartId)>,
    pub organs: Vec<(EntityId, OrganId)>,
    /// (part entity, organ slot) pairs; a slot is free while no organ of
    /// that type is present
    pub organ_slots: Vec<(EntityId, OrganId)>,
    pub mechanical: bool,
    pub dead: bool,
    pub asleep: bool,
    pub numbed: bool,
    pub has_bloodstream: bool,
    pub bleed_rate: f32,
    pub blood_level: f32,
    pub pain: AHashMap<PainChannel, f32>,
    pub damage: AHashMap<DamageTypeId, f32>,
    pub implants: Vec<EntityId>,
    pub worn: AHashSet<EquipSlot>,
    pub cavity: AHashMap<BodyPartId, Vec<EntityId>>,
    pub table_modifier: Option<f32>,
    pub diseases: Vec<String>,
    // Presentation-side effect counters
    pub stun_secs: f32,
    pub knockdown_secs: f32,
    pub slowdown_secs: f32,
    pub jitter_secs: f32,
    pub screams: u32,
    pub forced_drops: u32,
    pub popups: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemState {
    pub sterility: Option<Sterility>,
    pub surgical_tool: bool,
    pub severed_part: Option<BodyPartId>,
    pub permanent_implant: bool,
}

#[derive(Debug, Clone, Default)]
struct ActorState {
    hand: Vec<EntityId>,
    active_item: Option<EntityId>,
    clothing_soil: f32,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    patients: AHashMap<EntityId, PatientBody>,
    templates: AHashMap<EntityId, PatientBody>,
    items: AHashMap<EntityId, ItemState>,
    actors: AHashMap<EntityId, ActorState>,
    pub audit_log: Vec<String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn humanoid_parts() -> Vec<(EntityId, BodyPartId)> {
        [
            BodyPartId::unpaired(PartType::Head),
            BodyPartId::unpaired(PartType::Torso),
            BodyPartId::left(PartType::Arm),
            BodyPartId::right(PartType::Arm),
            BodyPartId::left(PartType::Hand),
            BodyPartId::right(PartType::Hand),
            BodyPartId::left(PartType::Leg),
            BodyPartId::right(PartType::Leg),
            BodyPartId::left(PartType::Foot),
            BodyPartId::right(PartType::Foot),
        ]
        .into_iter()
        .map(|p| (EntityId::new(), p))
        .collect()
    }

    /// Spawn a standard humanoid patient: full part set, heart + brain,
    /// bloodstream, everything worn.
    pub fn spawn_humanoid(&mut self) -> EntityId {
        let id = EntityId::new();
        let parts = Self::humanoid_parts();
        let torso = parts
            .iter()
            .find(|(_, p)| p.part_type == PartType::Torso)
            .map(|(e, _)| *e)
            .expect("humanoid has a torso");
        let head = parts
            .iter()
            .find(|(_, p)| p.part_type == PartType::Head)
            .map(|(e, _)| *e)
            .expect("humanoid has a head");

        let body = PatientBody {
            parts,
            organs: vec![
                (EntityId::new(), OrganId::from("heart")),
                (EntityId::new(), OrganId::from("brain")),
            ],
            organ_slots: vec![
                (torso, OrganId::from("heart")),
                (head, OrganId::from("brain")),
            ],
            has_bloodstream: true,
            blood_level: 100.0,
            worn: EquipSlot::all().into_iter().collect(),
            ..Default::default()
        };
        self.templates.insert(id, body.clone());
        self.patients.insert(id, body);
        id
    }

    /// Spawn a mechanical chassis: same limb layout, no organs, no blood.
    pub fn spawn_synthetic(&mut self) -> EntityId {
        let id = EntityId::new();
        let body = PatientBody {
            parts: Self::humanoid_parts(),
            mechanical: true,
            worn: EquipSlot::all().into_iter().collect(),
            ..Default::default()
        };
        self.templates.insert(id, body.clone());
        self.patients.insert(id, body);
        id
    }

    pub fn spawn_item(&mut self, state: ItemState) -> EntityId {
        let id = EntityId::new();
        self.items.insert(id, state);
        id
    }

    pub fn spawn_tool(&mut self, surgical: bool, sterility: Option<Sterility>) -> EntityId {
        self.spawn_item(ItemState {
            sterility,
            surgical_tool: surgical,
            ..Default::default()
        })
    }

    pub fn spawn_organ_item(&mut self, sterile: bool) -> EntityId {
        self.spawn_item(ItemState {
            sterility: sterile.then(Sterility::default),
            ..Default::default()
        })
    }

    pub fn spawn_severed_part(&mut self, part: BodyPartId, sterile: bool) -> EntityId {
        self.spawn_item(ItemState {
            sterility: sterile.then(Sterility::default),
            severed_part: Some(part),
            ..Default::default()
        })
    }

    pub fn spawn_implant(&mut self, permanent: bool) -> EntityId {
        self.spawn_item(ItemState {
            permanent_implant: permanent,
            ..Default::default()
        })
    }

    pub fn spawn_actor(&mut self) -> EntityId {
        let id = EntityId::new();
        self.actors.insert(id, ActorState::default());
        id
    }

    /// Put an item in the actor's hand and make it the active item.
    pub fn give_item(&mut self, actor: EntityId, item: EntityId) {
        let state = self.actors.entry(actor).or_default();
        state.hand.push(item);
        state.active_item = Some(item);
    }

    pub fn set_table(&mut self, patient: EntityId, modifier: f32) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.table_modifier = Some(modifier);
        }
    }

    pub fn patient(&self, id: EntityId) -> &PatientBody {
        &self.patients[&id]
    }

    pub fn patient_mut(&mut self, id: EntityId) -> &mut PatientBody {
        self.patients.get_mut(&id).expect("unknown patient")
    }

    pub fn hand_of(&self, actor: EntityId) -> &[EntityId] {
        self.actors
            .get(&actor)
            .map(|a| a.hand.as_slice())
            .unwrap_or(&[])
    }

    pub fn clothing_soil(&self, actor: EntityId) -> f32 {
        self.actors.get(&actor).map(|a| a.clothing_soil).unwrap_or(0.0)
    }

    fn patient_of_part(&self, part: EntityId) -> Option<EntityId> {
        self.patients
            .iter()
            .find(|(_, body)| {
                body.parts.iter().any(|(e, _)| *e == part)
                    || body.organ_slots.iter().any(|(e, _)| *e == part)
            })
            .map(|(id, _)| *id)
    }
}

impl SurgeryHost for MemoryHost {
    fn body_parts(&self, patient: EntityId) -> Vec<(EntityId, BodyPartId)> {
        self.patients
            .get(&patient)
            .map(|b| b.parts.clone())
            .unwrap_or_default()
    }

    fn organs_of_type(&self, patient: EntityId, organ: &OrganId) -> Vec<EntityId> {
        self.patients
            .get(&patient)
            .map(|b| {
                b.organs
                    .iter()
                    .filter(|(_, o)| o == organ)
                    .map(|(e, _)| *e)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn free_organ_slot(&self, patient: EntityId, organ: &OrganId) -> Option<EntityId> {
        let body = self.patients.get(&patient)?;
        let occupied = body.organs.iter().any(|(_, o)| o == organ);
        if occupied {
            return None;
        }
        body.organ_slots
            .iter()
            .find(|(_, o)| o == organ)
            .map(|(part, _)| *part)
    }

    fn remove_organ(&mut self, patient: EntityId, organ: EntityId) -> bool {
        let Some(body) = self.patients.get_mut(&patient) else {
            return false;
        };
        let before = body.organs.len();
        body.organs.retain(|(e, _)| *e != organ);
        let removed = body.organs.len() < before;
        if removed {
            self.items.entry(organ).or_default();
        }
        removed
    }

    fn insert_organ(&mut self, part: EntityId, slot: &OrganId, item: EntityId) -> bool {
        let Some(patient) = self.patient_of_part(part) else {
            return false;
        };
        let body = self.patient_mut(patient);
        if body.organs.iter().any(|(_, o)| o == slot) {
            return false;
        }
        body.organs.push((item, slot.clone()));
        true
    }

    fn detach_part(&mut self, patient: EntityId, part: EntityId) -> bool {
        let Some(body) = self.patients.get_mut(&patient) else {
            return false;
        };
        let Some(pos) = body.parts.iter().position(|(e, _)| *e == part) else {
            return false;
        };
        let (_, part_id) = body.parts.remove(pos);
        self.items.entry(part).or_default().severed_part = Some(part_id);
        true
    }

    fn attach_part(&mut self, patient: EntityId, slot: &BodyPartId, item: EntityId) -> bool {
        let Some(body) = self.patients.get_mut(&patient) else {
            return false;
        };
        if body.parts.iter().any(|(_, p)| p == slot) {
            return false;
        }
        body.parts.push((item, *slot));
        true
    }

    fn restore_body(&mut self, patient: EntityId) {
        if let Some(template) = self.templates.get(&patient) {
            let (parts, organs, slots) = (
                template.parts.clone(),
                template.organs.clone(),
                template.organ_slots.clone(),
            );
            let body = self.patient_mut(patient);
            body.parts = parts;
            body.organs = organs;
            body.organ_slots = slots;
            body.bleed_rate = 0.0;
            body.blood_level = 100.0;
        }
    }

    fn is_mechanical(&self, patient: EntityId) -> bool {
        self.patients.get(&patient).is_some_and(|b| b.mechanical)
    }

    fn is_dead(&self, patient: EntityId) -> bool {
        self.patients.get(&patient).is_some_and(|b| b.dead)
    }

    fn is_asleep(&self, patient: EntityId) -> bool {
        self.patients.get(&patient).is_some_and(|b| b.asleep)
    }

    fn is_pain_numbed(&self, patient: EntityId) -> bool {
        self.patients.get(&patient).is_some_and(|b| b.numbed)
    }

    fn has_bloodstream(&self, patient: EntityId) -> bool {
        self.patients.get(&patient).is_some_and(|b| b.has_bloodstream)
    }

    fn modify_bleed(&mut self, patient: EntityId, delta: f32) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.bleed_rate = (body.bleed_rate + delta).max(0.0);
        }
    }

    fn modify_blood_level(&mut self, patient: EntityId, delta: f32) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.blood_level = (body.blood_level + delta).max(0.0);
        }
    }

    fn apply_damage(&mut self, patient: EntityId, kind: &DamageTypeId, amount: f32) {
        if let Some(body) = self.patients.get_mut(&patient) {
            *body.damage.entry(kind.clone()).or_insert(0.0) += amount;
        }
    }

    fn adjust_pain(&mut self, patient: EntityId, channel: PainChannel, amount: f32) {
        if let Some(body) = self.patients.get_mut(&patient) {
            *body.pain.entry(channel).or_insert(0.0) += amount;
        }
    }

    fn force_implant(&mut self, patient: EntityId, item: EntityId) -> bool {
        let Some(body) = self.patients.get_mut(&patient) else {
            return false;
        };
        if body.implants.contains(&item) {
            return false;
        }
        body.implants.push(item);
        true
    }

    fn force_remove_implant(&mut self, patient: EntityId, implant: EntityId) -> bool {
        let Some(body) = self.patients.get_mut(&patient) else {
            return false;
        };
        let before = body.implants.len();
        body.implants.retain(|&i| i != implant);
        body.implants.len() < before
    }

    fn implant_is_permanent(&self, implant: EntityId) -> bool {
        self.items.get(&implant).is_some_and(|i| i.permanent_implant)
    }

    fn stun(&mut self, patient: EntityId, secs: f32) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.stun_secs += secs;
        }
    }

    fn knockdown(&mut self, patient: EntityId, secs: f32) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.knockdown_secs += secs;
        }
    }

    fn slowdown(&mut self, patient: EntityId, secs: f32, _walk_multiplier: f32) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.slowdown_secs += secs;
        }
    }

    fn jitter(&mut self, patient: EntityId, secs: f32) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.jitter_secs += secs;
        }
    }

    fn emote_scream(&mut self, patient: EntityId) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.screams += 1;
        }
    }

    fn popup(&mut self, patient: EntityId, message: &str) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.popups.push(message.to_string());
        }
    }

    fn force_drop_held(&mut self, patient: EntityId) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.forced_drops += 1;
        }
        if let Some(actor) = self.actors.get_mut(&patient) {
            actor.hand.clear();
            actor.active_item = None;
        }
    }

    fn inoculate(&mut self, patient: EntityId, disease: &str) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.diseases.push(disease.to_string());
        }
    }

    fn active_held_item(&self, actor: EntityId) -> Option<EntityId> {
        self.actors.get(&actor).and_then(|a| a.active_item)
    }

    fn pickup_any_hand(&mut self, actor: EntityId, item: EntityId) -> bool {
        self.actors.entry(actor).or_default().hand.push(item);
        true
    }

    fn is_wearing(&self, patient: EntityId, slot: EquipSlot) -> bool {
        self.patients
            .get(&patient)
            .is_some_and(|b| b.worn.contains(&slot))
    }

    fn unequip_slot(&mut self, patient: EntityId, slot: EquipSlot) {
        if let Some(body) = self.patients.get_mut(&patient) {
            body.worn.remove(&slot);
        }
    }

    fn soil_worn_clothing(&mut self, actor: EntityId, amount: f32) {
        self.actors.entry(actor).or_default().clothing_soil += amount;
    }

    fn cavity_store(&mut self, patient: EntityId, part: &BodyPartId, item: EntityId) -> bool {
        let Some(body) = self.patients.get_mut(&patient) else {
            return false;
        };
        body.cavity.entry(*part).or_default().push(item);
        true
    }

    fn cavity_retrieve(&mut self, patient: EntityId, part: &BodyPartId) -> Vec<EntityId> {
        self.patients
            .get_mut(&patient)
            .and_then(|b| b.cavity.remove(part))
            .unwrap_or_default()
    }

    fn operating_table_modifier(&self, patient: EntityId) -> Option<f32> {
        self.patients.get(&patient).and_then(|b| b.table_modifier)
    }

    fn sterility(&self, item: EntityId) -> Option<Sterility> {
        self.items.get(&item).and_then(|i| i.sterility.clone())
    }

    fn set_sterility(&mut self, item: EntityId, sterility: Sterility) {
        self.items.entry(item).or_default().sterility = Some(sterility);
    }

    fn clear_sterility(&mut self, item: EntityId) {
        if let Some(state) = self.items.get_mut(&item) {
            state.sterility = None;
        }
    }

    fn sterile_items(&self) -> Vec<EntityId> {
        self.items
            .iter()
            .filter(|(_, state)| state.sterility.is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    fn is_surgical_tool(&self, item: EntityId) -> bool {
        self.items.get(&item).is_some_and(|i| i.surgical_tool)
    }

    fn item_as_part(&self, item: EntityId) -> Option<BodyPartId> {
        self.items.get(&item).and_then(|i| i.severed_part)
    }

    fn audit(&mut self, actor: EntityId, patient: EntityId, action: &str) {
        self.audit_log.push(format!("{actor} -> {patient}: {action}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanoid_layout() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        assert_eq!(host.body_parts(patient).len(), 10);
        assert_eq!(host.organs_of_type(patient, &OrganId::from("heart")).len(), 1);
        assert!(host.has_bloodstream(patient));
        assert!(!host.is_mechanical(patient));
    }

    #[test]
    fn test_organ_slot_frees_after_removal() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let heart = OrganId::from("heart");
        assert!(host.free_organ_slot(patient, &heart).is_none());

        let organ = host.organs_of_type(patient, &heart)[0];
        assert!(host.remove_organ(patient, organ));
        assert!(host.free_organ_slot(patient, &heart).is_some());
    }

    #[test]
    fn test_detach_makes_item_a_part() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let left_arm = BodyPartId::left(PartType::Arm);
        let (arm_uid, _) = *host
            .body_parts(patient)
            .iter()
            .find(|(_, p)| *p == left_arm)
            .unwrap();
        assert!(host.detach_part(patient, arm_uid));
        assert_eq!(host.item_as_part(arm_uid), Some(left_arm));
        assert_eq!(host.body_parts(patient).len(), 9);
    }

    #[test]
    fn test_restore_body_after_mutilation() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let (arm_uid, _) = host.body_parts(patient)[2];
        host.detach_part(patient, arm_uid);
        host.modify_bleed(patient, 5.0);
        host.restore_body(patient);
        assert_eq!(host.body_parts(patient).len(), 10);
        assert_eq!(host.patient(patient).bleed_rate, 0.0);
    }
}
