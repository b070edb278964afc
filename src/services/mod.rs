//! External collaborator seam
//!
//! The engine owns no body topology, inventory, or status-effect state.
//! Everything it needs from the surrounding simulation goes through the
//! `SurgeryHost` trait: synchronous, in-process calls assumed to complete
//! without suspension. `memory::MemoryHost` is the in-memory reference
//! implementation used by tests and demos.

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::body::{BodyPartId, EquipSlot};
use crate::core::{DamageTypeId, EntityId, OrganId};
use crate::sterility::Sterility;

/// Pain channels recognized by the external pain service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PainChannel {
    Physical,
    Burn,
    CriticalBurn,
    Internal,
    ForeignObject,
    SharpPain,
    HeadTrauma,
    TorsoTrauma,
    ArmTrauma,
    LegTrauma,
    ArmFracture,
    LegFracture,
    BoneFracture,
    LocalizedPain,
}

/// Services consumed by the surgery engine.
///
/// Grouped by the collaborator that provides them; all default to
/// conservative no-ops only where a query has an obvious safe answer —
/// mutations must be implemented by the host.
pub trait SurgeryHost {
    // --- Body topology ---

    /// All body parts of a patient as (part entity, symbolic id) pairs.
    fn body_parts(&self, patient: EntityId) -> Vec<(EntityId, BodyPartId)>;

    /// All organ entities of the given type currently in the body.
    fn organs_of_type(&self, patient: EntityId, organ: &OrganId) -> Vec<EntityId>;

    /// A body part entity with a free slot for the given organ type.
    fn free_organ_slot(&self, patient: EntityId, organ: &OrganId) -> Option<EntityId>;

    fn remove_organ(&mut self, patient: EntityId, organ: EntityId) -> bool;

    fn insert_organ(&mut self, part: EntityId, slot: &OrganId, item: EntityId) -> bool;

    fn detach_part(&mut self, patient: EntityId, part: EntityId) -> bool;

    fn attach_part(&mut self, patient: EntityId, slot: &BodyPartId, item: EntityId) -> bool;

    /// Restore all missing limbs/organs (rejuvenate support).
    fn restore_body(&mut self, patient: EntityId);

    /// Is the patient a synthetic/mechanical chassis?
    fn is_mechanical(&self, patient: EntityId) -> bool;

    // --- Vitals ---

    fn is_dead(&self, patient: EntityId) -> bool;
    fn is_asleep(&self, patient: EntityId) -> bool;
    fn is_pain_numbed(&self, patient: EntityId) -> bool;

    // --- Damageable / bloodstream ---

    fn has_bloodstream(&self, patient: EntityId) -> bool;
    fn modify_bleed(&mut self, patient: EntityId, delta: f32);
    fn modify_blood_level(&mut self, patient: EntityId, delta: f32);
    fn apply_damage(&mut self, patient: EntityId, kind: &DamageTypeId, amount: f32);
    fn adjust_pain(&mut self, patient: EntityId, channel: PainChannel, amount: f32);

    // --- Implants ---

    fn force_implant(&mut self, patient: EntityId, item: EntityId) -> bool;
    fn force_remove_implant(&mut self, patient: EntityId, implant: EntityId) -> bool;
    fn implant_is_permanent(&self, implant: EntityId) -> bool;

    // --- Stun / jitter / emote / popup ---

    fn stun(&mut self, patient: EntityId, secs: f32);
    fn knockdown(&mut self, patient: EntityId, secs: f32);
    fn slowdown(&mut self, patient: EntityId, secs: f32, walk_multiplier: f32);
    fn jitter(&mut self, patient: EntityId, secs: f32);
    fn emote_scream(&mut self, patient: EntityId);
    fn popup(&mut self, patient: EntityId, message: &str);
    fn force_drop_held(&mut self, patient: EntityId);
    fn inoculate(&mut self, patient: EntityId, disease: &str);

    // --- Inventory ---

    fn active_held_item(&self, actor: EntityId) -> Option<EntityId>;
    fn pickup_any_hand(&mut self, actor: EntityId, item: EntityId) -> bool;
    fn is_wearing(&self, patient: EntityId, slot: EquipSlot) -> bool;
    fn unequip_slot(&mut self, patient: EntityId, slot: EquipSlot);
    fn soil_worn_clothing(&mut self, actor: EntityId, amount: f32);

    // --- Internal cavity storage ---

    fn cavity_store(&mut self, patient: EntityId, part: &BodyPartId, item: EntityId) -> bool;
    fn cavity_retrieve(&mut self, patient: EntityId, part: &BodyPartId) -> Vec<EntityId>;

    // --- Environment / item queries ---

    /// Declared success multiplier of the operating table the patient is
    /// restrained on, if any. Values <= 0 are treated as misconfiguration
    /// by the engine and contribute nothing.
    fn operating_table_modifier(&self, patient: EntityId) -> Option<f32>;

    fn sterility(&self, item: EntityId) -> Option<Sterility>;
    fn set_sterility(&mut self, item: EntityId, sterility: Sterility);
    fn clear_sterility(&mut self, item: EntityId);

    /// All items currently carrying a sterility marker (for decay).
    fn sterile_items(&self) -> Vec<EntityId>;

    fn is_surgical_tool(&self, item: EntityId) -> bool;

    /// If the item is a severed body part, its symbolic id.
    fn item_as_part(&self, item: EntityId) -> Option<BodyPartId>;

    // --- Audit log ---

    /// Record a privileged medical action (implant work).
    fn audit(&mut self, actor: EntityId, patient: EntityId, action: &str);
}
