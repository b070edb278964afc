//! Step resolution
//!
//! Resolves one attempted surgical step against a patient: compute the
//! success chance, roll, and dispatch the success handler or draw a
//! failure effect. All world mutation goes through the `SurgeryHost`
//! seam; the resolver itself only touches the operation record's ledger
//! and sterility scalar.

pub mod actions;

use tracing::debug;

use crate::body::{BodyPartId, EquipSlot, PartType};
use crate::core::{
    DamageId, DamageTypeId, EngineConfig, EntityId, OrganId, Result, SurgeryError,
};
use crate::core::DiceRoller;
use crate::procedure::{OperationRecord, SurgeryStep};
use crate::services::{PainChannel, SurgeryHost};
use crate::sterility::clamp_patient_sterility;

use actions::{ActionKind, FailureEffect, SyntheticEffect};

/// One requested surgical step
#[derive(Debug, Clone)]
pub struct StepRequest {
    pub patient: EntityId,
    pub actor: EntityId,
    pub action: ActionKind,
    /// Body part the step targets, for part and cavity work
    pub target_part: Option<BodyPartId>,
    /// Organ slot the step targets, for organ work
    pub target_organ: Option<OrganId>,
    /// Ledger category to heal
    pub damage_id: Option<DamageId>,
    /// Item consumed or manipulated by the step (organ, implant, part)
    pub item: Option<EntityId>,
}

impl StepRequest {
    pub fn new(patient: EntityId, actor: EntityId, action: ActionKind) -> Self {
        Self {
            patient,
            actor,
            action,
            target_part: None,
            target_organ: None,
            damage_id: None,
            item: None,
        }
    }

    pub fn on_part(mut self, part: BodyPartId) -> Self {
        self.target_part = Some(part);
        self
    }

    /// Target a part by its symbolic descriptor (`"left_arm"`, `"torso"`).
    pub fn on_part_descriptor(self, descriptor: &str) -> Result<Self> {
        Ok(self.on_part(BodyPartId::parse(descriptor)?))
    }

    pub fn on_organ(mut self, organ: OrganId) -> Self {
        self.target_organ = Some(organ);
        self
    }

    pub fn healing(mut self, id: DamageId) -> Self {
        self.damage_id = Some(id);
        self
    }

    pub fn with_item(mut self, item: EntityId) -> Self {
        self.item = Some(item);
        self
    }
}

/// Observable consequence of a resolved step
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedEffect {
    BleedChanged(f32),
    OrganRemoved(EntityId),
    OrganInserted(EntityId),
    PartDetached(BodyPartId),
    PartAttached(BodyPartId),
    Implanted(EntityId),
    ImplantRemoved(EntityId),
    ItemStored(EntityId),
    ItemsRetrieved(Vec<EntityId>),
    InternalHealed(DamageId, BodyPartId),
    DamageDealt(DamageTypeId, f32),
    InternalInflicted(DamageId, BodyPartId),
    Stunned(f32),
    PainReaction,
    Infected,
}

/// What one resolved step did
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub success: bool,
    pub effects: Vec<AppliedEffect>,
}

/// Compute the effective success chance for a step.
///
/// Base chance times the clamped patient sterility times the operating
/// table modifier. A table declaring a non-positive modifier is treated
/// as misconfigured and contributes nothing, same as no table at all.
pub fn success_chance(
    config: &EngineConfig,
    record: &OperationRecord,
    step: &SurgeryStep,
    table: Option<f32>,
) -> f32 {
    let sterility = clamp_patient_sterility(record.sterility, config.sterility_max);
    let table = match table {
        Some(m) if m > 0.0 => m,
        _ => 1.0,
    };
    step.base_chance * sterility * table
}

/// Deterministic fast path: a sterile surgical tool in the hand of a
/// surgeon working a maximally sterile patient never slips.
fn sterile_fast_path(
    config: &EngineConfig,
    host: &dyn SurgeryHost,
    record: &OperationRecord,
    actor: EntityId,
) -> bool {
    if record.sterility < config.sterility_max {
        return false;
    }
    let Some(item) = host.active_held_item(actor) else {
        return false;
    };
    host.is_surgical_tool(item) && host.sterility(item).is_some_and(|s| s.is_sterile())
}

/// Resolve one step end to end. The caller has already validated graph
/// legality and taken the operation lock.
pub fn resolve_step(
    config: &EngineConfig,
    rng: &mut DiceRoller,
    host: &mut dyn SurgeryHost,
    record: &mut OperationRecord,
    step: &SurgeryStep,
    req: &StepRequest,
) -> Result<Resolution> {
    let mechanical = host.is_mechanical(req.patient);
    if req.action.is_synthetic() && !mechanical {
        return Err(SurgeryError::ChassisMismatch(format!(
            "{:?} requires a mechanical chassis",
            req.action
        )));
    }
    if req.action.is_organic_only() && mechanical {
        return Err(SurgeryError::ChassisMismatch(format!(
            "{:?} cannot be performed on a mechanical chassis",
            req.action
        )));
    }

    let success = if sterile_fast_path(config, host, record, req.actor) {
        true
    } else {
        let p = success_chance(config, record, step, host.operating_table_modifier(req.patient));
        rng.prob(p)
    };
    debug!(
        action = ?req.action,
        patient = %req.patient,
        success,
        "step resolved"
    );

    let mut effects = Vec::new();
    if success {
        apply_success(config, rng, host, record, req, &mut effects)?;
        if req.action.smears_blood() && !mechanical {
            host.soil_worn_clothing(req.actor, config.blood_smear);
        }
    } else {
        apply_failure(config, rng, host, record, req, step, &mut effects);
    }
    // operating on a conscious patient hurts, success or not
    if can_feel_it(host, record, req.patient) {
        host.emote_scream(req.patient);
    }

    Ok(Resolution { success, effects })
}

fn apply_success(
    config: &EngineConfig,
    rng: &mut DiceRoller,
    host: &mut dyn SurgeryHost,
    record: &mut OperationRecord,
    req: &StepRequest,
    effects: &mut Vec<AppliedEffect>,
) -> Result<()> {
    match req.action {
        ActionKind::Cut => {
            if host.has_bloodstream(req.patient) {
                host.modify_bleed(req.patient, config.cut_bleed);
                effects.push(AppliedEffect::BleedChanged(config.cut_bleed));
            }
        }
        // Retraction repositions tissue without wounding anything new
        ActionKind::Retract => {}
        ActionKind::ClampBleeding => {
            if host.has_bloodstream(req.patient) {
                host.modify_bleed(req.patient, config.clamp_bleed);
                effects.push(AppliedEffect::BleedChanged(config.clamp_bleed));
            }
        }
        ActionKind::DrillThrough => {
            let piercing = DamageTypeId::from("Piercing");
            host.apply_damage(req.patient, &piercing, config.drill_pierce);
            effects.push(AppliedEffect::DamageDealt(piercing, config.drill_pierce));
        }
        ActionKind::RemoveOrgan => {
            let organ_type = req
                .target_organ
                .as_ref()
                .ok_or_else(|| SurgeryError::MissingPrerequisite("no organ targeted".into()))?;
            let organ = host
                .organs_of_type(req.patient, organ_type)
                .into_iter()
                .next()
                .ok_or_else(|| SurgeryError::TargetNotFound(organ_type.to_string()))?;
            if !host.remove_organ(req.patient, organ) {
                return Err(SurgeryError::TargetNotFound(organ_type.to_string()));
            }
            host.pickup_any_hand(req.actor, organ);
            host.modify_bleed(req.patient, config.extraction_bleed);
            effects.push(AppliedEffect::OrganRemoved(organ));
            effects.push(AppliedEffect::BleedChanged(config.extraction_bleed));
        }
        ActionKind::InsertOrgan => {
            let organ_type = req
                .target_organ
                .as_ref()
                .ok_or_else(|| SurgeryError::MissingPrerequisite("no organ targeted".into()))?;
            let item = req
                .item
                .ok_or_else(|| SurgeryError::MissingPrerequisite("no organ in hand".into()))?;
            let slot = host
                .free_organ_slot(req.patient, organ_type)
                .ok_or_else(|| {
                    SurgeryError::MissingPrerequisite(format!("no free {organ_type} slot"))
                })?;
            if !host.insert_organ(slot, organ_type, item) {
                return Err(SurgeryError::MissingPrerequisite(format!(
                    "{organ_type} slot rejected the organ"
                )));
            }
            effects.push(AppliedEffect::OrganInserted(item));
            maybe_infect(config, rng, host, req.patient, item, effects);
        }
        ActionKind::RemovePart => {
            let part_id = req
                .target_part
                .ok_or_else(|| SurgeryError::MissingPrerequisite("no body part targeted".into()))?;
            let part = host
                .body_parts(req.patient)
                .into_iter()
                .find(|(_, p)| *p == part_id)
                .map(|(e, _)| e)
                .ok_or_else(|| SurgeryError::TargetNotFound(part_id.to_string()))?;
            if !host.detach_part(req.patient, part) {
                return Err(SurgeryError::TargetNotFound(part_id.to_string()));
            }
            host.pickup_any_hand(req.actor, part);
            host.modify_bleed(req.patient, config.extraction_bleed);
            effects.push(AppliedEffect::PartDetached(part_id));
            effects.push(AppliedEffect::BleedChanged(config.extraction_bleed));
            drop_unsupported_clothing(host, req.patient);
        }
        ActionKind::AttachPart => {
            let item = req
                .item
                .ok_or_else(|| SurgeryError::MissingPrerequisite("no part in hand".into()))?;
            let part_id = host
                .item_as_part(item)
                .ok_or_else(|| {
                    SurgeryError::MissingPrerequisite("held item is not a body part".into())
                })?;
            let slot = req.target_part.unwrap_or(part_id);
            if slot != part_id {
                return Err(SurgeryError::ChassisMismatch(format!(
                    "cannot attach {part_id} to the {slot} mount"
                )));
            }
            if !host.attach_part(req.patient, &slot, item) {
                return Err(SurgeryError::MissingPrerequisite(format!(
                    "{slot} is already occupied"
                )));
            }
            effects.push(AppliedEffect::PartAttached(slot));
            maybe_infect(config, rng, host, req.patient, item, effects);
        }
        ActionKind::Implanting => {
            let item = req
                .item
                .ok_or_else(|| SurgeryError::MissingPrerequisite("no implant in hand".into()))?;
            if !host.force_implant(req.patient, item) {
                return Err(SurgeryError::MissingPrerequisite("implant rejected".into()));
            }
            host.audit(req.actor, req.patient, "implant inserted");
            effects.push(AppliedEffect::Implanted(item));
        }
        ActionKind::RemoveImplant => {
            let implant = req
                .item
                .ok_or_else(|| SurgeryError::MissingPrerequisite("no implant targeted".into()))?;
            if host.implant_is_permanent(implant) {
                return Err(SurgeryError::MissingPrerequisite(
                    "implant is permanently bonded".into(),
                ));
            }
            if !host.force_remove_implant(req.patient, implant) {
                return Err(SurgeryError::TargetNotFound("implant".into()));
            }
            host.pickup_any_hand(req.actor, implant);
            host.audit(req.actor, req.patient, "implant removed");
            effects.push(AppliedEffect::ImplantRemoved(implant));
        }
        ActionKind::StoreItem => {
            let item = req
                .item
                .ok_or_else(|| SurgeryError::MissingPrerequisite("nothing to store".into()))?;
            let part = req
                .target_part
                .unwrap_or_else(|| BodyPartId::unpaired(PartType::Torso));
            if !host.cavity_store(req.patient, &part, item) {
                return Err(SurgeryError::TargetNotFound(part.to_string()));
            }
            effects.push(AppliedEffect::ItemStored(item));
        }
        ActionKind::RetrieveItems => {
            let part = req
                .target_part
                .unwrap_or_else(|| BodyPartId::unpaired(PartType::Torso));
            let items = host.cavity_retrieve(req.patient, &part);
            for item in &items {
                host.pickup_any_hand(req.actor, *item);
            }
            effects.push(AppliedEffect::ItemsRetrieved(items));
        }
        ActionKind::HealInternalDamage => {
            let id = req
                .damage_id
                .clone()
                .ok_or_else(|| SurgeryError::MissingPrerequisite("no injury targeted".into()))?;
            let part = req
                .target_part
                .ok_or_else(|| SurgeryError::MissingPrerequisite("no body part targeted".into()))?;
            if !record.ledger.heal(&id, &part) {
                return Err(SurgeryError::TargetNotFound(format!("{id} at {part}")));
            }
            effects.push(AppliedEffect::InternalHealed(id, part));
        }
        // Synthetic chassis work
        _ => match req.action.effect_on_synthetic() {
            Some(SyntheticEffect::Structural(delta)) => {
                let structure = DamageTypeId::from("Structure");
                host.apply_damage(req.patient, &structure, delta);
                effects.push(AppliedEffect::DamageDealt(structure, delta));
            }
            Some(SyntheticEffect::Stun(secs)) => {
                host.stun(req.patient, secs);
                effects.push(AppliedEffect::Stunned(secs));
            }
            None => {}
        },
    }
    Ok(())
}

fn apply_failure(
    config: &EngineConfig,
    rng: &mut DiceRoller,
    host: &mut dyn SurgeryHost,
    record: &mut OperationRecord,
    req: &StepRequest,
    step: &SurgeryStep,
    effects: &mut Vec<AppliedEffect>,
) {
    let pool = step.failure_pool();
    let Some(effect) = rng.pick(&pool).cloned() else {
        return;
    };
    debug!(action = ?req.action, effect = ?effect, "step failed");
    match effect {
        FailureEffect::Bleed => {
            if host.has_bloodstream(req.patient) {
                host.modify_bleed(req.patient, config.failure_bleed);
                effects.push(AppliedEffect::BleedChanged(config.failure_bleed));
            }
        }
        FailureEffect::Slash(amount) => {
            let slash = DamageTypeId::from("Slash");
            host.apply_damage(req.patient, &slash, amount);
            effects.push(AppliedEffect::DamageDealt(slash, amount));
        }
        FailureEffect::Heat(amount) => {
            let heat = DamageTypeId::from("Heat");
            host.apply_damage(req.patient, &heat, amount);
            effects.push(AppliedEffect::DamageDealt(heat, amount));
        }
        FailureEffect::Internal(id) => {
            let part = req.target_part.or_else(|| {
                let parts = host.body_parts(req.patient);
                let ids: Vec<BodyPartId> = parts.into_iter().map(|(_, p)| p).collect();
                rng.pick(&ids).copied()
            });
            if let Some(part) = part {
                record.ledger.add(&id, part);
                effects.push(AppliedEffect::InternalInflicted(id, part));
            }
        }
        FailureEffect::PainReaction => {
            if can_feel_it(host, record, req.patient) {
                host.jitter(req.patient, config.pain_jitter_secs);
                host.adjust_pain(req.patient, PainChannel::SharpPain, 5.0);
                effects.push(AppliedEffect::PainReaction);
            }
        }
    }
}

/// Patients cannot react to pain while dead, asleep, pain-numbed,
/// mechanical, or mid limb-operation.
fn can_feel_it(host: &dyn SurgeryHost, record: &OperationRecord, patient: EntityId) -> bool {
    !(host.is_dead(patient)
        || host.is_asleep(patient)
        || host.is_pain_numbed(patient)
        || host.is_mechanical(patient)
        || record.limb_surgery)
}

/// Inserting unsterilized tissue risks a bloodstream infection.
fn maybe_infect(
    config: &EngineConfig,
    rng: &mut DiceRoller,
    host: &mut dyn SurgeryHost,
    patient: EntityId,
    item: EntityId,
    effects: &mut Vec<AppliedEffect>,
) {
    let sterile = host.sterility(item).is_some_and(|s| s.is_sterile());
    if !sterile && rng.prob(config.infection_chance) {
        host.inoculate(patient, "BloodInfection");
        effects.push(AppliedEffect::Infected);
    }
}

/// After losing a limb, clothing the remaining body can no longer
/// support slides off.
pub fn drop_unsupported_clothing(host: &mut dyn SurgeryHost, patient: EntityId) {
    let parts: Vec<BodyPartId> = host
        .body_parts(patient)
        .into_iter()
        .map(|(_, p)| p)
        .collect();
    for slot in EquipSlot::all() {
        if host.is_wearing(patient, slot) && !slot.supported_by(&parts) {
            host.unequip_slot(patient, slot);
        }
    }
}
