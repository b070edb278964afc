//! Hidden injury infliction and aggravation
//!
//! Two entry points. `on_damage_changed` turns incoming external damage
//! into hidden ledger entries by rolling each matching catalog spec.
//! `aggravate` runs one periodic pass over a patient's ledger: each
//! category flares with the configured chance, and a flare dispatches the
//! category handler with a jittered severity scaled by how many parts are
//! affected.

use tracing::debug;

use crate::body::{BodyPartId, PartType};
use crate::catalog::{DamageCatalog, DamageCategory, InternalDamageSpec};
use crate::core::{DamageId, DamageTypeId, DiceRoller, EngineConfig, EntityId};
use crate::ledger::DamageLedger;
use crate::services::{PainChannel, SurgeryHost};

/// Roll the catalog against an external damage change. Only positive
/// deltas can inflict; healing never seeds hidden injuries. Returns the
/// entries added to the ledger.
pub fn on_damage_changed(
    rng: &mut DiceRoller,
    catalog: &DamageCatalog,
    host: &dyn SurgeryHost,
    ledger: &mut DamageLedger,
    patient: EntityId,
    kind: &DamageTypeId,
    amount: f32,
) -> Vec<(DamageId, BodyPartId)> {
    let mut inflicted = Vec::new();
    if amount <= 0.0 {
        return inflicted;
    }
    let parts: Vec<BodyPartId> = host
        .body_parts(patient)
        .into_iter()
        .map(|(_, p)| p)
        .collect();
    if parts.is_empty() {
        return inflicted;
    }
    for spec in catalog.matching_type(kind) {
        if !rng.prob(spec.chance) {
            continue;
        }
        let eligible: Vec<BodyPartId> = parts
            .iter()
            .filter(|p| !spec.blacklist.contains(&p.part_type))
            .copied()
            .collect();
        let Some(part) = rng.pick(&eligible).copied() else {
            continue;
        };
        if ledger.add(&spec.id, part) {
            debug!(id = %spec.id, part = %part, "internal damage inflicted");
            inflicted.push((spec.id.clone(), part));
        }
    }
    inflicted
}

/// One aggravation pass over the whole ledger. Each category present
/// flares independently with `config.aggravation_chance`.
pub fn aggravate(
    config: &EngineConfig,
    rng: &mut DiceRoller,
    catalog: &DamageCatalog,
    host: &mut dyn SurgeryHost,
    ledger: &DamageLedger,
    patient: EntityId,
) {
    // Snapshot first: handlers take &mut host while we read the ledger.
    // Sorted so the roll sequence is stable under a fixed seed.
    let mut flares: Vec<(DamageId, Vec<BodyPartId>)> = ledger
        .iter()
        .map(|(id, parts)| (id.clone(), parts.iter().copied().collect()))
        .collect();
    flares.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
    for (id, parts) in flares {
        if !rng.prob(config.aggravation_chance) {
            continue;
        }
        let Some(spec) = catalog.get(&id) else {
            continue;
        };
        let (lo, hi) = config.severity_jitter;
        let severity = parts.len() as f32 * spec.severity * rng.range_f32(lo, hi);
        debug!(id = %id, severity, "internal damage aggravated");
        dispatch(rng, host, patient, spec, &parts, severity);
    }
}

fn dispatch(
    rng: &mut DiceRoller,
    host: &mut dyn SurgeryHost,
    patient: EntityId,
    spec: &InternalDamageSpec,
    parts: &[BodyPartId],
    severity: f32,
) {
    match spec.category {
        DamageCategory::PhysicalTrauma => physical_trauma(host, patient, parts, severity),
        DamageCategory::Burns => burns(host, patient, parts, severity),
        DamageCategory::Fractures => fractures(rng, host, patient, parts, severity),
        DamageCategory::InternalBleeding => internal_bleeding(rng, host, patient, severity),
        DamageCategory::CriticalBurns => critical_burns(rng, host, patient, severity),
        DamageCategory::ForeignObjects => foreign_objects(rng, host, patient, severity),
    }
}

fn trauma_channel(part: &BodyPartId) -> PainChannel {
    match part.part_type {
        PartType::Head => PainChannel::HeadTrauma,
        PartType::Torso => PainChannel::TorsoTrauma,
        PartType::Arm => PainChannel::ArmTrauma,
        PartType::Leg => PainChannel::LegTrauma,
        _ => PainChannel::LocalizedPain,
    }
}

fn physical_trauma(
    host: &mut dyn SurgeryHost,
    patient: EntityId,
    parts: &[BodyPartId],
    severity: f32,
) {
    host.adjust_pain(patient, PainChannel::Physical, 10.0 * severity);
    for part in parts {
        host.adjust_pain(patient, trauma_channel(part), 5.0 * severity);
    }
}

fn burns(host: &mut dyn SurgeryHost, patient: EntityId, parts: &[BodyPartId], severity: f32) {
    host.adjust_pain(patient, PainChannel::Burn, 8.0 * severity);
    let vital = parts
        .iter()
        .any(|p| matches!(p.part_type, PartType::Head | PartType::Torso));
    if vital {
        host.adjust_pain(patient, PainChannel::CriticalBurn, 5.0 * severity);
    }
}

fn fractures(
    rng: &mut DiceRoller,
    host: &mut dyn SurgeryHost,
    patient: EntityId,
    parts: &[BodyPartId],
    severity: f32,
) {
    // drop rolls and slowdown apply per affected part, so two broken
    // arms roll twice and two broken legs slow twice over
    for part in parts {
        let channel = match part.part_type {
            PartType::Arm => PainChannel::ArmFracture,
            PartType::Leg => PainChannel::LegFracture,
            _ => PainChannel::BoneFracture,
        };
        host.adjust_pain(patient, channel, 15.0 * severity);
        if part.is_arm() && rng.prob(0.3 * severity) {
            host.force_drop_held(patient);
        }
        if part.is_leg() {
            host.slowdown(patient, 5.0 * severity, 0.5);
        }
    }
    if parts.iter().filter(|p| p.is_leg()).count() >= 2 {
        host.knockdown(patient, 3.0 * severity);
    }
}

fn internal_bleeding(
    rng: &mut DiceRoller,
    host: &mut dyn SurgeryHost,
    patient: EntityId,
    severity: f32,
) {
    if host.has_bloodstream(patient) {
        host.modify_bleed(patient, 0.75 * severity);
        if rng.prob(0.3 * severity) {
            host.modify_blood_level(patient, -0.1 * severity);
        }
    }
    host.adjust_pain(patient, PainChannel::Internal, 12.0 * severity);
}

fn critical_burns(
    rng: &mut DiceRoller,
    host: &mut dyn SurgeryHost,
    patient: EntityId,
    severity: f32,
) {
    host.adjust_pain(patient, PainChannel::CriticalBurn, 25.0 * severity);
    if rng.prob(0.15 * severity) {
        host.stun(patient, 3.0 * severity);
        host.jitter(patient, 15.0);
    }
}

fn foreign_objects(
    rng: &mut DiceRoller,
    host: &mut dyn SurgeryHost,
    patient: EntityId,
    severity: f32,
) {
    host.adjust_pain(patient, PainChannel::ForeignObject, 15.0 * severity);
    if rng.prob(0.05 * severity) {
        host.inoculate(patient, "BloodInfection");
    }
    if rng.prob(0.4 * severity) {
        host.adjust_pain(patient, PainChannel::SharpPain, 30.0);
        host.popup(patient, "Something shifts painfully inside you!");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryHost;

    fn certain_catalog() -> DamageCatalog {
        let mut catalog = DamageCatalog::new();
        catalog
            .register(InternalDamageSpec {
                id: DamageId::from("CertainFracture"),
                severity: 1.0,
                category: DamageCategory::Fractures,
                chance: 1.0,
                blacklist: vec![PartType::Head],
                supported_types: vec![DamageTypeId::from("Blunt")],
                examine_hint: None,
            })
            .unwrap();
        catalog
    }

    #[test]
    fn test_healing_never_inflicts() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let mut rng = DiceRoller::seeded(1);
        let mut ledger = DamageLedger::new();
        let inflicted = on_damage_changed(
            &mut rng,
            &certain_catalog(),
            &host,
            &mut ledger,
            patient,
            &DamageTypeId::from("Blunt"),
            -10.0,
        );
        assert!(inflicted.is_empty());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_certain_spec_inflicts_exactly_one_part() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let mut rng = DiceRoller::seeded(7);
        let mut ledger = DamageLedger::new();
        let inflicted = on_damage_changed(
            &mut rng,
            &certain_catalog(),
            &host,
            &mut ledger,
            patient,
            &DamageTypeId::from("Blunt"),
            12.0,
        );
        assert_eq!(inflicted.len(), 1);
        let (id, part) = &inflicted[0];
        assert_eq!(id, &DamageId::from("CertainFracture"));
        assert_ne!(part.part_type, PartType::Head);
        assert_eq!(ledger.parts(id).unwrap().len(), 1);
    }

    #[test]
    fn test_unmatched_damage_type_inflicts_nothing() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let mut rng = DiceRoller::seeded(7);
        let mut ledger = DamageLedger::new();
        let inflicted = on_damage_changed(
            &mut rng,
            &certain_catalog(),
            &host,
            &mut ledger,
            patient,
            &DamageTypeId::from("Heat"),
            50.0,
        );
        assert!(inflicted.is_empty());
    }

    #[test]
    fn test_blacklist_respected_over_many_rolls() {
        let catalog = certain_catalog();
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let mut rng = DiceRoller::seeded(99);
        let mut ledger = DamageLedger::new();
        for _ in 0..64 {
            on_damage_changed(
                &mut rng,
                &catalog,
                &host,
                &mut ledger,
                patient,
                &DamageTypeId::from("Blunt"),
                5.0,
            );
        }
        let parts = ledger.parts(&DamageId::from("CertainFracture")).unwrap();
        assert!(parts.iter().all(|p| p.part_type != PartType::Head));
    }

    #[test]
    fn test_two_broken_legs_knock_down() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let mut rng = DiceRoller::seeded(3);
        let spec = InternalDamageSpec {
            id: DamageId::from("CertainFracture"),
            severity: 1.0,
            category: DamageCategory::Fractures,
            chance: 1.0,
            blacklist: vec![],
            supported_types: vec![DamageTypeId::from("Blunt")],
            examine_hint: None,
        };
        let parts = [
            BodyPartId::left(PartType::Leg),
            BodyPartId::right(PartType::Leg),
        ];
        dispatch(&mut rng, &mut host, patient, &spec, &parts, 1.0);
        assert!(host.patient(patient).knockdown_secs > 0.0);
        assert!(host.patient(patient).slowdown_secs > 0.0);
    }

    #[test]
    fn test_single_broken_leg_slows_but_stands() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let mut rng = DiceRoller::seeded(3);
        let spec = InternalDamageSpec {
            id: DamageId::from("CertainFracture"),
            severity: 1.0,
            category: DamageCategory::Fractures,
            chance: 1.0,
            blacklist: vec![],
            supported_types: vec![DamageTypeId::from("Blunt")],
            examine_hint: None,
        };
        let parts = [BodyPartId::left(PartType::Leg)];
        dispatch(&mut rng, &mut host, patient, &spec, &parts, 1.0);
        assert!(host.patient(patient).slowdown_secs > 0.0);
        assert_eq!(host.patient(patient).knockdown_secs, 0.0);
    }

    #[test]
    fn test_fracture_effects_apply_per_part() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let mut rng = DiceRoller::seeded(3);
        let spec = InternalDamageSpec {
            id: DamageId::from("CertainFracture"),
            severity: 1.0,
            category: DamageCategory::Fractures,
            chance: 1.0,
            blacklist: vec![],
            supported_types: vec![DamageTypeId::from("Blunt")],
            examine_hint: None,
        };

        // 0.3 * severity >= 1.0 makes every drop roll certain
        let arms = [
            BodyPartId::left(PartType::Arm),
            BodyPartId::right(PartType::Arm),
        ];
        dispatch(&mut rng, &mut host, patient, &spec, &arms, 4.0);
        assert_eq!(host.patient(patient).forced_drops, 2);

        let legs = [
            BodyPartId::left(PartType::Leg),
            BodyPartId::right(PartType::Leg),
        ];
        dispatch(&mut rng, &mut host, patient, &spec, &legs, 1.0);
        assert!((host.patient(patient).slowdown_secs - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_internal_bleeding_raises_bleed_rate() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let mut rng = DiceRoller::seeded(5);
        internal_bleeding(&mut rng, &mut host, patient, 2.0);
        assert!((host.patient(patient).bleed_rate - 1.5).abs() < 1e-6);
        assert!(host.patient(patient).pain[&PainChannel::Internal] > 0.0);
    }

    #[test]
    fn test_burns_on_torso_add_critical_pain() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        burns(
            &mut host,
            patient,
            &[BodyPartId::unpaired(PartType::Torso)],
            1.0,
        );
        assert!(host.patient(patient).pain[&PainChannel::CriticalBurn] > 0.0);

        let limb_only = host.spawn_humanoid();
        burns(
            &mut host,
            limb_only,
            &[BodyPartId::left(PartType::Arm)],
            1.0,
        );
        assert!(!host
            .patient(limb_only)
            .pain
            .contains_key(&PainChannel::CriticalBurn));
    }

    #[test]
    fn test_aggravation_with_zero_chance_is_silent() {
        let mut host = MemoryHost::new();
        let patient = host.spawn_humanoid();
        let mut rng = DiceRoller::seeded(11);
        let catalog = certain_catalog();
        let mut ledger = DamageLedger::new();
        ledger.add(
            &DamageId::from("CertainFracture"),
            BodyPartId::left(PartType::Leg),
        );

        let mut config = EngineConfig::default();
        config.aggravation_chance = 0.0;
        aggravate(&config, &mut rng, &catalog, &mut host, &ledger, patient);
        assert!(host.patient(patient).pain.is_empty());
    }
}
