//! Hidden-injury infliction and flare-up behavior through the engine.

use medbay::body::PartType;
use medbay::catalog::{DamageCatalog, DamageCategory, InternalDamageSpec};
use medbay::core::{DamageId, DamageTypeId};
use medbay::procedure::GraphLibrary;
use medbay::services::memory::MemoryHost;
use medbay::services::{PainChannel, SurgeryHost};
use medbay::{ActionKind, EngineConfig, StepRequest, SurgeryEngine};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A catalog with one certain fracture that can only land on legs, and a
/// config that flares every tick.
fn leg_fracture_setup() -> (SurgeryEngine, MemoryHost, medbay::EntityId) {
    init_tracing();
    let mut catalog = DamageCatalog::new();
    catalog
        .register(InternalDamageSpec {
            id: DamageId::from("CertainLegFracture"),
            severity: 1.0,
            category: DamageCategory::Fractures,
            chance: 1.0,
            blacklist: vec![
                PartType::Head,
                PartType::Torso,
                PartType::Arm,
                PartType::Hand,
                PartType::Foot,
                PartType::Tail,
                PartType::Other,
            ],
            supported_types: vec![DamageTypeId::from("Blunt")],
            examine_hint: Some("A leg bends where it should not.".into()),
        })
        .unwrap();

    let mut config = EngineConfig::default();
    config.aggravation_chance = 1.0;
    let mut engine =
        SurgeryEngine::with_data(config, catalog, GraphLibrary::with_defaults()).unwrap();
    engine.reseed(42);

    let mut host = MemoryHost::new();
    let patient = host.spawn_humanoid();
    (engine, host, patient)
}

#[test]
fn test_certain_spec_hits_one_leg_per_event() {
    let (mut engine, host, patient) = leg_fracture_setup();
    let inflicted = engine.on_damage_changed(&host, patient, &DamageTypeId::from("Blunt"), 10.0);
    assert_eq!(inflicted.len(), 1);
    assert!(inflicted[0].1.is_leg());
    assert_eq!(inflicted[0].0, DamageId::from("CertainLegFracture"));
}

#[test]
fn test_both_legs_fractured_knocks_down_on_flare() {
    let (mut engine, mut host, patient) = leg_fracture_setup();
    // with only two eligible legs, repeated hits cover both
    for _ in 0..32 {
        engine.on_damage_changed(&host, patient, &DamageTypeId::from("Blunt"), 10.0);
    }
    let record = engine.record(patient).unwrap();
    assert_eq!(
        record
            .ledger
            .parts(&DamageId::from("CertainLegFracture"))
            .unwrap()
            .len(),
        2
    );

    engine.tick(&mut host, 5.0);
    let body = host.patient(patient);
    assert!(body.knockdown_secs > 0.0);
    assert!(body.slowdown_secs > 0.0);
    assert!(body.pain[&PainChannel::LegFracture] > 0.0);
}

#[test]
fn test_healing_damage_inflicts_nothing() {
    let (mut engine, host, patient) = leg_fracture_setup();
    let inflicted = engine.on_damage_changed(&host, patient, &DamageTypeId::from("Blunt"), -25.0);
    assert!(inflicted.is_empty());
    assert!(engine.record(patient).unwrap().ledger.is_empty());
}

#[test]
fn test_dead_patients_do_not_flare() {
    let (mut engine, mut host, patient) = leg_fracture_setup();
    engine.on_damage_changed(&host, patient, &DamageTypeId::from("Blunt"), 10.0);
    host.patient_mut(patient).dead = true;

    engine.tick(&mut host, 25.0);
    assert!(host.patient(patient).pain.is_empty());
    assert_eq!(host.patient(patient).knockdown_secs, 0.0);
}

#[test]
fn test_limb_surgery_pauses_flares() {
    let (mut engine, mut host, patient) = leg_fracture_setup();
    engine.on_damage_changed(&host, patient, &DamageTypeId::from("Blunt"), 10.0);

    let surgeon = host.spawn_actor();
    let tool = host.spawn_tool(true, Some(medbay::sterility::Sterility::permanent()));
    host.give_item(surgeon, tool);
    engine.apply_antiseptic(patient, 1.0);
    for action in [ActionKind::Cut, ActionKind::Retract, ActionKind::ClampBleeding] {
        engine
            .request_step(&mut host, StepRequest::new(patient, surgeon, action))
            .unwrap();
    }
    // park the delayed amputation; flares pause while it is in progress
    engine
        .request_step(
            &mut host,
            StepRequest::new(patient, surgeon, ActionKind::RemovePart)
                .on_part(medbay::body::BodyPartId::left(PartType::Leg)),
        )
        .unwrap();
    assert!(engine.record(patient).unwrap().limb_surgery);

    engine.tick(&mut host, 5.0);
    assert!(!host.patient(patient).pain.contains_key(&PainChannel::LegFracture));
}

#[test]
fn test_sub_interval_ticks_accumulate() {
    let (mut engine, mut host, patient) = leg_fracture_setup();
    engine.on_damage_changed(&host, patient, &DamageTypeId::from("Blunt"), 10.0);

    for _ in 0..4 {
        engine.tick(&mut host, 1.0);
        assert!(host.patient(patient).pain.is_empty());
    }
    engine.tick(&mut host, 1.0); // crosses the 5s interval
    assert!(!host.patient(patient).pain.is_empty());
}

#[test]
fn test_examine_hint_surfaces_after_injury() {
    let (mut engine, host, patient) = leg_fracture_setup();
    assert!(engine.describe_internal_damage(patient).is_empty());
    engine.on_damage_changed(&host, patient, &DamageTypeId::from("Blunt"), 10.0);
    assert_eq!(
        engine.describe_internal_damage(patient),
        vec!["A leg bends where it should not.".to_string()]
    );
}

#[test]
fn test_default_catalog_burn_story() {
    init_tracing();
    let mut config = EngineConfig::default();
    config.aggravation_chance = 1.0;
    let mut engine = SurgeryEngine::with_data(
        config,
        DamageCatalog::with_defaults(),
        GraphLibrary::with_defaults(),
    )
    .unwrap();
    engine.reseed(7);
    let mut host = MemoryHost::new();
    let patient = host.spawn_humanoid();

    // heat damage until a burn category lands
    let mut burned = false;
    for _ in 0..64 {
        burned |= !engine
            .on_damage_changed(&host, patient, &DamageTypeId::from("Heat"), 15.0)
            .is_empty();
    }
    assert!(burned, "64 heat events at 40% chance must inflict");

    engine.tick(&mut host, 5.0);
    let pain = &host.patient(patient).pain;
    let burn = pain.get(&PainChannel::Burn).copied().unwrap_or(0.0);
    let critical = pain.get(&PainChannel::CriticalBurn).copied().unwrap_or(0.0);
    assert!(burn > 0.0 || critical > 0.0);
}
