//! Surgery engine
//!
//! Owns the per-patient operation records, the damage catalog, the
//! procedure graph library, and the seeded dice. The surrounding
//! simulation drives it through four entry points: `request_step` when a
//! surgeon acts, `on_damage_changed` when external damage lands,
//! `tick` on the shared cadence, and `cancel`/`reset` for interruption
//! and rejuvenation.

use ahash::AHashMap;
use tracing::{debug, info};

use crate::aggravation;
use crate::body::BodyPartId;
use crate::catalog::DamageCatalog;
use crate::core::{
    DamageId, DamageTypeId, DiceRoller, EngineConfig, EntityId, GraphId, NodeId, Result,
    SurgeryError,
};
use crate::procedure::{GraphLibrary, OperationRecord, SurgeryStep, ORGANIC_GRAPH, SYNTHETIC_GRAPH};
use crate::resolver::{self, AppliedEffect, StepRequest};
use crate::services::SurgeryHost;
use crate::sterility::{clamp_patient_sterility, Sterility};

/// Result of one `request_step` call
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    /// Step needs focused time; it resolves on a later tick
    pub pending: bool,
    pub success: bool,
    /// Node committed by this step, when it completed an edge
    pub committed_node: Option<NodeId>,
    pub effects: Vec<AppliedEffect>,
}

impl StepOutcome {
    fn deferred() -> Self {
        Self {
            pending: true,
            success: false,
            committed_node: None,
            effects: Vec::new(),
        }
    }
}

/// A step waiting out its delay
#[derive(Debug, Clone)]
struct PendingStep {
    request: StepRequest,
    step: SurgeryStep,
    step_index: usize,
    edge_len: usize,
    remaining: f32,
}

pub struct SurgeryEngine {
    config: EngineConfig,
    catalog: DamageCatalog,
    graphs: GraphLibrary,
    records: AHashMap<EntityId, OperationRecord>,
    pending: AHashMap<EntityId, PendingStep>,
    rng: DiceRoller,
    item_accum: f32,
}

impl SurgeryEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_data(config, DamageCatalog::with_defaults(), GraphLibrary::with_defaults())
    }

    pub fn with_data(
        config: EngineConfig,
        catalog: DamageCatalog,
        graphs: GraphLibrary,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SurgeryError::Catalog(format!("engine config: {e}")))?;
        info!(
            categories = catalog.len(),
            graphs = graphs.len(),
            "surgery engine initialized"
        );
        Ok(Self {
            config,
            catalog,
            graphs,
            records: AHashMap::new(),
            pending: AHashMap::new(),
            rng: DiceRoller::default(),
            item_accum: 0.0,
        })
    }

    /// Reseed the dice; subsequent rolls replay deterministically.
    pub fn reseed(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DamageCatalog {
        &self.catalog
    }

    /// The operation record for a patient, if the engine has seen them.
    pub fn record(&self, patient: EntityId) -> Option<&OperationRecord> {
        self.records.get(&patient)
    }

    fn record_entry(&mut self, patient: EntityId) -> &mut OperationRecord {
        self.records
            .entry(patient)
            .or_insert_with(|| OperationRecord::new(self.config.sterility_default))
    }

    fn graph_for(&self, host: &dyn SurgeryHost, patient: EntityId) -> GraphId {
        if host.is_mechanical(patient) {
            GraphId::from(SYNTHETIC_GRAPH)
        } else {
            GraphId::from(ORGANIC_GRAPH)
        }
    }

    /// Attempt one surgical step. Validates contention and graph
    /// legality before anything mutates; a delayed step parks as pending
    /// and resolves through `tick`.
    pub fn request_step(
        &mut self,
        host: &mut dyn SurgeryHost,
        req: StepRequest,
    ) -> Result<StepOutcome> {
        let patient = req.patient;
        if self.pending.contains_key(&patient) {
            return Err(SurgeryError::Busy);
        }
        let default_sterility = self.config.sterility_default;
        let graph_id = self
            .records
            .get(&patient)
            .and_then(|r| r.graph_id.clone())
            .unwrap_or_else(|| self.graph_for(host, patient));
        {
            let record = self
                .records
                .entry(patient)
                .or_insert_with(|| OperationRecord::new(default_sterility));
            if record.locked_by_other(req.actor) {
                return Err(SurgeryError::Busy);
            }
            record.graph_id.get_or_insert_with(|| graph_id.clone());
        }

        let graph = self.graphs.get(&graph_id).ok_or_else(|| {
            SurgeryError::Catalog(format!("unknown procedure graph '{graph_id}'"))
        })?;
        let (current, target_lock, completed) = {
            let record = &self.records[&patient];
            (
                record.current_node.clone(),
                record.current_target_node.clone(),
                record.completed_steps.clone(),
            )
        };
        // prefer the edge in progress; otherwise switching edges is
        // allowed and abandons prior progress
        let Some(step_ref) = graph
            .select_step(&current, target_lock.as_ref(), &completed, req.action)
            .or_else(|| graph.select_step(&current, None, &completed, req.action))
        else {
            return Err(SurgeryError::InvalidTransition(
                req.action,
                format!("not available at node '{current}'"),
            ));
        };
        let step = step_ref.step.clone();
        let target = step_ref.target.clone();
        let step_index = step_ref.step_index;
        let edge_len = graph
            .edge_len(&current, &target)
            .unwrap_or(step_ref.step_index + 1);

        let record = self
            .records
            .get_mut(&patient)
            .ok_or_else(|| SurgeryError::TargetNotFound(patient.to_string()))?;
        record.begin_step(req.actor, target, step_index, req.action.is_limb_operation());
        debug!(action = ?req.action, patient = %patient, step_index, "step begun");

        if let Some(delay) = step.delay {
            self.pending.insert(
                patient,
                PendingStep {
                    request: req,
                    step,
                    step_index,
                    edge_len,
                    remaining: delay,
                },
            );
            return Ok(StepOutcome::deferred());
        }
        self.finish_step(
            host,
            PendingStep {
                request: req,
                step,
                step_index,
                edge_len,
                remaining: 0.0,
            },
        )
    }

    fn finish_step(
        &mut self,
        host: &mut dyn SurgeryHost,
        pending: PendingStep,
    ) -> Result<StepOutcome> {
        let patient = pending.request.patient;
        let record = self
            .records
            .get_mut(&patient)
            .ok_or_else(|| SurgeryError::TargetNotFound(patient.to_string()))?;
        match resolver::resolve_step(
            &self.config,
            &mut self.rng,
            host,
            record,
            &pending.step,
            &pending.request,
        ) {
            Ok(res) => {
                let committed = if res.success {
                    record.complete_step(pending.step_index, pending.edge_len)
                } else {
                    record.release();
                    None
                };
                if let Some(node) = &committed {
                    debug!(patient = %patient, node = %node, "node committed");
                }
                Ok(StepOutcome {
                    pending: false,
                    success: res.success,
                    committed_node: committed,
                    effects: res.effects,
                })
            }
            Err(e) => {
                record.release();
                Err(e)
            }
        }
    }

    /// Abort the current step. Idempotent; edge progress survives so the
    /// operation can be resumed later.
    pub fn cancel(&mut self, patient: EntityId) {
        if self.pending.remove(&patient).is_some() {
            debug!(patient = %patient, "pending step cancelled");
        }
        if let Some(record) = self.records.get_mut(&patient) {
            record.release();
        }
    }

    /// Full rejuvenation: pristine record, restored body.
    pub fn reset(&mut self, host: &mut dyn SurgeryHost, patient: EntityId) {
        self.pending.remove(&patient);
        let sterility = self.config.sterility_default;
        self.record_entry(patient).reset(sterility);
        host.restore_body(patient);
        info!(patient = %patient, "patient reset");
    }

    /// Hook for external damage changes; rolls the catalog and records
    /// any new hidden injuries.
    pub fn on_damage_changed(
        &mut self,
        host: &dyn SurgeryHost,
        patient: EntityId,
        kind: &DamageTypeId,
        amount: f32,
    ) -> Vec<(DamageId, BodyPartId)> {
        let record = self
            .records
            .entry(patient)
            .or_insert_with(|| OperationRecord::new(self.config.sterility_default));
        aggravation::on_damage_changed(
            &mut self.rng,
            &self.catalog,
            host,
            &mut record.ledger,
            patient,
            kind,
            amount,
        )
    }

    /// Advance simulated time: resolve due delayed steps, decay item
    /// sterility, and run aggravation passes on the shared interval.
    pub fn tick(&mut self, host: &mut dyn SurgeryHost, dt: f32) {
        let mut due = Vec::new();
        for (patient, pending) in self.pending.iter_mut() {
            pending.remaining -= dt;
            if pending.remaining <= 0.0 {
                due.push(*patient);
            }
        }
        due.sort_unstable();
        for patient in due {
            if let Some(pending) = self.pending.remove(&patient) {
                // a prerequisite that vanished during the delay just
                // aborts the step
                let _ = self.finish_step(host, pending);
            }
        }

        self.item_accum += dt;
        while self.item_accum >= self.config.tick_interval {
            self.item_accum -= self.config.tick_interval;
            for item in host.sterile_items() {
                if let Some(mut sterility) = host.sterility(item) {
                    if sterility.decay() {
                        host.clear_sterility(item);
                    } else {
                        host.set_sterility(item, sterility);
                    }
                }
            }
        }

        let mut patients: Vec<EntityId> = self.records.keys().copied().collect();
        patients.sort_unstable();
        for patient in patients {
            let Some(record) = self.records.get_mut(&patient) else {
                continue;
            };
            record.tick_accum += dt;
            while record.tick_accum >= self.config.tick_interval {
                record.tick_accum -= self.config.tick_interval;
                if host.is_dead(patient) || record.limb_surgery {
                    continue;
                }
                aggravation::aggravate(
                    &self.config,
                    &mut self.rng,
                    &self.catalog,
                    host,
                    &record.ledger,
                    patient,
                );
            }
        }
    }

    /// Raise a patient's sterility scalar, clamped to the configured
    /// maximum.
    pub fn apply_antiseptic(&mut self, patient: EntityId, amount: f32) {
        let max = self.config.sterility_max;
        let record = self.record_entry(patient);
        record.sterility = clamp_patient_sterility(record.sterility + amount, max);
    }

    /// Mark an item freshly sterilized (autoclave output).
    pub fn sterilize_item(&self, host: &mut dyn SurgeryHost, item: EntityId) {
        host.set_sterility(item, Sterility::default());
    }

    /// Examine-level description of a patient's hidden injuries, built
    /// from catalog hints. Sorted for stable output.
    pub fn describe_internal_damage(&self, patient: EntityId) -> Vec<String> {
        let Some(record) = self.records.get(&patient) else {
            return Vec::new();
        };
        let mut lines: Vec<String> = record
            .ledger
            .categories()
            .filter_map(|id| self.catalog.get(id))
            .filter_map(|spec| spec.examine_hint.clone())
            .collect();
        lines.sort();
        lines.dedup();
        lines
    }
}
