//! Per-patient operation record
//!
//! Everything the engine remembers about one patient: where the body sits
//! in its procedure graph, who is operating and how far along the current
//! edge they are, the patient sterility scalar, the hidden-injury ledger,
//! and the per-patient tick accumulator.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::{EntityId, GraphId, NodeId};
use crate::ledger::DamageLedger;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Procedure graph this body follows; `None` until first assigned
    pub graph_id: Option<GraphId>,
    /// Node the body currently rests at
    pub current_node: NodeId,
    /// Surgeon holding the operation lock, if any
    pub surgeon: Option<EntityId>,
    /// Destination node of the edge in progress
    pub current_target_node: Option<NodeId>,
    /// Index of the step being performed on that edge
    pub current_step_index: usize,
    /// Step indices already completed on the edge in progress
    pub completed_steps: AHashSet<usize>,
    /// History of step sets satisfied per committed node (kept for graphs
    /// that backtrack through earlier nodes)
    pub completed_by_node: AHashMap<NodeId, AHashSet<usize>>,
    /// Patient sterility multiplier, clamped by the engine config
    pub sterility: f32,
    /// A step is actively being performed (or pending its delay)
    pub is_operating: bool,
    /// Mid limb-operation: pain reactions and tick aggravation pause
    pub limb_surgery: bool,
    /// Hidden internal injuries
    pub ledger: DamageLedger,
    /// Seconds accumulated toward the next aggravation pass
    pub tick_accum: f32,
}

impl OperationRecord {
    pub fn new(sterility: f32) -> Self {
        Self {
            graph_id: None,
            current_node: NodeId::default_node(),
            surgeon: None,
            current_target_node: None,
            current_step_index: 0,
            completed_steps: AHashSet::new(),
            completed_by_node: AHashMap::new(),
            sterility,
            is_operating: false,
            limb_surgery: false,
            ledger: DamageLedger::new(),
            tick_accum: 0.0,
        }
    }

    /// Take the operation lock and point at a step on an edge.
    pub fn begin_step(&mut self, surgeon: EntityId, target: NodeId, step_index: usize, limb: bool) {
        self.surgeon = Some(surgeon);
        if let Some(prev) = &self.current_target_node {
            if prev != &target {
                // switching edges abandons prior progress
                self.completed_steps.clear();
            }
        }
        self.current_target_node = Some(target);
        self.current_step_index = step_index;
        self.is_operating = true;
        self.limb_surgery = limb;
    }

    /// Mark a step done; commits the node transition when the edge is
    /// fully walked. Returns the committed node, if any.
    pub fn complete_step(&mut self, step_index: usize, edge_len: usize) -> Option<NodeId> {
        self.completed_steps.insert(step_index);
        self.is_operating = false;
        self.limb_surgery = false;
        if self.completed_steps.len() >= edge_len {
            let committed = self
                .current_target_node
                .take()
                .unwrap_or_else(NodeId::default_node);
            self.current_node = committed.clone();
            self.completed_by_node
                .entry(committed.clone())
                .or_default()
                .extend(self.completed_steps.drain());
            self.surgeon = None;
            self.current_step_index = 0;
            Some(committed)
        } else {
            None
        }
    }

    /// Release the lock without committing. The transient markers
    /// (surgeon, target node, step index) clear; completed steps survive
    /// so the surgeon can resume the same edge where they stopped.
    pub fn release(&mut self) {
        self.surgeon = None;
        self.current_target_node = None;
        self.current_step_index = 0;
        self.is_operating = false;
        self.limb_surgery = false;
    }

    /// Drop everything back to the pristine default state.
    pub fn reset(&mut self, sterility: f32) {
        self.current_node = NodeId::default_node();
        self.surgeon = None;
        self.current_target_node = None;
        self.current_step_index = 0;
        self.completed_steps.clear();
        self.completed_by_node.clear();
        self.sterility = sterility;
        self.is_operating = false;
        self.limb_surgery = false;
        self.ledger.clear();
        self.tick_accum = 0.0;
    }

    /// Is another surgeon currently holding the lock?
    pub fn locked_by_other(&self, actor: EntityId) -> bool {
        self.is_operating && self.surgeon.is_some() && self.surgeon != Some(actor)
    }
}
