//! Procedure graphs
//!
//! A surgery is a walk over a directed graph of body-state nodes. Edges
//! carry the steps that must all complete before the patient commits to
//! the destination node; steps within one edge may be performed in any
//! order. Self-loop edges model in-place work (organ swaps, implant work)
//! that leaves the body state unchanged, and every graph carries at least
//! one edge back to the `Default` node so the patient can be closed up.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::{GraphId, NodeId, Result, SurgeryError};
use crate::resolver::actions::{ActionKind, FailureEffect};

/// One attemptable step on an edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgeryStep {
    pub action: ActionKind,
    /// Base success chance before sterility and table modifiers
    pub base_chance: f32,
    /// Seconds of focused work before the step resolves; `None` resolves
    /// immediately
    #[serde(default)]
    pub delay: Option<f32>,
    /// Overrides the action's default failure pool when present
    #[serde(default)]
    pub failure_effects: Option<Vec<FailureEffect>>,
}

impl SurgeryStep {
    pub fn new(action: ActionKind, base_chance: f32) -> Self {
        Self {
            action,
            base_chance,
            delay: None,
            failure_effects: None,
        }
    }

    pub fn with_delay(mut self, secs: f32) -> Self {
        self.delay = Some(secs);
        self
    }

    /// The failure pool this step draws from on a botched roll.
    pub fn failure_pool(&self) -> Vec<FailureEffect> {
        self.failure_effects
            .clone()
            .unwrap_or_else(|| self.action.default_failure_effects())
    }
}

/// Transition from one node to another (or back to itself)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgeryEdge {
    pub to: NodeId,
    pub steps: Vec<SurgeryStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgeryNode {
    pub id: NodeId,
    pub edges: Vec<SurgeryEdge>,
}

/// A step located within a graph: which edge it sits on and its index in
/// that edge's step list
#[derive(Debug, Clone, Copy)]
pub struct StepRef<'a> {
    pub target: &'a NodeId,
    pub step_index: usize,
    pub step: &'a SurgeryStep,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurgeryGraph {
    pub id: GraphId,
    nodes: AHashMap<NodeId, SurgeryNode>,
}

impl SurgeryGraph {
    pub fn new(id: GraphId) -> Self {
        let mut nodes = AHashMap::new();
        let default = NodeId::default_node();
        nodes.insert(
            default.clone(),
            SurgeryNode {
                id: default,
                edges: Vec::new(),
            },
        );
        Self { id, nodes }
    }

    /// Add an edge, creating both endpoint nodes as needed.
    pub fn edge(
        mut self,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        steps: Vec<SurgeryStep>,
    ) -> Self {
        let from = from.into();
        let to = to.into();
        self.nodes.entry(to.clone()).or_insert_with(|| SurgeryNode {
            id: to.clone(),
            edges: Vec::new(),
        });
        let node = self.nodes.entry(from.clone()).or_insert_with(|| SurgeryNode {
            id: from,
            edges: Vec::new(),
        });
        node.edges.push(SurgeryEdge { to, steps });
        self
    }

    /// Shorthand for an in-place edge that returns to its own node.
    pub fn loop_edge(self, at: impl Into<NodeId>, steps: Vec<SurgeryStep>) -> Self {
        let at = at.into();
        self.edge(at.clone(), at, steps)
    }

    pub fn node(&self, id: &NodeId) -> Option<&SurgeryNode> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Locate the step a requested action corresponds to from the given
    /// node. When a target node is locked (an edge is in progress), only
    /// that edge is searched and already-completed step indices are
    /// skipped; otherwise the first edge offering the action is chosen.
    pub fn select_step<'a>(
        &'a self,
        from: &NodeId,
        target: Option<&NodeId>,
        completed: &AHashSet<usize>,
        action: ActionKind,
    ) -> Option<StepRef<'a>> {
        let node = self.nodes.get(from)?;
        let fresh = AHashSet::new();
        for edge in &node.edges {
            if let Some(locked) = target {
                if &edge.to != locked {
                    continue;
                }
            }
            // a fresh edge has no progress
            let done = if target.is_some() { completed } else { &fresh };
            for (idx, step) in edge.steps.iter().enumerate() {
                if step.action == action && !done.contains(&idx) {
                    return Some(StepRef {
                        target: &edge.to,
                        step_index: idx,
                        step,
                    });
                }
            }
        }
        None
    }

    /// Number of steps on the edge from `from` to `to`.
    pub fn edge_len(&self, from: &NodeId, to: &NodeId) -> Option<usize> {
        self.nodes
            .get(from)?
            .edges
            .iter()
            .find(|e| &e.to == to)
            .map(|e| e.steps.len())
    }

    /// Structural validation: a Default node exists, every edge lands on a
    /// known node with at least one step, chances are in (0, 1], and the
    /// Default node is reachable again from every node (the body can
    /// always be closed).
    pub fn validate(&self) -> Result<()> {
        let default = NodeId::default_node();
        if !self.nodes.contains_key(&default) {
            return Err(SurgeryError::Catalog(format!(
                "graph '{}' has no Default node",
                self.id
            )));
        }
        for node in self.nodes.values() {
            for edge in &node.edges {
                if !self.nodes.contains_key(&edge.to) {
                    return Err(SurgeryError::Catalog(format!(
                        "graph '{}': edge {} -> {} targets an unknown node",
                        self.id, node.id, edge.to
                    )));
                }
                if edge.steps.is_empty() {
                    return Err(SurgeryError::Catalog(format!(
                        "graph '{}': edge {} -> {} has no steps",
                        self.id, node.id, edge.to
                    )));
                }
                for step in &edge.steps {
                    if step.base_chance <= 0.0 || step.base_chance > 1.0 {
                        return Err(SurgeryError::Catalog(format!(
                            "graph '{}': step {:?} on {} -> {} has chance {} outside (0, 1]",
                            self.id, step.action, node.id, edge.to, step.base_chance
                        )));
                    }
                }
            }
        }
        // Reverse reachability of Default over non-loop edges.
        let mut open: Vec<&NodeId> = vec![&default];
        let mut closed: AHashSet<&NodeId> = AHashSet::new();
        while let Some(id) = open.pop() {
            if !closed.insert(id) {
                continue;
            }
            for node in self.nodes.values() {
                if node.edges.iter().any(|e| &e.to == id && e.to != node.id) {
                    open.push(&node.id);
                }
            }
        }
        for id in self.nodes.keys() {
            if !closed.contains(id) {
                return Err(SurgeryError::Catalog(format!(
                    "graph '{}': node {} cannot reach Default",
                    self.id, id
                )));
            }
        }
        Ok(())
    }
}

/// Registry of procedure graphs keyed by id
#[derive(Debug, Clone, Default)]
pub struct GraphLibrary {
    graphs: AHashMap<GraphId, SurgeryGraph>,
}

pub const ORGANIC_GRAPH: &str = "organic";
pub const SYNTHETIC_GRAPH: &str = "synthetic";

impl GraphLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library holding the two builtin procedure graphs.
    pub fn with_defaults() -> Self {
        let mut lib = Self::new();
        lib.register(Self::organic_graph())
            .expect("builtin organic graph is valid");
        lib.register(Self::synthetic_graph())
            .expect("builtin synthetic graph is valid");
        lib
    }

    pub fn register(&mut self, graph: SurgeryGraph) -> Result<()> {
        graph.validate()?;
        if self.graphs.contains_key(&graph.id) {
            return Err(SurgeryError::Catalog(format!(
                "duplicate graph id '{}'",
                graph.id
            )));
        }
        self.graphs.insert(graph.id.clone(), graph);
        Ok(())
    }

    pub fn get(&self, id: &GraphId) -> Option<&SurgeryGraph> {
        self.graphs.get(id)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Graph for fleshy patients: incise, open, work inside, close.
    fn organic_graph() -> SurgeryGraph {
        use ActionKind::*;
        SurgeryGraph::new(GraphId::from(ORGANIC_GRAPH))
            .edge("Default", "Incised", vec![SurgeryStep::new(Cut, 0.9)])
            .edge(
                "Incised",
                "Opened",
                vec![
                    SurgeryStep::new(Retract, 0.95),
                    SurgeryStep::new(ClampBleeding, 0.95),
                ],
            )
            .loop_edge(
                "Opened",
                vec![SurgeryStep::new(RemoveOrgan, 0.8).with_delay(4.0)],
            )
            .loop_edge(
                "Opened",
                vec![SurgeryStep::new(InsertOrgan, 0.8).with_delay(4.0)],
            )
            .loop_edge(
                "Opened",
                vec![SurgeryStep::new(RemovePart, 0.75).with_delay(6.0)],
            )
            .loop_edge(
                "Opened",
                vec![SurgeryStep::new(AttachPart, 0.75).with_delay(6.0)],
            )
            .loop_edge("Opened", vec![SurgeryStep::new(DrillThrough, 0.85)])
            .loop_edge("Opened", vec![SurgeryStep::new(Implanting, 0.9)])
            .loop_edge("Opened", vec![SurgeryStep::new(RemoveImplant, 0.85)])
            .loop_edge("Opened", vec![SurgeryStep::new(StoreItem, 0.95)])
            .loop_edge("Opened", vec![SurgeryStep::new(RetrieveItems, 0.95)])
            .loop_edge(
                "Opened",
                vec![SurgeryStep::new(HealInternalDamage, 0.7).with_delay(3.0)],
            )
            .edge(
                "Opened",
                "Default",
                vec![SurgeryStep::new(ClampBleeding, 0.95)],
            )
    }

    /// Graph for mechanical chassis: open the panel, work, screw it shut.
    fn synthetic_graph() -> SurgeryGraph {
        use ActionKind::*;
        SurgeryGraph::new(GraphId::from(SYNTHETIC_GRAPH))
            .edge(
                "Default",
                "PanelOpen",
                vec![
                    SurgeryStep::new(Unscrew, 0.95),
                    SurgeryStep::new(Pry, 0.9),
                ],
            )
            .edge("PanelOpen", "Exposed", vec![SurgeryStep::new(CutWire, 0.9)])
            .loop_edge("PanelOpen", vec![SurgeryStep::new(Weld, 0.85)])
            .loop_edge("PanelOpen", vec![SurgeryStep::new(Anchor, 0.95)])
            .loop_edge("PanelOpen", vec![SurgeryStep::new(Unanchor, 0.95)])
            .loop_edge("Exposed", vec![SurgeryStep::new(Pulse, 0.9)])
            .loop_edge("Exposed", vec![SurgeryStep::new(StripWire, 0.9)])
            .loop_edge("Exposed", vec![SurgeryStep::new(MendWire, 0.85)])
            .loop_edge("Exposed", vec![SurgeryStep::new(Implanting, 0.9)])
            .loop_edge("Exposed", vec![SurgeryStep::new(RemoveImplant, 0.85)])
            .edge("Exposed", "PanelOpen", vec![SurgeryStep::new(MendWire, 0.85)])
            .edge("PanelOpen", "Default", vec![SurgeryStep::new(Screw, 0.95)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_graphs_validate() {
        let lib = GraphLibrary::with_defaults();
        assert_eq!(lib.len(), 2);
        assert!(lib.get(&GraphId::from(ORGANIC_GRAPH)).is_some());
        assert!(lib.get(&GraphId::from(SYNTHETIC_GRAPH)).is_some());
    }

    #[test]
    fn test_select_step_from_default() {
        let lib = GraphLibrary::with_defaults();
        let graph = lib.get(&GraphId::from(ORGANIC_GRAPH)).unwrap();
        let done = AHashSet::new();
        let step = graph
            .select_step(&NodeId::default_node(), None, &done, ActionKind::Cut)
            .unwrap();
        assert_eq!(step.target, &NodeId::from("Incised"));
        assert_eq!(step.step_index, 0);
    }

    #[test]
    fn test_illegal_action_has_no_step() {
        let lib = GraphLibrary::with_defaults();
        let graph = lib.get(&GraphId::from(ORGANIC_GRAPH)).unwrap();
        let done = AHashSet::new();
        assert!(graph
            .select_step(&NodeId::default_node(), None, &done, ActionKind::RemoveOrgan)
            .is_none());
    }

    #[test]
    fn test_locked_target_skips_completed_steps() {
        let lib = GraphLibrary::with_defaults();
        let graph = lib.get(&GraphId::from(ORGANIC_GRAPH)).unwrap();
        let incised = NodeId::from("Incised");
        let opened = NodeId::from("Opened");

        let mut done = AHashSet::new();
        done.insert(0usize); // Retract already performed
        let step = graph
            .select_step(&incised, Some(&opened), &done, ActionKind::ClampBleeding)
            .unwrap();
        assert_eq!(step.step_index, 1);

        done.insert(1);
        assert!(graph
            .select_step(&incised, Some(&opened), &done, ActionKind::ClampBleeding)
            .is_none());
    }

    #[test]
    fn test_validate_rejects_dangling_edge() {
        let graph = SurgeryGraph::new(GraphId::from("broken")).edge(
            "Default",
            "Nowhere",
            vec![SurgeryStep::new(ActionKind::Cut, 0.9)],
        );
        // "Nowhere" exists (edge() creates it) but cannot reach Default.
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_chance() {
        let graph = SurgeryGraph::new(GraphId::from("broken"))
            .edge(
                "Default",
                "A",
                vec![SurgeryStep::new(ActionKind::Cut, 1.2)],
            )
            .edge("A", "Default", vec![SurgeryStep::new(ActionKind::Cut, 0.9)]);
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_closing_edge_returns_to_default() {
        let lib = GraphLibrary::with_defaults();
        let graph = lib.get(&GraphId::from(ORGANIC_GRAPH)).unwrap();
        let done = AHashSet::new();
        let step = graph
            .select_step(
                &NodeId::from("Opened"),
                None,
                &done,
                ActionKind::ClampBleeding,
            )
            .unwrap();
        assert!(step.target.is_default());
    }
}
