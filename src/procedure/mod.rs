//! Surgery procedures: graphs and per-patient records

pub mod graph;
pub mod record;

pub use graph::{GraphLibrary, StepRef, SurgeryEdge, SurgeryGraph, SurgeryNode, SurgeryStep};
pub use graph::{ORGANIC_GRAPH, SYNTHETIC_GRAPH};
pub use record::OperationRecord;
