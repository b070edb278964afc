//! Medbay: a surgical procedure engine
//!
//! Per-patient surgery modeled as a walk over procedure graphs, plus a
//! probabilistic hidden-injury layer: external damage can seed internal
//! injuries that periodically aggravate until surgically healed. The
//! engine is deliberately world-agnostic; body topology, inventory, and
//! status effects live behind the [`services::SurgeryHost`] seam.
//!
//! # Architecture
//!
//! - [`core`] - identifiers, errors, config, seeded dice
//! - [`body`] - body part vocabulary and equipment support rules
//! - [`catalog`] - hidden injury category definitions (TOML-loadable)
//! - [`ledger`] - per-patient hidden injury bookkeeping
//! - [`procedure`] - surgery graphs and operation records
//! - [`resolver`] - single-step resolution (roll, succeed, or botch)
//! - [`aggravation`] - injury infliction and periodic flare-ups
//! - [`sterility`] - decaying sterility markers
//! - [`services`] - the host seam and an in-memory reference host
//! - [`engine`] - the orchestrating [`engine::SurgeryEngine`]

pub mod aggravation;
pub mod body;
pub mod catalog;
pub mod core;
pub mod engine;
pub mod ledger;
pub mod procedure;
pub mod resolver;
pub mod services;
pub mod sterility;

pub use crate::core::{EngineConfig, EntityId, Result, SurgeryError};
pub use crate::engine::{StepOutcome, SurgeryEngine};
pub use crate::resolver::actions::ActionKind;
pub use crate::resolver::StepRequest;
pub use crate::services::SurgeryHost;
