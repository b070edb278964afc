pub mod config;
pub mod error;
pub mod ids;
pub mod rng;

pub use config::EngineConfig;
pub use error::{Result, SurgeryError};
pub use ids::{DamageId, DamageTypeId, EntityId, GraphId, NodeId, OrganId};
pub use rng::DiceRoller;
