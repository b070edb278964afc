//! Identifier newtypes used throughout the codebase
//!
//! The core logic depends only on opaque identifiers; nothing is looked
//! up by reflection. String-backed ids are validated against the catalog
//! or graph library once at startup.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for entities (patients, surgeons, items, organs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id! {
    /// Identifier of a damage category in the catalog (e.g. "ArterialBleeding")
    DamageId
}

string_id! {
    /// External damage type identifier (e.g. "Slash", "Heat", "Piercing")
    DamageTypeId
}

string_id! {
    /// Node in a procedure graph
    NodeId
}

string_id! {
    /// Identifier of a procedure graph
    GraphId
}

string_id! {
    /// Organ type / organ slot identifier (e.g. "heart")
    OrganId
}

impl NodeId {
    /// The canonical initial and reset node of every procedure graph.
    pub fn default_node() -> Self {
        Self("Default".to_string())
    }

    pub fn is_default(&self) -> bool {
        self.0 == "Default"
    }
}

/// Simulation time unit (seconds of simulated time)
pub type Seconds = f32;
