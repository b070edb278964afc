pub mod part;

pub use part::{BodyPartId, EquipSlot, PartType, Symmetry};
