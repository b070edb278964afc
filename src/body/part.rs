//! Body part vocabulary and descriptor syntax
//!
//! Parts are identified by symmetry + type, rendered as `"left_arm"` style
//! descriptors. The engine depends only on these identifiers; the actual
//! part entities live behind the host seam.

use serde::{Deserialize, Serialize};

use crate::core::{Result, SurgeryError};

/// Body part categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartType {
    Head,
    Torso,
    Arm,
    Hand,
    Leg,
    Foot,
    Tail,
    Other,
}

impl PartType {
    fn as_str(&self) -> &'static str {
        match self {
            PartType::Head => "head",
            PartType::Torso => "torso",
            PartType::Arm => "arm",
            PartType::Hand => "hand",
            PartType::Leg => "leg",
            PartType::Foot => "foot",
            PartType::Tail => "tail",
            PartType::Other => "other",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "head" => PartType::Head,
            "torso" => PartType::Torso,
            "arm" => PartType::Arm,
            "hand" => PartType::Hand,
            "leg" => PartType::Leg,
            "foot" => PartType::Foot,
            "tail" => PartType::Tail,
            "other" => PartType::Other,
            _ => return None,
        })
    }
}

/// Left/right symmetry of paired parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Symmetry {
    #[default]
    None,
    Left,
    Right,
}

/// Symbolic body part identifier (`"left_arm"`, `"torso"`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyPartId {
    pub symmetry: Symmetry,
    pub part_type: PartType,
}

impl BodyPartId {
    pub fn new(symmetry: Symmetry, part_type: PartType) -> Self {
        Self { symmetry, part_type }
    }

    pub fn unpaired(part_type: PartType) -> Self {
        Self::new(Symmetry::None, part_type)
    }

    pub fn left(part_type: PartType) -> Self {
        Self::new(Symmetry::Left, part_type)
    }

    pub fn right(part_type: PartType) -> Self {
        Self::new(Symmetry::Right, part_type)
    }

    /// Parse a symbolic descriptor: `"<left|right>_<type>"` or bare
    /// `"<type>"` for unpaired parts.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let descriptor = descriptor.trim().to_ascii_lowercase();
        if let Some((prefix, rest)) = descriptor.split_once('_') {
            let symmetry = match prefix {
                "left" => Symmetry::Left,
                "right" => Symmetry::Right,
                _ => {
                    return Err(SurgeryError::TargetNotFound(format!(
                        "bad part descriptor '{descriptor}'"
                    )))
                }
            };
            let part_type = PartType::parse(rest).ok_or_else(|| {
                SurgeryError::TargetNotFound(format!("unknown part type '{rest}'"))
            })?;
            Ok(Self::new(symmetry, part_type))
        } else {
            let part_type = PartType::parse(&descriptor).ok_or_else(|| {
                SurgeryError::TargetNotFound(format!("unknown part type '{descriptor}'"))
            })?;
            Ok(Self::unpaired(part_type))
        }
    }

    pub fn is_leg(&self) -> bool {
        self.part_type == PartType::Leg
    }

    pub fn is_arm(&self) -> bool {
        self.part_type == PartType::Arm
    }
}

impl std::fmt::Display for BodyPartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.symmetry {
            Symmetry::Left => write!(f, "left_{}", self.part_type.as_str()),
            Symmetry::Right => write!(f, "right_{}", self.part_type.as_str()),
            Symmetry::None => write!(f, "{}", self.part_type.as_str()),
        }
    }
}

impl std::str::FromStr for BodyPartId {
    type Err = SurgeryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Equipment slots whose wearability depends on the body part graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    Shoes,
    Socks,
    Gloves,
    Head,
}

impl EquipSlot {
    pub fn all() -> [EquipSlot; 4] {
        [EquipSlot::Shoes, EquipSlot::Socks, EquipSlot::Gloves, EquipSlot::Head]
    }

    /// Can this slot still be worn given the remaining body parts?
    ///
    /// Bilateral slots require both sides of both supporting part types.
    pub fn supported_by(&self, parts: &[BodyPartId]) -> bool {
        let count = |t: PartType| parts.iter().filter(|p| p.part_type == t).count();
        match self {
            EquipSlot::Shoes | EquipSlot::Socks => {
                count(PartType::Leg) >= 2 && count(PartType::Foot) >= 2
            }
            EquipSlot::Gloves => count(PartType::Arm) >= 2 && count(PartType::Hand) >= 2,
            EquipSlot::Head => count(PartType::Head) >= 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_roundtrip() {
        for s in ["left_arm", "right_leg", "torso", "head", "left_foot", "tail"] {
            let id = BodyPartId::parse(s).unwrap();
            assert_eq!(id.to_string(), s);
        }
    }

    #[test]
    fn test_bad_descriptors_rejected() {
        assert!(BodyPartId::parse("upper_arm").is_err());
        assert!(BodyPartId::parse("left_wing").is_err());
        assert!(BodyPartId::parse("").is_err());
    }

    #[test]
    fn test_descriptor_case_insensitive() {
        assert_eq!(
            BodyPartId::parse("Left_Arm").unwrap(),
            BodyPartId::left(PartType::Arm)
        );
    }

    fn humanoid() -> Vec<BodyPartId> {
        vec![
            BodyPartId::unpaired(PartType::Head),
            BodyPartId::unpaired(PartType::Torso),
            BodyPartId::left(PartType::Arm),
            BodyPartId::right(PartType::Arm),
            BodyPartId::left(PartType::Hand),
            BodyPartId::right(PartType::Hand),
            BodyPartId::left(PartType::Leg),
            BodyPartId::right(PartType::Leg),
            BodyPartId::left(PartType::Foot),
            BodyPartId::right(PartType::Foot),
        ]
    }

    #[test]
    fn test_full_body_supports_all_slots() {
        let parts = humanoid();
        for slot in EquipSlot::all() {
            assert!(slot.supported_by(&parts), "{slot:?} should be wearable");
        }
    }

    #[test]
    fn test_missing_leg_drops_footwear_only() {
        let parts: Vec<_> = humanoid()
            .into_iter()
            .filter(|p| *p != BodyPartId::left(PartType::Leg))
            .collect();
        assert!(!EquipSlot::Shoes.supported_by(&parts));
        assert!(!EquipSlot::Socks.supported_by(&parts));
        assert!(EquipSlot::Gloves.supported_by(&parts));
        assert!(EquipSlot::Head.supported_by(&parts));
    }

    #[test]
    fn test_missing_hand_drops_gloves() {
        let parts: Vec<_> = humanoid()
            .into_iter()
            .filter(|p| *p != BodyPartId::right(PartType::Hand))
            .collect();
        assert!(!EquipSlot::Gloves.supported_by(&parts));
        assert!(EquipSlot::Shoes.supported_by(&parts));
    }

    #[test]
    fn test_headless_drops_head_slot() {
        let parts: Vec<_> = humanoid()
            .into_iter()
            .filter(|p| p.part_type != PartType::Head)
            .collect();
        assert!(!EquipSlot::Head.supported_by(&parts));
    }
}
