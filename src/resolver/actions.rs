//! Surgery action definitions
//!
//! Every discrete step a surgeon can attempt, with per-action properties:
//! which chassis it applies to, what it does on success, and the failure
//! outcomes a botched roll can draw from.

use serde::{Deserialize, Serialize};

use crate::core::DamageId;

/// One discrete surgical action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    // Organic
    Cut,
    Retract,
    ClampBleeding,
    DrillThrough,
    RemoveOrgan,
    InsertOrgan,
    RemovePart,
    AttachPart,
    Implanting,
    RemoveImplant,
    StoreItem,
    RetrieveItems,
    HealInternalDamage,
    // Synthetic chassis repair
    Unscrew,
    Screw,
    Pulse,
    Weld,
    CutWire,
    StripWire,
    MendWire,
    Pry,
    Anchor,
    Unanchor,
}

/// Fixed side effect of a successful synthetic-chassis action
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyntheticEffect {
    /// Structural damage delta; negative values repair
    Structural(f32),
    /// Stun for the given number of seconds
    Stun(f32),
}

impl ActionKind {
    /// Actions that are a no-op unless the patient is a mechanical chassis
    pub fn is_synthetic(&self) -> bool {
        matches!(
            self,
            ActionKind::Unscrew
                | ActionKind::Screw
                | ActionKind::Pulse
                | ActionKind::Weld
                | ActionKind::CutWire
                | ActionKind::StripWire
                | ActionKind::MendWire
                | ActionKind::Pry
                | ActionKind::Anchor
                | ActionKind::Unanchor
        )
    }

    /// Actions that only make sense on flesh. Implant work is chassis
    /// neutral and absent from both partitions.
    pub fn is_organic_only(&self) -> bool {
        !self.is_synthetic()
            && !matches!(self, ActionKind::Implanting | ActionKind::RemoveImplant)
    }

    /// Incision-class actions that bloody the surgeon's clothing
    pub fn smears_blood(&self) -> bool {
        matches!(
            self,
            ActionKind::Cut
                | ActionKind::Retract
                | ActionKind::ClampBleeding
                | ActionKind::DrillThrough
                | ActionKind::RemoveOrgan
                | ActionKind::RemovePart
        )
    }

    /// Actions operating on a specific limb (marks the record as
    /// mid-limb-operation for pain/tick suppression)
    pub fn is_limb_operation(&self) -> bool {
        matches!(self, ActionKind::RemovePart | ActionKind::AttachPart)
    }

    pub fn effect_on_synthetic(&self) -> Option<SyntheticEffect> {
        use SyntheticEffect::*;
        Some(match self {
            ActionKind::Unscrew | ActionKind::Screw => Structural(0.5),
            ActionKind::Pulse => Stun(3.0),
            ActionKind::Weld => Structural(-5.0),
            ActionKind::CutWire => Structural(2.0),
            ActionKind::StripWire => Structural(1.0),
            ActionKind::MendWire => Structural(-2.0),
            ActionKind::Pry => Structural(3.0),
            ActionKind::Anchor | ActionKind::Unanchor => Structural(0.5),
            _ => return None,
        })
    }

    /// Default failure-effect pool for a botched roll. An empty pool
    /// means failure is a plain no-op.
    pub fn default_failure_effects(&self) -> Vec<FailureEffect> {
        match self {
            ActionKind::Cut | ActionKind::Retract => vec![
                FailureEffect::Bleed,
                FailureEffect::Slash(4.0),
                FailureEffect::Internal(DamageId::from("ArterialBleeding")),
                FailureEffect::PainReaction,
            ],
            ActionKind::ClampBleeding => vec![FailureEffect::Bleed, FailureEffect::PainReaction],
            ActionKind::DrillThrough => vec![
                FailureEffect::Slash(6.0),
                FailureEffect::Internal(DamageId::from("BoneFracture")),
                FailureEffect::PainReaction,
            ],
            ActionKind::RemoveOrgan | ActionKind::InsertOrgan => vec![
                FailureEffect::Bleed,
                FailureEffect::Internal(DamageId::from("InternalHemorrhage")),
                FailureEffect::PainReaction,
            ],
            ActionKind::RemovePart | ActionKind::AttachPart => vec![
                FailureEffect::Bleed,
                FailureEffect::Slash(5.0),
                FailureEffect::PainReaction,
            ],
            ActionKind::Implanting | ActionKind::RemoveImplant => vec![
                FailureEffect::Internal(DamageId::from("ShrapnelLodged")),
                FailureEffect::PainReaction,
            ],
            ActionKind::StoreItem | ActionKind::RetrieveItems => {
                vec![FailureEffect::PainReaction]
            }
            ActionKind::HealInternalDamage => vec![FailureEffect::PainReaction],
            ActionKind::Weld => vec![FailureEffect::Heat(4.0)],
            // Remaining synthetic work fails without side effects
            _ => vec![],
        }
    }
}

/// One outcome drawn uniformly from an action's failure pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FailureEffect {
    /// Aggravated bleeding at the configured failure rate
    Bleed,
    /// Direct slash damage
    Slash(f32),
    /// Direct heat damage
    Heat(f32),
    /// New hidden injury at the targeted part
    Internal(DamageId),
    /// Scream emote plus timed jitter, suppressed for numbed patients
    PainReaction,
}
