//! Sterility markers
//!
//! Tools and fields carry a decaying sterility score. The marker is owned
//! by the host (it lives on items, not patients); the engine drives decay
//! on the shared tick cadence and drops the marker once exhausted.
//! Patient-side sterility is a scalar on the operation record, clamped to
//! the configured maximum.

use serde::{Deserialize, Serialize};

/// Decaying sterility score attached to an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sterility {
    pub amount: f32,
    pub decay_rate: f32,
    /// Autoclaved instruments and the like never decay
    pub always_sterile: bool,
}

impl Sterility {
    pub fn new(amount: f32, decay_rate: f32) -> Self {
        Self {
            amount,
            decay_rate,
            always_sterile: false,
        }
    }

    pub fn permanent() -> Self {
        Self {
            amount: Self::DEFAULT_AMOUNT,
            decay_rate: 0.0,
            always_sterile: true,
        }
    }

    pub const DEFAULT_AMOUNT: f32 = 100.0;
    pub const DEFAULT_DECAY: f32 = 0.5;

    pub fn is_sterile(&self) -> bool {
        self.always_sterile || self.amount > 0.0
    }

    /// One decay step. Returns true once the marker is exhausted and
    /// should be removed from the item.
    pub fn decay(&mut self) -> bool {
        if self.always_sterile {
            return false;
        }
        self.amount -= self.decay_rate;
        self.amount <= 0.0
    }
}

impl Default for Sterility {
    fn default() -> Self {
        Self::new(Self::DEFAULT_AMOUNT, Self::DEFAULT_DECAY)
    }
}

/// Clamp a patient sterility scalar to the valid multiplier range.
pub fn clamp_patient_sterility(value: f32, max: f32) -> f32 {
    value.clamp(0.0, max)
}
