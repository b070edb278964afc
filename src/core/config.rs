//! Engine configuration with documented constants
//!
//! All tuning values are collected here with explanations of their purpose
//! and how they interact with each other.

/// Configuration for the surgery engine
///
/// Values mirror the behavior of the reference gameplay tuning. Changing
/// them shifts how forgiving (or lethal) operations feel.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // === TICK LOOP ===
    /// Seconds of simulated time between aggravation passes per patient
    ///
    /// Sub-interval `tick()` calls are cheap accumulator decrements.
    pub tick_interval: f32,

    /// Per-category chance that a non-empty ledger entry aggravates on a
    /// given pass
    ///
    /// At 0.10 with a 5s interval, each hidden injury flares roughly once
    /// every 50 simulated seconds.
    pub aggravation_chance: f32,

    /// Bounds of the uniform severity jitter applied per aggravation
    ///
    /// `severity = |parts| * category.severity * uniform(lo, hi)`.
    pub severity_jitter: (f32, f32),

    // === STEP RESOLUTION ===
    /// Bleed-rate delta applied by a successful Cut
    pub cut_bleed: f32,

    /// Bleed-rate delta applied by a successful ClampBleeding (negative)
    pub clamp_bleed: f32,

    /// Piercing damage applied by a successful DrillThrough
    pub drill_pierce: f32,

    /// Bleed-rate delta when an organ or body part leaves the body
    pub extraction_bleed: f32,

    /// Bleed-rate delta applied by the "Bleed" failure effect
    pub failure_bleed: f32,

    /// Blood smeared onto the surgeon's worn clothing per organic success
    pub blood_smear: f32,

    /// Chance that inserting a non-sterile organ or part inoculates the
    /// patient with a blood infection (rolled independently of success)
    pub infection_chance: f32,

    /// Seconds of jitter applied by a pain reaction
    pub pain_jitter_secs: f32,

    // === STERILITY ===
    /// Upper clamp on patient sterility; also the threshold for the
    /// deterministic always-succeed fast path
    pub sterility_max: f32,

    /// Patient sterility on record creation and after reset
    pub sterility_default: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: 5.0,
            aggravation_chance: 0.10,
            severity_jitter: (0.5, 1.5),

            cut_bleed: 2.0,
            clamp_bleed: -10.0,
            drill_pierce: 5.0,
            extraction_bleed: 2.0,
            failure_bleed: 6.0,
            blood_smear: 0.4,
            infection_chance: 0.3,
            pain_jitter_secs: 8.0,

            sterility_max: 1.5,
            sterility_default: 1.0,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval <= 0.0 {
            return Err("tick_interval must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.aggravation_chance) {
            return Err(format!(
                "aggravation_chance ({}) must be in [0, 1]",
                self.aggravation_chance
            ));
        }
        let (lo, hi) = self.severity_jitter;
        if lo <= 0.0 || hi < lo {
            return Err(format!("severity_jitter ({lo}, {hi}) must satisfy 0 < lo <= hi"));
        }
        if self.sterility_max < self.sterility_default {
            return Err(format!(
                "sterility_max ({}) must be >= sterility_default ({})",
                self.sterility_max, self.sterility_default
            ));
        }
        if self.clamp_bleed > 0.0 {
            return Err("clamp_bleed must be non-positive".into());
        }
        Ok(())
    }
}
