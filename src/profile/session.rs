//! Session-scoped fatigue inputs
//!
//! Fatigue is computed elsewhere; this crate only consumes the scalar and
//! keeps a click counter that widens click spread late in a session.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Clicks before the one-time spread boost kicks in
pub const CLICK_FATIGUE_THRESHOLD: u32 = 200;

const MIN_FATIGUE_VARIANCE_MULTIPLIER: f64 = 1.10;
const MAX_FATIGUE_VARIANCE_MULTIPLIER: f64 = 1.30;

/// Fatigue level in `[0, 1]` (0 = fresh, 1 = exhausted)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct FatigueLevel(f64);

impl FatigueLevel {
    pub const FRESH: FatigueLevel = FatigueLevel(0.0);
    pub const EXHAUSTED: FatigueLevel = FatigueLevel(1.0);

    /// Create a fatigue level, clamping into `[0, 1]`
    pub fn new(level: f64) -> Self {
        if level.is_nan() {
            return Self::FRESH;
        }
        Self(level.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Tremor amplitude scale, 1.0 (fresh) to 1.8 (exhausted)
    pub fn amplitude_scale(&self) -> f64 {
        1.0 + self.0 * 0.8
    }

    /// Misclick rate multiplier, 1.0 (fresh) to 2.0 (exhausted)
    pub fn misclick_multiplier(&self) -> f64 {
        1.0 + self.0
    }
}

/// Per-session click bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCounters {
    click_count: u32,
    variance_boost: f64,
}

impl Default for SessionCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCounters {
    pub fn new() -> Self {
        Self {
            click_count: 0,
            variance_boost: 1.0,
        }
    }

    pub fn click_count(&self) -> u32 {
        self.click_count
    }

    /// Count a click, applying the spread boost once the threshold is passed
    pub fn record_click<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.click_count = self.click_count.saturating_add(1);

        if self.click_count >= CLICK_FATIGUE_THRESHOLD && !self.is_boosted() {
            self.variance_boost =
                rng.random_range(MIN_FATIGUE_VARIANCE_MULTIPLIER..=MAX_FATIGUE_VARIANCE_MULTIPLIER);
            log::debug!(
                "Click fatigue variance boost applied after {} clicks: {:.2}",
                self.click_count,
                self.variance_boost
            );
        }
    }

    pub fn is_boosted(&self) -> bool {
        self.variance_boost > 1.0
    }

    /// Multiplier applied to click spread around the target center
    pub fn variance_multiplier(&self) -> f64 {
        self.variance_boost
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
