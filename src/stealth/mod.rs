//! Stealth and anti-detection module
//!
//! This module decides which human imperfections a movement carries:
//! - Humanized timing for clicks, scrolls, drags and pauses
//! - Hesitations, overshoots and settle nudges during pointing
//! - Occasional misclicks followed by a correction

pub mod humanize;

pub use humanize::*;

use serde::{Deserialize, Serialize};

/// Configuration for humanized behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanizeConfig {
    /// Add Perlin path deviation and motor noise to sampled points
    pub path_noise: bool,
    /// Allow brief pauses partway through a movement
    pub hesitations: bool,
    /// Allow splitting long movements at a waypoint
    pub submovements: bool,
    /// Allow overshooting the target and correcting back
    pub overshoot: bool,
    /// Allow small nudges after arrival
    pub micro_corrections: bool,
    /// Allow clicks beside the intended point
    pub misclicks: bool,
    /// Jitter the sampling tick interval
    pub timing_jitter: bool,
    /// Multiplier applied to the profile's event probabilities
    pub probability_scale: f64,
}

impl Default for HumanizeConfig {
    fn default() -> Self {
        Self {
            path_noise: true,
            hesitations: true,
            submovements: true,
            overshoot: true,
            micro_corrections: true,
            misclicks: true,
            timing_jitter: true,
            probability_scale: 1.0,
        }
    }
}

impl HumanizeConfig {
    /// Create a config with no humanization (for testing)
    pub fn disabled() -> Self {
        Self {
            path_noise: false,
            hesitations: false,
            submovements: false,
            overshoot: false,
            micro_corrections: false,
            misclicks: false,
            timing_jitter: false,
            probability_scale: 0.0,
        }
    }

    /// Create a config with every imperfection on and more frequent
    pub fn maximum() -> Self {
        Self {
            probability_scale: 1.5,
            ..Self::default()
        }
    }

    /// Scale a profile probability, keeping it in `[0, 1]`
    pub fn scaled(&self, probability: f64) -> f64 {
        (probability * self.probability_scale).clamp(0.0, 1.0)
    }
}
