//! Per-individual motor characteristics
//!
//! A `MotionProfile` is the behavioral fingerprint of one simulated person:
//! tremor, handedness, timing law coefficients and base probabilities. It is
//! immutable for the lifetime of a session.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Behavioral constants of one simulated individual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionProfile {
    /// 0.0 = left-handed, 0.5 = ambidextrous, 1.0 = right-handed
    pub dominant_hand_bias: f64,
    /// Physiological tremor base frequency (Hz)
    pub tremor_frequency_hz: f64,
    /// Tremor amplitude in pixels
    pub tremor_amplitude_px: f64,
    /// Phase lag of the Y tremor axis relative to X (degrees)
    pub tremor_phase_offset_deg: f64,
    /// How consistently speed and precision co-vary (0-1)
    pub motor_speed_correlation: f64,
    /// Fitts' law intercept (ms)
    pub fitts_a_ms: f64,
    /// Fitts' law slope (ms per bit)
    pub fitts_b_ms: f64,
    /// Base probability of overshooting the target
    pub overshoot_probability: f64,
    /// Probability of a small settle nudge after arrival
    pub micro_correction_probability: f64,
    /// Probability of clicking beside the intended point
    pub misclick_probability: f64,
    /// Probability of a movement containing brief pauses
    pub hesitation_probability: f64,
    /// Probability of splitting a long movement at a waypoint
    pub submovement_probability: f64,
    /// Velocity skew: 0.2 (snappy start) to 0.8 (lazy start)
    pub velocity_flow: f64,
    /// Visual feedback latency expressed in noise samples
    pub feedback_delay_samples: usize,
    /// Muscle bandwidth cutoff for the noise low-pass (Hz)
    pub muscle_bandwidth_hz: f64,
    /// Minimum accumulated motion before the cursor steps (px)
    pub motor_unit_threshold_px: f64,
    /// Global movement speed multiplier
    pub mouse_speed_multiplier: f64,
    /// Whether long movements split into ballistic/approach/fine phases
    pub uses_path_segmentation: bool,
    /// Habitual horizontal click bias as a fraction of target width
    pub click_bias_x: f64,
    /// Habitual vertical click bias as a fraction of target height
    pub click_bias_y: f64,
    /// Ex-Gaussian click hold parameters (ms)
    pub click_duration_mu: f64,
    pub click_duration_sigma: f64,
    pub click_duration_tau: f64,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            dominant_hand_bias: 0.6,
            tremor_frequency_hz: 10.0,
            tremor_amplitude_px: 0.8,
            tremor_phase_offset_deg: 90.0,
            motor_speed_correlation: 0.7,
            fitts_a_ms: 60.0,
            fitts_b_ms: 130.0,
            overshoot_probability: 0.12,
            micro_correction_probability: 0.20,
            misclick_probability: 0.02,
            hesitation_probability: 0.15,
            submovement_probability: 0.25,
            velocity_flow: 0.4,
            feedback_delay_samples: 15,
            muscle_bandwidth_hz: 18.0,
            motor_unit_threshold_px: 0.8,
            mouse_speed_multiplier: 1.0,
            uses_path_segmentation: true,
            click_bias_x: 0.0,
            click_bias_y: 0.0,
            click_duration_mu: 85.0,
            click_duration_sigma: 15.0,
            click_duration_tau: 10.0,
        }
    }
}

impl MotionProfile {
    /// Draw a plausible individual
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            dominant_hand_bias: rng.random_range(0.55..=0.75),
            tremor_frequency_hz: rng.random_range(8.0..=12.0),
            tremor_amplitude_px: rng.random_range(0.2..=1.5),
            tremor_phase_offset_deg: rng.random_range(60.0..=120.0),
            motor_speed_correlation: rng.random_range(0.5..=0.9),
            fitts_a_ms: rng.random_range(40.0..=90.0),
            fitts_b_ms: rng.random_range(100.0..=160.0),
            overshoot_probability: rng.random_range(0.08..=0.15),
            micro_correction_probability: rng.random_range(0.15..=0.25),
            misclick_probability: rng.random_range(0.01..=0.03),
            hesitation_probability: rng.random_range(0.05..=0.25),
            submovement_probability: rng.random_range(0.10..=0.40),
            velocity_flow: rng.random_range(0.2..=0.8),
            feedback_delay_samples: rng.random_range(10..=20),
            muscle_bandwidth_hz: rng.random_range(10.0..=25.0),
            motor_unit_threshold_px: rng.random_range(0.0..=1.5),
            mouse_speed_multiplier: rng.random_range(0.8..=1.3),
            uses_path_segmentation: rng.random_bool(0.5),
            click_bias_x: rng.random_range(-0.1..=0.1),
            click_bias_y: rng.random_range(-0.1..=0.1),
            click_duration_mu: rng.random_range(75.0..=95.0),
            click_duration_sigma: rng.random_range(10.0..=20.0),
            click_duration_tau: rng.random_range(5.0..=15.0),
        }
    }

    /// Check every invariant, reporting the first violation
    pub fn validate(&self) -> Result<(), ProfileError> {
        let probabilities = [
            ("dominant_hand_bias", self.dominant_hand_bias),
            ("motor_speed_correlation", self.motor_speed_correlation),
            ("overshoot_probability", self.overshoot_probability),
            ("micro_correction_probability", self.micro_correction_probability),
            ("misclick_probability", self.misclick_probability),
            ("hesitation_probability", self.hesitation_probability),
            ("submovement_probability", self.submovement_probability),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ProfileError::ProbabilityOutOfRange { field, value });
            }
        }

        let positives = [
            ("tremor_frequency_hz", self.tremor_frequency_hz),
            ("muscle_bandwidth_hz", self.muscle_bandwidth_hz),
            ("mouse_speed_multiplier", self.mouse_speed_multiplier),
            ("click_duration_mu", self.click_duration_mu),
        ];
        for (field, value) in positives {
            if !(value.is_finite() && value > 0.0) {
                return Err(ProfileError::NonPositive { field, value });
            }
        }

        let ranges = [
            ("tremor_amplitude_px", self.tremor_amplitude_px, 0.0, 10.0),
            ("tremor_phase_offset_deg", self.tremor_phase_offset_deg, 60.0, 120.0),
            ("velocity_flow", self.velocity_flow, 0.2, 0.8),
            ("motor_unit_threshold_px", self.motor_unit_threshold_px, 0.0, 5.0),
            ("click_bias_x", self.click_bias_x, -0.1, 0.1),
            ("click_bias_y", self.click_bias_y, -0.1, 0.1),
            ("fitts_a_ms", self.fitts_a_ms, 0.0, 1000.0),
            ("fitts_b_ms", self.fitts_b_ms, 0.0, 1000.0),
            ("click_duration_sigma", self.click_duration_sigma, 0.0, 100.0),
            ("click_duration_tau", self.click_duration_tau, 0.0, 100.0),
        ];
        for (field, value, min, max) in ranges {
            if !(min..=max).contains(&value) {
                return Err(ProfileError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }

        if self.feedback_delay_samples == 0 {
            return Err(ProfileError::ZeroFeedbackDelay);
        }

        Ok(())
    }

    /// Tremor Y-axis phase lag in radians
    pub fn tremor_phase_offset_rad(&self) -> f64 {
        self.tremor_phase_offset_deg.to_radians()
    }

    /// Hand bias mapped to -1.0 (left) ..= 1.0 (right)
    pub fn handedness(&self) -> f64 {
        (self.dominant_hand_bias - 0.5) * 2.0
    }
}

/// Profile validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("{field} must be a probability in [0, 1], got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f64 },
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} = {value} outside [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("feedback_delay_samples must be at least 1")]
    ZeroFeedbackDelay,
}
