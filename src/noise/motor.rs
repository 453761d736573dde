//! Biological motor noise generator
//!
//! Produces the 2D positional jitter a real hand adds to an intended path.
//! Each sample runs the same pipeline:
//!
//! 1. Two pink sources, correlated by hand dominance
//! 2. A delayed, noisy correction of past error (visual-motor loop),
//!    occasionally overcorrecting
//! 3. A first-order low-pass at the muscle bandwidth
//! 4. A resonant tremor oscillator added after the filter
//! 5. Amplitude scaling by fatigue, movement phase, speed and progress
//!
//! Timing is taken from caller-supplied timestamps so the generator works
//! against both wall and virtual clocks.

use std::f64::consts::TAU;
use std::time::Duration;

use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use super::colored::ColoredNoise;
use super::tremor::TremorOscillator;
use crate::profile::{FatigueLevel, MotionProfile};

/// Elapsed time assumed for the first sample after construction or reset
const DEFAULT_SAMPLE_INTERVAL_S: f64 = 0.010;
const MIN_SAMPLE_INTERVAL_S: f64 = 0.001;
const MAX_SAMPLE_INTERVAL_S: f64 = 0.100;

/// Maximum hand-dominance correlation between axes
const MAX_AXIS_CORRELATION: f64 = 0.4;
/// Directional X bias per unit of hand bias away from neutral
const HAND_DIRECTION_BIAS: f64 = 0.1;

const FEEDBACK_GAIN_BASE: f64 = 0.35;
const CORRECTION_NOISE_SCALE: f64 = 0.3;
const OVERCORRECTION_PROBABILITY: f64 = 0.15;
const MAX_OVERCORRECTION: f64 = 1.4;
/// Decay of the leaky error integrator fed back through the loop
const ERROR_DECAY: f64 = 0.9;
/// Integrator bound; keeps the delayed loop's limit cycle below the tremor peak
const ERROR_LIMIT: f64 = 0.5;
const FILTER_STATE_LIMIT: f64 = 4.0;

/// Gain bringing the unit-variance pink sum up to pixel scale
pub const BASE_NOISE_GAIN: f64 = 2.5;
/// Tremor weight relative to the filtered noise
pub const TREMOR_WEIGHT: f64 = 0.35;

/// Which stages of the pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseModel {
    /// Full pipeline with feedback loop and resonant tremor
    #[default]
    Resonant,
    /// Correlated pink noise through the muscle low-pass only
    BandwidthOnly,
}

/// Coarse stage of a movement, which gates how much tremor shows through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementPhase {
    /// Fast initial launch, tremor mostly masked
    Ballistic,
    /// Mid-flight corrections
    Correction,
    /// Final homing, tremor fully visible
    Precision,
}

impl MovementPhase {
    pub fn from_progress(progress: f64) -> Self {
        if progress < 0.25 {
            Self::Ballistic
        } else if progress < 0.75 {
            Self::Correction
        } else {
            Self::Precision
        }
    }

    pub fn amplitude_scale(&self) -> f64 {
        match self {
            Self::Ballistic => 0.3,
            Self::Correction => 0.7,
            Self::Precision => 1.2,
        }
    }
}

/// Where in a movement the next sample is taken
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementContext {
    pub progress: f64,
    pub speed_px_per_ms: f64,
    pub phase: MovementPhase,
}

impl Default for MovementContext {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl MovementContext {
    /// Build a context; progress is clamped to `[0, 1]` and speed to `>= 0`
    pub fn new(progress: f64, speed_px_per_ms: f64) -> Self {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let speed_px_per_ms = if speed_px_per_ms.is_finite() {
            speed_px_per_ms.max(0.0)
        } else {
            0.0
        };
        Self {
            progress,
            speed_px_per_ms,
            phase: MovementPhase::from_progress(progress),
        }
    }
}

/// First-order IIR low-pass coefficient `2*pi*fc / (2*pi*fc + fs)`
///
/// Returns 1.0 (pass-through) when either rate is non-positive or not finite.
pub fn lowpass_alpha(sample_rate_hz: f64, cutoff_hz: f64) -> f64 {
    if !(sample_rate_hz.is_finite() && cutoff_hz.is_finite())
        || sample_rate_hz <= 0.0
        || cutoff_hz <= 0.0
    {
        return 1.0;
    }
    let omega = TAU * cutoff_hz;
    (omega / (omega + sample_rate_hz)).clamp(0.0, 1.0)
}

/// Stateful 2D motor noise source for one simulated hand
#[derive(Debug, Clone)]
pub struct MotorNoise {
    model: NoiseModel,

    hand_bias: f64,
    bandwidth_hz: f64,
    amplitude_px: f64,
    feedback_gain: f64,
    feedback_oscillation: f64,

    source_x: ColoredNoise,
    source_y: ColoredNoise,
    tremor: TremorOscillator,

    filter: (f64, f64),
    error: (f64, f64),
    error_ring: Vec<(f64, f64)>,
    ring_cursor: usize,
    last_sample: Option<Duration>,

    context: MovementContext,
    fatigue: FatigueLevel,
}

impl MotorNoise {
    pub fn new(profile: &MotionProfile, model: NoiseModel) -> Self {
        let correlation = profile.motor_speed_correlation;
        Self {
            model,
            hand_bias: profile.dominant_hand_bias,
            bandwidth_hz: profile.muscle_bandwidth_hz,
            amplitude_px: profile.tremor_amplitude_px,
            feedback_gain: FEEDBACK_GAIN_BASE * (0.7 + correlation * 0.6),
            feedback_oscillation: (1.0 - correlation) * 0.3,
            source_x: ColoredNoise::new(),
            source_y: ColoredNoise::new(),
            tremor: TremorOscillator::new(
                profile.tremor_frequency_hz,
                profile.tremor_phase_offset_rad(),
            ),
            filter: (0.0, 0.0),
            error: (0.0, 0.0),
            error_ring: vec![(0.0, 0.0); profile.feedback_delay_samples.max(1)],
            ring_cursor: 0,
            last_sample: None,
            context: MovementContext::default(),
            fatigue: FatigueLevel::FRESH,
        }
    }

    pub fn model(&self) -> NoiseModel {
        self.model
    }

    pub fn context(&self) -> MovementContext {
        self.context
    }

    pub fn set_context(&mut self, context: MovementContext) {
        self.context = context;
    }

    pub fn set_fatigue(&mut self, fatigue: FatigueLevel) {
        self.fatigue = fatigue;
    }

    pub fn fatigue(&self) -> FatigueLevel {
        self.fatigue
    }

    /// Next noise sample in pixels for a sample taken at `now`
    pub fn next_2d<R: Rng + ?Sized>(&mut self, now: Duration, rng: &mut R) -> (f64, f64) {
        let dt = match self.last_sample {
            Some(last) => now
                .saturating_sub(last)
                .as_secs_f64()
                .clamp(MIN_SAMPLE_INTERVAL_S, MAX_SAMPLE_INTERVAL_S),
            None => DEFAULT_SAMPLE_INTERVAL_S,
        };
        self.last_sample = Some(now);
        let sample_rate_hz = 1.0 / dt;

        let (raw_x, raw_y) = self.correlated_pair(rng);

        let (combined_x, combined_y) = match self.model {
            NoiseModel::BandwidthOnly => (raw_x, raw_y),
            NoiseModel::Resonant => {
                let (cx, cy) = self.feedback_correction(rng);
                (raw_x + cx, raw_y + cy)
            }
        };

        let alpha = lowpass_alpha(sample_rate_hz, self.bandwidth_hz);
        self.filter.0 = (alpha * combined_x + (1.0 - alpha) * self.filter.0)
            .clamp(-FILTER_STATE_LIMIT, FILTER_STATE_LIMIT);
        self.filter.1 = (alpha * combined_y + (1.0 - alpha) * self.filter.1)
            .clamp(-FILTER_STATE_LIMIT, FILTER_STATE_LIMIT);

        let mut out_x = self.filter.0 * BASE_NOISE_GAIN;
        let mut out_y = self.filter.1 * BASE_NOISE_GAIN;

        if self.model == NoiseModel::Resonant {
            let (tx, ty) = self.tremor.step(dt, rng);
            out_x += tx * TREMOR_WEIGHT;
            out_y += ty * TREMOR_WEIGHT;

            self.error.0 = (self.error.0 * ERROR_DECAY + out_x).clamp(-ERROR_LIMIT, ERROR_LIMIT);
            self.error.1 = (self.error.1 * ERROR_DECAY + out_y).clamp(-ERROR_LIMIT, ERROR_LIMIT);
            self.error_ring[self.ring_cursor] = self.error;
            self.ring_cursor = (self.ring_cursor + 1) % self.error_ring.len();
        }

        let amplitude = self.effective_amplitude();
        (out_x * amplitude, out_y * amplitude)
    }

    /// Clear filter, feedback and timing state between unrelated movements.
    /// Tremor phase and envelope carry over.
    pub fn reset(&mut self) {
        self.filter = (0.0, 0.0);
        self.error = (0.0, 0.0);
        self.error_ring.fill((0.0, 0.0));
        self.ring_cursor = 0;
        self.last_sample = None;
        self.context = MovementContext::default();
        self.source_x.reset();
        self.source_y.reset();
        self.tremor.reset();
    }

    fn correlated_pair<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (f64, f64) {
        let raw_x = self.source_x.next(rng);
        let raw_y = self.source_y.next(rng);

        let r = (self.hand_bias - 0.5) * 2.0 * MAX_AXIS_CORRELATION;
        let y = raw_y * (1.0 - r * r).sqrt() + raw_x * r;
        let x = raw_x + (self.hand_bias - 0.5) * HAND_DIRECTION_BIAS;
        (x, y)
    }

    fn feedback_correction<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (f64, f64) {
        // Oldest slot: written feedback_delay_samples steps ago
        let (delayed_x, delayed_y) = self.error_ring[self.ring_cursor];

        let mut cx =
            -delayed_x * self.feedback_gain + self.source_x.next(rng) * CORRECTION_NOISE_SCALE;
        let mut cy =
            -delayed_y * self.feedback_gain + self.source_y.next(rng) * CORRECTION_NOISE_SCALE;

        if rng.random_bool(OVERCORRECTION_PROBABILITY) {
            let gaussian: f64 = rng.sample(StandardNormal);
            let overshoot = rng.random_range(1.0..=MAX_OVERCORRECTION)
                + self.feedback_oscillation * gaussian;
            cx *= overshoot;
            cy *= overshoot;
        }

        (cx, cy)
    }

    fn effective_amplitude(&self) -> f64 {
        let speed_scale = 1.0 / (1.0 + self.context.speed_px_per_ms * 0.5);
        let progress_scale = if self.context.progress > 0.9 {
            1.0 + (self.context.progress - 0.9) * 2.0
        } else {
            1.0
        };

        self.amplitude_px
            * self.fatigue.amplitude_scale()
            * self.context.phase.amplitude_scale()
            * speed_scale
            * progress_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::spectral;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trace(model: NoiseModel, samples: usize, seed: u64) -> Vec<f64> {
        let profile = MotionProfile::default();
        let mut noise = MotorNoise::new(&profile, model);
        noise.set_context(MovementContext::new(0.5, 0.0));
        let mut rng = StdRng::seed_from_u64(seed);

        (0..samples)
            .map(|i| noise.next_2d(Duration::from_millis(10 * i as u64), &mut rng).0)
            .collect()
    }

    #[test]
    fn test_alpha_in_unit_range() {
        for fs in [1.0, 10.0, 100.0, 1000.0, 1e6] {
            for fc in [0.1, 1.0, 18.0, 100.0, 1e5] {
                let alpha = lowpass_alpha(fs, fc);
                assert!((0.0..=1.0).contains(&alpha), "alpha({fs}, {fc}) = {alpha}");
            }
        }
    }

    #[test]
    fn test_alpha_approaches_one() {
        let low = lowpass_alpha(100.0, 1.0);
        let high = lowpass_alpha(100.0, 1e6);
        assert!(high > low);
        assert!(high > 0.9999);
    }

    #[test]
    fn test_alpha_passes_through_invalid() {
        assert_eq!(lowpass_alpha(0.0, 18.0), 1.0);
        assert_eq!(lowpass_alpha(100.0, -1.0), 1.0);
        assert_eq!(lowpass_alpha(f64::NAN, 18.0), 1.0);
        assert_eq!(lowpass_alpha(100.0, f64::INFINITY), 1.0);
    }

    #[test]
    fn test_phase_from_progress() {
        assert_eq!(MovementPhase::from_progress(0.1), MovementPhase::Ballistic);
        assert_eq!(MovementPhase::from_progress(0.25), MovementPhase::Correction);
        assert_eq!(MovementPhase::from_progress(0.75), MovementPhase::Precision);
        assert_eq!(MovementContext::new(2.0, -1.0).progress, 1.0);
        assert_eq!(MovementContext::new(2.0, -1.0).speed_px_per_ms, 0.0);
    }

    #[test]
    fn test_output_finite_and_bounded() {
        let xs = trace(NoiseModel::Resonant, 100_000, 1);
        let limit = MotionProfile::default().tremor_amplitude_px
            * 1.2
            * (FILTER_STATE_LIMIT * BASE_NOISE_GAIN + 1.65 * TREMOR_WEIGHT);
        for x in xs {
            assert!(x.is_finite());
            assert!(x.abs() <= limit);
        }
    }

    #[test]
    fn test_finite_after_reset() {
        let profile = MotionProfile::default();
        let mut noise = MotorNoise::new(&profile, NoiseModel::Resonant);
        let mut rng = StdRng::seed_from_u64(9);

        for i in 0..500 {
            noise.next_2d(Duration::from_millis(7 * i), &mut rng);
        }
        noise.reset();

        let (x, y) = noise.next_2d(Duration::from_millis(3500), &mut rng);
        assert!(x.is_finite() && y.is_finite());
    }

    #[test]
    fn test_long_gap_is_clamped() {
        let profile = MotionProfile::default();
        let mut noise = MotorNoise::new(&profile, NoiseModel::Resonant);
        let mut rng = StdRng::seed_from_u64(10);

        noise.next_2d(Duration::ZERO, &mut rng);
        let (x, y) = noise.next_2d(Duration::from_secs(3600), &mut rng);
        assert!(x.is_finite() && y.is_finite());

        // Clock going backwards behaves like the minimum interval
        let (x, y) = noise.next_2d(Duration::from_secs(1), &mut rng);
        assert!(x.is_finite() && y.is_finite());
    }

    #[test]
    fn test_fatigue_raises_amplitude() {
        let profile = MotionProfile::default();
        let mut fresh = MotorNoise::new(&profile, NoiseModel::Resonant);
        let mut tired = MotorNoise::new(&profile, NoiseModel::Resonant);
        tired.set_fatigue(FatigueLevel::EXHAUSTED);

        let mut rng_a = StdRng::seed_from_u64(12);
        let mut rng_b = StdRng::seed_from_u64(12);
        let (a, _) = fresh.next_2d(Duration::ZERO, &mut rng_a);
        let (b, _) = tired.next_2d(Duration::ZERO, &mut rng_b);
        assert!((b - a * 1.8).abs() < 1e-9);
    }

    #[test]
    fn test_seeded_runs_match() {
        assert_eq!(trace(NoiseModel::Resonant, 2000, 77), trace(NoiseModel::Resonant, 2000, 77));
    }

    #[test]
    fn test_error_integrates_unscaled_output() {
        let profile = MotionProfile::default();
        let mut noise = MotorNoise::new(&profile, NoiseModel::Resonant);
        noise.set_context(MovementContext::new(0.95, 0.0));
        let amplitude = noise.effective_amplitude();
        let mut rng = StdRng::seed_from_u64(1);

        for i in 0..50 {
            let before = noise.error;
            let (x, y) = noise.next_2d(Duration::from_millis(10 * i), &mut rng);
            let expected_x = (before.0 * 0.9 + x / amplitude).clamp(-ERROR_LIMIT, ERROR_LIMIT);
            let expected_y = (before.1 * 0.9 + y / amplitude).clamp(-ERROR_LIMIT, ERROR_LIMIT);
            assert!((noise.error.0 - expected_x).abs() < 1e-9, "step {i}");
            assert!((noise.error.1 - expected_y).abs() < 1e-9, "step {i}");
        }
    }

    #[test]
    fn test_feedback_loop_adds_slow_oscillation() {
        let samples = 20_000;
        let resonant = trace(NoiseModel::Resonant, samples, 21);
        let bandwidth_only = trace(NoiseModel::BandwidthOnly, samples, 21);

        let resonant_band = spectral::band_power(&resonant, 1024, 100.0, 2.0, 4.0);
        let baseline_band = spectral::band_power(&bandwidth_only, 1024, 100.0, 2.0, 4.0);
        assert!(
            resonant_band > 8.0 * baseline_band,
            "loop band {resonant_band} vs baseline {baseline_band}"
        );
    }

    #[test]
    fn test_tremor_band_peak() {
        // 10 ms steps for 200 s
        let samples = 20_000;
        let resonant = trace(NoiseModel::Resonant, samples, 21);
        let bandwidth_only = trace(NoiseModel::BandwidthOnly, samples, 21);

        let resonant_band = spectral::band_power(&resonant, 1024, 100.0, 8.0, 12.0);
        let baseline_band = spectral::band_power(&bandwidth_only, 1024, 100.0, 8.0, 12.0);
        assert!(
            resonant_band > 3.0 * baseline_band,
            "tremor band {resonant_band} vs baseline {baseline_band}"
        );

        let peak = spectral::peak_frequency(&resonant, 1024, 100.0, 4.0, 40.0);
        assert!((8.0..=12.0).contains(&peak), "peak at {peak} Hz");
    }
}
