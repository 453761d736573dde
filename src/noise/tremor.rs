//! Physiological tremor oscillator
//!
//! Both axes share one phase so the tremor traces an ellipse rather than two
//! independent wobbles. The instantaneous frequency wanders around the base
//! frequency (Ornstein-Uhlenbeck drift) and a slowly breathing envelope
//! modulates the amplitude, which keeps the spectral peak broad instead of a
//! single line.

use std::f64::consts::TAU;

use rand::Rng;
use rand_distr::StandardNormal;

/// Mean reversion rate of the frequency drift (1/s)
const DRIFT_THETA: f64 = 1.5;
/// Drift diffusion (Hz per sqrt(s))
const DRIFT_SIGMA: f64 = 0.9;
/// Soft limit on the drift magnitude (Hz)
const DRIFT_LIMIT_HZ: f64 = 1.5;

const ENVELOPE_STIFFNESS: f64 = 12.0;
const ENVELOPE_DAMPING: f64 = 4.0;
const ENVELOPE_NOISE: f64 = 1.5;
/// Logistic steepness mapping envelope state to gain
const ENVELOPE_STEEPNESS: f64 = 4.0;

/// Envelope velocity kept across a reset
const RESET_VELOCITY_RETAIN: f64 = 0.25;

/// Shared-phase tremor oscillator with drifting frequency and envelope
#[derive(Debug, Clone)]
pub struct TremorOscillator {
    base_frequency_hz: f64,
    phase_offset_rad: f64,
    phase: f64,
    drift_hz: f64,
    envelope_state: f64,
    envelope_velocity: f64,
}

impl TremorOscillator {
    pub fn new(base_frequency_hz: f64, phase_offset_rad: f64) -> Self {
        Self {
            base_frequency_hz,
            phase_offset_rad,
            phase: 0.0,
            drift_hz: 0.0,
            envelope_state: 0.0,
            envelope_velocity: 0.0,
        }
    }

    /// Advance by `dt` seconds and return the tremor sample for both axes
    pub fn step<R: Rng + ?Sized>(&mut self, dt: f64, rng: &mut R) -> (f64, f64) {
        let sqrt_dt = dt.sqrt();

        let drift_noise: f64 = rng.sample(StandardNormal);
        self.drift_hz += -DRIFT_THETA * self.drift_hz * dt + DRIFT_SIGMA * sqrt_dt * drift_noise;
        self.drift_hz = DRIFT_LIMIT_HZ * (self.drift_hz / DRIFT_LIMIT_HZ).tanh();

        let frequency = (self.base_frequency_hz + self.drift_hz).max(0.0);
        self.phase = (self.phase + TAU * frequency * dt).rem_euclid(TAU);

        let envelope_noise: f64 = rng.sample(StandardNormal);
        let accel = -ENVELOPE_STIFFNESS * self.envelope_state
            - ENVELOPE_DAMPING * self.envelope_velocity;
        self.envelope_velocity += accel * dt + ENVELOPE_NOISE * sqrt_dt * envelope_noise;
        self.envelope_state += self.envelope_velocity * dt;

        let envelope = self.envelope();
        let jitter_x = rng.random_range(0.9..=1.1);
        let jitter_y = rng.random_range(0.9..=1.1);

        (
            self.phase.sin() * envelope * jitter_x,
            (self.phase + self.phase_offset_rad).sin() * envelope * jitter_y,
        )
    }

    /// Current amplitude envelope, always in `(0.5, 1.5)`
    pub fn envelope(&self) -> f64 {
        0.5 + 1.0 / (1.0 + (-ENVELOPE_STEEPNESS * self.envelope_state).exp())
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn drift_hz(&self) -> f64 {
        self.drift_hz
    }

    /// Drop the frequency drift and most of the envelope momentum, keeping
    /// phase and envelope so the tremor does not restart from zero
    pub fn reset(&mut self) {
        self.drift_hz = 0.0;
        self.envelope_velocity *= RESET_VELOCITY_RETAIN;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_phase_stays_wrapped() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut tremor = TremorOscillator::new(10.0, 90f64.to_radians());
        for _ in 0..100_000 {
            tremor.step(0.01, &mut rng);
            assert!((0.0..TAU).contains(&tremor.phase()));
            assert!(tremor.drift_hz().abs() < DRIFT_LIMIT_HZ);
        }
    }

    #[test]
    fn test_envelope_bounded() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut tremor = TremorOscillator::new(10.0, 1.0);
        for _ in 0..50_000 {
            let (x, y) = tremor.step(0.005, &mut rng);
            let env = tremor.envelope();
            assert!(env > 0.5 && env < 1.5);
            assert!(x.abs() <= 1.5 * 1.1 && y.abs() <= 1.5 * 1.1);
        }
    }

    #[test]
    fn test_reset_keeps_phase() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut tremor = TremorOscillator::new(9.0, 1.2);
        for _ in 0..37 {
            tremor.step(0.01, &mut rng);
        }
        let phase = tremor.phase();
        let envelope = tremor.envelope();

        tremor.reset();
        assert_eq!(tremor.phase(), phase);
        assert_eq!(tremor.envelope(), envelope);
        assert_eq!(tremor.drift_hz(), 0.0);
    }
}
