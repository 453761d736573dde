//! Movement timing
//!
//! Fitts' law durations and the asymmetric velocity profile. Humans
//! accelerate quickly and spend longer decelerating into the target, so
//! progress along the curve is a skewed sigmoid of elapsed time.

use rand::Rng;
use rand_distr::StandardNormal;

/// Substituted when a caller passes a non-positive target width (px)
pub const DEFAULT_TARGET_WIDTH: f64 = 20.0;

pub const MIN_DURATION_MS: f64 = 80.0;
pub const MAX_DURATION_MS: f64 = 2500.0;

const DURATION_NOISE_SD_MS: f64 = 20.0;
const DURATION_NOISE_LIMIT_MS: f64 = 50.0;

/// Sigmoid steepness of the time warp
const WARP_STEEPNESS: f64 = 10.0;
/// Maps `velocity_flow` onto the warp exponent
const FLOW_EXPONENT_SCALE: f64 = 2.5;

/// Map elapsed fraction `t` to path progress
///
/// Monotonic with `warp(0) = 0` and `warp(1) = 1`. Lower `flow` front-loads
/// the motion.
pub fn warp_progress(t: f64, flow: f64) -> f64 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let exponent = (flow * FLOW_EXPONENT_SCALE).max(0.05);

    let logistic = |w: f64| 1.0 / (1.0 + (-(w - 0.5) * WARP_STEEPNESS).exp());
    let low = logistic(0.0);
    let high = logistic(1.0);

    ((logistic(t.powf(exponent)) - low) / (high - low)).clamp(0.0, 1.0)
}

/// Fitts' law index of difficulty in bits
pub fn index_of_difficulty(distance: f64, width: f64) -> f64 {
    let width = if width > 0.0 { width.max(1.0) } else { DEFAULT_TARGET_WIDTH };
    (1.0 + distance.max(0.0) / width).log2()
}

/// Noisy Fitts' law duration in ms, clamped into `[80, 2500]`
pub fn fitts_duration_ms<R: Rng + ?Sized>(
    a_ms: f64,
    b_ms: f64,
    distance: f64,
    width: f64,
    rng: &mut R,
) -> f64 {
    let gaussian: f64 = rng.sample(StandardNormal);
    let jitter = (gaussian * DURATION_NOISE_SD_MS)
        .clamp(-DURATION_NOISE_LIMIT_MS, DURATION_NOISE_LIMIT_MS);

    (a_ms + b_ms * index_of_difficulty(distance, width) + jitter)
        .clamp(MIN_DURATION_MS, MAX_DURATION_MS)
}

/// Apply speed multipliers to a base duration, keeping it in range
pub fn scale_duration_ms(base_ms: f64, speed: f64) -> f64 {
    let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
    (base_ms / speed).clamp(MIN_DURATION_MS, MAX_DURATION_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_warp_endpoints_and_monotonic() {
        for flow in [0.2, 0.4, 0.6, 0.8] {
            assert!(warp_progress(0.0, flow).abs() < 1e-12);
            assert!((warp_progress(1.0, flow) - 1.0).abs() < 1e-12);

            let mut prev = 0.0;
            for i in 1..=100 {
                let w = warp_progress(i as f64 / 100.0, flow);
                assert!(w >= prev, "warp not monotonic at flow {flow}");
                prev = w;
            }
        }
    }

    #[test]
    fn test_low_flow_front_loads() {
        assert!(warp_progress(0.3, 0.2) > warp_progress(0.3, 0.8));
    }

    #[test]
    fn test_duration_clamped() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..1000 {
            let short = fitts_duration_ms(0.0, 0.0, 1.0, 20.0, &mut rng);
            let long = fitts_duration_ms(2000.0, 500.0, 5000.0, 1.0, &mut rng);
            assert!(short >= MIN_DURATION_MS);
            assert!(long <= MAX_DURATION_MS);
        }
    }

    #[test]
    fn test_duration_grows_with_difficulty() {
        assert!(index_of_difficulty(800.0, 10.0) > index_of_difficulty(100.0, 10.0));
        assert_eq!(index_of_difficulty(20.0, 0.0), 1.0);
        assert_eq!(scale_duration_ms(1000.0, 2.0), 500.0);
        assert_eq!(scale_duration_ms(1000.0, 0.0), 1000.0);
    }
}
