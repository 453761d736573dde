//! Post-arrival corrections
//!
//! After a ballistic movement people either overshoot and come back, or
//! land close and nudge the last pixel or two. Small, distant targets hit
//! at speed overshoot the most.

use std::f64::consts::TAU;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::geometry::Vec2;

pub const MIN_OVERSHOOT_PROBABILITY: f64 = 0.02;
pub const MAX_OVERSHOOT_PROBABILITY: f64 = 0.40;

const MIN_OVERSHOOT_PIXELS: f64 = 3.0;
const MAX_OVERSHOOT_PIXELS: f64 = 12.0;
/// Largest hand-bias rotation of the overshoot direction (degrees)
const MAX_BIAS_ANGLE_DEG: f64 = 18.0;
const ANGLE_SPREAD_DEG: f64 = 12.0;
const MAX_ANGLE_DEG: f64 = 45.0;

const MIN_MICRO_CORRECTION_PIXELS: f64 = 1.0;
const MAX_MICRO_CORRECTION_PIXELS: f64 = 3.0;

/// Small targets overshoot more: 1.5x under 20 px, 0.5x at 80 px and up
pub fn size_factor(target_width: f64) -> f64 {
    if target_width < 20.0 {
        1.5
    } else if target_width < 50.0 {
        1.5 - (target_width - 20.0) / 30.0 * 0.5
    } else if target_width < 80.0 {
        1.0 - (target_width - 50.0) / 30.0 * 0.5
    } else {
        0.5
    }
}

/// Long throws overshoot more: 0.2x under 100 px, 1.3x at 800 px and up
pub fn distance_factor(distance: f64) -> f64 {
    if distance < 100.0 {
        0.2
    } else if distance < 400.0 {
        0.2 + (distance - 100.0) / 300.0 * 0.8
    } else if distance < 800.0 {
        1.0 + (distance - 400.0) / 400.0 * 0.3
    } else {
        1.3
    }
}

/// Fast movements overshoot more: 0.3x under 0.5 px/ms, 1.5x at 2 px/ms and up
pub fn speed_factor(speed_px_per_ms: f64) -> f64 {
    if speed_px_per_ms < 0.5 {
        0.3
    } else if speed_px_per_ms < 1.0 {
        0.3 + (speed_px_per_ms - 0.5) / 0.5 * 0.7
    } else if speed_px_per_ms < 2.0 {
        1.0 + (speed_px_per_ms - 1.0) * 0.5
    } else {
        1.5
    }
}

/// Overshoot probability for a movement, clamped to `[0.02, 0.40]`
pub fn overshoot_probability(
    base: f64,
    target_width: f64,
    distance: f64,
    speed_px_per_ms: f64,
) -> f64 {
    (base
        * size_factor(target_width)
        * distance_factor(distance)
        * speed_factor(speed_px_per_ms))
    .clamp(MIN_OVERSHOOT_PROBABILITY, MAX_OVERSHOOT_PROBABILITY)
}

/// Displacement past the target along `direction`, rotated toward the
/// dominant hand by a clamped Gaussian angle
pub fn overshoot_offset<R: Rng + ?Sized>(direction: Vec2, hand_bias: f64, rng: &mut R) -> Vec2 {
    let len = direction.length();
    if len <= f64::EPSILON {
        return Vec2::ZERO;
    }

    let bias_deg = (hand_bias - 0.5) * 2.0 * MAX_BIAS_ANGLE_DEG;
    let gaussian: f64 = rng.sample(StandardNormal);
    let angle = (bias_deg + gaussian * ANGLE_SPREAD_DEG)
        .clamp(-MAX_ANGLE_DEG, MAX_ANGLE_DEG)
        .to_radians();

    let (sin, cos) = angle.sin_cos();
    let (ux, uy) = (direction.x / len, direction.y / len);
    let distance = rng.random_range(MIN_OVERSHOOT_PIXELS..=MAX_OVERSHOOT_PIXELS);

    Vec2::new((ux * cos - uy * sin) * distance, (ux * sin + uy * cos) * distance)
}

/// A 1-3 px nudge in a uniformly random direction
pub fn micro_correction_offset<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    let distance = rng.random_range(MIN_MICRO_CORRECTION_PIXELS..=MAX_MICRO_CORRECTION_PIXELS);
    let angle = rng.random_range(0.0..TAU);
    Vec2::new(angle.cos() * distance, angle.sin() * distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_factor_tables() {
        assert_eq!(size_factor(10.0), 1.5);
        assert!((size_factor(50.0) - 1.0).abs() < 1e-12);
        assert_eq!(size_factor(100.0), 0.5);

        assert_eq!(distance_factor(50.0), 0.2);
        assert!((distance_factor(400.0) - 1.0).abs() < 1e-12);
        assert_eq!(distance_factor(1000.0), 1.3);

        assert_eq!(speed_factor(0.2), 0.3);
        assert!((speed_factor(1.0) - 1.0).abs() < 1e-12);
        assert_eq!(speed_factor(3.0), 1.5);
    }

    #[test]
    fn test_probability_clamped() {
        assert_eq!(overshoot_probability(1.0, 5.0, 1000.0, 5.0), MAX_OVERSHOOT_PROBABILITY);
        assert_eq!(overshoot_probability(0.0, 5.0, 1000.0, 5.0), MIN_OVERSHOOT_PROBABILITY);
    }

    #[test]
    fn test_hard_targets_overshoot_more() {
        let mut rng = StdRng::seed_from_u64(13);
        let base = 0.12;
        let trials = 10_000;

        let hard = overshoot_probability(base, 10.0, 600.0, 2.0);
        let easy = overshoot_probability(base, 100.0, 50.0, 0.2);

        let hard_hits = (0..trials).filter(|_| rng.random_bool(hard)).count();
        let easy_hits = (0..trials).filter(|_| rng.random_bool(easy)).count();
        assert!(hard_hits > easy_hits, "{hard_hits} vs {easy_hits}");
    }

    #[test]
    fn test_overshoot_offset_geometry() {
        let mut rng = StdRng::seed_from_u64(14);
        let direction = Vec2::new(10.0, 0.0);

        for _ in 0..1000 {
            let offset = overshoot_offset(direction, 0.6, &mut rng);
            let len = offset.length();
            assert!((3.0 - 1e-9..=12.0 + 1e-9).contains(&len));
            // Never more than 45 degrees off the movement direction
            assert!(offset.x >= len * 45f64.to_radians().cos() - 1e-9);
        }
        assert_eq!(overshoot_offset(Vec2::ZERO, 0.6, &mut rng), Vec2::ZERO);
    }

    #[test]
    fn test_micro_correction_size() {
        let mut rng = StdRng::seed_from_u64(15);
        for _ in 0..1000 {
            let len = micro_correction_offset(&mut rng).length();
            assert!((1.0 - 1e-9..=3.0 + 1e-9).contains(&len));
        }
    }
}
