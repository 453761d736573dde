//! Path planning
//!
//! Builds the curve a movement follows and how long it takes. Curvature is
//! biased by handedness: right-handed people tend to arc one way, left-handed
//! the other, with plenty of individual variation.

use rand::Rng;
use rand_distr::StandardNormal;

use super::bezier::{BezierPath, MAX_CONTROL_POINTS};
use super::timing;
use crate::geometry::Vec2;
use crate::profile::MotionProfile;

const SHORT_PATH_PX: f64 = 200.0;
const MEDIUM_PATH_PX: f64 = 500.0;

const MIN_CURVATURE: f64 = 0.05;
const MAX_CURVATURE: f64 = 0.15;
const CURVATURE_JITTER_SD: f64 = 0.2;
const CURVE_SIGN_BIAS_SCALE: f64 = 1.4;
const CURVE_SIGN_SD: f64 = 0.5;

/// Plans curves and durations for one profile
#[derive(Debug, Clone, Copy)]
pub struct PathPlanner<'a> {
    profile: &'a MotionProfile,
}

impl<'a> PathPlanner<'a> {
    pub fn new(profile: &'a MotionProfile) -> Self {
        Self { profile }
    }

    /// 3 control points under 200 px, 4 under 500 px, otherwise 5
    pub fn control_point_count(distance: f64) -> usize {
        if distance < SHORT_PATH_PX {
            3
        } else if distance < MEDIUM_PATH_PX {
            4
        } else {
            MAX_CONTROL_POINTS
        }
    }

    /// Curve from `start` to `end` with hand-biased perpendicular bulge
    pub fn plan_curve<R: Rng + ?Sized>(&self, start: Vec2, end: Vec2, rng: &mut R) -> BezierPath {
        let delta = end - start;
        let distance = delta.length();
        if distance < 1.0 {
            return BezierPath::line(start, end);
        }

        let count = Self::control_point_count(distance);
        let normal = delta.unit_normal();
        let curvature = rng.random_range(MIN_CURVATURE..=MAX_CURVATURE);
        let sign = self.curve_sign(rng);

        let mut points = [Vec2::ZERO; MAX_CONTROL_POINTS];
        points[0] = start;
        points[count - 1] = end;

        for (i, point) in points.iter_mut().enumerate().take(count - 1).skip(1) {
            let t = i as f64 / (count - 1) as f64;
            let jitter: f64 = rng.sample(StandardNormal);
            let bow = (std::f64::consts::PI * t).sin() * sign;
            let offset = distance * curvature * bow * (1.0 + jitter * CURVATURE_JITTER_SD);
            *point = start.lerp(end, t) + normal * offset;
        }

        log::trace!(
            "Planned {}-point curve over {:.0}px, curvature {:.3} sign {}",
            count,
            distance,
            curvature,
            sign
        );

        BezierPath::from_points(&points[..count]).unwrap_or_else(|| BezierPath::line(start, end))
    }

    /// Progress along the curve after `t` of the planned duration
    pub fn warp(&self, t: f64) -> f64 {
        timing::warp_progress(t, self.profile.velocity_flow)
    }

    /// Movement duration in ms for `distance` onto a target `width` wide,
    /// sped up by the profile multiplier and `segment_speed`
    pub fn duration_ms<R: Rng + ?Sized>(
        &self,
        distance: f64,
        width: f64,
        segment_speed: f64,
        rng: &mut R,
    ) -> f64 {
        let (a, b) = (self.profile.fitts_a_ms, self.profile.fitts_b_ms);
        let base = timing::fitts_duration_ms(a, b, distance, width, rng);
        timing::scale_duration_ms(base, self.profile.mouse_speed_multiplier * segment_speed)
    }

    /// +1 bends clockwise on screen, -1 counter-clockwise
    fn curve_sign<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let mean = (self.profile.dominant_hand_bias - 0.5) * CURVE_SIGN_BIAS_SCALE;
        let gaussian: f64 = rng.sample(StandardNormal);
        if mean + gaussian * CURVE_SIGN_SD >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn clockwise_share(bias: f64) -> f64 {
        let profile = MotionProfile {
            dominant_hand_bias: bias,
            ..Default::default()
        };
        let planner = PathPlanner::new(&profile);
        let mut rng = StdRng::seed_from_u64(31);

        let start = Vec2::new(100.0, 500.0);
        let end = Vec2::new(900.0, 500.0);
        let trials = 1000;
        let clockwise = (0..trials)
            .filter(|_| planner.plan_curve(start, end, &mut rng).point_at(0.5).y > 500.0)
            .count();
        clockwise as f64 / trials as f64
    }

    #[test]
    fn test_control_point_count() {
        assert_eq!(PathPlanner::control_point_count(150.0), 3);
        assert_eq!(PathPlanner::control_point_count(200.0), 4);
        assert_eq!(PathPlanner::control_point_count(499.0), 4);
        assert_eq!(PathPlanner::control_point_count(500.0), 5);
    }

    #[test]
    fn test_curve_keeps_endpoints() {
        let profile = MotionProfile::default();
        let planner = PathPlanner::new(&profile);
        let mut rng = StdRng::seed_from_u64(2);

        for distance in [50.0, 300.0, 900.0] {
            let start = Vec2::new(10.0, 20.0);
            let end = Vec2::new(10.0 + distance, 60.0);
            let path = planner.plan_curve(start, end, &mut rng);
            assert_eq!(path.start(), start);
            assert_eq!(path.end(), end);
            let expected = PathPlanner::control_point_count(start.distance(end));
            assert_eq!(path.control_points().len(), expected);
        }
    }

    #[test]
    fn test_right_hand_bends_clockwise() {
        assert!(clockwise_share(0.75) > 0.65);
        assert!(clockwise_share(0.25) < 0.35);
    }

    #[test]
    fn test_horizontal_move_midpoint_bias() {
        let profile = MotionProfile {
            dominant_hand_bias: 0.8,
            ..Default::default()
        };
        let planner = PathPlanner::new(&profile);
        let mut rng = StdRng::seed_from_u64(32);

        let (start, end) = (Vec2::new(0.0, 0.0), Vec2::new(400.0, 0.0));
        let (mut clockwise, mut counter) = (0, 0);
        for _ in 0..1000 {
            let offset = planner.plan_curve(start, end, &mut rng).point_at(0.5).y;
            if offset > 0.0 {
                clockwise += 1;
            } else if offset < 0.0 {
                counter += 1;
            }
        }
        assert!(clockwise > counter, "{clockwise} vs {counter}");
    }

    #[test]
    fn test_degenerate_distance_is_line() {
        let profile = MotionProfile::default();
        let planner = PathPlanner::new(&profile);
        let mut rng = StdRng::seed_from_u64(3);
        let p = Vec2::new(5.0, 5.0);
        assert_eq!(planner.plan_curve(p, p, &mut rng).control_points().len(), 2);
    }

    #[test]
    fn test_speed_shortens_duration() {
        let profile = MotionProfile {
            mouse_speed_multiplier: 2.0,
            ..Default::default()
        };
        let planner = PathPlanner::new(&profile);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 {
            let ms = planner.duration_ms(600.0, 20.0, 1.0, &mut rng);
            // Base is at most a + b*log2(31) + 50 ~ 754 ms
            assert!((timing::MIN_DURATION_MS..=400.0).contains(&ms));
        }
    }
}
