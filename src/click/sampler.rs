//! Click point sampling
//!
//! Humans aim for the middle of a target but land on a Gaussian spread
//! around it, slightly off-center and with a personal bias. Pixel-perfect
//! center clicks are a bot signature, so they never come out of here.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::geometry::{Rect, ScreenPoint, Shape};
use crate::profile::MotionProfile;

/// Pixels kept clear of every edge
pub const EDGE_PADDING: i32 = 2;

pub const CENTER_MIN: f64 = 0.45;
pub const CENTER_MAX: f64 = 0.55;

pub const DEFAULT_STD_DEV: f64 = 0.15;
/// Tight spread for small targets
pub const PRECISE_STD_DEV: f64 = 0.10;
/// Loose spread for large targets
pub const IMPRECISE_STD_DEV: f64 = 0.20;

const MAX_CLICK_BIAS: f64 = 0.1;
const SHAPE_ATTEMPTS: usize = 10;

/// Standard deviation fraction suited to the target size
pub fn adaptive_std_dev(rect: Rect) -> f64 {
    let min_dimension = rect.min_dimension();
    if min_dimension < 20 {
        PRECISE_STD_DEV
    } else if min_dimension > 100 {
        IMPRECISE_STD_DEV
    } else {
        DEFAULT_STD_DEV
    }
}

/// Resolves target regions into concrete click pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickPointSampler {
    bias_x: f64,
    bias_y: f64,
    spread: f64,
}

impl Default for ClickPointSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ClickPointSampler {
    /// Unbiased sampler
    pub fn new() -> Self {
        Self {
            bias_x: 0.0,
            bias_y: 0.0,
            spread: 1.0,
        }
    }

    /// Sampler carrying the profile's habitual click bias
    pub fn for_profile(profile: &MotionProfile) -> Self {
        Self::new().with_bias(profile.click_bias_x, profile.click_bias_y)
    }

    /// Bias as a fraction of target size, clamped to +-10%
    pub fn with_bias(mut self, bias_x: f64, bias_y: f64) -> Self {
        self.bias_x = finite_or_zero(bias_x).clamp(-MAX_CLICK_BIAS, MAX_CLICK_BIAS);
        self.bias_y = finite_or_zero(bias_y).clamp(-MAX_CLICK_BIAS, MAX_CLICK_BIAS);
        self
    }

    /// Widen the spread around the center, e.g. late in a session
    pub fn with_spread(mut self, multiplier: f64) -> Self {
        self.spread = if multiplier.is_finite() && multiplier > 0.0 {
            multiplier
        } else {
            1.0
        };
        self
    }

    /// Pick a point inside `rect`
    ///
    /// `std_dev_fraction` defaults to 15% of each dimension and
    /// `center_fraction` to a fresh draw in `[0.45, 0.55]` per axis.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rect: Rect,
        std_dev_fraction: Option<f64>,
        center_fraction: Option<f64>,
        rng: &mut R,
    ) -> ScreenPoint {
        if rect.is_degenerate() {
            log::warn!("Degenerate click rect {:?}, using its midpoint", rect);
            return rect.midpoint();
        }

        let std_dev = std_dev_fraction
            .filter(|s| s.is_finite() && *s >= 0.0)
            .unwrap_or(DEFAULT_STD_DEV);
        let mut center = || {
            center_fraction
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0))
                .unwrap_or_else(|| rng.random_range(CENTER_MIN..=CENTER_MAX))
        };
        let (center_x, center_y) = (center(), center());

        let x = self.sample_axis(rect.x, rect.width, std_dev, center_x + self.bias_x, rng);
        let y = self.sample_axis(rect.y, rect.height, std_dev, center_y + self.bias_y, rng);

        self.avoid_exact_center(rect, ScreenPoint::new(x, y))
    }

    /// Pick a point with a spread chosen from the target size
    pub fn sample_adaptive<R: Rng + ?Sized>(&self, rect: Rect, rng: &mut R) -> ScreenPoint {
        self.sample(rect, Some(adaptive_std_dev(rect)), None, rng)
    }

    /// Pick a point inside an irregular shape, retrying within its bounding
    /// box and falling back to a plain bounding-box sample
    pub fn sample_in_shape<S: Shape + ?Sized, R: Rng + ?Sized>(
        &self,
        shape: &S,
        rng: &mut R,
    ) -> ScreenPoint {
        let bounds = shape.bounds();
        for _ in 0..SHAPE_ATTEMPTS {
            let candidate = self.sample_adaptive(bounds, rng);
            if shape.contains(candidate) {
                return candidate;
            }
        }
        log::debug!(
            "No in-shape click point after {} attempts, using bounds",
            SHAPE_ATTEMPTS
        );
        self.sample_adaptive(bounds, rng)
    }

    fn sample_axis<R: Rng + ?Sized>(
        &self,
        origin: i32,
        size: i32,
        std_dev: f64,
        center: f64,
        rng: &mut R,
    ) -> i32 {
        if size <= 2 * EDGE_PADDING {
            return origin + size / 2;
        }

        let size_f = f64::from(size);
        let gaussian: f64 = rng.sample(StandardNormal);
        let offset = size_f * center + gaussian * size_f * std_dev * self.spread;

        let max = f64::from(size - EDGE_PADDING - 1);
        origin + offset.clamp(f64::from(EDGE_PADDING), max).floor() as i32
    }

    /// Nudge one pixel off the geometric center, toward the habitual bias
    fn avoid_exact_center(&self, rect: Rect, point: ScreenPoint) -> ScreenPoint {
        let center = rect.center();
        if f64::from(point.x) != center.x || f64::from(point.y) != center.y {
            return point;
        }

        let (min_x, max_x) = if rect.width > 2 * EDGE_PADDING {
            (rect.x + EDGE_PADDING, rect.x + rect.width - EDGE_PADDING - 1)
        } else {
            (rect.x, rect.x + rect.width - 1)
        };

        let preferred = if self.bias_x < 0.0 { -1 } else { 1 };
        for step in [preferred, -preferred] {
            let x = point.x + step;
            if (min_x..=max_x).contains(&x) {
                return ScreenPoint::new(x, point.y);
            }
        }
        point
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_center(rect: Rect, p: ScreenPoint) -> bool {
        let c = rect.center();
        f64::from(p.x) == c.x && f64::from(p.y) == c.y
    }

    #[test]
    fn test_samples_inside_and_never_center() {
        let mut rng = StdRng::seed_from_u64(17);
        let sampler = ClickPointSampler::new();

        for _ in 0..10_000 {
            let rect = Rect::new(
                rng.random_range(0..1800),
                rng.random_range(0..1000),
                rng.random_range(2 * EDGE_PADDING..200),
                rng.random_range(2 * EDGE_PADDING..200),
            );
            let point = sampler.sample(rect, None, None, &mut rng);
            assert!(rect.contains(point), "{point:?} outside {rect:?}");
            assert!(!is_center(rect, point), "{point:?} is the center of {rect:?}");
        }
    }

    #[test]
    fn test_fixed_center_fraction_never_center() {
        // Zero spread aimed at the exact middle still avoids it
        let mut rng = StdRng::seed_from_u64(18);
        let sampler = ClickPointSampler::new();
        let rect = Rect::new(100, 100, 40, 20);

        for _ in 0..1000 {
            let point = sampler.sample(rect, Some(0.0), Some(0.5), &mut rng);
            assert!(rect.contains(point));
            assert!(!is_center(rect, point));
        }
    }

    #[test]
    fn test_tiny_rect_uses_midpoint() {
        let mut rng = StdRng::seed_from_u64(19);
        let sampler = ClickPointSampler::new();

        let rect = Rect::new(10, 10, 3, 3);
        assert_eq!(sampler.sample(rect, None, None, &mut rng), ScreenPoint::new(11, 11));

        let even = Rect::new(10, 10, 4, 4);
        let point = sampler.sample(even, None, None, &mut rng);
        assert!(even.contains(point));
        assert!(!is_center(even, point));
    }

    #[test]
    fn test_degenerate_rect_returns_midpoint() {
        let mut rng = StdRng::seed_from_u64(20);
        let point = ClickPointSampler::new().sample(Rect::new(50, 60, 0, 10), None, None, &mut rng);
        assert_eq!(point, ScreenPoint::new(50, 65));
    }

    #[test]
    fn test_bias_shifts_mean() {
        let mut rng = StdRng::seed_from_u64(21);
        let rect = Rect::new(0, 0, 200, 200);
        let right = ClickPointSampler::new().with_bias(0.1, 0.0);

        let mean_x: f64 = (0..2000)
            .map(|_| f64::from(right.sample(rect, None, None, &mut rng).x))
            .sum::<f64>()
            / 2000.0;
        assert!(mean_x > 110.0, "mean x {mean_x}");
    }

    #[test]
    fn test_adaptive_std_dev() {
        assert_eq!(adaptive_std_dev(Rect::new(0, 0, 15, 300)), PRECISE_STD_DEV);
        assert_eq!(adaptive_std_dev(Rect::new(0, 0, 50, 60)), DEFAULT_STD_DEV);
        assert_eq!(adaptive_std_dev(Rect::new(0, 0, 150, 120)), IMPRECISE_STD_DEV);
    }

    #[test]
    fn test_shape_sample_prefers_inside() {
        let mut rng = StdRng::seed_from_u64(22);
        let sampler = ClickPointSampler::new();
        let diamond = Polygon::new(vec![
            ScreenPoint::new(50, 0),
            ScreenPoint::new(100, 50),
            ScreenPoint::new(50, 100),
            ScreenPoint::new(0, 50),
        ]);

        let inside = (0..500)
            .filter(|_| diamond.contains(sampler.sample_in_shape(&diamond, &mut rng)))
            .count();
        assert!(inside > 490);
    }

    #[test]
    fn test_spread_widens_distribution() {
        let rect = Rect::new(0, 0, 400, 400);
        let spread_of = |sampler: ClickPointSampler, seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..2000)
                .map(|_| {
                    let point = sampler.sample(rect, Some(0.1), Some(0.5), &mut rng);
                    (f64::from(point.x) - 200.0).abs()
                })
                .sum::<f64>()
        };
        let wide = spread_of(ClickPointSampler::new().with_spread(1.3), 5);
        assert!(wide > spread_of(ClickPointSampler::new(), 5));
    }
}
