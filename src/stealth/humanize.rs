//! Human timing simulation for anti-detection
//!
//! Every pause, hold and interval a simulated hand produces comes from here.
//! Distributions are skewed the way human reaction data is: ex-Gaussian for
//! button holds, log-normal for short pauses, uniform only where a flat
//! spread is realistic.

use std::f64::consts::{PI, TAU};
use std::time::Duration;

use rand::Rng;
use rand_distr::{Distribution, Exp, LogNormal, Normal};

use crate::profile::{FatigueLevel, MotionProfile};

/// Button hold range (ms)
const MIN_CLICK_DURATION_MS: f64 = 60.0;
const MAX_CLICK_DURATION_MS: f64 = 120.0;

const MIN_DOUBLE_CLICK_INTERVAL_MS: u64 = 80;
const MAX_DOUBLE_CLICK_INTERVAL_MS: u64 = 180;

/// Sampling tick: 7 ms nominal, -1/+2 ms jitter
const TICK_INTERVAL_MS: f64 = 7.0;
const TICK_JITTER_LOW_MS: f64 = -1.0;
const TICK_JITTER_HIGH_MS: f64 = 2.0;

const MIN_HESITATION_MS: u64 = 5;
const MAX_HESITATION_MS: u64 = 15;

const WAYPOINT_PAUSE_MEDIAN_MS: f64 = 20.0;
const WAYPOINT_PAUSE_SIGMA: f64 = 0.3;
const MIN_WAYPOINT_PAUSE_MS: f64 = 10.0;
const MAX_WAYPOINT_PAUSE_MS: f64 = 30.0;

const MIN_OVERSHOOT_DELAY_MS: u64 = 50;
const MAX_OVERSHOOT_DELAY_MS: u64 = 150;
const MIN_MICRO_CORRECTION_DELAY_MS: u64 = 100;
const MAX_MICRO_CORRECTION_DELAY_MS: u64 = 200;

/// Misclicks land 5-20 px off and are capped at a 10% rate
const MIN_MISCLICK_OFFSET: f64 = 5.0;
const MAX_MISCLICK_OFFSET: f64 = 20.0;
const MAX_MISCLICK_RATE: f64 = 0.10;
const MIN_MISCLICK_CORRECTION_DELAY_MS: u64 = 200;
const MAX_MISCLICK_CORRECTION_DELAY_MS: u64 = 500;

const MIN_SCROLL_DELAY_MS: f64 = 30.0;
const MAX_SCROLL_DELAY_MS: f64 = 80.0;
const SCROLL_SPEED_VARIANCE: f64 = 0.3;
const SCROLL_PAUSE_PROBABILITY: f64 = 0.15;
const MIN_SCROLL_PAUSE_MS: u64 = 50;
const MAX_SCROLL_PAUSE_MS: u64 = 150;

const MIN_DRAG_HOLD_BEFORE_MS: u64 = 50;
const MAX_DRAG_HOLD_BEFORE_MS: u64 = 120;
const MIN_DRAG_HOLD_AFTER_MS: u64 = 30;
const MAX_DRAG_HOLD_AFTER_MS: u64 = 80;

const MIN_DRIFT_PIXELS: f64 = 5.0;
const MAX_DRIFT_PIXELS: f64 = 30.0;
const MIN_DRIFT_DURATION_MS: u64 = 500;
const MAX_DRIFT_DURATION_MS: u64 = 2000;

/// Milliseconds as a `Duration`, negative values saturating to zero
pub fn millis(ms: f64) -> Duration {
    if ms.is_finite() && ms > 0.0 {
        Duration::from_nanos((ms * 1_000_000.0).round() as u64)
    } else {
        Duration::ZERO
    }
}

/// A small idle movement away from the resting point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftPlan {
    pub dx: f64,
    pub dy: f64,
    pub duration: Duration,
}

/// Timing generator for one simulated individual
#[derive(Debug, Clone)]
pub struct Humanizer {
    click_mu: f64,
    click_sigma: f64,
    click_tau: f64,
    misclick_probability: f64,
}

impl Humanizer {
    /// Create a humanizer from a profile
    ///
    /// Fast movers click faster: the hold mean shrinks with the speed
    /// multiplier in proportion to how tightly speed and precision co-vary.
    pub fn new(profile: &MotionProfile) -> Self {
        let speed_deviation = profile.mouse_speed_multiplier - 1.0;
        let adjustment = 1.0 - speed_deviation * profile.motor_speed_correlation;

        Self {
            click_mu: profile.click_duration_mu * adjustment,
            click_sigma: profile.click_duration_sigma,
            click_tau: profile.click_duration_tau,
            misclick_probability: profile.misclick_probability,
        }
    }

    /// Ex-Gaussian sample: Gaussian core plus exponential right tail of mean `tau`
    pub fn ex_gaussian<R: Rng + ?Sized>(mu: f64, sigma: f64, tau: f64, rng: &mut R) -> f64 {
        let core = Normal::new(mu, sigma.max(0.0)).map_or(mu, |normal| normal.sample(rng));
        let tail = if tau > 0.0 {
            Exp::new(1.0 / tau).map_or(0.0, |exp| exp.sample(rng))
        } else {
            0.0
        };
        core + tail
    }

    /// Log-normal sample around `median_ms`, clamped to `[min_ms, max_ms]`
    pub fn log_normal_ms<R: Rng + ?Sized>(
        median_ms: f64,
        sigma: f64,
        min_ms: f64,
        max_ms: f64,
        rng: &mut R,
    ) -> f64 {
        LogNormal::new(median_ms.ln(), sigma)
            .map_or(median_ms, |log_normal| log_normal.sample(rng))
            .clamp(min_ms, max_ms)
    }

    /// How long a button stays pressed for a click
    pub fn click_hold<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let ms = Self::ex_gaussian(self.click_mu, self.click_sigma, self.click_tau, rng)
            .clamp(MIN_CLICK_DURATION_MS, MAX_CLICK_DURATION_MS);
        millis(ms.round())
    }

    /// Gap between the two clicks of a double-click
    pub fn double_click_interval<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(
            rng.random_range(MIN_DOUBLE_CLICK_INTERVAL_MS..=MAX_DOUBLE_CLICK_INTERVAL_MS),
        )
    }

    /// Sleep between sampling ticks; `jitter` off gives the nominal interval
    pub fn tick_interval<R: Rng + ?Sized>(&self, jitter: bool, rng: &mut R) -> Duration {
        let ms = if jitter {
            TICK_INTERVAL_MS + rng.random_range(TICK_JITTER_LOW_MS..=TICK_JITTER_HIGH_MS)
        } else {
            TICK_INTERVAL_MS
        };
        millis(ms.max(1.0))
    }

    /// Brief mid-movement pause
    pub fn hesitation_pause<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.random_range(MIN_HESITATION_MS..=MAX_HESITATION_MS))
    }

    /// Pause at a sub-movement waypoint
    pub fn waypoint_pause<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        millis(Self::log_normal_ms(
            WAYPOINT_PAUSE_MEDIAN_MS,
            WAYPOINT_PAUSE_SIGMA,
            MIN_WAYPOINT_PAUSE_MS,
            MAX_WAYPOINT_PAUSE_MS,
            rng,
        ))
    }

    /// Pause at the far point of an overshoot before correcting
    pub fn overshoot_pause<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.random_range(MIN_OVERSHOOT_DELAY_MS..=MAX_OVERSHOOT_DELAY_MS))
    }

    /// Wait before a settle nudge
    pub fn micro_correction_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(
            rng.random_range(MIN_MICRO_CORRECTION_DELAY_MS..=MAX_MICRO_CORRECTION_DELAY_MS),
        )
    }

    /// Effective misclick rate at `fatigue`, capped at 10%
    pub fn misclick_rate(&self, fatigue: FatigueLevel) -> f64 {
        (self.misclick_probability * fatigue.misclick_multiplier()).clamp(0.0, MAX_MISCLICK_RATE)
    }

    pub fn should_misclick<R: Rng + ?Sized>(&self, fatigue: FatigueLevel, rng: &mut R) -> bool {
        rng.random_bool(self.misclick_rate(fatigue))
    }

    /// Offset of a misclick from the intended point
    pub fn misclick_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> (i32, i32) {
        let distance = rng.random_range(MIN_MISCLICK_OFFSET..=MAX_MISCLICK_OFFSET);
        let angle = rng.random_range(0.0..TAU);
        ((angle.cos() * distance).round() as i32, (angle.sin() * distance).round() as i32)
    }

    /// Realization delay before correcting a misclick
    pub fn misclick_correction_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(
            rng.random_range(MIN_MISCLICK_CORRECTION_DELAY_MS..=MAX_MISCLICK_CORRECTION_DELAY_MS),
        )
    }

    /// Per-scroll speed factor, held for the whole scroll
    pub fn scroll_speed<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        1.0 + rng.random_range(-SCROLL_SPEED_VARIANCE..=SCROLL_SPEED_VARIANCE)
    }

    /// Delay after a scroll notch; faster in the middle of the scroll
    pub fn scroll_tick_delay<R: Rng + ?Sized>(
        &self,
        progress: f64,
        speed: f64,
        rng: &mut R,
    ) -> Duration {
        let acceleration = 1.0 - 0.3 * (progress.clamp(0.0, 1.0) * PI).sin();
        let base = rng.random_range(MIN_SCROLL_DELAY_MS..=MAX_SCROLL_DELAY_MS);
        millis((base * speed * acceleration).floor())
    }

    /// Occasional mid-scroll hesitation
    pub fn scroll_pause<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Duration> {
        if rng.random_bool(SCROLL_PAUSE_PROBABILITY) {
            Some(Duration::from_millis(rng.random_range(MIN_SCROLL_PAUSE_MS..=MAX_SCROLL_PAUSE_MS)))
        } else {
            None
        }
    }

    /// Hold after pressing, before a drag starts moving
    pub fn drag_hold_before<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.random_range(MIN_DRAG_HOLD_BEFORE_MS..=MAX_DRAG_HOLD_BEFORE_MS))
    }

    /// Hold at the drop point before releasing
    pub fn drag_hold_after<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.random_range(MIN_DRAG_HOLD_AFTER_MS..=MAX_DRAG_HOLD_AFTER_MS))
    }

    /// Direction, size and length of an idle drift
    pub fn idle_drift<R: Rng + ?Sized>(&self, rng: &mut R) -> DriftPlan {
        let distance = rng.random_range(MIN_DRIFT_PIXELS..=MAX_DRIFT_PIXELS);
        let angle = rng.random_range(0.0..TAU);
        DriftPlan {
            dx: angle.cos() * distance,
            dy: angle.sin() * distance,
            duration: Duration::from_millis(
                rng.random_range(MIN_DRIFT_DURATION_MS..=MAX_DRIFT_DURATION_MS),
            ),
        }
    }
}
