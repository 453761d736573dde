//! Movement executor
//!
//! Turns a target into a time-stamped stream of backend events. Progress
//! along a segment is elapsed clock time over planned duration, so a slow
//! backend drops intermediate points instead of stretching the movement.
//!
//! Each request claims the shared [`StateCell`] first and walks
//! `Planning -> Sampling -> (Overshoot | MicroCorrection) -> Done -> Idle`.
//! Composite requests (sub-movements, segments, misclick corrections, drags)
//! re-enter `Planning` for every leg.

use std::f64::consts::{PI, TAU};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::backend::{InputBackend, MouseButton, ScrollDirection};
use super::clock::MotionClock;
use super::corrections;
use super::error::{MotionError, MotionResult};
use super::state::{CancelToken, MotionState, StateCell};
use crate::click::ClickPointSampler;
use crate::config::{ConfigError, MotionConfig};
use crate::geometry::{Rect, ScreenPoint, Vec2};
use crate::noise::{MotorNoise, MovementContext, PerlinNoise};
use crate::path::{warp_progress, PathPlanner, DEFAULT_TARGET_WIDTH};
use crate::profile::{FatigueLevel, MotionProfile, SessionCounters};
use crate::stealth::{HumanizeConfig, Humanizer};

/// Added to the pending displacement before flooring it to whole pixels
pub const EMISSION_ROUNDING_BIAS: f64 = 0.5;
/// Share of the motor noise sample dithered into each emitted step
pub const DITHER_SCALE: f64 = 0.5;

/// Progress after which every tick emits
const FINAL_APPROACH: f64 = 0.95;

const SUBMOVEMENT_MIN_DISTANCE: f64 = 300.0;
const WAYPOINT_WIDTH: f64 = 50.0;
const WAYPOINT_MIN_T: f64 = 0.4;
const WAYPOINT_MAX_T: f64 = 0.6;
const WAYPOINT_DEVIATION: f64 = 0.15;

const SEGMENTATION_MIN_DISTANCE: f64 = 400.0;
const BALLISTIC_SHARE: f64 = 0.70;
const BALLISTIC_SPEED: f64 = 1.15;
const BALLISTIC_WIDTH: f64 = 100.0;
const APPROACH_SHARE: f64 = 0.25;
const APPROACH_SPEED: f64 = 1.0;
const HOMING_SPEED: f64 = 0.70;

const MAX_HESITATIONS: usize = 2;
const LONG_HESITATION_DISTANCE: f64 = 400.0;
const HESITATION_MIN_T: f64 = 0.2;
const HESITATION_MAX_T: f64 = 0.8;
const HESITATION_TOLERANCE: f64 = 0.05;

const MIN_PATH_NOISE_PX: f64 = 1.0;
const MAX_PATH_NOISE_PX: f64 = 3.0;

const DRAG_DURATION_SCALE: f64 = 1.5;
const MAX_DRAG_DURATION_MS: f64 = 5000.0;

const IDLE_TICK: Duration = Duration::from_millis(20);

/// A request the executor (or its worker) can run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MotionCommand {
    MoveTo { target: ScreenPoint, width: f64 },
    MoveToRect { rect: Rect },
    Click { button: MouseButton },
    DoubleClick { button: MouseButton },
    ClickIn { rect: Rect, button: MouseButton },
    /// Positive amounts scroll down, negative up, one notch per unit
    Scroll { amount: i32 },
    Drag { from: ScreenPoint, to: ScreenPoint, button: MouseButton },
    IdleDrift,
}

/// What a completed request did
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionOutcome {
    /// Resolved target pixel (the sampled point for rectangle requests)
    pub target: ScreenPoint,
    pub final_position: ScreenPoint,
    pub overshoot: bool,
    pub micro_correction: bool,
    pub submovement: bool,
    pub misclick: bool,
    /// Move and scroll events sent to the backend
    pub steps: usize,
    pub elapsed: Duration,
}

/// Side-to-side hand wobble while a button is held down
#[derive(Debug, Clone, Copy)]
struct Wobble {
    freq_x: f64,
    freq_y: f64,
    amplitude: f64,
    noise_phase: f64,
}

impl Wobble {
    fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            freq_x: rng.random_range(2.0..=4.0),
            freq_y: rng.random_range(2.5..=4.5),
            amplitude: rng.random_range(1.0..=2.5),
            noise_phase: rng.random_range(0.0..1000.0),
        }
    }

    fn offset(&self, elapsed_s: f64, perlin: &PerlinNoise) -> Vec2 {
        let modulation = 1.0 + perlin.noise1d(self.noise_phase + elapsed_s * 2.0) * 0.4;
        Vec2::new(
            (TAU * self.freq_x * elapsed_s).sin() * self.amplitude * modulation,
            (TAU * self.freq_y * elapsed_s).cos() * self.amplitude * modulation * 0.7,
        )
    }
}

/// Drives one simulated hand over one input backend
pub struct MovementExecutor<B: InputBackend, C: MotionClock, R: Rng = StdRng> {
    backend: B,
    clock: C,
    rng: R,

    profile: MotionProfile,
    humanize: HumanizeConfig,
    humanizer: Humanizer,
    noise: MotorNoise,
    perlin: PerlinNoise,
    sampler: ClickPointSampler,

    bounds: Rect,
    position: ScreenPoint,
    state: StateCell,
    cancel: CancelToken,
    session: SessionCounters,
    fatigue: FatigueLevel,
    held: Vec<MouseButton>,

    report: MotionOutcome,
}

impl<B: InputBackend, C: MotionClock> MovementExecutor<B, C, StdRng> {
    /// Executor seeded from `config.seed`, or from OS entropy when unset
    pub fn new(
        config: MotionConfig,
        profile: MotionProfile,
        backend: B,
        clock: C,
    ) -> Result<Self, ConfigError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, profile, backend, clock, rng)
    }
}

impl<B: InputBackend, C: MotionClock, R: Rng> MovementExecutor<B, C, R> {
    pub fn with_rng(
        config: MotionConfig,
        profile: MotionProfile,
        backend: B,
        clock: C,
        mut rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        profile.validate()?;

        let perlin = PerlinNoise::new(rng.random());
        let position = config.initial_position();

        Ok(Self {
            backend,
            clock,
            rng,
            humanizer: Humanizer::new(&profile),
            noise: MotorNoise::new(&profile, config.noise_model),
            perlin,
            sampler: ClickPointSampler::for_profile(&profile),
            profile,
            humanize: config.humanize,
            bounds: config.bounds,
            position,
            state: StateCell::new(),
            cancel: CancelToken::new(),
            session: SessionCounters::new(),
            fatigue: FatigueLevel::FRESH,
            held: Vec::new(),
            report: MotionOutcome::default(),
        })
    }

    /// Share an externally owned cancellation token
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn position(&self) -> ScreenPoint {
        self.position
    }

    /// Tell the executor where the cursor is, e.g. after the user moved it
    pub fn set_position(&mut self, point: ScreenPoint) {
        self.position = self.bounds.clamp(point);
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn profile(&self) -> &MotionProfile {
        &self.profile
    }

    pub fn state(&self) -> MotionState {
        self.state.get()
    }

    /// Handle on the lifecycle state, shared with controllers
    pub fn state_cell(&self) -> StateCell {
        self.state.clone()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn session(&self) -> &SessionCounters {
        &self.session
    }

    pub fn reset_session(&mut self) {
        self.session.reset();
    }

    pub fn fatigue(&self) -> FatigueLevel {
        self.fatigue
    }

    pub fn set_fatigue(&mut self, fatigue: FatigueLevel) {
        self.fatigue = fatigue;
        self.noise.set_fatigue(fatigue);
    }

    /// Forget noise history before an unrelated movement
    pub fn reset_noise(&mut self) {
        self.noise.reset();
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn move_to(&mut self, target: ScreenPoint, width: f64) -> MotionResult<MotionOutcome> {
        self.run(MotionCommand::MoveTo { target, width })
    }

    /// Move to a sampled point inside `rect`
    pub fn move_to_rect(&mut self, rect: Rect) -> MotionResult<MotionOutcome> {
        self.run(MotionCommand::MoveToRect { rect })
    }

    /// Click at the current position
    pub fn click(&mut self, button: MouseButton) -> MotionResult<MotionOutcome> {
        self.run(MotionCommand::Click { button })
    }

    pub fn double_click(&mut self, button: MouseButton) -> MotionResult<MotionOutcome> {
        self.run(MotionCommand::DoubleClick { button })
    }

    /// Move into `rect` and click, occasionally missing first
    pub fn click_in(&mut self, rect: Rect, button: MouseButton) -> MotionResult<MotionOutcome> {
        self.run(MotionCommand::ClickIn { rect, button })
    }

    pub fn scroll(&mut self, amount: i32) -> MotionResult<MotionOutcome> {
        self.run(MotionCommand::Scroll { amount })
    }

    pub fn drag(
        &mut self,
        from: ScreenPoint,
        to: ScreenPoint,
        button: MouseButton,
    ) -> MotionResult<MotionOutcome> {
        self.run(MotionCommand::Drag { from, to, button })
    }

    pub fn idle_drift(&mut self) -> MotionResult<MotionOutcome> {
        self.run(MotionCommand::IdleDrift)
    }

    /// Claim the executor and run `command`
    pub fn run(&mut self, command: MotionCommand) -> MotionResult<MotionOutcome> {
        self.state.try_reserve()?;
        self.cancel.begin();
        self.run_reserved(command)
    }

    /// Run `command` on an executor whose state cell the caller already reserved
    pub(crate) fn run_reserved(&mut self, command: MotionCommand) -> MotionResult<MotionOutcome> {
        match command {
            MotionCommand::MoveTo { target, width } => self.finish(|s| s.pointing(target, width)),
            MotionCommand::MoveToRect { rect } => self.finish(|s| {
                let point = s.resolve_click_point(rect);
                s.pointing(point, rect_width(rect))
            }),
            MotionCommand::Click { button } => self.finish(|s| {
                s.enter(MotionState::Planning)?;
                s.press_release(button)?;
                Ok(s.position)
            }),
            MotionCommand::DoubleClick { button } => self.finish(|s| {
                s.enter(MotionState::Planning)?;
                s.press_release(button)?;
                let interval = s.humanizer.double_click_interval(&mut s.rng);
                s.pause(interval)?;
                s.press_release(button)?;
                Ok(s.position)
            }),
            MotionCommand::ClickIn { rect, button } => {
                self.finish(|s| s.click_in_rect(rect, button))
            }
            MotionCommand::Scroll { amount } => self.finish(|s| s.scroll_notches(amount)),
            MotionCommand::Drag { from, to, button } => {
                self.finish(|s| s.drag_path(from, to, button))
            }
            MotionCommand::IdleDrift => self.finish(|s| s.drift()),
        }
    }

    /// Run `op` inside the reserved lifecycle and always come back to `Idle`
    fn finish<F>(&mut self, op: F) -> MotionResult<MotionOutcome>
    where
        F: FnOnce(&mut Self) -> MotionResult<ScreenPoint>,
    {
        let started = self.clock.now();
        self.report = MotionOutcome {
            target: self.position,
            final_position: self.position,
            ..Default::default()
        };

        let result = op(self).and_then(|target| {
            self.enter(MotionState::Done)?;
            self.state.transition(MotionState::Idle)?;
            Ok(target)
        });

        if let Err(e) = &result {
            log::debug!("Motion ended early at {:?}: {}", self.position, e);
            self.release_held_buttons();
        }
        self.state.release();

        let target = result?;
        self.report.target = target;
        self.report.final_position = self.position;
        self.report.elapsed = self.clock.now().saturating_sub(started);
        Ok(self.report)
    }

    /// Step to `next`, passing through `Planning`/`Sampling` when the direct
    /// transition is not allowed
    fn enter(&self, next: MotionState) -> MotionResult<()> {
        let current = self.state.get();
        if current == next {
            return Ok(());
        }
        if !current.can_transition_to(next) {
            let via = match next {
                MotionState::Overshoot | MotionState::MicroCorrection => {
                    Some(MotionState::Sampling)
                }
                MotionState::Sampling => Some(MotionState::Planning),
                _ => None,
            };
            if let Some(via) = via {
                self.enter(via)?;
            }
        }
        self.state.transition(next)
    }

    fn check_target(&self, target: ScreenPoint) -> MotionResult<()> {
        if self.bounds.contains(target) {
            Ok(())
        } else {
            log::error!("Rejected target {:?} outside {:?}", target, self.bounds);
            Err(MotionError::InvalidTarget {
                target,
                bounds: self.bounds,
            })
        }
    }

    fn check_cancel(&self) -> MotionResult<()> {
        if self.cancel.is_cancelled() {
            Err(MotionError::Interrupted {
                position: self.position,
            })
        } else {
            Ok(())
        }
    }

    fn pause(&mut self, duration: Duration) -> MotionResult<()> {
        self.clock.sleep(duration);
        self.check_cancel()
    }

    /// Send a move to `point` (clamped to bounds) unless the cursor is already there
    fn emit(&mut self, point: ScreenPoint) -> MotionResult<()> {
        let point = self.bounds.clamp(point);
        if point != self.position {
            self.backend.move_absolute(point)?;
            self.position = point;
            self.report.steps += 1;
        }
        Ok(())
    }

    /// Full pointing movement: strategy choice, legs, then post-arrival correction
    fn pointing(&mut self, target: ScreenPoint, width: f64) -> MotionResult<ScreenPoint> {
        self.check_target(target)?;
        self.enter(MotionState::Planning)?;

        let width = if width.is_finite() && width > 0.0 { width } else { DEFAULT_TARGET_WIDTH };
        let start = self.position;
        let distance = start.distance(target);
        if distance < 1.0 {
            return Ok(target);
        }

        let began = self.clock.now();
        let split = self.humanize.submovements
            && distance > SUBMOVEMENT_MIN_DISTANCE
            && self.rng.random_bool(self.humanize.scaled(self.profile.submovement_probability));

        if split {
            let waypoint = self.waypoint(start, target);
            log::trace!("Sub-movement via {:?} to {:?}", waypoint, target);
            self.report.submovement = true;
            self.direct(waypoint, WAYPOINT_WIDTH)?;
            let pause = self.humanizer.waypoint_pause(&mut self.rng);
            self.pause(pause)?;
        }
        self.direct(target, width)?;

        let elapsed_ms = (self.clock.now().saturating_sub(began).as_secs_f64() * 1000.0).max(1.0);
        self.settle(start, target, width, distance / elapsed_ms)?;
        Ok(target)
    }

    /// One leg, split into ballistic/approach/homing phases when long enough
    fn direct(&mut self, target: ScreenPoint, width: f64) -> MotionResult<()> {
        let start = self.position;
        let distance = start.distance(target);

        if self.profile.uses_path_segmentation && distance >= SEGMENTATION_MIN_DISTANCE {
            let ballistic_end = start
                .to_vec2()
                .lerp(target.to_vec2(), BALLISTIC_SHARE)
                .round();
            let approach_end = ballistic_end
                .to_vec2()
                .lerp(target.to_vec2(), APPROACH_SHARE)
                .round();
            log::trace!(
                "Segmented leg {:?} -> {:?} -> {:?} -> {:?}",
                start,
                ballistic_end,
                approach_end,
                target
            );

            self.sample_segment(ballistic_end, BALLISTIC_WIDTH, BALLISTIC_SPEED, None)?;
            self.sample_segment(approach_end, width * 2.0, APPROACH_SPEED, None)?;
            self.sample_segment(target, width, HOMING_SPEED, None)
        } else {
            self.sample_segment(target, width, 1.0, None)
        }
    }

    /// Waypoint partway along the line, pushed sideways and kept on screen
    fn waypoint(&mut self, start: ScreenPoint, target: ScreenPoint) -> ScreenPoint {
        let (from, to) = (start.to_vec2(), target.to_vec2());
        let distance = from.distance(to);
        let t = self.rng.random_range(WAYPOINT_MIN_T..=WAYPOINT_MAX_T);
        let reach = distance * WAYPOINT_DEVIATION;
        let deviation = self.rng.random_range(-reach..=reach);

        let point = from.lerp(to, t) + (to - from).unit_normal() * deviation;
        self.bounds.clamp(point.round())
    }

    fn plan_hesitations(&mut self, distance: f64) -> [Option<f64>; MAX_HESITATIONS] {
        let mut points = [None; MAX_HESITATIONS];
        if !self.humanize.hesitations
            || !self.rng.random_bool(self.humanize.scaled(self.profile.hesitation_probability))
        {
            return points;
        }

        let count = if distance > LONG_HESITATION_DISTANCE {
            self.rng.random_range(1..=MAX_HESITATIONS)
        } else {
            1
        };
        for point in points.iter_mut().take(count) {
            *point = Some(self.rng.random_range(HESITATION_MIN_T..=HESITATION_MAX_T));
        }
        points
    }

    /// The sampling loop for one curve, ending exactly on `end`
    fn sample_segment(
        &mut self,
        end: ScreenPoint,
        width: f64,
        speed: f64,
        wobble: Option<Wobble>,
    ) -> MotionResult<()> {
        let start = self.position;
        let distance = start.distance(end);
        if distance < 1.0 {
            return Ok(());
        }
        self.enter(MotionState::Planning)?;

        let planner = PathPlanner::new(&self.profile);
        let curve = planner.plan_curve(start.to_vec2(), end.to_vec2(), &mut self.rng);
        let mut duration_ms = planner.duration_ms(distance, width, speed, &mut self.rng);
        if wobble.is_some() {
            duration_ms = (duration_ms * DRAG_DURATION_SCALE).min(MAX_DRAG_DURATION_MS);
        }

        let hesitations = self.plan_hesitations(distance);
        let mut hesitated = [false; MAX_HESITATIONS];
        let path_amplitude = if self.humanize.path_noise {
            self.rng.random_range(MIN_PATH_NOISE_PX..=MAX_PATH_NOISE_PX)
        } else {
            0.0
        };
        let path_seed: u64 = self.rng.random();
        let threshold = self.profile.motor_unit_threshold_px;
        let flow = self.profile.velocity_flow;
        let mean_speed = distance / duration_ms;

        self.enter(MotionState::Sampling)?;
        let began = self.clock.now();
        let total_s = duration_ms / 1000.0;

        loop {
            self.check_cancel()?;
            let elapsed_s = self.clock.now().saturating_sub(began).as_secs_f64();
            let t = elapsed_s / total_s;
            if t >= 1.0 {
                break;
            }

            let due = hesitations
                .iter()
                .zip(hesitated.iter_mut())
                .find(|(point, done)| {
                    !**done && point.is_some_and(|p| (t - p).abs() <= HESITATION_TOLERANCE)
                });
            if let Some((_, done)) = due {
                *done = true;
                let pause = self.humanizer.hesitation_pause(&mut self.rng);
                self.pause(pause)?;
                continue;
            }

            let mut ideal = curve.point_at(warp_progress(t, flow));
            if path_amplitude > 0.0 {
                let bend = self.perlin.path_offset(t, path_amplitude, path_seed);
                ideal = ideal + bend * (PI * t).sin();
            }
            if let Some(wobble) = &wobble {
                ideal = ideal + wobble.offset(elapsed_s, &self.perlin);
            }

            let pending = ideal - self.position.to_vec2();
            if pending.length() >= threshold || t >= FINAL_APPROACH {
                let (dx, dy) = if self.humanize.path_noise {
                    self.noise.set_context(MovementContext::new(t, mean_speed));
                    self.noise.next_2d(self.clock.now(), &mut self.rng)
                } else {
                    (0.0, 0.0)
                };
                let step = ScreenPoint::new(
                    self.position.x + quantize(pending.x, dx),
                    self.position.y + quantize(pending.y, dy),
                );
                self.emit(step)?;
            }

            let tick = self.humanizer.tick_interval(self.humanize.timing_jitter, &mut self.rng);
            self.clock.sleep(tick);
        }

        self.emit(end)
    }

    /// Overshoot or settle nudge after arriving on `target`
    fn settle(
        &mut self,
        start: ScreenPoint,
        target: ScreenPoint,
        width: f64,
        speed_px_per_ms: f64,
    ) -> MotionResult<()> {
        let distance = start.distance(target);

        if self.humanize.overshoot {
            let probability = corrections::overshoot_probability(
                self.profile.overshoot_probability,
                width,
                distance,
                speed_px_per_ms,
            );
            if self.rng.random_bool(self.humanize.scaled(probability)) {
                return self.overshoot(target.to_vec2() - start.to_vec2(), target);
            }
        }

        if self.humanize.micro_corrections
            && self.rng.random_bool(self.humanize.scaled(self.profile.micro_correction_probability))
        {
            return self.micro_correct(target);
        }
        Ok(())
    }

    fn overshoot(&mut self, direction: Vec2, target: ScreenPoint) -> MotionResult<()> {
        self.enter(MotionState::Overshoot)?;
        let offset = corrections::overshoot_offset(
            direction,
            self.profile.dominant_hand_bias,
            &mut self.rng,
        );
        log::debug!("Overshooting {:?} by ({:.1}, {:.1})", target, offset.x, offset.y);

        self.emit((target.to_vec2() + offset).round())?;
        let pause = self.humanizer.overshoot_pause(&mut self.rng);
        self.pause(pause)?;
        self.emit(target)?;
        self.report.overshoot = true;
        Ok(())
    }

    fn micro_correct(&mut self, target: ScreenPoint) -> MotionResult<()> {
        self.enter(MotionState::MicroCorrection)?;
        let delay = self.humanizer.micro_correction_delay(&mut self.rng);
        self.pause(delay)?;

        let nudge = corrections::micro_correction_offset(&mut self.rng);
        log::debug!("Micro-correction ({:.1}, {:.1}) at {:?}", nudge.x, nudge.y, target);
        self.emit((target.to_vec2() + nudge).round())?;
        self.report.micro_correction = true;
        Ok(())
    }

    fn resolve_click_point(&mut self, rect: Rect) -> ScreenPoint {
        self.sampler
            .with_spread(self.session.variance_multiplier())
            .sample_adaptive(rect, &mut self.rng)
    }

    fn press(&mut self, button: MouseButton) -> MotionResult<()> {
        self.backend.button_down(button)?;
        self.held.push(button);
        Ok(())
    }

    fn release(&mut self, button: MouseButton) -> MotionResult<()> {
        self.held.retain(|held| *held != button);
        self.backend.button_up(button)?;
        Ok(())
    }

    fn press_release(&mut self, button: MouseButton) -> MotionResult<()> {
        self.press(button)?;
        let hold = self.humanizer.click_hold(&mut self.rng);
        self.pause(hold)?;
        self.release(button)?;
        self.session.record_click(&mut self.rng);
        Ok(())
    }

    fn release_held_buttons(&mut self) {
        for button in std::mem::take(&mut self.held) {
            if let Err(e) = self.backend.button_up(button) {
                log::warn!("Failed to release {:?}: {}", button, e);
            }
        }
    }

    fn click_in_rect(&mut self, rect: Rect, button: MouseButton) -> MotionResult<ScreenPoint> {
        let point = self.resolve_click_point(rect);
        let width = rect_width(rect);

        if self.humanize.misclicks && self.humanizer.should_misclick(self.fatigue, &mut self.rng) {
            let (dx, dy) = self.humanizer.misclick_offset(&mut self.rng);
            let miss = self.bounds.clamp(ScreenPoint::new(point.x + dx, point.y + dy));
            log::debug!("Misclick at {:?} instead of {:?}", miss, point);

            self.pointing(miss, width)?;
            self.press_release(button)?;
            self.report.misclick = true;

            let delay = self.humanizer.misclick_correction_delay(&mut self.rng);
            self.pause(delay)?;

            let corrected = self.resolve_click_point(rect);
            self.pointing(corrected, width)?;
            self.press_release(button)?;
            return Ok(corrected);
        }

        self.pointing(point, width)?;
        self.press_release(button)?;
        Ok(point)
    }

    fn scroll_notches(&mut self, amount: i32) -> MotionResult<ScreenPoint> {
        self.enter(MotionState::Planning)?;
        let direction = if amount > 0 { ScrollDirection::Down } else { ScrollDirection::Up };
        let notches = amount.unsigned_abs();
        let speed = self.humanizer.scroll_speed(&mut self.rng);
        log::debug!("Scrolling {} notches {:?} at speed {:.2}", notches, direction, speed);

        for notch in 0..notches {
            self.check_cancel()?;
            self.backend.scroll(direction)?;
            self.report.steps += 1;

            if notch + 1 < notches {
                let progress = f64::from(notch) / f64::from(notches);
                let delay = self.humanizer.scroll_tick_delay(progress, speed, &mut self.rng);
                self.pause(delay)?;
                if let Some(pause) = self.humanizer.scroll_pause(&mut self.rng) {
                    self.pause(pause)?;
                }
            }
        }
        Ok(self.position)
    }

    fn drag_path(
        &mut self,
        from: ScreenPoint,
        to: ScreenPoint,
        button: MouseButton,
    ) -> MotionResult<ScreenPoint> {
        self.check_target(to)?;
        self.pointing(from, DEFAULT_TARGET_WIDTH)?;

        self.press(button)?;
        let hold = self.humanizer.drag_hold_before(&mut self.rng);
        self.pause(hold)?;

        let wobble = Wobble::new(&mut self.rng);
        self.sample_segment(to, DEFAULT_TARGET_WIDTH, 1.0, Some(wobble))?;

        let hold = self.humanizer.drag_hold_after(&mut self.rng);
        self.pause(hold)?;
        self.release(button)?;
        Ok(to)
    }

    fn drift(&mut self) -> MotionResult<ScreenPoint> {
        self.enter(MotionState::Planning)?;
        let plan = self.humanizer.idle_drift(&mut self.rng);
        let start = self.position;
        let target = self.bounds.clamp(ScreenPoint::new(
            start.x + plan.dx.round() as i32,
            start.y + plan.dy.round() as i32,
        ));
        log::trace!("Idle drift {:?} -> {:?} over {:?}", start, target, plan.duration);

        self.enter(MotionState::Sampling)?;
        let began = self.clock.now();
        let total_s = plan.duration.as_secs_f64();

        while total_s > 0.0 {
            self.check_cancel()?;
            let t = self.clock.now().saturating_sub(began).as_secs_f64() / total_s;
            if t >= 1.0 {
                break;
            }

            let ideal = start.to_vec2().lerp(target.to_vec2(), t);
            let (dx, dy) = if self.humanize.path_noise {
                self.noise.set_context(MovementContext::new(t, 0.0));
                self.noise.next_2d(self.clock.now(), &mut self.rng)
            } else {
                (0.0, 0.0)
            };
            self.emit(ScreenPoint::new(quantize(ideal.x, dx), quantize(ideal.y, dy)))?;
            self.clock.sleep(IDLE_TICK);
        }

        self.emit(target)?;
        Ok(target)
    }
}

impl<B: InputBackend, C: MotionClock, R: Rng> Drop for MovementExecutor<B, C, R> {
    fn drop(&mut self) {
        self.release_held_buttons();
    }
}

/// Whole-pixel step for a pending displacement plus motor noise dither
fn quantize(pending: f64, noise: f64) -> i32 {
    (pending + noise * DITHER_SCALE + EMISSION_ROUNDING_BIAS).floor() as i32
}

fn rect_width(rect: Rect) -> f64 {
    f64::from(rect.min_dimension().max(1))
}
