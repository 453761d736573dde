//! Motor Cursor - human-like pointer motion for automation agents
//!
//! This library turns "move to this target and click" into a time-stamped
//! stream of cursor positions and button events with the statistical texture
//! of a real hand: curved paths, asymmetric velocity, pink noise, tremor,
//! delayed visual feedback, overshoots and settle nudges.
//!
//! ## Layout
//!
//! - `noise`: colored noise, tremor and the combined motor noise pipeline
//! - `path`: Bézier curves, time warp and Fitts' law durations
//! - `click`: where inside a target the click lands
//! - `motion`: the executor, its worker thread, clocks and backends
//! - `profile`: per-individual constants plus session fatigue
//! - `stealth`: humanized timing and which imperfections are enabled
//!
//! ## Determinism
//!
//! Every stochastic call takes its random source explicitly. Seed the
//! executor and drive it with a `VirtualClock` to replay a trace exactly.

pub mod click;
pub mod config;
pub mod geometry;
pub mod motion;
pub mod noise;
pub mod path;
pub mod profile;
pub mod stealth;

pub use crate::config::{ConfigError, MotionConfig, Settings};
pub use crate::geometry::{Rect, ScreenPoint, Shape};
pub use crate::motion::{
    InputBackend, MotionClock, MotionCommand, MotionController, MotionError, MotionOutcome,
    MouseButton, MovementExecutor,
};
pub use crate::profile::{FatigueLevel, MotionProfile};

/// Build an executor from a stored settings bundle
pub fn executor_from_settings<B: InputBackend, C: MotionClock>(
    settings: Settings,
    backend: B,
    clock: C,
) -> Result<MovementExecutor<B, C>, ConfigError> {
    MovementExecutor::new(settings.motion, settings.profile, backend, clock)
}
