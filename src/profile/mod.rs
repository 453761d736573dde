//! Behavioral profile module
//!
//! Read-only per-individual constants plus the session-scoped fatigue and
//! click counters that modulate them.

pub mod motion_profile;
pub mod session;

pub use motion_profile::{MotionProfile, ProfileError};
pub use session::{FatigueLevel, SessionCounters, CLICK_FATIGUE_THRESHOLD};
