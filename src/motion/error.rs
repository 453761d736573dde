//! Motion error types

use super::backend::BackendError;
use super::state::MotionState;
use crate::geometry::{Rect, ScreenPoint};

/// Failure of a motion request
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MotionError {
    #[error("Target {target:?} outside addressable bounds {bounds:?}")]
    InvalidTarget { target: ScreenPoint, bounds: Rect },
    #[error("Another motion is in progress ({0:?})")]
    Busy(MotionState),
    #[error("Invalid motion state transition {from:?} -> {to:?}")]
    InvalidTransition { from: MotionState, to: MotionState },
    #[error("Motion interrupted at {position:?}")]
    Interrupted { position: ScreenPoint },
    #[error("Input backend failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Motion worker is not running")]
    WorkerUnavailable,
}

pub type MotionResult<T> = Result<T, MotionError>;
