//! Motion lifecycle state machine
//!
//! One motion runs at a time per executor. The state lives in an atomic cell
//! shared between the executor and any controller handles, so overlapping
//! requests are rejected before they reach the worker.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::MotionError;

/// Where the executor is in a motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionState {
    Idle,
    Planning,
    Sampling,
    Overshoot,
    MicroCorrection,
    Done,
}

impl MotionState {
    fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Planning => 1,
            Self::Sampling => 2,
            Self::Overshoot => 3,
            Self::MicroCorrection => 4,
            Self::Done => 5,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Planning,
            2 => Self::Sampling,
            3 => Self::Overshoot,
            4 => Self::MicroCorrection,
            5 => Self::Done,
            _ => Self::Idle,
        }
    }

    /// Whether `self -> next` is a legal step
    ///
    /// Composite motions (sub-movements, segments, misclick corrections)
    /// re-enter `Planning` from the sampling and post-arrival states.
    pub fn can_transition_to(self, next: MotionState) -> bool {
        use MotionState::*;
        matches!(
            (self, next),
            (Idle, Planning)
                | (Planning, Sampling)
                | (Planning, Done)
                | (Sampling, Overshoot)
                | (Sampling, MicroCorrection)
                | (Sampling, Done)
                | (Sampling, Planning)
                | (Overshoot, Done)
                | (Overshoot, Planning)
                | (MicroCorrection, Done)
                | (MicroCorrection, Planning)
                | (Done, Planning)
                | (Done, Idle)
        )
    }
}

/// Shared, lock-free motion state
#[derive(Debug, Clone)]
pub struct StateCell {
    inner: Arc<AtomicU8>,
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(MotionState::Idle.to_u8())),
        }
    }

    pub fn get(&self) -> MotionState {
        MotionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// Claim the executor for a new motion (`Idle -> Planning`)
    pub fn try_reserve(&self) -> Result<(), MotionError> {
        self.inner
            .compare_exchange(
                MotionState::Idle.to_u8(),
                MotionState::Planning.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|current| MotionError::Busy(MotionState::from_u8(current)))
    }

    /// Step to `next`, rejecting illegal transitions
    pub fn transition(&self, next: MotionState) -> Result<(), MotionError> {
        let current = self.get();
        if !current.can_transition_to(next) {
            return Err(MotionError::InvalidTransition { from: current, to: next });
        }

        self.inner
            .compare_exchange(current.to_u8(), next.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|actual| MotionError::InvalidTransition {
                from: MotionState::from_u8(actual),
                to: next,
            })
    }

    /// Return to `Idle` from any state (cleanup after errors)
    pub fn release(&self) {
        self.inner.store(MotionState::Idle.to_u8(), Ordering::Release);
    }
}

/// Cooperative cancellation, polled by the sampling loop every tick
///
/// Each motion takes a fresh generation when it is reserved. `cancel` marks
/// whichever generation is current, so a cancel that lands after its motion
/// finished never interrupts the next one.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelGenerations>,
}

#[derive(Debug, Default)]
struct CancelGenerations {
    current: AtomicU64,
    cancelled: AtomicU64,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new motion generation and return it
    pub fn begin(&self) -> u64 {
        self.inner.current.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Generation of the latest motion, 0 before the first one
    pub fn generation(&self) -> u64 {
        self.inner.current.load(Ordering::Acquire)
    }

    /// Interrupt the current motion
    pub fn cancel(&self) {
        let generation = self.generation();
        self.inner.cancelled.fetch_max(generation, Ordering::AcqRel);
    }

    pub fn is_cancelled(&self) -> bool {
        let generation = self.generation();
        generation != 0 && self.inner.cancelled.load(Ordering::Acquire) == generation
    }
}
