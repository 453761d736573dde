//! Motion execution module
//!
//! Everything that touches time and the input device: the executor and its
//! sampling loop, the worker thread, clocks, backends and the lifecycle
//! state machine.

pub mod backend;
pub mod clock;
pub mod controller;
pub mod corrections;
pub mod error;
pub mod executor;
pub mod state;

pub use backend::{
    BackendError, InputBackend, InputEvent, MouseButton, RecordedEvent, RecordingBackend,
    ScrollDirection,
};
pub use clock::{MotionClock, SystemClock, VirtualClock};
pub use controller::{MotionController, MotionTicket};
pub use error::{MotionError, MotionResult};
pub use executor::{
    MotionCommand, MotionOutcome, MovementExecutor, DITHER_SCALE, EMISSION_ROUNDING_BIAS,
};
pub use state::{CancelToken, MotionState, StateCell};
