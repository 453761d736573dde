//! Input injection backend
//!
//! The motion pipeline only emits absolute moves, button transitions and
//! scroll notches. Whatever sits behind this trait (a uinput device, a
//! remote agent, a recorder) is expected to be cheap and non-blocking.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::clock::MotionClock;
use crate::geometry::ScreenPoint;

/// Mouse buttons, carrying their Linux input event codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// `BTN_LEFT` / `BTN_RIGHT` / `BTN_MIDDLE`
    pub fn code(&self) -> u16 {
        match self {
            Self::Left => 0x110,
            Self::Right => 0x111,
            Self::Middle => 0x112,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Failure reported by an input backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Input device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Failed to write input event: {0}")]
    WriteFailed(String),
}

/// Sink for synthesized input
pub trait InputBackend: Send {
    fn move_absolute(&mut self, point: ScreenPoint) -> Result<(), BackendError>;

    fn button_down(&mut self, button: MouseButton) -> Result<(), BackendError>;

    fn button_up(&mut self, button: MouseButton) -> Result<(), BackendError>;

    fn scroll(&mut self, direction: ScrollDirection) -> Result<(), BackendError>;
}

impl<B: InputBackend + ?Sized> InputBackend for Box<B> {
    fn move_absolute(&mut self, point: ScreenPoint) -> Result<(), BackendError> {
        (**self).move_absolute(point)
    }

    fn button_down(&mut self, button: MouseButton) -> Result<(), BackendError> {
        (**self).button_down(button)
    }

    fn button_up(&mut self, button: MouseButton) -> Result<(), BackendError> {
        (**self).button_up(button)
    }

    fn scroll(&mut self, direction: ScrollDirection) -> Result<(), BackendError> {
        (**self).scroll(direction)
    }
}

/// One injected input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Move(ScreenPoint),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    Scroll(ScrollDirection),
}

/// An event with the clock time it was injected at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedEvent {
    pub at: Duration,
    pub event: InputEvent,
}

/// Backend that stores events in memory; clones share the same log
#[derive(Clone, Default)]
pub struct RecordingBackend {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
    clock: Option<Arc<dyn MotionClock + Sync>>,
    fail_after: Option<usize>,
}

impl std::fmt::Debug for RecordingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingBackend")
            .field("events", &self.len())
            .field("timestamped", &self.clock.is_some())
            .finish()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp each event with `clock`'s current time
    pub fn with_clock<C: MotionClock + Sync + 'static>(mut self, clock: C) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Fail every write once `count` events have been recorded
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Only the move targets, in order
    pub fn moves(&self) -> Vec<ScreenPoint> {
        self.events()
            .into_iter()
            .filter_map(|e| match e.event {
                InputEvent::Move(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        match self.events.lock() {
            Ok(events) => events.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn record(&self, event: InputEvent) -> Result<(), BackendError> {
        let at = self.clock.as_ref().map(|c| c.now()).unwrap_or_default();
        let mut events = self
            .events
            .lock()
            .map_err(|e| BackendError::WriteFailed(e.to_string()))?;

        if self.fail_after.is_some_and(|limit| events.len() >= limit) {
            return Err(BackendError::WriteFailed("recording limit reached".into()));
        }
        events.push(RecordedEvent { at, event });
        Ok(())
    }
}

impl InputBackend for RecordingBackend {
    fn move_absolute(&mut self, point: ScreenPoint) -> Result<(), BackendError> {
        self.record(InputEvent::Move(point))
    }

    fn button_down(&mut self, button: MouseButton) -> Result<(), BackendError> {
        self.record(InputEvent::ButtonDown(button))
    }

    fn button_up(&mut self, button: MouseButton) -> Result<(), BackendError> {
        self.record(InputEvent::ButtonUp(button))
    }

    fn scroll(&mut self, direction: ScrollDirection) -> Result<(), BackendError> {
        self.record(InputEvent::Scroll(direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::clock::VirtualClock;

    #[test]
    fn test_button_codes() {
        assert_eq!(MouseButton::Left.code(), 0x110);
        assert_eq!(MouseButton::Right.code(), 0x111);
        assert_eq!(MouseButton::Middle.code(), 0x112);
    }

    #[test]
    fn test_records_with_timestamps() {
        let clock = VirtualClock::new();
        let backend = RecordingBackend::new().with_clock(clock.clone());
        let mut sink = backend.clone();

        sink.move_absolute(ScreenPoint::new(1, 2)).unwrap();
        clock.advance(Duration::from_millis(5));
        sink.button_down(MouseButton::Left).unwrap();

        let events = backend.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].at, Duration::from_millis(5));
        assert_eq!(backend.moves(), vec![ScreenPoint::new(1, 2)]);
    }

    #[test]
    fn test_failing_after_limit() {
        let mut backend = RecordingBackend::new().failing_after(1);
        assert!(backend.scroll(ScrollDirection::Down).is_ok());
        assert!(backend.scroll(ScrollDirection::Down).is_err());
    }
}
