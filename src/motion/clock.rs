//! Time sources for the sampling loop
//!
//! Progress is derived from elapsed clock time rather than iteration count,
//! so the loop needs a monotonic clock and a precise sleep. `VirtualClock`
//! replaces both for tests and dry runs: sleeping just advances its time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Remaining time handed to spin-yield instead of the OS sleep
const SPIN_THRESHOLD: Duration = Duration::from_millis(1);

/// Monotonic time and sleeping
pub trait MotionClock: Send {
    /// Time since the clock's origin
    fn now(&self) -> Duration;

    /// Block the calling worker for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `Instant`
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl MotionClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        let deadline = Instant::now() + duration;

        // OS sleep overshoots by up to a scheduler quantum; finish by yielding
        if duration > SPIN_THRESHOLD {
            std::thread::sleep(duration - SPIN_THRESHOLD);
        }
        while Instant::now() < deadline {
            std::thread::yield_now();
        }
    }
}

/// Deterministic clock that only moves when slept on or advanced
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    nanos: Arc<AtomicU64>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::AcqRel);
    }
}

impl MotionClock for VirtualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

impl<C: MotionClock + Sync + ?Sized> MotionClock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

impl MotionClock for Box<dyn MotionClock> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}
