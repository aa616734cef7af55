//! Time sources for expiry and sweep scheduling.
//!
//! The scene graph never reads wall-clock time directly. Every cache store asks
//! a [`Clock`] so tests can drive expiry deterministically with [`ManualClock`].

use std::sync::Mutex;
use web_time::{Duration, Instant};

/// Provides timing information for cache expiry.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;

    /// Returns the number of milliseconds elapsed since `since`.
    fn elapsed_millis(&self, since: Instant) -> u64 {
        self.now().saturating_duration_since(since).as_millis() as u64
    }
}

/// Clock backed by the platform monotonic timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Time is expressed as an offset from the instant the clock was created, which
/// lets tests read like a timeline (`clock.set(mins(10) + secs(30))`).
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Moves the clock to `origin + offset`. Moving backwards is allowed.
    pub fn set(&self, offset: Duration) {
        *self.lock() = offset;
    }

    pub fn advance(&self, by: Duration) {
        *self.lock() += by;
    }

    /// Offset of the current reading from the clock's origin.
    pub fn offset(&self) -> Duration {
        *self.lock()
    }

    /// The instant the clock would report at `offset`.
    pub fn instant_at(&self, offset: Duration) -> Instant {
        self.origin + offset
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Duration> {
        self.offset
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.lock()
    }
}
