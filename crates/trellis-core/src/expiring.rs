//! Last-touch bookkeeping shared by every cache store.

use std::sync::Mutex;
use web_time::{Duration, Instant};

/// Timestamp of the last read or write of a cache entry.
///
/// An entry that was never touched counts as expired.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Expiring {
    last_touched: Option<Instant>,
}

impl Expiring {
    pub fn touched_at(now: Instant) -> Self {
        Self {
            last_touched: Some(now),
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_touched = Some(now);
    }

    /// True once strictly more than `lifetime` has passed since the last touch.
    pub fn is_expired(&self, now: Instant, lifetime: Duration) -> bool {
        match self.last_touched {
            Some(last) => now.saturating_duration_since(last) > lifetime,
            None => true,
        }
    }
}

/// [`Expiring`] with its own lock, for entries read through a shared map guard.
#[derive(Debug, Default)]
pub struct SharedExpiring {
    inner: Mutex<Expiring>,
}

impl SharedExpiring {
    pub fn touched_at(now: Instant) -> Self {
        Self {
            inner: Mutex::new(Expiring::touched_at(now)),
        }
    }

    pub fn touch(&self, now: Instant) {
        self.lock().touch(now);
    }

    pub fn is_expired(&self, now: Instant, lifetime: Duration) -> bool {
        self.lock().is_expired(now, lifetime)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Expiring> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    const LIFETIME: Duration = Duration::from_secs(60);

    #[test]
    fn untouched_entry_is_expired() {
        let clock = ManualClock::new();
        assert!(Expiring::default().is_expired(clock.now(), LIFETIME));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let clock = ManualClock::new();
        for start in [0u64, 7, 3_600] {
            clock.set(Duration::from_secs(start));
            let entry = Expiring::touched_at(clock.now());

            clock.set(Duration::from_secs(start) + LIFETIME);
            assert!(!entry.is_expired(clock.now(), LIFETIME));

            clock.advance(Duration::from_millis(1));
            assert!(entry.is_expired(clock.now(), LIFETIME));
        }
    }

    #[test]
    fn touching_resets_the_deadline() {
        let clock = ManualClock::new();
        let shared = SharedExpiring::touched_at(clock.now());

        clock.advance(Duration::from_secs(50));
        shared.touch(clock.now());
        clock.advance(Duration::from_secs(50));
        assert!(!shared.is_expired(clock.now(), LIFETIME));

        clock.advance(Duration::from_secs(11));
        assert!(shared.is_expired(clock.now(), LIFETIME));
    }
}
