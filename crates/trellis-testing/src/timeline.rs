use std::sync::Arc;
use trellis_core::{Clock, Duration, ManualClock};
use trellis_ui::{CacheConfig, Caches};

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

pub fn mins(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

/// Caches driven by a [`ManualClock`], so expiry can be scripted as
/// `timeline.at(mins(10) + secs(30))`.
pub struct Timeline {
    clock: Arc<ManualClock>,
    caches: Arc<Caches>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        let clock = Arc::new(ManualClock::new());
        let caches = Arc::new(Caches::new(Arc::clone(&clock) as Arc<dyn Clock>, config));
        Self { clock, caches }
    }

    /// Moves the clock to `offset` from the start of the timeline.
    pub fn at(&self, offset: Duration) -> &Self {
        self.clock.set(offset);
        self
    }

    pub fn advance(&self, by: Duration) -> &Self {
        self.clock.advance(by);
        self
    }

    pub fn clock(&self) -> &Arc<ManualClock> {
        &self.clock
    }

    pub fn caches(&self) -> &Arc<Caches> {
        &self.caches
    }

    /// Records `offset` as the time of the last sweep.
    pub fn set_last_clean(&self, offset: Duration) {
        self.caches
            .set_last_clean(Some(self.clock.instant_at(offset)));
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}
