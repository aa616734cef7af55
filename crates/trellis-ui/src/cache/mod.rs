//! Expiring caches shared by every canvas of an application.
//!
//! Each store has its own lock, so unrelated lookups never contend. Entries are
//! evicted after [`CacheConfig::cache_duration`] without a touch, by the
//! rate-limited [`Caches::clean`] sweep.

mod canvas;
mod renderer;
mod svg;
mod text;
mod texture;

pub use canvas::CanvasCache;
pub use renderer::RendererCache;
pub use svg::SvgCache;
pub use text::{FontMetric, FontMetricCache};
pub use texture::{TextureCache, TextureHandle, TextureLookup};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use trellis_core::{Clock, Duration, Instant, SystemClock};

/// Identity of a canvas for canvas-scoped cache entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanvasId(u64);

impl CanvasId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        CanvasId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Timing knobs for the cache sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entries untouched for longer than this are expired.
    pub cache_duration: Duration,
    /// Minimum spacing of sweeps not triggered by a canvas refresh.
    pub clean_task_interval: Duration,
    /// Hard floor between any two sweeps.
    pub min_clean_interval: Duration,
}

impl CacheConfig {
    /// Sets the entry lifetime and derives the clean task interval from it.
    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.cache_duration = duration;
        self.clean_task_interval = duration / 2;
        self
    }

    pub fn with_clean_task_interval(mut self, interval: Duration) -> Self {
        self.clean_task_interval = interval;
        self
    }

    pub fn with_min_clean_interval(mut self, interval: Duration) -> Self {
        self.min_clean_interval = interval;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let cache_duration = Duration::from_secs(60);
        Self {
            cache_duration,
            clean_task_interval: cache_duration / 2,
            min_clean_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Default)]
struct SweepState {
    last_clean: Option<Instant>,
    skipped_clean_with_canvas_refresh: bool,
}

/// The full set of cache stores.
pub struct Caches {
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    renderers: RendererCache,
    canvases: CanvasCache,
    textures: TextureCache,
    svgs: SvgCache,
    fonts: FontMetricCache,
    sweep: Mutex<SweepState>,
}

impl Caches {
    pub fn new(clock: Arc<dyn Clock>, config: CacheConfig) -> Self {
        let lifetime = config.cache_duration;
        Self {
            renderers: RendererCache::new(Arc::clone(&clock), lifetime),
            canvases: CanvasCache::new(Arc::clone(&clock), lifetime),
            textures: TextureCache::new(Arc::clone(&clock), lifetime),
            svgs: SvgCache::new(Arc::clone(&clock), lifetime),
            fonts: FontMetricCache::new(Arc::clone(&clock), lifetime),
            clock,
            config,
            sweep: Mutex::new(SweepState::default()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn renderers(&self) -> &RendererCache {
        &self.renderers
    }

    pub fn canvases(&self) -> &CanvasCache {
        &self.canvases
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    pub fn svgs(&self) -> &SvgCache {
        &self.svgs
    }

    pub fn fonts(&self) -> &FontMetricCache {
        &self.fonts
    }

    /// Instant of the last sweep that actually ran.
    pub fn last_clean(&self) -> Option<Instant> {
        self.sweep_state().last_clean
    }

    /// Overrides the last sweep instant, e.g. to resume a schedule.
    pub fn set_last_clean(&self, at: Option<Instant>) {
        self.sweep_state().last_clean = at;
    }

    /// True while a refresh-triggered sweep is owed to the next eligible clean.
    pub fn has_skipped_refresh_clean(&self) -> bool {
        self.sweep_state().skipped_clean_with_canvas_refresh
    }

    /// Sweeps expired entries, rate limited.
    ///
    /// SVG rasters and font metrics are swept on every run. Renderers and
    /// canvas associations are only touched while a canvas walks its trees, so
    /// they are swept only when `canvas_refreshed` is set (or a refresh clean
    /// was skipped earlier). Returns true when the sweep ran.
    pub fn clean(&self, canvas_refreshed: bool) -> bool {
        let now = self.clock.now();
        let Some(canvas_refreshed) = self.begin_clean(now, canvas_refreshed) else {
            return false;
        };

        let svgs = self.svgs.sweep_expired(now);
        let fonts = self.fonts.sweep_expired(now);
        let (renderers, canvases) = if canvas_refreshed {
            (
                self.renderers.sweep_expired(now),
                self.canvases.sweep_expired(now),
            )
        } else {
            (0, 0)
        };
        log::debug!(
            "cache clean (refresh: {canvas_refreshed}): {svgs} svgs, {fonts} font metrics, \
             {renderers} renderers, {canvases} canvas entries evicted"
        );
        true
    }

    /// Drops every entry tied to `canvas`, regardless of age.
    pub fn clean_canvas(&self, canvas: CanvasId) {
        let now = self.clock.now();
        let objects = self
            .canvases
            .remove_where(|owner, _| owner == canvas, now);
        self.renderers.destroy_all(&objects);
        let textures = self.textures.remove_for_canvas(canvas);
        log::debug!(
            "cleaned canvas {canvas:?}: {} objects, {textures} textures",
            objects.len()
        );
    }

    /// Applies the rate limit. Returns whether the sweep should include the
    /// refresh-only stores, or `None` when the sweep must not run.
    fn begin_clean(&self, now: Instant, canvas_refreshed: bool) -> Option<bool> {
        let mut state = self.sweep_state();
        let mut canvas_refreshed = canvas_refreshed;
        if let Some(last) = state.last_clean {
            let since = now.saturating_duration_since(last);
            if since < self.config.min_clean_interval {
                if canvas_refreshed {
                    state.skipped_clean_with_canvas_refresh = true;
                }
                return None;
            }
            if state.skipped_clean_with_canvas_refresh {
                state.skipped_clean_with_canvas_refresh = false;
                canvas_refreshed = true;
            }
            if !canvas_refreshed && since < self.config.clean_task_interval {
                return None;
            }
        } else if state.skipped_clean_with_canvas_refresh {
            state.skipped_clean_with_canvas_refresh = false;
            canvas_refreshed = true;
        }
        state.last_clean = Some(now);
        Some(canvas_refreshed)
    }

    fn sweep_state(&self) -> MutexGuard<'_, SweepState> {
        lock(&self.sweep)
    }
}

impl Default for Caches {
    fn default() -> Self {
        Caches::new(Arc::new(SystemClock), CacheConfig::default())
    }
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
