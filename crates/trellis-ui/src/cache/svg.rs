use super::{read, write};
use std::sync::{Arc, RwLock};
use trellis_core::collections::map::HashMap;
use trellis_core::{Clock, Duration, Instant, SharedExpiring};
use trellis_ui_graphics::RasterImage;

struct SvgEntry {
    image: Arc<RasterImage>,
    width: u32,
    height: u32,
    expiry: SharedExpiring,
}

/// Rasterized SVG images by resource name.
pub struct SvgCache {
    clock: Arc<dyn Clock>,
    lifetime: Duration,
    entries: RwLock<HashMap<String, SvgEntry>>,
}

impl SvgCache {
    pub(crate) fn new(clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self {
            clock,
            lifetime,
            entries: RwLock::new(HashMap::default()),
        }
    }

    /// The raster cached for `name`, only if it was rendered at these dimensions.
    pub fn get(&self, name: &str, width: u32, height: u32) -> Option<Arc<RasterImage>> {
        let entries = read(&self.entries);
        let entry = entries.get(name)?;
        if entry.width != width || entry.height != height {
            return None;
        }
        entry.expiry.touch(self.clock.now());
        Some(Arc::clone(&entry.image))
    }

    pub fn set(&self, name: impl Into<String>, image: Arc<RasterImage>, width: u32, height: u32) {
        write(&self.entries).insert(
            name.into(),
            SvgEntry {
                image,
                width,
                height,
                expiry: SharedExpiring::touched_at(self.clock.now()),
            },
        );
    }

    pub(crate) fn sweep_expired(&self, now: Instant) -> usize {
        let mut entries = write(&self.entries);
        let before = entries.len();
        entries.retain(|_, entry| !entry.expiry.is_expired(now, self.lifetime));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::ManualClock;

    #[test]
    fn lookup_requires_matching_dimensions() {
        let clock = Arc::new(ManualClock::new());
        let cache = SvgCache::new(clock, Duration::from_secs(60));
        let image = Arc::new(RasterImage::new(4, 5));
        cache.set("check", Arc::clone(&image), 4, 5);

        assert!(cache.get("check", 4, 5).is_some());
        assert!(cache.get("check", 5, 5).is_none());
        assert!(cache.get("cross", 4, 5).is_none());
    }

    #[test]
    fn sweep_drops_only_stale_rasters() {
        let clock = Arc::new(ManualClock::new());
        let cache = SvgCache::new(clock.clone(), Duration::from_secs(60));
        cache.set("old", Arc::new(RasterImage::new(1, 1)), 1, 1);
        clock.advance(Duration::from_secs(30));
        cache.set("new", Arc::new(RasterImage::new(1, 1)), 1, 1);

        clock.advance(Duration::from_secs(31));
        assert_eq!(cache.sweep_expired(clock.now()), 1);
        assert!(cache.get("new", 1, 1).is_some());
    }
}
