use super::{read, write};
use std::sync::{Arc, RwLock};
use trellis_core::collections::map::HashMap;
use trellis_core::{Clock, Duration, Instant, SharedExpiring};
use trellis_ui_graphics::{Size, TextStyle};

/// Measured extent of a run of text.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FontMetric {
    pub size: Size,
    pub baseline: f32,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct FontMetricKey {
    text: String,
    // f32 bits so the key can be hashed.
    font_size: u32,
    style: TextStyle,
}

impl FontMetricKey {
    fn new(text: &str, font_size: f32, style: TextStyle) -> Self {
        Self {
            text: text.to_owned(),
            font_size: font_size.to_bits(),
            style,
        }
    }
}

struct FontMetricEntry {
    metric: FontMetric,
    expiry: SharedExpiring,
}

/// Text measurements by (text, font size, style).
pub struct FontMetricCache {
    clock: Arc<dyn Clock>,
    lifetime: Duration,
    entries: RwLock<HashMap<FontMetricKey, FontMetricEntry>>,
}

impl FontMetricCache {
    pub(crate) fn new(clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self {
            clock,
            lifetime,
            entries: RwLock::new(HashMap::default()),
        }
    }

    pub fn get(&self, text: &str, font_size: f32, style: TextStyle) -> Option<FontMetric> {
        let key = FontMetricKey::new(text, font_size, style);
        let entries = read(&self.entries);
        let entry = entries.get(&key)?;
        entry.expiry.touch(self.clock.now());
        Some(entry.metric)
    }

    pub fn set(&self, text: &str, font_size: f32, style: TextStyle, metric: FontMetric) {
        write(&self.entries).insert(
            FontMetricKey::new(text, font_size, style),
            FontMetricEntry {
                metric,
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
    fn key_includes_size_and_style() {
        let cache = FontMetricCache::new(Arc::new(ManualClock::new()), Duration::from_secs(60));
        let metric = FontMetric {
            size: Size::new(42.0, 14.0),
            baseline: 11.0,
        };
        cache.set("Hello", 14.0, TextStyle::default(), metric);

        assert_eq!(cache.get("Hello", 14.0, TextStyle::default()), Some(metric));
        assert_eq!(cache.get("Hello", 15.0, TextStyle::default()), None);
        assert_eq!(cache.get("Hello", 14.0, TextStyle::bold()), None);
    }
}
