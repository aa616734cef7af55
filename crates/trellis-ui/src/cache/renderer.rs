use super::{read, write};
use crate::object::{ObjectId, ObjectRef, WeakObjectRef, WidgetRenderer};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use trellis_core::collections::map::HashMap;
use trellis_core::{Clock, Duration, Instant, SharedExpiring};

struct RendererEntry {
    // Pins the widget allocation so its id cannot be reused while cached.
    _widget: WeakObjectRef,
    renderer: Arc<dyn WidgetRenderer>,
    expiry: SharedExpiring,
}

/// Renderer-by-widget store. Renderers are created on first lookup.
pub struct RendererCache {
    clock: Arc<dyn Clock>,
    lifetime: Duration,
    entries: RwLock<HashMap<ObjectId, RendererEntry>>,
}

impl RendererCache {
    pub(crate) fn new(clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self {
            clock,
            lifetime,
            entries: RwLock::new(HashMap::default()),
        }
    }

    /// Returns the renderer of `object`, creating it on first use.
    ///
    /// Returns `None` for objects that are not widgets.
    pub fn renderer(&self, object: &ObjectRef) -> Option<Arc<dyn WidgetRenderer>> {
        let widget = object.as_widget()?;
        let id = ObjectId::of(object);
        let now = self.clock.now();
        if let Some(entry) = read(&self.entries).get(&id) {
            entry.expiry.touch(now);
            return Some(Arc::clone(&entry.renderer));
        }

        // Created outside the lock: renderers may look up other renderers.
        let created: Arc<dyn WidgetRenderer> = Arc::from(widget.create_renderer());
        let mut entries = write(&self.entries);
        if let Some(existing) = entries.get(&id) {
            existing.expiry.touch(now);
            let existing = Arc::clone(&existing.renderer);
            drop(entries);
            destroy_contained(id, &created);
            return Some(existing);
        }
        entries.insert(
            id,
            RendererEntry {
                _widget: Arc::downgrade(object),
                renderer: Arc::clone(&created),
                expiry: SharedExpiring::touched_at(now),
            },
        );
        Some(created)
    }

    /// Returns the cached renderer without creating one or touching it.
    pub fn peek(&self, object: &ObjectRef) -> Option<Arc<dyn WidgetRenderer>> {
        read(&self.entries)
            .get(&ObjectId::of(object))
            .map(|entry| Arc::clone(&entry.renderer))
    }

    /// True if the widget currently has a renderer.
    pub fn is_rendered(&self, object: &ObjectRef) -> bool {
        read(&self.entries).contains_key(&ObjectId::of(object))
    }

    /// Destroys and forgets the renderer of `object`, if any.
    pub fn destroy_renderer(&self, object: &ObjectRef) {
        self.destroy_all(&[ObjectId::of(object)]);
    }

    /// Destroys the renderers of every listed object. Returns how many existed.
    pub fn destroy_all(&self, ids: &[ObjectId]) -> usize {
        let removed: Vec<_> = {
            let mut entries = write(&self.entries);
            ids.iter()
                .filter_map(|id| entries.remove(id).map(|entry| (*id, entry)))
                .collect()
        };
        for (id, entry) in &removed {
            destroy_contained(*id, &entry.renderer);
        }
        removed.len()
    }

    pub(crate) fn sweep_expired(&self, now: Instant) -> usize {
        let expired: Vec<ObjectId> = read(&self.entries)
            .iter()
            .filter(|(_, entry)| entry.expiry.is_expired(now, self.lifetime))
            .map(|(id, _)| *id)
            .collect();
        self.destroy_all(&expired)
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs a renderer's teardown, containing a panic to this one entry.
fn destroy_contained(id: ObjectId, renderer: &Arc<dyn WidgetRenderer>) {
    if panic::catch_unwind(AssertUnwindSafe(|| renderer.destroy())).is_err() {
        log::warn!(
            "renderer of object {:#x} panicked while being destroyed",
            id.as_usize()
        );
    }
}
