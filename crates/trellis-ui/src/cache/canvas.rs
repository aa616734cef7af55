use super::{read, write, CanvasId};
use crate::object::{ObjectId, ObjectRef, WeakObjectRef};
use std::sync::{Arc, RwLock};
use trellis_core::collections::map::HashMap;
use trellis_core::{Clock, Duration, Instant, SharedExpiring};

struct CanvasEntry {
    _object: WeakObjectRef,
    canvas: CanvasId,
    expiry: SharedExpiring,
}

/// Records which canvas last drew each object.
pub struct CanvasCache {
    clock: Arc<dyn Clock>,
    lifetime: Duration,
    entries: RwLock<HashMap<ObjectId, CanvasEntry>>,
}

impl CanvasCache {
    pub(crate) fn new(clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self {
            clock,
            lifetime,
            entries: RwLock::new(HashMap::default()),
        }
    }

    /// Associates `object` with `canvas` and touches the entry.
    pub fn set_canvas_for_object(&self, object: &ObjectRef, canvas: CanvasId) {
        let id = ObjectId::of(object);
        let now = self.clock.now();
        if let Some(entry) = read(&self.entries).get(&id) {
            if entry.canvas == canvas {
                entry.expiry.touch(now);
                return;
            }
        }
        write(&self.entries).insert(
            id,
            CanvasEntry {
                _object: Arc::downgrade(object),
                canvas,
                expiry: SharedExpiring::touched_at(now),
            },
        );
    }

    /// The canvas `object` was last drawn on.
    pub fn canvas_for_object(&self, object: &ObjectRef) -> Option<CanvasId> {
        let entries = read(&self.entries);
        let entry = entries.get(&ObjectId::of(object))?;
        entry.expiry.touch(self.clock.now());
        Some(entry.canvas)
    }

    /// Removes entries for which `remove(canvas, expired)` holds and returns
    /// their object ids.
    pub(crate) fn remove_where(
        &self,
        mut remove: impl FnMut(CanvasId, bool) -> bool,
        now: Instant,
    ) -> Vec<ObjectId> {
        let mut entries = write(&self.entries);
        let ids: Vec<ObjectId> = entries
            .iter()
            .filter(|(_, entry)| remove(entry.canvas, entry.expiry.is_expired(now, self.lifetime)))
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            entries.remove(id);
        }
        ids
    }

    pub(crate) fn sweep_expired(&self, now: Instant) -> usize {
        self.remove_where(|_, expired| expired, now).len()
    }

    /// Number of objects associated with `canvas`.
    pub fn count_for(&self, canvas: CanvasId) -> usize {
        read(&self.entries)
            .values()
            .filter(|entry| entry.canvas == canvas)
            .count()
    }

    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
