use super::{lock, CanvasId};
use crate::object::{ObjectId, ObjectRef, WeakObjectRef};
use std::sync::{Arc, Mutex};
use trellis_core::collections::map::HashMap;
use trellis_core::{Clock, Duration, Expiring};

/// Backend texture name. Zero is the backend's "no texture" value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    pub const NONE: TextureHandle = TextureHandle(0);

    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }
}

/// Result of a texture lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureLookup {
    /// Nothing cached for the object yet.
    Miss,
    /// Cached, but the backend could not provide a texture. Skip drawing.
    Invalid,
    Hit(TextureHandle),
}

struct TextureEntry {
    _object: WeakObjectRef,
    texture: TextureHandle,
    canvas: CanvasId,
    expiry: Expiring,
}

/// Texture-by-object store, scoped to the canvas whose painter owns it.
pub struct TextureCache {
    clock: Arc<dyn Clock>,
    lifetime: Duration,
    entries: Mutex<HashMap<ObjectId, TextureEntry>>,
}

impl TextureCache {
    pub(crate) fn new(clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self {
            clock,
            lifetime,
            entries: Mutex::new(HashMap::default()),
        }
    }

    pub fn get(&self, object: &ObjectRef) -> TextureLookup {
        let mut entries = lock(&self.entries);
        let Some(entry) = entries.get_mut(&ObjectId::of(object)) else {
            return TextureLookup::Miss;
        };
        entry.expiry.touch(self.clock.now());
        if entry.texture.is_valid() {
            TextureLookup::Hit(entry.texture)
        } else {
            TextureLookup::Invalid
        }
    }

    pub fn set(&self, object: &ObjectRef, texture: TextureHandle, canvas: CanvasId) {
        lock(&self.entries).insert(
            ObjectId::of(object),
            TextureEntry {
                _object: Arc::downgrade(object),
                texture,
                canvas,
                expiry: Expiring::touched_at(self.clock.now()),
            },
        );
    }

    pub fn delete(&self, id: ObjectId) -> Option<TextureHandle> {
        lock(&self.entries).remove(&id).map(|entry| entry.texture)
    }

    /// Calls `f` for every expired texture owned by `canvas`.
    ///
    /// The store is not locked while `f` runs, so `f` may delete entries.
    pub fn range_expired_textures_for(
        &self,
        canvas: CanvasId,
        f: impl FnMut(ObjectId, TextureHandle),
    ) {
        let now = self.clock.now();
        let lifetime = self.lifetime;
        self.range_matching(canvas, |entry| entry.expiry.is_expired(now, lifetime), f);
    }

    /// Calls `f` for every texture owned by `canvas`.
    pub fn range_textures_for(&self, canvas: CanvasId, f: impl FnMut(ObjectId, TextureHandle)) {
        self.range_matching(canvas, |_| true, f);
    }

    pub(crate) fn remove_for_canvas(&self, canvas: CanvasId) -> usize {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|_, entry| entry.canvas != canvas);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn range_matching(
        &self,
        canvas: CanvasId,
        mut matches: impl FnMut(&TextureEntry) -> bool,
        mut f: impl FnMut(ObjectId, TextureHandle),
    ) {
        let selected: Vec<(ObjectId, TextureHandle)> = lock(&self.entries)
            .iter()
            .filter(|(_, entry)| entry.canvas == canvas && matches(entry))
            .map(|(id, entry)| (*id, entry.texture))
            .collect();
        for (id, texture) in selected {
            f(id, texture);
        }
    }
}
