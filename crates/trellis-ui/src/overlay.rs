//! Stack of transient layers drawn above a canvas's content.
//!
//! Each overlay carries its own focus manager and render-cache tree. The three
//! live in one entry so they can never fall out of step.

use crate::cache::Caches;
use crate::focus::{DeviceKind, FocusManager};
use crate::object::{ObjectId, ObjectRef};
use crate::render_tree::RenderTree;
use std::sync::Arc;
use trellis_ui_graphics::Rect;

pub struct OverlayEntry {
    object: ObjectRef,
    focus_manager: FocusManager,
    render_tree: RenderTree,
}

impl OverlayEntry {
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    pub fn focus_manager(&self) -> &FocusManager {
        &self.focus_manager
    }

    pub fn focus_manager_mut(&mut self) -> &mut FocusManager {
        &mut self.focus_manager
    }

    pub fn render_tree(&self) -> &RenderTree {
        &self.render_tree
    }

    pub fn render_tree_mut(&mut self) -> &mut RenderTree {
        &mut self.render_tree
    }
}

type ChangeHook = Box<dyn Fn() + Send + Sync>;

/// Overlays ordered bottom to top.
pub struct OverlayStack {
    entries: Vec<OverlayEntry>,
    caches: Arc<Caches>,
    device: DeviceKind,
    on_change: Option<ChangeHook>,
}

impl OverlayStack {
    pub fn new(caches: Arc<Caches>, device: DeviceKind) -> Self {
        Self {
            entries: Vec::new(),
            caches,
            device,
            on_change: None,
        }
    }

    /// Installs a hook run after every add or remove.
    pub fn set_on_change(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.on_change = Some(Box::new(hook));
    }

    /// Pushes `overlay` with a fresh focus manager and render tree.
    ///
    /// Overlays that ask for it are placed over `interactive_area`.
    pub fn add(&mut self, overlay: ObjectRef, interactive_area: Rect) {
        if overlay.wants_interactive_area() {
            overlay.resize(interactive_area.size());
            overlay.move_to(interactive_area.origin());
        }
        let focus_manager = FocusManager::new(overlay.clone(), Arc::clone(&self.caches), self.device);
        let render_tree = RenderTree::new(overlay.clone());
        self.entries.push(OverlayEntry {
            object: overlay,
            focus_manager,
            render_tree,
        });
        self.changed();
    }

    /// Removes `overlay` and every overlay stacked above it.
    ///
    /// Returns false when `overlay` is not on the stack.
    pub fn remove(&mut self, overlay: &ObjectRef) -> bool {
        let id = ObjectId::of(overlay);
        let Some(index) = self
            .entries
            .iter()
            .position(|entry| ObjectId::of(&entry.object) == id)
        else {
            return false;
        };
        self.entries.truncate(index);
        self.changed();
        true
    }

    pub fn top(&self) -> Option<&ObjectRef> {
        self.entries.last().map(|entry| &entry.object)
    }

    pub fn top_focus_manager(&self) -> Option<&FocusManager> {
        self.entries.last().map(|entry| &entry.focus_manager)
    }

    /// Overlay objects, bottom first.
    pub fn list(&self) -> Vec<ObjectRef> {
        self.entries.iter().map(|entry| entry.object.clone()).collect()
    }

    pub fn list_focus_managers(&self) -> impl Iterator<Item = &FocusManager> {
        self.entries.iter().map(|entry| &entry.focus_manager)
    }

    pub fn entries(&self) -> &[OverlayEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [OverlayEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn changed(&self) {
        if let Some(hook) = &self.on_change {
            hook();
        }
    }
}
