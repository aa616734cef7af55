//! Canvas objects and their optional capabilities.
//!
//! Every node of the scene graph is an [`ObjectRef`]. Objects advertise what
//! they can do through the `as_*` accessors on [`CanvasObject`]; the engine
//! never asks for a concrete type.

use crate::cache::Caches;
use smallvec::SmallVec;
use std::sync::{Arc, Weak};
use trellis_ui_graphics::{Point, Size};

pub type ObjectRef = Arc<dyn CanvasObject>;
pub type WeakObjectRef = Weak<dyn CanvasObject>;

/// Child list returned by containers and renderers.
pub type ObjectList = SmallVec<[ObjectRef; 4]>;

/// Identity of a canvas object: the address of its shared allocation.
///
/// Stores that key by `ObjectId` also keep a [`WeakObjectRef`] so the address
/// cannot be recycled while the entry exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    pub fn of(object: &ObjectRef) -> Self {
        ObjectId(Arc::as_ptr(object) as *const () as usize)
    }

    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// Returns true if both references point at the same object.
pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    ObjectId::of(a) == ObjectId::of(b)
}

/// Any drawable or interactive unit of the scene graph.
///
/// Objects are shared across threads (`refresh` may be requested from
/// anywhere), so state lives behind interior mutability.
pub trait CanvasObject: Send + Sync + 'static {
    /// Position relative to the parent.
    fn position(&self) -> Point;
    fn size(&self) -> Size;
    fn min_size(&self) -> Size;
    fn move_to(&self, position: Point);
    fn resize(&self, size: Size);

    fn visible(&self) -> bool;
    fn show(&self);
    fn hide(&self);

    fn refresh(&self) {}

    /// Overlays returning true are stretched over the canvas interactive area
    /// when pushed onto an overlay stack.
    fn wants_interactive_area(&self) -> bool {
        false
    }

    fn as_container(&self) -> Option<&dyn Container> {
        None
    }

    fn as_widget(&self) -> Option<&dyn Widget> {
        None
    }

    fn as_scrollable(&self) -> Option<&dyn Scrollable> {
        None
    }

    fn as_focusable(&self) -> Option<&dyn Focusable> {
        None
    }

    fn as_disableable(&self) -> Option<&dyn Disableable> {
        None
    }

    fn as_selectable_text(&self) -> Option<&dyn SelectableText> {
        None
    }

    fn as_activatable(&self) -> Option<&dyn Activatable> {
        None
    }
}

/// An object with an explicit, ordered child list. Order is paint order.
pub trait Container {
    fn objects(&self) -> ObjectList;
    fn layout(&self, size: Size);
}

/// An object whose children and layout come from a lazily created renderer.
pub trait Widget {
    /// Called at most once per widget until its renderer is destroyed.
    fn create_renderer(&self) -> Box<dyn WidgetRenderer>;
}

pub trait WidgetRenderer: Send + Sync {
    fn objects(&self) -> ObjectList;
    fn layout(&self, size: Size);
    fn min_size(&self) -> Size;
    fn refresh(&self);
    /// Releases everything the renderer holds. Called once, on eviction.
    fn destroy(&self);
}

/// Marks an object that clips its subtree to its own bounds.
pub trait Scrollable {}

pub trait Focusable {
    fn focus_gained(&self);
    fn focus_lost(&self);
}

pub trait Disableable {
    fn disabled(&self) -> bool;
}

/// Implemented by objects whose text can be selected and copied.
pub trait SelectableText {
    fn selected_text(&self) -> String;
}

/// Implemented by menu bars that can be toggled between active and idle.
pub trait Activatable {
    fn is_active(&self) -> bool;
}

pub(crate) fn is_disabled(object: &dyn CanvasObject) -> bool {
    object.as_disableable().is_some_and(|d| d.disabled())
}

/// Minimum size of `object`, asking a widget's renderer when it has one.
pub fn object_min_size(object: &ObjectRef, caches: &Caches) -> Size {
    match caches.renderers().renderer(object) {
        Some(renderer) => renderer.min_size(),
        None => object.min_size(),
    }
}

/// Lays out the children of `object` at its current size.
pub fn update_layout(object: &ObjectRef, caches: &Caches) {
    if let Some(container) = object.as_container() {
        container.layout(object.size());
    } else if let Some(renderer) = caches.renderers().renderer(object) {
        renderer.layout(object.size());
    }
}

/// Children of `object` in paint order.
pub fn children_of(object: &ObjectRef, caches: &Caches) -> ObjectList {
    if let Some(container) = object.as_container() {
        container.objects()
    } else if let Some(renderer) = caches.renderers().renderer(object) {
        renderer.objects()
    } else {
        ObjectList::new()
    }
}
