//! Retained-mode scene graph for Trellis
//!
//! Objects form a tree of [`CanvasObject`]s. A [`Canvas`] owns the render
//! cache trees, focus managers and overlays for one window, while [`Caches`]
//! holds the time-expiring stores shared by every canvas.

pub mod cache;
pub mod canvas;
pub mod clip;
pub mod focus;
pub mod object;
pub mod overlay;
pub mod painter;
pub mod render_tree;
pub mod walker;

pub use cache::{
    CacheConfig, Caches, CanvasId, FontMetric, TextureHandle, TextureLookup,
};
pub use canvas::{Canvas, CanvasError, CanvasOptions, RefreshHandle};
pub use clip::{ClipItem, ClipStack};
pub use focus::{DeviceKind, FocusManager, FocusOutcome};
pub use object::{
    object_min_size, same_object, update_layout, Activatable, CanvasObject, Container,
    Disableable, Focusable, ObjectId, ObjectList, ObjectRef, Scrollable, SelectableText,
    WeakObjectRef, Widget, WidgetRenderer,
};
pub use overlay::{OverlayEntry, OverlayStack};
pub use painter::Painter;
pub use render_tree::{NodeId, NodeView, PaintData, RenderTree, RenderVisitor};
pub use walker::{
    absolute_position_for_object, find_object_at_position_matching,
    reverse_walk_visible_object_tree, visit_before, walk_complete_object_tree,
    walk_visible_object_tree, FnVisitor, Hit, ObjectVisitor,
};

pub use trellis_ui_graphics::{EdgeInsets, Point, RasterImage, Rect, Size};

pub mod prelude {
    pub use crate::cache::{CacheConfig, Caches};
    pub use crate::canvas::{Canvas, CanvasOptions};
    pub use crate::object::{CanvasObject, Container, ObjectRef, Widget, WidgetRenderer};
    pub use crate::walker::ObjectVisitor;
    pub use trellis_ui_graphics::prelude::*;
}
