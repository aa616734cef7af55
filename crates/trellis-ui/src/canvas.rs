//! Per-window scene state: regions, focus, overlays and the refresh pipeline.
//!
//! A [`Canvas`] is owned by the draw context. The only way other threads talk
//! to it is through a [`RefreshHandle`].

use crate::cache::{CanvasId, Caches};
use crate::focus::{DeviceKind, FocusManager, FocusOutcome};
use crate::object::{object_min_size, same_object, update_layout, ObjectId, ObjectRef};
use crate::overlay::OverlayStack;
use crate::painter::Painter;
use crate::render_tree::{NodeView, RenderTree, RenderVisitor};
use crate::walker::{visit_before, walk_complete_object_tree};
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use trellis_core::{DirtyFlag, RefreshQueue};
use trellis_ui_graphics::{EdgeInsets, Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasError {
    /// The object is not in the content, menu or any overlay of the canvas.
    NotInCanvas,
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanvasError::NotInCanvas => write!(
                f,
                "object is not part of the canvas content, menu or overlays"
            ),
        }
    }
}

impl std::error::Error for CanvasError {}

/// Construction options for a [`Canvas`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CanvasOptions {
    pub device: DeviceKind,
    /// Insets of the interactive area (e.g. notches or system bars).
    pub interactive_insets: EdgeInsets,
}

impl CanvasOptions {
    pub fn with_device(mut self, device: DeviceKind) -> Self {
        self.device = device;
        self
    }

    pub fn with_interactive_insets(mut self, insets: EdgeInsets) -> Self {
        self.interactive_insets = insets;
        self
    }
}

struct RefreshShared {
    queue: RefreshQueue<ObjectRef>,
    dirty: DirtyFlag,
}

/// Thread-safe entry point for requesting redraws of a canvas.
#[derive(Clone)]
pub struct RefreshHandle {
    shared: Arc<RefreshShared>,
}

impl RefreshHandle {
    /// Queues `object` for resource release and marks the canvas dirty.
    /// Never blocks.
    pub fn refresh(&self, object: &ObjectRef) {
        self.shared.queue.push(object.clone());
        self.shared.dirty.set();
    }

    pub fn set_dirty(&self) {
        self.shared.dirty.set();
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.dirty.is_dirty()
    }

    /// Refresh requests not yet drained by the draw context.
    pub fn pending(&self) -> usize {
        self.shared.queue.pending()
    }
}

struct Region {
    tree: RenderTree,
    focus: FocusManager,
}

impl Region {
    fn new(root: ObjectRef, caches: &Arc<Caches>, device: DeviceKind) -> Self {
        Self {
            tree: RenderTree::new(root.clone()),
            focus: FocusManager::new(root, Arc::clone(caches), device),
        }
    }

    fn root(&self) -> &ObjectRef {
        self.tree.root_object()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FocusRegion {
    Content,
    Menu,
    Overlay(usize),
}

type FocusHook = Box<dyn Fn(&ObjectRef) + Send>;
type UnfocusHook = Box<dyn Fn() + Send>;

pub struct Canvas {
    id: CanvasId,
    caches: Arc<Caches>,
    options: CanvasOptions,
    size: Size,
    content: Option<Region>,
    menu: Option<Region>,
    window_head: Option<RenderTree>,
    overlays: OverlayStack,
    refresh: Arc<RefreshShared>,
    painter: Option<Box<dyn Painter>>,
    on_focus: Option<FocusHook>,
    on_unfocus: Option<UnfocusHook>,
}

impl Canvas {
    pub fn new(caches: Arc<Caches>, options: CanvasOptions) -> Self {
        let refresh = Arc::new(RefreshShared {
            queue: RefreshQueue::new(),
            dirty: DirtyFlag::new(),
        });
        let mut overlays = OverlayStack::new(Arc::clone(&caches), options.device);
        let hook = Arc::clone(&refresh);
        overlays.set_on_change(move || hook.dirty.set());
        Self {
            id: CanvasId::next(),
            caches,
            options,
            size: Size::ZERO,
            content: None,
            menu: None,
            window_head: None,
            overlays,
            refresh,
            painter: None,
            on_focus: None,
            on_unfocus: None,
        }
    }

    pub fn id(&self) -> CanvasId {
        self.id
    }

    pub fn caches(&self) -> &Arc<Caches> {
        &self.caches
    }

    pub fn options(&self) -> &CanvasOptions {
        &self.options
    }

    // --- refresh pipeline -------------------------------------------------

    pub fn refresh_handle(&self) -> RefreshHandle {
        RefreshHandle {
            shared: Arc::clone(&self.refresh),
        }
    }

    /// Queues `object` for a redraw. Safe to call from any thread through a
    /// [`RefreshHandle`]; this is a shortcut for the owning thread.
    pub fn refresh(&self, object: &ObjectRef) {
        self.refresh.queue.push(object.clone());
        self.refresh.dirty.set();
    }

    pub fn is_dirty(&self) -> bool {
        self.refresh.dirty.is_dirty()
    }

    pub fn set_dirty(&self) {
        self.refresh.dirty.set();
    }

    pub fn check_dirty_and_clear(&self) -> bool {
        self.refresh.dirty.check_and_clear()
    }

    /// Releases painter resources of every refreshed object subtree, then of
    /// every expired texture owned by this canvas. Returns the number of
    /// refresh requests drained.
    pub fn free_dirty_textures(&mut self) -> usize {
        let caches = Arc::clone(&self.caches);
        let painter = &mut self.painter;
        let drained = self.refresh.queue.drain(|object| {
            let mut free_walked = visit_before(|walked: &ObjectRef, _: Point, _: Point, _: Size| {
                if let Some(painter) = painter.as_mut() {
                    let id = ObjectId::of(walked);
                    let texture = caches.textures().delete(id);
                    painter.free(id, texture);
                }
                ControlFlow::Continue(())
            });
            walk_complete_object_tree(&object, &caches, &mut free_walked);
        });

        if let Some(painter) = painter.as_mut() {
            caches
                .textures()
                .range_expired_textures_for(self.id, |id, texture| {
                    caches.textures().delete(id);
                    log::trace!("freeing expired texture {texture:?}");
                    painter.free(id, Some(texture));
                });
        }
        drained
    }

    // --- painter ----------------------------------------------------------

    pub fn set_painter(&mut self, painter: Box<dyn Painter>) {
        self.painter = Some(painter);
    }

    pub fn painter(&self) -> Option<&dyn Painter> {
        self.painter.as_deref()
    }

    pub fn painter_mut(&mut self) -> Option<&mut (dyn Painter + 'static)> {
        self.painter.as_deref_mut()
    }

    pub fn take_painter(&mut self) -> Option<Box<dyn Painter>> {
        self.painter.take()
    }

    // --- regions ----------------------------------------------------------

    /// Replaces the content, keeping the focused object when the new content
    /// still contains it.
    pub fn set_content(&mut self, content: ObjectRef) {
        let previous = self.content.as_ref().and_then(|c| c.focus.focused());
        let mut region = Region::new(content, &self.caches, self.options.device);
        if let Some(focused) = previous {
            region.focus.focus(Some(&focused));
        }
        self.content = Some(region);
        self.layout_regions();
        self.set_dirty();
    }

    pub fn content(&self) -> Option<&ObjectRef> {
        self.content.as_ref().map(Region::root)
    }

    pub fn set_menu(&mut self, menu: Option<ObjectRef>) {
        self.menu = menu.map(|menu| Region::new(menu, &self.caches, self.options.device));
        self.layout_regions();
        self.set_dirty();
    }

    pub fn menu(&self) -> Option<&ObjectRef> {
        self.menu.as_ref().map(Region::root)
    }

    /// Sets the window decoration drawn by the canvas on mobile platforms.
    pub fn set_mobile_window_head(&mut self, head: Option<ObjectRef>) {
        self.window_head = head.map(RenderTree::new);
        self.set_dirty();
    }

    pub fn overlays(&self) -> &OverlayStack {
        &self.overlays
    }

    pub fn add_overlay(&mut self, overlay: ObjectRef) {
        let area = self.interactive_area();
        self.overlays.add(overlay, area);
    }

    pub fn remove_overlay(&mut self, overlay: &ObjectRef) -> bool {
        self.overlays.remove(overlay)
    }

    /// Roots that can be hit-tested: content, then menu, then overlays.
    pub fn object_trees(&self) -> Vec<ObjectRef> {
        let mut trees = Vec::with_capacity(self.overlays.len() + 2);
        trees.extend(self.content().cloned());
        trees.extend(self.menu().cloned());
        trees.extend(self.overlays.list());
        trees
    }

    // --- geometry ---------------------------------------------------------

    pub fn size(&self) -> Size {
        self.size
    }

    /// Smallest size that fits the content below the menu.
    pub fn min_size(&self) -> Size {
        let content = self
            .content()
            .map(|c| object_min_size(c, &self.caches))
            .unwrap_or_default();
        match self.menu() {
            Some(menu) => {
                let menu = object_min_size(menu, &self.caches);
                Size::new(content.width.max(menu.width), content.height + menu.height)
            }
            None => content,
        }
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
        self.layout_regions();
        let area = self.interactive_area();
        for overlay in self.overlays.list() {
            if overlay.wants_interactive_area() {
                overlay.resize(area.size());
                overlay.move_to(area.origin());
            }
        }
    }

    /// Part of the canvas not covered by system decorations.
    pub fn interactive_area(&self) -> Rect {
        let insets = self.options.interactive_insets;
        Rect::from_origin_size(insets.origin(), self.size.subtract_insets(insets))
    }

    fn layout_regions(&mut self) {
        let size = self.size;
        let mut top = 0.0;
        if let Some(menu) = self.menu() {
            let height = object_min_size(menu, &self.caches).height;
            menu.move_to(Point::ZERO);
            menu.resize(Size::new(size.width, height));
            top = height;
        }
        if let Some(content) = self.content() {
            content.move_to(Point::new(0.0, top));
            content.resize(Size::new(size.width, (size.height - top).max(0.0)));
        }
    }

    // --- tree walks -------------------------------------------------------

    /// Walks every region's render tree: content, window head, menu, then
    /// each overlay bottom to top.
    pub fn walk_trees<V>(&mut self, visitor: &mut V)
    where
        V: RenderVisitor + ?Sized,
    {
        let caches = &self.caches;
        if let Some(content) = self.content.as_mut() {
            content.tree.walk(caches, visitor);
        }
        if let Some(head) = self.window_head.as_mut() {
            head.walk(caches, visitor);
        }
        if let Some(menu) = self.menu.as_mut() {
            menu.tree.walk(caches, visitor);
        }
        for entry in self.overlays.entries_mut() {
            entry.render_tree_mut().walk(caches, visitor);
        }
    }

    /// Re-evaluates minimum sizes and lays out the parents of objects whose
    /// minimum changed. Returns true when a region root changed minimum size,
    /// meaning the window minimum must be re-evaluated.
    pub fn ensure_min_size(&mut self) -> bool {
        if self.content.is_none() {
            return false;
        }
        let caches = Arc::clone(&self.caches);
        let canvas_size = self.size;

        let mut pass = MinSizePass {
            caches: &caches,
            canvas: self.id,
            canvas_size,
            last_parent: None,
            window_needs_update: false,
        };
        self.walk_trees(&mut pass);
        let MinSizePass {
            last_parent,
            window_needs_update,
            ..
        } = pass;

        let min = self.min_size();
        if window_needs_update
            && (canvas_size.width < min.width || canvas_size.height < min.height)
        {
            self.resize(canvas_size.max(min));
        }
        if let Some(parent) = last_parent {
            update_layout(&parent, &caches);
        }
        window_needs_update
    }

    // --- focus ------------------------------------------------------------

    /// Called whenever a region accepts a focus request, including requests
    /// that were deferred or ignored.
    pub fn set_on_focus(&mut self, hook: impl Fn(&ObjectRef) + Send + 'static) {
        self.on_focus = Some(Box::new(hook));
    }

    pub fn set_on_unfocus(&mut self, hook: impl Fn() + Send + 'static) {
        self.on_unfocus = Some(Box::new(hook));
    }

    /// Focuses `object` in whichever region owns it, trying the active region
    /// first.
    pub fn focus(&mut self, object: &ObjectRef) -> Result<FocusOutcome, CanvasError> {
        let active = self.active_region();
        let mut order: Vec<FocusRegion> = active.into_iter().collect();
        order.push(FocusRegion::Content);
        order.push(FocusRegion::Menu);
        order.extend((0..self.overlays.len()).map(FocusRegion::Overlay));

        for (i, region) in order.into_iter().enumerate() {
            if i > 0 && Some(region) == active {
                continue;
            }
            let Some(manager) = self.focus_manager_mut(region) else {
                continue;
            };
            let outcome = manager.focus(Some(object));
            if outcome.is_accepted() {
                if let Some(hook) = &self.on_focus {
                    hook(object);
                }
                return Ok(outcome);
            }
        }

        log::error!("failed to focus object which is not part of the canvas content, menu or overlays");
        Err(CanvasError::NotInCanvas)
    }

    pub fn unfocus(&mut self) {
        let Some(manager) = self.active_focus_manager_mut() else {
            return;
        };
        if manager.focus(None).is_accepted() {
            if let Some(hook) = &self.on_unfocus {
                hook();
            }
        }
    }

    pub fn focused(&self) -> Option<ObjectRef> {
        let region = self.active_region()?;
        self.focus_manager(region)?.focused()
    }

    pub fn focus_next(&mut self) -> Option<ObjectRef> {
        self.active_focus_manager_mut()?.focus_next()
    }

    pub fn focus_previous(&mut self) -> Option<ObjectRef> {
        self.active_focus_manager_mut()?.focus_previous()
    }

    pub fn focus_gained(&self) {
        if let Some(manager) = self.active_region().and_then(|r| self.focus_manager(r)) {
            manager.focus_gained();
        }
    }

    pub fn focus_lost(&self) {
        if let Some(manager) = self.active_region().and_then(|r| self.focus_manager(r)) {
            manager.focus_lost();
        }
    }

    /// Top overlay, else the menu while active, else the content.
    fn active_region(&self) -> Option<FocusRegion> {
        if !self.overlays.is_empty() {
            return Some(FocusRegion::Overlay(self.overlays.len() - 1));
        }
        if self.is_menu_active() {
            return Some(FocusRegion::Menu);
        }
        self.content.as_ref().map(|_| FocusRegion::Content)
    }

    fn is_menu_active(&self) -> bool {
        match self.menu() {
            Some(menu) => menu.as_activatable().map_or(true, |m| m.is_active()),
            None => false,
        }
    }

    fn focus_manager(&self, region: FocusRegion) -> Option<&FocusManager> {
        match region {
            FocusRegion::Content => self.content.as_ref().map(|r| &r.focus),
            FocusRegion::Menu => self.menu.as_ref().map(|r| &r.focus),
            FocusRegion::Overlay(index) => self
                .overlays
                .entries()
                .get(index)
                .map(|entry| entry.focus_manager()),
        }
    }

    fn focus_manager_mut(&mut self, region: FocusRegion) -> Option<&mut FocusManager> {
        match region {
            FocusRegion::Content => self.content.as_mut().map(|r| &mut r.focus),
            FocusRegion::Menu => self.menu.as_mut().map(|r| &mut r.focus),
            FocusRegion::Overlay(index) => self
                .overlays
                .entries_mut()
                .get_mut(index)
                .map(|entry| entry.focus_manager_mut()),
        }
    }

    fn active_focus_manager_mut(&mut self) -> Option<&mut FocusManager> {
        let region = self.active_region()?;
        self.focus_manager_mut(region)
    }
}

impl Drop for Canvas {
    fn drop(&mut self) {
        if let Some(painter) = self.painter.as_mut() {
            let textures = self.caches.textures();
            textures.range_textures_for(self.id, |id, texture| {
                textures.delete(id);
                painter.free(id, Some(texture));
            });
        }
        self.caches.clean_canvas(self.id);
    }
}

/// Post-order pass behind [`Canvas::ensure_min_size`].
struct MinSizePass<'a> {
    caches: &'a Caches,
    canvas: CanvasId,
    canvas_size: Size,
    last_parent: Option<ObjectRef>,
    window_needs_update: bool,
}

impl RenderVisitor for MinSizePass<'_> {
    fn after_children(&mut self, node: &mut NodeView<'_>) {
        let object = node.object().clone();
        self.caches.canvases().set_canvas_for_object(&object, self.canvas);
        if !object.visible() {
            return;
        }

        let min = object_min_size(&object, self.caches);
        if node.min_size() == min {
            return;
        }
        node.set_min_size(min);

        let to_layout = match node.parent_object() {
            Some(parent) => Some(parent.clone()),
            None => {
                self.window_needs_update = true;
                let size = object.size();
                let expected = min.max(size);
                if expected != size && size != self.canvas_size {
                    object.resize(expected);
                    None
                } else {
                    Some(object.clone())
                }
            }
        };

        let unchanged = match (&to_layout, &self.last_parent) {
            (Some(a), Some(b)) => same_object(a, b),
            (None, None) => true,
            _ => false,
        };
        if !unchanged {
            if let Some(previous) = self.last_parent.take() {
                update_layout(&previous, self.caches);
            }
            self.last_parent = to_layout;
        }
    }
}
