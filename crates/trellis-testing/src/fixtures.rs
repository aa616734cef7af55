//! Scriptable canvas objects.
//!
//! [`TestObject`] covers leaves, containers, scroll views, focusable entries
//! and overlays through builder flags. [`TestWidget`] adds a renderer so the
//! renderer cache has something to create and destroy.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use trellis_ui::{
    Activatable, CanvasObject, Container, Disableable, Focusable, ObjectList, ObjectRef,
    Scrollable, SelectableText, Widget, WidgetRenderer,
};
use trellis_ui_graphics::{Point, Size};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone, Copy)]
struct Geometry {
    position: Point,
    size: Size,
    min_size: Size,
}

/// A canvas object whose behaviour is chosen at construction.
pub struct TestObject {
    name: String,
    geometry: Mutex<Geometry>,
    visible: AtomicBool,
    children: Mutex<Option<Vec<ObjectRef>>>,
    scrollable: bool,
    focusable: bool,
    selectable: bool,
    disabled: Option<AtomicBool>,
    active: Option<AtomicBool>,
    interactive_area: bool,
    layouts: AtomicUsize,
    focus_gained: AtomicUsize,
    focus_lost: AtomicUsize,
}

impl TestObject {
    pub fn builder(name: impl Into<String>) -> TestObjectBuilder {
        TestObjectBuilder::new(name)
    }

    /// A visible leaf at the origin with the given size and minimum size.
    pub fn leaf(name: impl Into<String>, width: f32, height: f32) -> Arc<Self> {
        Self::builder(name).size(width, height).min_size(width, height).build()
    }

    /// A container holding `children`.
    pub fn container(name: impl Into<String>, children: Vec<ObjectRef>) -> Arc<Self> {
        Self::builder(name).children(children).build()
    }

    pub fn object(self: &Arc<Self>) -> ObjectRef {
        Arc::clone(self) as ObjectRef
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_children(&self, children: Vec<ObjectRef>) {
        *lock(&self.children) = Some(children);
    }

    pub fn set_min_size(&self, size: Size) {
        lock(&self.geometry).min_size = size;
    }

    pub fn set_disabled(&self, disabled: bool) {
        if let Some(flag) = &self.disabled {
            flag.store(disabled, Ordering::SeqCst);
        }
    }

    pub fn set_active(&self, active: bool) {
        if let Some(flag) = &self.active {
            flag.store(active, Ordering::SeqCst);
        }
    }

    /// Number of times this container laid out its children.
    pub fn layout_count(&self) -> usize {
        self.layouts.load(Ordering::SeqCst)
    }

    pub fn focus_gained_count(&self) -> usize {
        self.focus_gained.load(Ordering::SeqCst)
    }

    pub fn focus_lost_count(&self) -> usize {
        self.focus_lost.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for TestObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestObject").field("name", &self.name).finish()
    }
}

impl CanvasObject for TestObject {
    fn position(&self) -> Point {
        lock(&self.geometry).position
    }

    fn size(&self) -> Size {
        lock(&self.geometry).size
    }

    fn min_size(&self) -> Size {
        lock(&self.geometry).min_size
    }

    fn move_to(&self, position: Point) {
        lock(&self.geometry).position = position;
    }

    fn resize(&self, size: Size) {
        lock(&self.geometry).size = size;
    }

    fn visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    fn wants_interactive_area(&self) -> bool {
        self.interactive_area
    }

    fn as_container(&self) -> Option<&dyn Container> {
        lock(&self.children).is_some().then_some(self as &dyn Container)
    }

    fn as_scrollable(&self) -> Option<&dyn Scrollable> {
        self.scrollable.then_some(self as &dyn Scrollable)
    }

    fn as_focusable(&self) -> Option<&dyn Focusable> {
        self.focusable.then_some(self as &dyn Focusable)
    }

    fn as_disableable(&self) -> Option<&dyn Disableable> {
        self.disabled.as_ref().map(|_| self as &dyn Disableable)
    }

    fn as_selectable_text(&self) -> Option<&dyn SelectableText> {
        self.selectable.then_some(self as &dyn SelectableText)
    }

    fn as_activatable(&self) -> Option<&dyn Activatable> {
        self.active.as_ref().map(|_| self as &dyn Activatable)
    }
}

impl Container for TestObject {
    fn objects(&self) -> ObjectList {
        lock(&self.children)
            .as_ref()
            .map(|children| children.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn layout(&self, _size: Size) {
        self.layouts.fetch_add(1, Ordering::SeqCst);
    }
}

impl Scrollable for TestObject {}

impl Focusable for TestObject {
    fn focus_gained(&self) {
        self.focus_gained.fetch_add(1, Ordering::SeqCst);
    }

    fn focus_lost(&self) {
        self.focus_lost.fetch_add(1, Ordering::SeqCst);
    }
}

impl Disableable for TestObject {
    fn disabled(&self) -> bool {
        self.disabled
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

impl SelectableText for TestObject {
    fn selected_text(&self) -> String {
        self.name.clone()
    }
}

impl Activatable for TestObject {
    fn is_active(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

pub struct TestObjectBuilder {
    name: String,
    geometry: Geometry,
    visible: bool,
    children: Option<Vec<ObjectRef>>,
    scrollable: bool,
    focusable: bool,
    selectable: bool,
    disabled: Option<bool>,
    active: Option<bool>,
    interactive_area: bool,
}

impl TestObjectBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            geometry: Geometry {
                position: Point::ZERO,
                size: Size::ZERO,
                min_size: Size::ZERO,
            },
            visible: true,
            children: None,
            scrollable: false,
            focusable: false,
            selectable: false,
            disabled: None,
            active: None,
            interactive_area: false,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.geometry.position = Point::new(x, y);
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.geometry.size = Size::new(width, height);
        self
    }

    pub fn min_size(mut self, width: f32, height: f32) -> Self {
        self.geometry.min_size = Size::new(width, height);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn children(mut self, children: Vec<ObjectRef>) -> Self {
        self.children = Some(children);
        self
    }

    /// Makes the object a scroll view: its children are clipped to its bounds.
    pub fn scroll(mut self) -> Self {
        self.scrollable = true;
        self.children.get_or_insert_with(Vec::new);
        self
    }

    pub fn focusable(mut self) -> Self {
        self.focusable = true;
        self
    }

    /// Makes the object disableable, starting in the given state.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    pub fn selectable_text(mut self) -> Self {
        self.selectable = true;
        self
    }

    /// Makes the object activatable, starting in the given state.
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn fills_interactive_area(mut self) -> Self {
        self.interactive_area = true;
        self
    }

    pub fn build(self) -> Arc<TestObject> {
        Arc::new(TestObject {
            name: self.name,
            geometry: Mutex::new(self.geometry),
            visible: AtomicBool::new(self.visible),
            children: Mutex::new(self.children),
            scrollable: self.scrollable,
            focusable: self.focusable,
            selectable: self.selectable,
            disabled: self.disabled.map(AtomicBool::new),
            active: self.active.map(AtomicBool::new),
            interactive_area: self.interactive_area,
            layouts: AtomicUsize::new(0),
            focus_gained: AtomicUsize::new(0),
            focus_lost: AtomicUsize::new(0),
        })
    }
}

/// Counters shared between a [`TestWidget`] and every renderer it creates.
#[derive(Default)]
pub struct RendererStats {
    created: AtomicUsize,
    destroyed: AtomicUsize,
    layouts: AtomicUsize,
    refreshed: AtomicUsize,
}

impl RendererStats {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn layouts(&self) -> usize {
        self.layouts.load(Ordering::SeqCst)
    }

    pub fn refreshed(&self) -> usize {
        self.refreshed.load(Ordering::SeqCst)
    }
}

/// A widget drawn by a [`TestRenderer`].
pub struct TestWidget {
    geometry: Mutex<Geometry>,
    visible: AtomicBool,
    parts: Vec<ObjectRef>,
    renderer_min: Arc<Mutex<Size>>,
    stats: Arc<RendererStats>,
}

impl TestWidget {
    /// A widget of the given size whose renderer reports `min` and draws
    /// `parts`.
    pub fn new(size: Size, min: Size, parts: Vec<ObjectRef>) -> Arc<Self> {
        Arc::new(Self {
            geometry: Mutex::new(Geometry {
                position: Point::ZERO,
                size,
                min_size: min,
            }),
            visible: AtomicBool::new(true),
            parts,
            renderer_min: Arc::new(Mutex::new(min)),
            stats: Arc::new(RendererStats::default()),
        })
    }

    pub fn simple() -> Arc<Self> {
        Self::new(Size::new(10.0, 10.0), Size::new(10.0, 10.0), Vec::new())
    }

    pub fn object(self: &Arc<Self>) -> ObjectRef {
        Arc::clone(self) as ObjectRef
    }

    pub fn stats(&self) -> &Arc<RendererStats> {
        &self.stats
    }

    /// Changes the minimum size reported by current and future renderers.
    pub fn set_min_size(&self, size: Size) {
        lock(&self.geometry).min_size = size;
        *lock(&self.renderer_min) = size;
    }
}

impl CanvasObject for TestWidget {
    fn position(&self) -> Point {
        lock(&self.geometry).position
    }

    fn size(&self) -> Size {
        lock(&self.geometry).size
    }

    fn min_size(&self) -> Size {
        lock(&self.geometry).min_size
    }

    fn move_to(&self, position: Point) {
        lock(&self.geometry).position = position;
    }

    fn resize(&self, size: Size) {
        lock(&self.geometry).size = size;
    }

    fn visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn show(&self) {
        self.visible.store(true, Ordering::SeqCst);
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    fn as_widget(&self) -> Option<&dyn Widget> {
        Some(self)
    }
}

impl Widget for TestWidget {
    fn create_renderer(&self) -> Box<dyn WidgetRenderer> {
        self.stats.created.fetch_add(1, Ordering::SeqCst);
        Box::new(TestRenderer {
            min: Arc::clone(&self.renderer_min),
            parts: self.parts.clone(),
            stats: Arc::clone(&self.stats),
        })
    }
}

pub struct TestRenderer {
    min: Arc<Mutex<Size>>,
    parts: Vec<ObjectRef>,
    stats: Arc<RendererStats>,
}

impl WidgetRenderer for TestRenderer {
    fn objects(&self) -> ObjectList {
        self.parts.iter().cloned().collect()
    }

    fn layout(&self, _size: Size) {
        self.stats.layouts.fetch_add(1, Ordering::SeqCst);
    }

    fn min_size(&self) -> Size {
        *lock(&self.min)
    }

    fn refresh(&self) {
        self.stats.refreshed.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(&self) {
        self.stats.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// `count` simple widgets, each pushed through the renderer cache once.
pub fn rendered_widgets(caches: &trellis_ui::Caches, count: usize) -> Vec<Arc<TestWidget>> {
    (0..count)
        .map(|_| {
            let widget = TestWidget::simple();
            caches.renderers().renderer(&widget.object());
            widget
        })
        .collect()
}
