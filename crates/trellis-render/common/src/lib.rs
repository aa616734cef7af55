//! Frame driver shared between painter backends.
//!
//! Backends implement [`Painter`]. The platform loop calls [`repaint`] once per
//! frame on the draw context.

use trellis_ui::{Canvas, CanvasObject, ClipStack, NodeView, RenderVisitor};
use trellis_ui_graphics::{Point, Size};

pub use trellis_ui::painter::Painter;

/// What a call to [`repaint`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// The canvas was dirty and has been painted.
    pub painted: bool,
    /// A region root changed minimum size; the window should re-read
    /// [`Canvas::min_size`].
    pub window_needs_update: bool,
    /// Refresh requests drained this frame.
    pub drained: usize,
}

/// Paints every region of `canvas` with `painter`.
///
/// Each scrollable opens a clip on entry. On exit the enclosing clip is
/// re-opened, or clipping stops when none is left.
pub fn paint_canvas(canvas: &mut Canvas, painter: &mut dyn Painter) {
    painter.clear();
    let mut visitor = PaintVisitor {
        painter,
        clips: ClipStack::new(),
        frame_size: canvas.size(),
    };
    canvas.walk_trees(&mut visitor);
    debug_assert!(visitor.clips.is_empty(), "unbalanced clip stack after paint");
}

struct PaintVisitor<'a> {
    painter: &'a mut dyn Painter,
    clips: ClipStack,
    frame_size: Size,
}

impl RenderVisitor for PaintVisitor<'_> {
    fn before_children(&mut self, node: &mut NodeView<'_>, position: Point) {
        let object = node.object();
        if object.as_scrollable().is_some() {
            let clip = self.clips.push(position, object.size());
            self.painter.start_clipping(clip.position, clip.size);
        }
        self.painter.paint(object, position, self.frame_size);
    }

    fn after_children(&mut self, node: &mut NodeView<'_>) {
        if node.object().as_scrollable().is_none() {
            return;
        }
        self.clips.pop();
        match self.clips.top() {
            Some(parent) => self.painter.start_clipping(parent.position, parent.size),
            None => self.painter.stop_clipping(),
        }
    }
}

/// Runs one frame: settles minimum sizes, releases refreshed resources,
/// paints when dirty and sweeps the caches.
pub fn repaint(canvas: &mut Canvas) -> FrameOutcome {
    let window_needs_update = canvas.ensure_min_size();
    let drained = canvas.free_dirty_textures();

    let refreshed = canvas.check_dirty_and_clear();
    let mut painted = false;
    if refreshed {
        if let Some(mut painter) = canvas.take_painter() {
            paint_canvas(canvas, painter.as_mut());
            canvas.set_painter(painter);
            painted = true;
        } else {
            log::debug!("canvas {:?} is dirty but has no painter", canvas.id());
        }
    }
    canvas.caches().clean(refreshed);

    FrameOutcome {
        painted,
        window_needs_update,
        drained,
    }
}
