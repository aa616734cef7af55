use std::sync::{Arc, Mutex, MutexGuard};
use trellis_ui::{ObjectId, ObjectRef, Painter, TextureHandle};
use trellis_ui_graphics::{Point, RasterImage, Size};

#[derive(Clone, Debug, PartialEq)]
pub enum PaintOp {
    Init,
    Clear,
    Paint { object: ObjectId, position: Point },
    Free {
        object: ObjectId,
        texture: Option<TextureHandle>,
    },
    StartClipping { position: Point, size: Size },
    StopClipping,
    OutputSize { width: u32, height: u32 },
    FrameBufferScale(f32),
    Capture,
}

/// Shared view of everything a [`RecordingPainter`] was asked to do.
#[derive(Clone, Default)]
pub struct PaintLog {
    ops: Arc<Mutex<Vec<PaintOp>>>,
}

impl PaintLog {
    pub fn ops(&self) -> Vec<PaintOp> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Objects painted, in paint order.
    pub fn painted(&self) -> Vec<ObjectId> {
        self.lock()
            .iter()
            .filter_map(|op| match op {
                PaintOp::Paint { object, .. } => Some(*object),
                _ => None,
            })
            .collect()
    }

    pub fn freed(&self) -> Vec<(ObjectId, Option<TextureHandle>)> {
        self.lock()
            .iter()
            .filter_map(|op| match op {
                PaintOp::Free { object, texture } => Some((*object, *texture)),
                _ => None,
            })
            .collect()
    }

    /// Position recorded for the last paint of `object`.
    pub fn painted_at(&self, object: &ObjectRef) -> Option<Point> {
        let id = ObjectId::of(object);
        self.lock().iter().rev().find_map(|op| match op {
            PaintOp::Paint { object, position } if *object == id => Some(*position),
            _ => None,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PaintOp>> {
        self.ops.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, op: PaintOp) {
        self.lock().push(op);
    }
}

/// A painter that draws nothing and logs every call.
pub struct RecordingPainter {
    log: PaintLog,
}

impl RecordingPainter {
    pub fn new() -> (Self, PaintLog) {
        let log = PaintLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl Painter for RecordingPainter {
    fn init(&mut self) {
        self.log.push(PaintOp::Init);
    }

    fn clear(&mut self) {
        self.log.push(PaintOp::Clear);
    }

    fn paint(&mut self, object: &ObjectRef, position: Point, _frame_size: Size) {
        self.log.push(PaintOp::Paint {
            object: ObjectId::of(object),
            position,
        });
    }

    fn free(&mut self, object: ObjectId, texture: Option<TextureHandle>) {
        self.log.push(PaintOp::Free { object, texture });
    }

    fn start_clipping(&mut self, position: Point, size: Size) {
        self.log.push(PaintOp::StartClipping { position, size });
    }

    fn stop_clipping(&mut self) {
        self.log.push(PaintOp::StopClipping);
    }

    fn set_output_size(&mut self, width: u32, height: u32) {
        self.log.push(PaintOp::OutputSize { width, height });
    }

    fn set_frame_buffer_scale(&mut self, scale: f32) {
        self.log.push(PaintOp::FrameBufferScale(scale));
    }

    fn capture(&mut self) -> RasterImage {
        self.log.push(PaintOp::Capture);
        RasterImage::new(0, 0)
    }
}
