//! Contract between a canvas and the backend that turns objects into pixels.

use crate::cache::TextureHandle;
use crate::object::{ObjectId, ObjectRef};
use trellis_ui_graphics::{Point, RasterImage, Size};

/// A drawing backend bound to one canvas.
///
/// Every method runs on the draw context.
pub trait Painter: Send {
    /// Prepares backend state. Called once before the first frame.
    fn init(&mut self);

    fn clear(&mut self);

    /// Draws a single object at its absolute position.
    fn paint(&mut self, object: &ObjectRef, position: Point, frame_size: Size);

    /// Releases backend resources held for `object`. `texture` is the cache
    /// entry the canvas removed for it, if there was one.
    fn free(&mut self, object: ObjectId, texture: Option<TextureHandle>);

    /// Restricts painting to the given rectangle until the next call to
    /// `start_clipping` or `stop_clipping`.
    fn start_clipping(&mut self, position: Point, size: Size);

    fn stop_clipping(&mut self);

    /// Pixel size of the output surface.
    fn set_output_size(&mut self, width: u32, height: u32);

    fn set_frame_buffer_scale(&mut self, scale: f32);

    /// Reads back the last frame.
    fn capture(&mut self) -> RasterImage;
}
