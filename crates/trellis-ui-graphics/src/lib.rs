//! Pure math/data for the Trellis scene graph
//!
//! This crate contains the geometry primitives, typography keys and raster
//! image container shared by the engine, the cache stores and the painters.

mod geometry;
mod image;
mod typography;

pub use geometry::*;
pub use image::*;
pub use typography::*;

pub mod prelude {
    pub use crate::geometry::{EdgeInsets, Point, Rect, Size};
    pub use crate::image::RasterImage;
    pub use crate::typography::TextStyle;
}
