//! Mask buffers and their composed raster.

mod model;
mod raster;

pub use model::{ErrorMark, MaskArea, MaskModel, MaskShape, MaskViewMode, PixelCounts};
pub use raster::HiddenRaster;
