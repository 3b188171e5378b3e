//! Pixel formats and conversion between them.

mod convert;
mod format;

pub use convert::{convert_pixel, Rgba};
pub use format::PixelFormat;
