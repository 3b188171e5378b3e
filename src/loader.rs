//! Source image decoding.

use std::path::Path;

use eink_pipeline::{Canvas, PipelineError, PixelFormat};
use image::{DynamicImage, ImageReader};

use crate::error::ViewerError;

/// Decode the image at `path` into a canvas.
///
/// Greyscale images become `Y8`, RGB images `Rgb888` and RGBA images
/// `Rgba8888Be` (R, G, B, A in memory). Deeper sample types are reduced to
/// 8 bits. Any other channel layout is rejected.
pub fn load_image(path: &Path) -> Result<Canvas, ViewerError> {
    let decode_error = |reason: String| ViewerError::Decode {
        path: path.display().to_string(),
        reason,
    };

    let image = ImageReader::open(path)
        .map_err(|e| decode_error(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_error(e.to_string()))?
        .decode()
        .map_err(|e| decode_error(e.to_string()))?;

    let canvas = canvas_from_image(image)?;
    tracing::debug!(
        path = %path.display(),
        width = canvas.width(),
        height = canvas.height(),
        format = %canvas.format(),
        "Decoded image"
    );
    Ok(canvas)
}

/// Wrap decoded pixels in a canvas without copying more than once.
pub fn canvas_from_image(image: DynamicImage) -> Result<Canvas, ViewerError> {
    let (width, height) = (image.width(), image.height());
    let canvas = match image.color().channel_count() {
        1 => Canvas::from_raw(width, height, PixelFormat::Y8, image.into_luma8().into_raw())?,
        3 => Canvas::from_raw(width, height, PixelFormat::Rgb888, image.into_rgb8().into_raw())?,
        4 => Canvas::from_raw(
            width,
            height,
            PixelFormat::Rgba8888Be,
            image.into_rgba8().into_raw(),
        )?,
        n => return Err(PipelineError::UnsupportedChannels(n).into()),
    };
    Ok(canvas)
}
