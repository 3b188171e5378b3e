//! Aspect-preserving resize with letterboxing.
//!
//! Resampling is delegated to `image::imageops::resize` with the triangle
//! (bilinear) filter. The source bytes are handed over as a 1-4 channel
//! `u8` image according to the format's byte width, so 16-bit formats are
//! interpolated per byte like any other two-channel image.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, LumaA, Pixel, Rgb, Rgba};

use crate::canvas::{Canvas, Rect};
use crate::error::PipelineError;

/// Scale `src` to fit inside `dst` without distorting it.
///
/// The limiting axis fills `dst` completely and the other axis is centred;
/// pixels outside the returned region are left untouched. Both canvases
/// must share a byte-aligned format.
pub fn scale_fit(src: &Canvas, dst: &mut Canvas) -> Result<Rect, PipelineError> {
    if src.format() != dst.format() {
        return Err(PipelineError::FormatMismatch {
            expected: dst.format(),
            actual: src.format(),
        });
    }
    if src.format().is_packed() {
        return Err(PipelineError::PackedFormat(src.format()));
    }

    if src.width() == dst.width() && src.height() == dst.height() {
        dst.as_bytes_mut().copy_from_slice(src.as_bytes());
        return Ok(Rect::new(0, 0, dst.width(), dst.height()));
    }

    let region = fit_region(src.width(), src.height(), dst.width(), dst.height());
    let scaled = match src.format().channels() {
        1 => resample::<Luma<u8>>(src, region.w, region.h)?,
        2 => resample::<LumaA<u8>>(src, region.w, region.h)?,
        3 => resample::<Rgb<u8>>(src, region.w, region.h)?,
        _ => resample::<Rgba<u8>>(src, region.w, region.h)?,
    };

    tracing::trace!(
        src_width = src.width(),
        src_height = src.height(),
        ?region,
        "Scaled into letterbox"
    );

    blit(&scaled, region, dst);
    Ok(region)
}

/// Placement of a `src_w` x `src_h` image scaled to fit `dst_w` x `dst_h`.
fn fit_region(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Rect {
    let scale_x = dst_w as f32 / src_w as f32;
    let scale_y = dst_h as f32 / src_h as f32;

    if scale_x > scale_y {
        let w = ((src_w as f32 * scale_y) as u32).clamp(1, dst_w);
        Rect::new((dst_w - w) / 2, 0, w, dst_h)
    } else {
        let h = ((src_h as f32 * scale_x) as u32).clamp(1, dst_h);
        Rect::new(0, (dst_h - h) / 2, dst_w, h)
    }
}

fn resample<P>(src: &Canvas, width: u32, height: u32) -> Result<Vec<u8>, PipelineError>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let image: ImageBuffer<P, Vec<u8>> =
        ImageBuffer::from_raw(src.width(), src.height(), src.as_bytes().to_vec()).ok_or(
            PipelineError::BufferSize {
                expected: src.format().buffer_len(src.width(), src.height()),
                actual: src.as_bytes().len(),
            },
        )?;
    Ok(imageops::resize(&image, width, height, FilterType::Triangle).into_raw())
}

/// Copy a tightly packed `region.w` x `region.h` block into `dst` at the
/// region's offset.
fn blit(block: &[u8], region: Rect, dst: &mut Canvas) {
    let bytes_pp = dst.format().channels();
    let stride = dst.stride();
    let row_len = region.w as usize * bytes_pp;
    let out = dst.as_bytes_mut();

    for (row, line) in block.chunks_exact(row_len).enumerate() {
        let start = (region.y as usize + row) * stride + region.x as usize * bytes_pp;
        out[start..start + row_len].copy_from_slice(line);
    }
}
