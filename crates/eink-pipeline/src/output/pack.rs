//! Panel packing: widen quantized one-channel values into the target's
//! native layout.

use crate::canvas::{Canvas, Rect};
use crate::error::PipelineError;
use crate::filter::{ColorMode, Subpixel};
use crate::pixel::PixelFormat;

const OPAQUE: u32 = 0xff00_0000;

/// Store the quantized `plane` (tightly packed, `block.w` x `block.h`) into
/// `target` at `block`.
///
/// `Argb8888` targets get each value widened into a pixel: in subpixel mode
/// the value lands on the bit position of the filter colour over that
/// pixel, in monochrome mode it is replicated into R, G and B. Any other
/// byte-wide target receives the value unchanged.
pub(crate) fn pack(plane: &[u8], block: Rect, mode: ColorMode, target: &mut Canvas) {
    let height = target.height();
    let widen = target.format() == PixelFormat::Argb8888;

    for (row, line) in plane.chunks_exact(block.w as usize).enumerate() {
        let y = block.y + row as u32;
        for (col, &q) in line.iter().enumerate() {
            let x = block.x + col as u32;
            let value = match (widen, mode) {
                (false, _) => q as u32,
                (true, ColorMode::Subpixel) => {
                    OPAQUE | (q as u32) << Subpixel::at(x, y, height).shift()
                }
                (true, ColorMode::Monochrome) => OPAQUE | (q as u32) * 0x0001_0101,
            };
            target.set_pixel(x, y, value);
        }
    }
}

/// Approximate subpixel light bleed on an `Argb8888` target.
///
/// Each pixel's own colour component is OR-merged into its right neighbour
/// and, except on the block's last row, its lower-right neighbour. Only
/// useful for simulated displays.
pub(crate) fn brighten(block: Rect, target: &mut Canvas) {
    if block.w < 2 || block.h == 0 {
        return;
    }
    let height = target.height();
    let last_row = block.y + block.h - 1;

    for y in block.y..=last_row {
        for x in block.x..block.x + block.w - 1 {
            let own = target.pixel(x, y) & (0xff << Subpixel::at(x, y, height).shift());
            let right = target.pixel(x + 1, y);
            target.set_pixel(x + 1, y, right | own);
            if y < last_row {
                let below = target.pixel(x + 1, y + 1);
                target.set_pixel(x + 1, y + 1, below | own);
            }
        }
    }
}

/// Copy `canvas` row by row into a framebuffer whose lines are `stride`
/// bytes apart.
///
/// The framebuffer's virtual line length may exceed the canvas width; the
/// padding bytes are left untouched.
pub fn copy_rows_strided(
    dst: &mut [u8],
    stride: usize,
    canvas: &Canvas,
) -> Result<(), PipelineError> {
    if canvas.format().is_packed() {
        return Err(PipelineError::PackedFormat(canvas.format()));
    }
    let row_len = canvas.stride();
    let rows = canvas.height() as usize;
    let needed = stride * (rows - 1) + row_len;
    if stride < row_len || dst.len() < needed {
        return Err(PipelineError::BufferSize {
            expected: needed,
            actual: dst.len(),
        });
    }

    for (row, line) in canvas.as_bytes().chunks_exact(row_len).enumerate() {
        let start = row * stride;
        dst[start..start + row_len].copy_from_slice(line);
    }
    Ok(())
}
