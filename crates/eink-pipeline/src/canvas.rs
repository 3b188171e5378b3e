//! Owned pixel buffers tagged with their format.
//!
//! [`Canvas`] is the unit of ownership for every pipeline stage. Its buffer
//! is a plain byte vector; the typed accessors [`Canvas::pixel`] and
//! [`Canvas::set_pixel`] do the bpp-aware indexing so no stage needs to
//! reinterpret the bytes itself.

use crate::error::PipelineError;
use crate::pixel::{convert_pixel, PixelFormat};

/// An integer region. The all-zero rect stands for "the entire canvas".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    /// Sentinel for "entire canvas".
    pub const ZERO: Rect = Rect {
        x: 0,
        y: 0,
        w: 0,
        h: 0,
    };

    #[inline]
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// True for a rect with no extent, which callers treat as "everything".
    #[inline]
    pub const fn is_full_sentinel(&self) -> bool {
        self.w == 0 && self.h == 0
    }

    /// Replace the sentinel with the full `width` x `height` area.
    pub fn or_full(self, width: u32, height: u32) -> Rect {
        if self.is_full_sentinel() {
            Rect::new(0, 0, width, height)
        } else {
            self
        }
    }

    /// Check that the rect lies entirely within a `width` x `height` area.
    pub fn check_within(&self, width: u32, height: u32) -> Result<(), PipelineError> {
        let fits_x = self.x.checked_add(self.w).is_some_and(|end| end <= width);
        let fits_y = self.y.checked_add(self.h).is_some_and(|end| end <= height);
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(PipelineError::RegionOutOfBounds {
                x: self.x,
                y: self.y,
                w: self.w,
                h: self.h,
                width,
                height,
            })
        }
    }
}

/// A fixed-size pixel buffer in a single [`PixelFormat`].
///
/// The buffer holds `ceil(width * height * bpp / 8)` bytes. Packed formats
/// are laid out as one continuous bit stream (rows are not byte aligned),
/// with the left-most pixel in the most significant bits of each byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    format: PixelFormat,
    buf: Vec<u8>,
}

impl Canvas {
    /// Allocate a canvas. Callers must not rely on the initial content.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            format,
            buf: vec![0; format.buffer_len(width, height)],
        })
    }

    /// Wrap an existing buffer, checking that its length matches the format.
    pub fn from_raw(
        width: u32,
        height: u32,
        format: PixelFormat,
        buf: Vec<u8>,
    ) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidDimensions { width, height });
        }
        let expected = format.buffer_len(width, height);
        if buf.len() != expected {
            return Err(PipelineError::BufferSize {
                expected,
                actual: buf.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            buf,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per row for byte-aligned formats.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.channels()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Read the packed value of pixel (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) lies outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of range");
        let index = y as usize * self.width as usize + x as usize;
        let buf = &self.buf;
        match self.format.bpp() {
            bpp @ (1 | 2 | 4) => {
                let (byte, shift) = packed_position(index, bpp);
                ((buf[byte] >> shift) & self.format.mask()) as u32
            }
            8 => buf[index] as u32,
            16 => {
                let o = index * 2;
                u16::from_le_bytes([buf[o], buf[o + 1]]) as u32
            }
            24 => {
                let o = index * 3;
                (buf[o] as u32) << 16 | (buf[o + 1] as u32) << 8 | buf[o + 2] as u32
            }
            _ => {
                let o = index * 4;
                u32::from_le_bytes([buf[o], buf[o + 1], buf[o + 2], buf[o + 3]])
            }
        }
    }

    /// Write the packed value of pixel (x, y). Bits above the format's
    /// width are ignored.
    ///
    /// # Panics
    ///
    /// Panics if (x, y) lies outside the canvas.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u32) {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of range");
        let index = y as usize * self.width as usize + x as usize;
        let mask = self.format.mask();
        let buf = &mut self.buf;
        match self.format.bpp() {
            bpp @ (1 | 2 | 4) => {
                let (byte, shift) = packed_position(index, bpp);
                buf[byte] = (buf[byte] & !(mask << shift)) | ((value as u8 & mask) << shift);
            }
            8 => buf[index] = value as u8,
            16 => {
                let o = index * 2;
                buf[o..o + 2].copy_from_slice(&(value as u16).to_le_bytes());
            }
            24 => {
                let o = index * 3;
                buf[o] = (value >> 16) as u8;
                buf[o + 1] = (value >> 8) as u8;
                buf[o + 2] = value as u8;
            }
            _ => {
                let o = index * 4;
                buf[o..o + 4].copy_from_slice(&value.to_le_bytes());
            }
        }
    }

    /// Set every pixel to `value`.
    pub fn fill(&mut self, value: u32) {
        match self.format.bpp() {
            8 => self.buf.fill(value as u8),
            _ => {
                for y in 0..self.height {
                    for x in 0..self.width {
                        self.set_pixel(x, y, value);
                    }
                }
            }
        }
    }

    /// Convert `src` into a new canvas of format `format`.
    ///
    /// Caution: converts one pixel at a time. Fine for a one-shot load-time
    /// conversion, far too slow for a per-frame path.
    pub fn converted(src: &Canvas, format: PixelFormat) -> Result<Canvas, PipelineError> {
        let mut dst = Canvas::new(src.width, src.height, format)?;
        convert_canvas(&mut dst, src)?;
        Ok(dst)
    }
}

/// Byte index and right shift of pixel `index` in a packed bit stream.
#[inline]
fn packed_position(index: usize, bpp: u32) -> (usize, u32) {
    let bit = index * bpp as usize;
    let shift = 8 - bpp - (bit % 8) as u32;
    (bit / 8, shift)
}

/// Convert every pixel of `src` into `dst`'s format.
///
/// Both canvases must have the same dimensions.
pub fn convert_canvas(dst: &mut Canvas, src: &Canvas) -> Result<(), PipelineError> {
    if dst.width != src.width || dst.height != src.height {
        return Err(PipelineError::DimensionMismatch {
            src_width: src.width,
            src_height: src.height,
            dst_width: dst.width,
            dst_height: dst.height,
        });
    }
    if dst.format == src.format {
        dst.buf.copy_from_slice(&src.buf);
        return Ok(());
    }
    // Fail on the format pair before touching the destination.
    convert_pixel(dst.format, src.format, 0)?;

    for y in 0..src.height {
        for x in 0..src.width {
            let value = convert_pixel(dst.format, src.format, src.pixel(x, y))?;
            dst.set_pixel(x, y, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rect_sentinel_expands() {
        assert_eq!(Rect::ZERO.or_full(10, 20), Rect::new(0, 0, 10, 20));
        assert_eq!(Rect::new(1, 2, 3, 4).or_full(10, 20), Rect::new(1, 2, 3, 4));
    }

    #[test]
    fn test_rect_bounds() {
        assert!(Rect::new(0, 0, 10, 10).check_within(10, 10).is_ok());
        assert!(Rect::new(5, 5, 5, 5).check_within(10, 10).is_ok());
        assert!(Rect::new(5, 5, 6, 5).check_within(10, 10).is_err());
        assert!(Rect::new(u32::MAX, 0, 2, 1).check_within(10, 10).is_err());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert_eq!(
            Canvas::new(0, 4, PixelFormat::Y8),
            Err(PipelineError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert_eq!(
            Canvas::from_raw(2, 2, PixelFormat::Rgb888, vec![0; 11]),
            Err(PipelineError::BufferSize {
                expected: 12,
                actual: 11
            })
        );
        assert!(Canvas::from_raw(2, 2, PixelFormat::Rgb888, vec![0; 12]).is_ok());
    }

    #[test]
    fn test_packed_pixels_msb_first() {
        let mut canvas = Canvas::new(8, 1, PixelFormat::Y1Packed).unwrap();
        canvas.set_pixel(0, 0, 1);
        canvas.set_pixel(7, 0, 1);
        assert_eq!(canvas.as_bytes(), &[0b1000_0001]);
        assert_eq!(canvas.pixel(0, 0), 1);
        assert_eq!(canvas.pixel(1, 0), 0);
        assert_eq!(canvas.pixel(7, 0), 1);
    }

    #[test]
    fn test_packed_rows_are_continuous() {
        // 3 pixels per row at 4bpp: row 1 starts mid-byte
        let mut canvas = Canvas::new(3, 2, PixelFormat::Y4Packed).unwrap();
        canvas.set_pixel(0, 1, 0xa);
        assert_eq!(canvas.as_bytes(), &[0x00, 0x0a, 0x00]);
        assert_eq!(canvas.pixel(0, 1), 0xa);
    }

    #[test]
    fn test_rgb888_byte_order() {
        let mut canvas = Canvas::new(1, 1, PixelFormat::Rgb888).unwrap();
        canvas.set_pixel(0, 0, 0x112233);
        assert_eq!(canvas.as_bytes(), &[0x11, 0x22, 0x33]);
    }

    #[test]
    fn test_argb8888_little_endian() {
        let mut canvas = Canvas::new(1, 1, PixelFormat::Argb8888).unwrap();
        canvas.set_pixel(0, 0, 0xff112233);
        assert_eq!(canvas.as_bytes(), &[0x33, 0x22, 0x11, 0xff]);
        assert_eq!(canvas.pixel(0, 0), 0xff112233);
    }

    #[test]
    fn test_fill_wide_format() {
        let mut canvas = Canvas::new(2, 2, PixelFormat::Rgb565).unwrap();
        canvas.fill(0xf800);
        assert_eq!(canvas.as_bytes(), &[0x00, 0xf8, 0x00, 0xf8, 0x00, 0xf8, 0x00, 0xf8]);
    }

    #[test]
    fn test_convert_rgb_to_grey() {
        let src = Canvas::from_raw(2, 1, PixelFormat::Rgb888, vec![255, 255, 255, 0, 255, 0])
            .unwrap();
        let grey = Canvas::converted(&src, PixelFormat::Y8).unwrap();
        assert_eq!(grey.as_bytes(), &[255, 143]);
    }

    #[test]
    fn test_convert_grey_round_trip_is_exact() {
        let bytes: Vec<u8> = (0..=255).collect();
        let src = Canvas::from_raw(16, 16, PixelFormat::Y8, bytes.clone()).unwrap();
        for format in [
            PixelFormat::Rgb888,
            PixelFormat::Argb8888,
            PixelFormat::Rgba8888,
            PixelFormat::Argb8888Be,
            PixelFormat::Rgba8888Be,
        ] {
            let there = Canvas::converted(&src, format).unwrap();
            let back = Canvas::converted(&there, PixelFormat::Y8).unwrap();
            assert_eq!(back.as_bytes(), bytes.as_slice(), "via {format}");
        }
    }

    #[test]
    fn test_convert_rgb565_round_trip_within_rounding() {
        let bytes: Vec<u8> = (0..=255).collect();
        let src = Canvas::from_raw(16, 16, PixelFormat::Y8, bytes.clone()).unwrap();
        let there = Canvas::converted(&src, PixelFormat::Rgb565).unwrap();
        let back = Canvas::converted(&there, PixelFormat::Y8).unwrap();
        for (orig, round) in bytes.iter().zip(back.as_bytes()) {
            assert!(
                (*orig as i32 - *round as i32).abs() <= 8,
                "luma {orig} came back as {round}"
            );
        }
    }

    #[test]
    fn test_convert_rejects_dimension_mismatch() {
        let src = Canvas::new(2, 2, PixelFormat::Y8).unwrap();
        let mut dst = Canvas::new(3, 2, PixelFormat::Rgb888).unwrap();
        assert!(matches!(
            convert_canvas(&mut dst, &src),
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_convert_rejects_cfa_before_writing() {
        let src = Canvas::from_raw(1, 1, PixelFormat::C8, vec![0x55]).unwrap();
        let mut dst = Canvas::new(1, 1, PixelFormat::Y8).unwrap();
        dst.fill(0x11);
        assert!(convert_canvas(&mut dst, &src).is_err());
        assert_eq!(dst.as_bytes(), &[0x11]);
    }
}
