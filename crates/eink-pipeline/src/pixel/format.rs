//! Pixel format definitions.
//!
//! Multi-byte pixels are stored as little-endian words: a 32-bit `Argb8888`
//! pixel `0xAARRGGBB` sits in memory as `BB GG RR AA`. `Rgb888` is the one
//! exception and is always stored as `RR GG BB`.

use std::fmt;

/// Supported pixel encodings.
///
/// The set is closed: every stage matches on it exhaustively, and a
/// format's bits per pixel never changes, so it alone determines buffer
/// sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PixelFormat {
    /// 1-bit greyscale, 8 pixels per byte, left-most pixel in the MSB.
    Y1Packed,
    /// 2-bit greyscale, 4 pixels per byte.
    Y2Packed,
    /// 4-bit greyscale, 2 pixels per byte.
    Y4Packed,
    /// 8-bit greyscale.
    Y8,
    /// 1-bit greyscale, one pixel per byte in the low bit.
    Y1Lsb,
    /// 2-bit greyscale, one pixel per byte in the low bits.
    Y2Lsb,
    /// 4-bit greyscale, one pixel per byte in the low nibble.
    Y4Lsb,
    /// 24-bit colour, bytes R, G, B.
    Rgb888,
    /// 16-bit colour, little endian.
    Rgb565,
    /// 32-bit colour with alpha in the top byte, little endian.
    Argb8888,
    /// 32-bit colour with alpha in the low byte, little endian.
    Rgba8888,
    /// 16-bit colour, big endian.
    Rgb565Be,
    /// 32-bit colour, big endian ARGB (bytes A, R, G, B).
    Argb8888Be,
    /// 32-bit colour, big endian RGBA (bytes R, G, B, A).
    Rgba8888Be,
    /// 1-bit colour-filter-array dot, one per byte.
    C1Lsb,
    /// 2-bit colour-filter-array dot, one per byte.
    C2Lsb,
    /// 4-bit colour-filter-array dot, one per byte.
    C4Lsb,
    /// 8-bit colour-filter-array dot.
    C8,
}

impl PixelFormat {
    /// Bits per pixel.
    pub const fn bpp(self) -> u32 {
        match self {
            PixelFormat::Y1Packed => 1,
            PixelFormat::Y2Packed => 2,
            PixelFormat::Y4Packed => 4,
            PixelFormat::Y8
            | PixelFormat::Y1Lsb
            | PixelFormat::Y2Lsb
            | PixelFormat::Y4Lsb
            | PixelFormat::C1Lsb
            | PixelFormat::C2Lsb
            | PixelFormat::C4Lsb
            | PixelFormat::C8 => 8,
            PixelFormat::Rgb565 | PixelFormat::Rgb565Be => 16,
            PixelFormat::Rgb888 => 24,
            PixelFormat::Argb8888
            | PixelFormat::Argb8888Be
            | PixelFormat::Rgba8888
            | PixelFormat::Rgba8888Be => 32,
        }
    }

    /// Bit mask of a single pixel inside a packed byte, or 0 for
    /// formats that are not packed.
    pub const fn mask(self) -> u8 {
        match self {
            PixelFormat::Y1Packed => 0x01,
            PixelFormat::Y2Packed => 0x03,
            PixelFormat::Y4Packed => 0x0f,
            _ => 0x00,
        }
    }

    /// Whether several pixels share one byte.
    #[inline]
    pub const fn is_packed(self) -> bool {
        self.bpp() < 8
    }

    /// Bytes per pixel for byte-aligned formats (0 for packed formats).
    #[inline]
    pub const fn channels(self) -> usize {
        (self.bpp() / 8) as usize
    }

    /// Whether the encoding carries an alpha channel.
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            PixelFormat::Argb8888
                | PixelFormat::Argb8888Be
                | PixelFormat::Rgba8888
                | PixelFormat::Rgba8888Be
        )
    }

    /// Whether this is a colour-filter-array dot format.
    pub const fn is_cfa(self) -> bool {
        matches!(
            self,
            PixelFormat::C1Lsb | PixelFormat::C2Lsb | PixelFormat::C4Lsb | PixelFormat::C8
        )
    }

    /// Buffer size in bytes for a `width` x `height` image.
    pub fn buffer_len(self, width: u32, height: u32) -> usize {
        let bits = width as usize * height as usize * self.bpp() as usize;
        bits.div_ceil(8)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Y1Packed => "Y1_PACKED",
            PixelFormat::Y2Packed => "Y2_PACKED",
            PixelFormat::Y4Packed => "Y4_PACKED",
            PixelFormat::Y8 => "Y8",
            PixelFormat::Y1Lsb => "Y1_LSB",
            PixelFormat::Y2Lsb => "Y2_LSB",
            PixelFormat::Y4Lsb => "Y4_LSB",
            PixelFormat::Rgb888 => "RGB888",
            PixelFormat::Rgb565 => "RGB565",
            PixelFormat::Argb8888 => "ARGB8888",
            PixelFormat::Rgba8888 => "RGBA8888",
            PixelFormat::Rgb565Be => "RGB565_BE",
            PixelFormat::Argb8888Be => "ARGB8888_BE",
            PixelFormat::Rgba8888Be => "RGBA8888_BE",
            PixelFormat::C1Lsb => "C1_LSB",
            PixelFormat::C2Lsb => "C2_LSB",
            PixelFormat::C4Lsb => "C4_LSB",
            PixelFormat::C8 => "C8",
        };
        f.write_str(name)
    }
}
