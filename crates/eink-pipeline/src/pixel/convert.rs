//! Per-pixel format conversion.
//!
//! Every conversion goes through an [`Rgba`] decomposition: decode the
//! source value into 8-bit channels, derive luma for greyscale targets,
//! then encode into the destination layout.

use super::PixelFormat;
use crate::error::PipelineError;

/// Luma weights in per-mille. They sum to 1000 so grey inputs map back to
/// themselves exactly.
const LUMA_R: u32 = 312;
const LUMA_G: u32 = 563;
const LUMA_B: u32 = 125;

/// A pixel decomposed into 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Opaque colour.
    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    /// Opaque grey with all three channels set to `y`.
    #[inline]
    pub const fn grey(y: u8) -> Self {
        Self::opaque(y, y, y)
    }

    /// Luma using the panel weights 0.312 R + 0.563 G + 0.125 B.
    #[inline]
    pub fn luma(self) -> u8 {
        let sum = LUMA_R * self.r as u32 + LUMA_G * self.g as u32 + LUMA_B * self.b as u32;
        (sum / 1000) as u8
    }

    /// Decode a packed pixel value of format `format`.
    pub fn decode(format: PixelFormat, value: u32) -> Result<Self, PipelineError> {
        let byte = value as u8;
        let rgba = match format {
            PixelFormat::Y1Lsb | PixelFormat::Y1Packed => {
                Self::grey(if value != 0 { 0xff } else { 0x00 })
            }
            PixelFormat::Y2Lsb | PixelFormat::Y2Packed => {
                let v = byte & 0x03;
                Self::grey(v | v << 2 | v << 4 | v << 6)
            }
            PixelFormat::Y4Lsb | PixelFormat::Y4Packed => {
                let v = byte & 0x0f;
                Self::grey(v | v << 4)
            }
            PixelFormat::Y8 => Self::grey(byte),
            PixelFormat::Rgb565 => decode_565(value as u16),
            PixelFormat::Rgb565Be => decode_565((value as u16).swap_bytes()),
            PixelFormat::Rgb888 => {
                Self::opaque((value >> 16) as u8, (value >> 8) as u8, value as u8)
            }
            PixelFormat::Argb8888 => Self {
                a: (value >> 24) as u8,
                r: (value >> 16) as u8,
                g: (value >> 8) as u8,
                b: value as u8,
            },
            PixelFormat::Rgba8888 => Self {
                r: (value >> 24) as u8,
                g: (value >> 16) as u8,
                b: (value >> 8) as u8,
                a: value as u8,
            },
            PixelFormat::Argb8888Be => Self {
                b: (value >> 24) as u8,
                g: (value >> 16) as u8,
                r: (value >> 8) as u8,
                a: value as u8,
            },
            PixelFormat::Rgba8888Be => Self {
                a: (value >> 24) as u8,
                b: (value >> 16) as u8,
                g: (value >> 8) as u8,
                r: value as u8,
            },
            PixelFormat::C1Lsb | PixelFormat::C2Lsb | PixelFormat::C4Lsb | PixelFormat::C8 => {
                return Err(PipelineError::UnsupportedConversion {
                    src: format,
                    dst: format,
                })
            }
        };
        Ok(rgba)
    }

    /// Encode into format `format`. Greyscale targets keep the top bits of
    /// the luma; alpha survives only in alpha-bearing formats.
    pub fn encode(self, format: PixelFormat) -> Result<u32, PipelineError> {
        let Rgba { r, g, b, a } = self;
        let (r, g, b, a) = (r as u32, g as u32, b as u32, a as u32);
        let value = match format {
            PixelFormat::Y1Lsb | PixelFormat::Y1Packed => (self.luma() >> 7) as u32 & 0x01,
            PixelFormat::Y2Lsb | PixelFormat::Y2Packed => (self.luma() >> 6) as u32 & 0x03,
            PixelFormat::Y4Lsb | PixelFormat::Y4Packed => (self.luma() >> 4) as u32 & 0x0f,
            PixelFormat::Y8 => self.luma() as u32,
            PixelFormat::Rgb565 => encode_565(r, g, b),
            PixelFormat::Rgb565Be => (encode_565(r, g, b) as u16).swap_bytes() as u32,
            PixelFormat::Rgb888 => r << 16 | g << 8 | b,
            PixelFormat::Argb8888 => a << 24 | r << 16 | g << 8 | b,
            PixelFormat::Rgba8888 => r << 24 | g << 16 | b << 8 | a,
            PixelFormat::Argb8888Be => b << 24 | g << 16 | r << 8 | a,
            PixelFormat::Rgba8888Be => a << 24 | b << 16 | g << 8 | r,
            PixelFormat::C1Lsb | PixelFormat::C2Lsb | PixelFormat::C4Lsb | PixelFormat::C8 => {
                return Err(PipelineError::UnsupportedConversion {
                    src: format,
                    dst: format,
                })
            }
        };
        Ok(value)
    }
}

fn decode_565(c: u16) -> Rgba {
    let mut r = ((c >> 8) & 0xf8) as u8;
    let mut g = ((c >> 3) & 0xfc) as u8;
    let mut b = ((c << 3) & 0xf8) as u8;
    r |= r >> 5;
    g |= g >> 6;
    b |= b >> 5;
    Rgba::opaque(r, g, b)
}

fn encode_565(r: u32, g: u32, b: u32) -> u32 {
    (r & 0xf8) << 8 | (g & 0xfc) << 3 | (b & 0xf8) >> 3
}

/// Convert a packed pixel value from `src` to `dst` format.
///
/// Identical formats return the value unchanged. CFA dot formats carry no
/// colour on their own and cannot be converted either way.
pub fn convert_pixel(dst: PixelFormat, src: PixelFormat, value: u32) -> Result<u32, PipelineError> {
    if src == dst {
        return Ok(value);
    }
    let unsupported = PipelineError::UnsupportedConversion { src, dst };
    let rgba = Rgba::decode(src, value).map_err(|_| unsupported.clone())?;
    rgba.encode(dst).map_err(|_| unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_weights() {
        assert_eq!(Rgba::opaque(255, 0, 0).luma(), 79);
        assert_eq!(Rgba::opaque(0, 255, 0).luma(), 143);
        assert_eq!(Rgba::opaque(0, 0, 255).luma(), 31);
        assert_eq!(Rgba::grey(255).luma(), 255);
    }

    #[test]
    fn test_grey_luma_is_exact() {
        for v in 0..=255u8 {
            assert_eq!(Rgba::grey(v).luma(), v, "grey {v} should map to itself");
        }
    }

    #[test]
    fn test_same_format_is_identity() {
        assert_eq!(
            convert_pixel(PixelFormat::C8, PixelFormat::C8, 0x42),
            Ok(0x42)
        );
        assert_eq!(
            convert_pixel(PixelFormat::Argb8888, PixelFormat::Argb8888, 0x12345678),
            Ok(0x12345678)
        );
    }

    #[test]
    fn test_low_depth_grey_expands() {
        assert_eq!(convert_pixel(PixelFormat::Y8, PixelFormat::Y1Lsb, 1), Ok(0xff));
        assert_eq!(convert_pixel(PixelFormat::Y8, PixelFormat::Y1Lsb, 0), Ok(0x00));
        assert_eq!(convert_pixel(PixelFormat::Y8, PixelFormat::Y2Lsb, 2), Ok(0xaa));
        assert_eq!(convert_pixel(PixelFormat::Y8, PixelFormat::Y4Lsb, 0x7), Ok(0x77));
    }

    #[test]
    fn test_grey_to_low_depth_keeps_top_bits() {
        assert_eq!(convert_pixel(PixelFormat::Y1Lsb, PixelFormat::Y8, 0x80), Ok(1));
        assert_eq!(convert_pixel(PixelFormat::Y1Lsb, PixelFormat::Y8, 0x7f), Ok(0));
        assert_eq!(convert_pixel(PixelFormat::Y2Lsb, PixelFormat::Y8, 0xc5), Ok(3));
        assert_eq!(convert_pixel(PixelFormat::Y4Lsb, PixelFormat::Y8, 0xa5), Ok(0xa));
    }

    #[test]
    fn test_rgb888_to_argb_forces_opaque_alpha() {
        let argb = convert_pixel(PixelFormat::Argb8888, PixelFormat::Rgb888, 0x112233).unwrap();
        assert_eq!(argb, 0xff112233);
    }

    #[test]
    fn test_alpha_dropped_for_rgb888() {
        let rgb = convert_pixel(PixelFormat::Rgb888, PixelFormat::Argb8888, 0x80112233).unwrap();
        assert_eq!(rgb, 0x112233);
    }

    #[test]
    fn test_alpha_carried_between_alpha_formats() {
        let rgba = convert_pixel(PixelFormat::Rgba8888, PixelFormat::Argb8888, 0x80112233).unwrap();
        assert_eq!(rgba, 0x11223380);
    }

    #[test]
    fn test_rgba_be_decodes_decoder_byte_order() {
        // Bytes R=0x10 G=0x20 B=0x30 A=0x40 read as a little-endian word
        let word = u32::from_le_bytes([0x10, 0x20, 0x30, 0x40]);
        let rgba = Rgba::decode(PixelFormat::Rgba8888Be, word).unwrap();
        assert_eq!(
            rgba,
            Rgba {
                r: 0x10,
                g: 0x20,
                b: 0x30,
                a: 0x40
            }
        );
    }

    #[test]
    fn test_rgb565_extremes() {
        assert_eq!(
            convert_pixel(PixelFormat::Rgb888, PixelFormat::Rgb565, 0xffff),
            Ok(0xffffff)
        );
        assert_eq!(
            convert_pixel(PixelFormat::Rgb565, PixelFormat::Rgb888, 0xff0000),
            Ok(0xf800)
        );
        assert_eq!(
            convert_pixel(PixelFormat::Rgb565Be, PixelFormat::Rgb888, 0xff0000),
            Ok(0x00f8)
        );
    }

    #[test]
    fn test_encode_decode_inverse_for_32bit_formats() {
        let colour = Rgba {
            r: 0x12,
            g: 0x34,
            b: 0x56,
            a: 0x78,
        };
        for format in [
            PixelFormat::Argb8888,
            PixelFormat::Rgba8888,
            PixelFormat::Argb8888Be,
            PixelFormat::Rgba8888Be,
        ] {
            let value = colour.encode(format).unwrap();
            assert_eq!(Rgba::decode(format, value).unwrap(), colour, "{format}");
        }
    }

    #[test]
    fn test_cfa_formats_rejected() {
        assert_eq!(
            convert_pixel(PixelFormat::Y8, PixelFormat::C8, 0x10),
            Err(PipelineError::UnsupportedConversion {
                src: PixelFormat::C8,
                dst: PixelFormat::Y8
            })
        );
        assert_eq!(
            convert_pixel(PixelFormat::C4Lsb, PixelFormat::Rgb888, 0x10),
            Err(PipelineError::UnsupportedConversion {
                src: PixelFormat::Rgb888,
                dst: PixelFormat::C4Lsb
            })
        );
    }
}
