//! Error type for the pipeline.
//!
//! Every variant is a contract violation detected before any pixel is
//! touched: callers either fix their input or skip the frame.

use thiserror::Error;

use crate::pixel::PixelFormat;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Unsupported conversion: {src} -> {dst}")]
    UnsupportedConversion { src: PixelFormat, dst: PixelFormat },

    #[error("Pixel format mismatch: expected {expected}, got {actual}")]
    FormatMismatch {
        expected: PixelFormat,
        actual: PixelFormat,
    },

    #[error("Packed pixel format {0} is not supported here")]
    PackedFormat(PixelFormat),

    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Canvas dimensions differ: {src_width}x{src_height} vs {dst_width}x{dst_height}")]
    DimensionMismatch {
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    },

    #[error("Region {w}x{h}+{x}+{y} does not fit in {width}x{height}")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        width: u32,
        height: u32,
    },

    #[error("Invalid gamma exponent: {0}")]
    InvalidGamma(f32),

    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(u8),

    #[error("Unsupported target format: {0}")]
    UnsupportedTarget(PixelFormat),
}
