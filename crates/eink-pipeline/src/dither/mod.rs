//! Quantization and dithering primitives.
//!
//! The filter pipeline picks one [`DitherMethod`] per run:
//!
//! - **Error diffusion**: pushes each pixel's quantization error onto
//!   unvisited neighbours through a [`Kernel`]. Monochrome panels use
//!   [`FLOYD_STEINBERG`] or [`SIERRA_TWO_ROW`]; colour-filter-array panels
//!   always use [`SUBPIXEL`], which only targets same-colour subpixels.
//! - **Ordered**: adds a fixed threshold map entry plus a bias.
//! - **Blue noise**: adds a scaled entry of a noise tile.

pub mod blue_noise;
mod kernel;
pub mod ordered;

pub use kernel::*;

/// Dithering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DitherMethod {
    /// Plain truncation to the output depth.
    None,
    /// Error diffusion through a kernel.
    #[default]
    ErrorDiffusion,
    /// Ordered dithering with a threshold map.
    Ordered,
    /// Additive blue noise.
    BlueNoise,
}

/// Diffusion kernel used for monochrome panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MonoKernel {
    #[default]
    FloydSteinberg,
    SierraTwoRow,
}

impl MonoKernel {
    pub fn kernel(self) -> &'static Kernel {
        match self {
            MonoKernel::FloydSteinberg => &FLOYD_STEINBERG,
            MonoKernel::SierraTwoRow => &SIERRA_TWO_ROW,
        }
    }
}

/// Output grey depth of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BitDepth {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "1bpp"))]
    One,
    #[cfg_attr(feature = "serde", serde(rename = "2bpp"))]
    Two,
    #[cfg_attr(feature = "serde", serde(rename = "4bpp"))]
    Four,
    #[cfg_attr(feature = "serde", serde(rename = "8bpp"))]
    Eight,
}

impl BitDepth {
    pub const fn bits(self) -> u32 {
        match self {
            BitDepth::One => 1,
            BitDepth::Two => 2,
            BitDepth::Four => 4,
            BitDepth::Eight => 8,
        }
    }

    /// Reduce `v` to this depth, replicating the kept bits through the byte
    /// so the result is again a full-scale 8-bit level.
    #[inline]
    pub const fn quantize(self, v: u8) -> u8 {
        match self {
            BitDepth::One => {
                if v & 0x80 != 0 {
                    0xff
                } else {
                    0x00
                }
            }
            BitDepth::Two => {
                let q = v & 0xc0;
                let q = q | q >> 2;
                q | q >> 4
            }
            BitDepth::Four => {
                let q = v & 0xf0;
                q | q >> 4
            }
            BitDepth::Eight => v,
        }
    }
}

/// Error buffer for error diffusion.
///
/// Holds a sliding window of rows, only as many as the kernel reaches
/// (`max_dy + 1`), with one accumulator per column of the block being
/// processed.
///
/// # Usage Pattern
///
/// 1. Create buffer with `new(width, row_depth)`
/// 2. For each row:
///    a. Read accumulated error with `get_accumulated(x)`
///    b. After processing pixel, distribute error with `add_error(x, dy, error)`
///    c. After row complete, call `advance_row()`
#[derive(Debug)]
pub struct ErrorBuffer {
    /// rows[0] is the current row, rows[1] the next, etc.
    rows: Vec<Vec<f32>>,
    width: usize,
}

impl ErrorBuffer {
    /// Create a buffer for rows of `width` pixels reaching `row_depth` rows.
    pub fn new(width: usize, row_depth: usize) -> Self {
        Self {
            rows: (0..row_depth).map(|_| vec![0.0; width]).collect(),
            width,
        }
    }

    /// Error carried into column `x` of the current row.
    #[inline]
    pub fn get_accumulated(&self, x: usize) -> f32 {
        self.rows[0][x]
    }

    /// Add error to column `x`, `row_offset` rows below the current one.
    ///
    /// Silently ignores targets outside the window or the row.
    #[inline]
    pub fn add_error(&mut self, x: isize, row_offset: usize, error: f32) {
        if x >= 0 && (x as usize) < self.width && row_offset < self.rows.len() {
            self.rows[row_offset][x as usize] += error;
        }
    }

    /// Spread `error` from column `x` of the current row over `kernel`.
    pub fn diffuse(&mut self, kernel: &Kernel, x: usize, error: f32) {
        let divisor = kernel.divisor as f32;
        for &(dx, dy, weight) in kernel.entries {
            self.add_error(x as isize + dx as isize, dy as usize, error * weight as f32 / divisor);
        }
    }

    /// Move to the next row.
    ///
    /// The consumed row is zeroed and recycled as the furthest row.
    pub fn advance_row(&mut self) {
        self.rows.rotate_left(1);
        if let Some(last) = self.rows.last_mut() {
            last.fill(0.0);
        }
    }

    /// Smallest and largest value currently held anywhere in the window.
    pub fn extremes(&self) -> (f32, f32) {
        self.rows
            .iter()
            .flatten()
            .fold((0.0f32, 0.0f32), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}
