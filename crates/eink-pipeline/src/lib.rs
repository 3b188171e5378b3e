//! eink-pipeline: image pipeline for electrophoretic panels
//!
//! Turns a decoded source bitmap into the reduced-depth, dithered and
//! optionally colour-filter-array-masked pixels a panel expects.
//!
//! # Quick Start
//!
//! ```
//! use eink_pipeline::{scale_fit, Canvas, FilterConfig, FilterPipeline, PixelFormat, Rect};
//!
//! let src = Canvas::from_raw(2, 2, PixelFormat::Y8, vec![255; 4]).unwrap();
//! let mut scaled = Canvas::new(4, 4, PixelFormat::Y8).unwrap();
//! let region = scale_fit(&src, &mut scaled).unwrap();
//!
//! let pipeline = FilterPipeline::new(FilterConfig::default()).unwrap();
//! let mut panel = Canvas::new(4, 4, PixelFormat::Y8).unwrap();
//! pipeline.process(&scaled, region, region, &mut panel).unwrap();
//!
//! assert!(panel.as_bytes().iter().all(|&b| b == 0xff));
//! ```
//!
//! # Stages
//!
//! - [`PixelFormat`] / [`convert_canvas`]: any-to-any conversion through an
//!   RGBA decomposition, luma weighted 0.312 / 0.563 / 0.125.
//! - [`scale_fit`]: aspect-preserving resize with letterboxing.
//! - [`GammaTables`]: sRGB <-> linear lookup for one gamma exponent.
//! - [`FilterPipeline`]: subpixel sampling, low-pass filter, quantization,
//!   dithering, packing.
//!
//! # Linear light
//!
//! With `gamma_aware` set (the default) samples are decoded to linear light
//! before error is added and quantized, and the error left behind is
//! measured against the linear value of the chosen level. Dithering in sRGB
//! instead reproduces mid-tones far too bright: sRGB 128 is only about 22%
//! of full intensity and must come out as roughly one lit pixel in five.

pub mod canvas;
pub mod color;
pub mod dither;
pub mod error;
pub mod filter;
pub mod output;
pub mod pixel;
pub mod preprocess;


pub use canvas::{convert_canvas, Canvas, Rect};
pub use color::GammaTables;
pub use dither::{BitDepth, DitherMethod, MonoKernel};
pub use error::PipelineError;
pub use filter::{ColorMode, FilterConfig, FilterPipeline, Subpixel};
pub use output::copy_rows_strided;
pub use pixel::{convert_pixel, PixelFormat, Rgba};
pub use preprocess::scale_fit;
