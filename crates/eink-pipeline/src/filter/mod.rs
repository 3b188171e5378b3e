//! The filter pipeline: turns a scaled source block into panel pixels.
//!
//! One [`FilterPipeline::process`] call runs three stages over a block:
//!
//! 1. **Sampling**: reduce the source to one channel per panel pixel. On
//!    colour-filter-array panels each pixel takes the source channel of the
//!    filter dot above it, optionally low-pass filtered against its four
//!    neighbours to soften colour fringes.
//! 2. **Quantization**: raster-order reduction to the output depth, with the
//!    configured [`DitherMethod`], in linear light when gamma-aware.
//! 3. **Packing**: store the result in the target's native layout.
//!
//! The whole behaviour matrix is chosen at runtime through [`FilterConfig`].

mod subpixel;

use std::sync::Arc;

pub use subpixel::Subpixel;

use crate::canvas::{Canvas, Rect};
use crate::color::GammaTables;
use crate::dither::{
    blue_noise, ordered, BitDepth, DitherMethod, ErrorBuffer, Kernel, MonoKernel, SUBPIXEL,
};
use crate::error::PipelineError;
use crate::output;
use crate::pixel::PixelFormat;

/// How the panel produces colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ColorMode {
    /// Greyscale panel fed from `Y8` sources.
    #[default]
    Monochrome,
    /// Greyscale panel under a colour filter array, fed from `Rgb888`.
    Subpixel,
}

impl ColorMode {
    /// Source format the pipeline accepts in this mode.
    pub const fn source_format(self) -> PixelFormat {
        match self {
            ColorMode::Monochrome => PixelFormat::Y8,
            ColorMode::Subpixel => PixelFormat::Rgb888,
        }
    }
}

/// Runtime filter configuration.
///
/// # Defaults
///
/// - Monochrome, 1bpp output
/// - Floyd-Steinberg error diffusion in linear light, gamma 2.2
/// - Low-pass filter on (only affects subpixel mode), brighten off
///
/// # Example
///
/// ```
/// use eink_pipeline::{BitDepth, ColorMode, DitherMethod, FilterConfig};
///
/// let config = FilterConfig::new()
///     .color_mode(ColorMode::Subpixel)
///     .depth(BitDepth::Four)
///     .dither(DitherMethod::Ordered);
/// assert!(config.lpf);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilterConfig {
    pub color_mode: ColorMode,

    /// Output grey depth.
    pub depth: BitDepth,

    pub dither: DitherMethod,

    /// Diffusion kernel for monochrome panels. Subpixel mode always uses
    /// its own same-colour kernel.
    pub kernel: MonoKernel,

    /// Quantize and diffuse in linear light.
    pub gamma_aware: bool,

    /// Exponent of the panel's tone curve.
    pub gamma: f32,

    /// Map the linear value back through the inverse curve before
    /// quantizing. Only meaningful when `gamma_aware` is set.
    pub srgb_requantize: bool,

    /// Low-pass filter subpixel samples.
    pub lpf: bool,

    /// OR-merge each subpixel into its right and lower-right neighbours on
    /// `Argb8888` targets. Simulation only.
    pub brighten: bool,

    /// Added to every ordered-dither threshold.
    pub ordered_bias: i32,

    /// Blue noise amplitude, 128 = full tile range.
    pub noise_strength: u8,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Monochrome,
            depth: BitDepth::One,
            dither: DitherMethod::ErrorDiffusion,
            kernel: MonoKernel::FloydSteinberg,
            gamma_aware: true,
            gamma: 2.2,
            srgb_requantize: false,
            lpf: true,
            brighten: false,
            ordered_bias: ordered::DEFAULT_BIAS,
            noise_strength: 128,
        }
    }
}

impl FilterConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    #[inline]
    pub fn depth(mut self, depth: BitDepth) -> Self {
        self.depth = depth;
        self
    }

    #[inline]
    pub fn dither(mut self, method: DitherMethod) -> Self {
        self.dither = method;
        self
    }

    #[inline]
    pub fn kernel(mut self, kernel: MonoKernel) -> Self {
        self.kernel = kernel;
        self
    }

    #[inline]
    pub fn gamma_aware(mut self, enabled: bool) -> Self {
        self.gamma_aware = enabled;
        self
    }

    #[inline]
    pub fn gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    #[inline]
    pub fn srgb_requantize(mut self, enabled: bool) -> Self {
        self.srgb_requantize = enabled;
        self
    }

    #[inline]
    pub fn lpf(mut self, enabled: bool) -> Self {
        self.lpf = enabled;
        self
    }

    #[inline]
    pub fn brighten(mut self, enabled: bool) -> Self {
        self.brighten = enabled;
        self
    }

    #[inline]
    pub fn ordered_bias(mut self, bias: i32) -> Self {
        self.ordered_bias = bias;
        self
    }

    #[inline]
    pub fn noise_strength(mut self, strength: u8) -> Self {
        self.noise_strength = strength;
        self
    }

    fn kernel_ref(&self) -> &'static Kernel {
        match self.color_mode {
            ColorMode::Subpixel => &SUBPIXEL,
            ColorMode::Monochrome => self.kernel.kernel(),
        }
    }
}

/// A configured filter pipeline.
///
/// Cheap to clone; the gamma tables are shared.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    config: FilterConfig,
    tables: Arc<GammaTables>,
}

impl FilterPipeline {
    /// Build a pipeline, computing the gamma tables for `config.gamma`.
    pub fn new(config: FilterConfig) -> Result<Self, PipelineError> {
        let tables = Arc::new(GammaTables::new(config.gamma)?);
        Ok(Self { config, tables })
    }

    /// Build a pipeline around existing tables. `config.gamma` is ignored.
    pub fn with_tables(config: FilterConfig, tables: Arc<GammaTables>) -> Self {
        Self { config, tables }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn tables(&self) -> &Arc<GammaTables> {
        &self.tables
    }

    /// Filter `src_rect` of `src` into `target` with its top-left corner at
    /// (`dst_rect.x`, `dst_rect.y`).
    ///
    /// A zero `src_rect` selects the whole source. The destination block has
    /// the size of the source region, so `dst_rect.w` and `dst_rect.h` are
    /// not consulted. All checks happen before `target` is written.
    pub fn process(
        &self,
        src: &Canvas,
        src_rect: Rect,
        dst_rect: Rect,
        target: &mut Canvas,
    ) -> Result<(), PipelineError> {
        let expected = self.config.color_mode.source_format();
        if src.format() != expected {
            return Err(PipelineError::FormatMismatch {
                expected,
                actual: src.format(),
            });
        }
        if !matches!(
            target.format(),
            PixelFormat::Argb8888 | PixelFormat::Y8 | PixelFormat::C8
        ) {
            return Err(PipelineError::UnsupportedTarget(target.format()));
        }

        let region = src_rect.or_full(src.width(), src.height());
        region.check_within(src.width(), src.height())?;
        let block = Rect::new(dst_rect.x, dst_rect.y, region.w, region.h);
        block.check_within(target.width(), target.height())?;

        if region.w == 0 || region.h == 0 {
            return Ok(());
        }

        let mut plane = self.sample(src, region, block, target.height());
        self.quantize(&mut plane, region.w as usize, region.h as usize);

        output::pack(&plane, block, self.config.color_mode, target);
        if self.config.brighten && target.format() == PixelFormat::Argb8888 {
            output::brighten(block, target);
        }
        Ok(())
    }

    /// Stage A: one byte per panel pixel, block-sized and tightly packed.
    fn sample(&self, src: &Canvas, region: Rect, block: Rect, panel_height: u32) -> Vec<u8> {
        let (w, h) = (region.w as usize, region.h as usize);
        let bytes = src.as_bytes();
        let stride = src.stride();
        let bytes_pp = src.format().channels();

        let mut plane = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                let channel = match self.config.color_mode {
                    ColorMode::Monochrome => 0,
                    ColorMode::Subpixel => {
                        Subpixel::at(block.x + x as u32, block.y + y as u32, panel_height)
                            .channel()
                    }
                };
                let at = |x: usize, y: usize| -> u32 {
                    let sx = region.x as usize + x;
                    let sy = region.y as usize + y;
                    bytes[sy * stride + sx * bytes_pp + channel] as u32
                };

                let centre = at(x, y);
                let value = if self.config.lpf && self.config.color_mode == ColorMode::Subpixel {
                    let up = if y == 0 { centre } else { at(x, y - 1) };
                    let down = if y == h - 1 { centre } else { at(x, y + 1) };
                    let left = if x == 0 { centre } else { at(x - 1, y) };
                    let right = if x == w - 1 { centre } else { at(x + 1, y) };
                    (centre >> 1) + (up >> 3) + (down >> 3) + (left >> 3) + (right >> 3)
                } else {
                    centre
                };
                plane.push(value as u8);
            }
        }
        plane
    }

    /// Stage B: quantize `plane` in place in raster order.
    fn quantize(&self, plane: &mut [u8], w: usize, h: usize) {
        let config = &self.config;
        let tables = &self.tables;
        let subpixel = config.color_mode == ColorMode::Subpixel;
        let kernel = config.kernel_ref();

        let mut errors = (config.dither == DitherMethod::ErrorDiffusion)
            .then(|| ErrorBuffer::new(w, kernel.max_dy + 1));
        let (mut carried_min, mut carried_max) = (0.0f32, 0.0f32);

        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                let sample = plane[idx];
                let mut v = if config.gamma_aware {
                    tables.srgb_to_linear(sample)
                } else {
                    sample as f32
                };

                match config.dither {
                    DitherMethod::ErrorDiffusion => {
                        if let Some(errors) = errors.as_ref() {
                            let carried = errors.get_accumulated(x);
                            carried_min = carried_min.min(carried);
                            carried_max = carried_max.max(carried);
                            v += carried;
                        }
                    }
                    DitherMethod::Ordered => {
                        v += (ordered::threshold(subpixel, x, y) + config.ordered_bias) as f32;
                    }
                    DitherMethod::BlueNoise => {
                        let noise = blue_noise::noise(subpixel, x, y);
                        v += (noise * config.noise_strength as i32 / 128) as f32;
                    }
                    DitherMethod::None => {}
                }

                let v = v.clamp(0.0, 255.0);
                let level = if config.gamma_aware && config.srgb_requantize {
                    tables.linear_to_srgb(v)
                } else {
                    v as u8
                };
                let q = config.depth.quantize(level);

                if let Some(errors) = errors.as_mut() {
                    let reference = if config.gamma_aware {
                        tables.srgb_to_linear(q)
                    } else {
                        q as f32
                    };
                    errors.diffuse(kernel, x, v - reference);
                }

                plane[idx] = q;
            }
            if let Some(errors) = errors.as_mut() {
                errors.advance_row();
            }
        }

        if errors.is_some() {
            tracing::debug!(
                min = carried_min,
                max = carried_max,
                width = w,
                height = h,
                "Accumulated diffusion error"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grey(width: u32, height: u32, value: u8) -> Canvas {
        Canvas::from_raw(
            width,
            height,
            PixelFormat::Y8,
            vec![value; (width * height) as usize],
        )
        .unwrap()
    }

    fn run(config: FilterConfig, src: &Canvas, target_format: PixelFormat) -> Canvas {
        let mut target = Canvas::new(src.width(), src.height(), target_format).unwrap();
        FilterPipeline::new(config)
            .unwrap()
            .process(src, Rect::ZERO, Rect::ZERO, &mut target)
            .unwrap();
        target
    }

    #[test]
    fn test_default_config() {
        let config = FilterConfig::default();
        assert_eq!(config.color_mode, ColorMode::Monochrome);
        assert_eq!(config.depth, BitDepth::One);
        assert_eq!(config.dither, DitherMethod::ErrorDiffusion);
        assert!(config.gamma_aware);
        assert_eq!(config.gamma, 2.2);
        assert_eq!(config.ordered_bias, 10);
        assert!(!config.brighten);
    }

    #[test]
    fn test_builder_chain() {
        let config = FilterConfig::new()
            .color_mode(ColorMode::Subpixel)
            .depth(BitDepth::Four)
            .dither(DitherMethod::BlueNoise)
            .kernel(MonoKernel::SierraTwoRow)
            .gamma_aware(false)
            .gamma(1.8)
            .srgb_requantize(true)
            .lpf(false)
            .brighten(true)
            .ordered_bias(0)
            .noise_strength(64);
        assert_eq!(config.color_mode, ColorMode::Subpixel);
        assert_eq!(config.depth, BitDepth::Four);
        assert_eq!(config.dither, DitherMethod::BlueNoise);
        assert_eq!(config.kernel, MonoKernel::SierraTwoRow);
        assert!(!config.gamma_aware);
        assert_eq!(config.gamma, 1.8);
        assert!(config.srgb_requantize);
        assert!(!config.lpf);
        assert!(config.brighten);
        assert_eq!(config.ordered_bias, 0);
        assert_eq!(config.noise_strength, 64);
    }

    #[test]
    fn test_invalid_gamma_rejected_at_construction() {
        assert!(FilterPipeline::new(FilterConfig::new().gamma(-2.0)).is_err());
    }

    #[test]
    fn test_rejects_wrong_source_format() {
        let src = grey(2, 2, 0);
        let mut target = Canvas::new(2, 2, PixelFormat::Y8).unwrap();
        let pipeline =
            FilterPipeline::new(FilterConfig::new().color_mode(ColorMode::Subpixel)).unwrap();
        assert_eq!(
            pipeline.process(&src, Rect::ZERO, Rect::ZERO, &mut target),
            Err(PipelineError::FormatMismatch {
                expected: PixelFormat::Rgb888,
                actual: PixelFormat::Y8
            })
        );
    }

    #[test]
    fn test_rejects_unsupported_target() {
        let src = grey(2, 2, 0);
        let mut target = Canvas::new(2, 2, PixelFormat::Rgb565).unwrap();
        let pipeline = FilterPipeline::new(FilterConfig::new()).unwrap();
        assert_eq!(
            pipeline.process(&src, Rect::ZERO, Rect::ZERO, &mut target),
            Err(PipelineError::UnsupportedTarget(PixelFormat::Rgb565))
        );
    }

    #[test]
    fn test_rejects_block_outside_target_without_writing() {
        let src = grey(4, 4, 0xff);
        let mut target = Canvas::new(4, 4, PixelFormat::Y8).unwrap();
        target.fill(0x33);
        let pipeline = FilterPipeline::new(FilterConfig::new()).unwrap();
        let result = pipeline.process(&src, Rect::ZERO, Rect::new(1, 0, 0, 0), &mut target);
        assert!(matches!(result, Err(PipelineError::RegionOutOfBounds { .. })));
        assert!(target.as_bytes().iter().all(|&b| b == 0x33));
    }

    #[test]
    fn test_rejects_source_rect_outside_source() {
        let src = grey(4, 4, 0xff);
        let mut target = Canvas::new(8, 8, PixelFormat::Y8).unwrap();
        let pipeline = FilterPipeline::new(FilterConfig::new()).unwrap();
        let result = pipeline.process(&src, Rect::new(2, 2, 3, 1), Rect::ZERO, &mut target);
        assert!(matches!(result, Err(PipelineError::RegionOutOfBounds { .. })));
    }

    #[test]
    fn test_block_lands_at_destination_offset() {
        let src = grey(2, 2, 0xff);
        let mut target = Canvas::new(4, 4, PixelFormat::Y8).unwrap();
        let pipeline = FilterPipeline::new(FilterConfig::new()).unwrap();
        pipeline
            .process(&src, Rect::ZERO, Rect::new(1, 2, 0, 0), &mut target)
            .unwrap();
        #[rustfmt::skip]
        let expected = [
            0, 0,    0,    0,
            0, 0,    0,    0,
            0, 0xff, 0xff, 0,
            0, 0xff, 0xff, 0,
        ];
        assert_eq!(target.as_bytes(), &expected);
    }

    #[test]
    fn test_source_sub_rect_selects_pixels() {
        let src = Canvas::from_raw(2, 2, PixelFormat::Y8, vec![0, 0, 0, 0xff]).unwrap();
        let mut target = Canvas::new(1, 1, PixelFormat::Y8).unwrap();
        let pipeline = FilterPipeline::new(FilterConfig::new()).unwrap();
        pipeline
            .process(&src, Rect::new(1, 1, 1, 1), Rect::ZERO, &mut target)
            .unwrap();
        assert_eq!(target.as_bytes(), &[0xff]);
    }

    #[test]
    fn test_mono_argb_output_is_grey_and_opaque() {
        let config = FilterConfig::new()
            .depth(BitDepth::Eight)
            .dither(DitherMethod::None)
            .gamma_aware(false);
        let target = run(config, &grey(2, 1, 0x42), PixelFormat::Argb8888);
        assert_eq!(target.pixel(0, 0), 0xff424242);
        assert_eq!(target.pixel(1, 0), 0xff424242);
    }

    #[test]
    fn test_subpixel_sampling_picks_filter_channel() {
        // height 1: x=0 Blue, x=1 Green, x=2 Red
        let src = Canvas::from_raw(
            3,
            1,
            PixelFormat::Rgb888,
            vec![0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80, 0x90],
        )
        .unwrap();
        let config = FilterConfig::new()
            .color_mode(ColorMode::Subpixel)
            .depth(BitDepth::Eight)
            .dither(DitherMethod::None)
            .gamma_aware(false)
            .lpf(false);
        let target = run(config, &src, PixelFormat::C8);
        assert_eq!(target.as_bytes(), &[0x30, 0x50, 0x70]);
    }

    #[test]
    fn test_lpf_uses_same_channel_neighbours() {
        // height 1: x=1 samples Green, neighbours read Green too
        let src = Canvas::from_raw(
            3,
            1,
            PixelFormat::Rgb888,
            vec![0x80, 0x80, 0x80, 0x40, 0x40, 0x40, 0xff, 0xff, 0xff],
        )
        .unwrap();
        let config = FilterConfig::new()
            .color_mode(ColorMode::Subpixel)
            .depth(BitDepth::Eight)
            .dither(DitherMethod::None)
            .gamma_aware(false);
        let target = run(config, &src, PixelFormat::C8);
        // centre 0x40: 0x20 + up 0x08 + down 0x08 + left 0x10 + right 0x1f
        assert_eq!(target.pixel(1, 0), 0x20 + 0x08 + 0x08 + 0x10 + 0x1f);
    }

    #[test]
    fn test_lpf_preserves_flat_regions() {
        let src = Canvas::from_raw(3, 3, PixelFormat::Rgb888, vec![0xc8; 27]).unwrap();
        let config = FilterConfig::new()
            .color_mode(ColorMode::Subpixel)
            .depth(BitDepth::Eight)
            .dither(DitherMethod::None)
            .gamma_aware(false);
        let target = run(config, &src, PixelFormat::C8);
        // 0x64 + 4 * 0x19 = 0xc8
        assert!(target.as_bytes().iter().all(|&b| b == 0xc8));
    }

    #[test]
    fn test_ordered_dither_adds_threshold_and_bias() {
        let config = FilterConfig::new()
            .dither(DitherMethod::Ordered)
            .gamma_aware(false);
        // 0x80 + (-128 + 10) < 0x80, 0x80 + (0 + 10) >= 0x80
        let target = run(config, &grey(2, 1, 0x80), PixelFormat::Y8);
        assert_eq!(target.as_bytes(), &[0x00, 0xff]);
    }

    #[test]
    fn test_blue_noise_zero_strength_is_plain_threshold() {
        let config = FilterConfig::new()
            .dither(DitherMethod::BlueNoise)
            .noise_strength(0)
            .gamma_aware(false);
        let target = run(config, &grey(4, 4, 0x90), PixelFormat::Y8);
        assert!(target.as_bytes().iter().all(|&b| b == 0xff));
    }

    #[test]
    fn test_srgb_requantize_brightens_mid_grey() {
        let config = FilterConfig::new()
            .dither(DitherMethod::None)
            .srgb_requantize(true);
        // 129 -> linear ~56.9 -> back to 128 before the 1bpp threshold
        let target = run(config, &grey(1, 1, 0x81), PixelFormat::Y8);
        assert_eq!(target.as_bytes(), &[0xff]);
    }

    #[test]
    fn test_error_diffusion_spreads_first_pixel_error() {
        let config = FilterConfig::new().gamma_aware(false);
        // 0x60 alone rounds down; with 7/16 of its error the neighbour
        // 0x60 + 0x2a crosses the threshold
        let target = run(config, &grey(2, 1, 0x60), PixelFormat::Y8);
        assert_eq!(target.as_bytes(), &[0x00, 0xff]);
    }
}
