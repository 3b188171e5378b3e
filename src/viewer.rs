//! End-to-end driver: decode, convert, scale, filter, present.

use std::path::Path;
use std::time::Instant;

use eink_pipeline::{scale_fit, Canvas, ColorMode, FilterPipeline, Rect};

use crate::error::ViewerError;
use crate::loader::load_image;
use crate::models::{AppConfig, DisplayConfig};
use crate::panel::{PanelBackend, PanelPresenter};

/// Shows images on one panel with one filter configuration.
pub struct Viewer<B: PanelBackend> {
    presenter: PanelPresenter<B>,
    pipeline: FilterPipeline,
    display: DisplayConfig,
}

impl<B: PanelBackend> Viewer<B> {
    /// Initialise the panel behind `backend` and build the filter pipeline.
    pub fn new(backend: B, config: &AppConfig) -> Result<Self, ViewerError> {
        let pipeline = FilterPipeline::new(config.filter.clone())?;
        let presenter = PanelPresenter::init(backend)?;
        Ok(Self {
            presenter,
            pipeline,
            display: config.display.clone(),
        })
    }

    pub fn presenter(&self) -> &PanelPresenter<B> {
        &self.presenter
    }

    /// Decode `path` and show it. Returns the panel region the image
    /// occupies.
    pub fn show_file(&mut self, path: &Path) -> Result<Rect, ViewerError> {
        let started = Instant::now();
        let image = load_image(path)?;
        tracing::info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            format = %image.format(),
            elapsed_ms = elapsed_ms(started),
            "Loaded image"
        );
        self.show(&image)
    }

    /// Fit `image` onto the panel, letterboxed with the configured
    /// background, and present it.
    pub fn show(&mut self, image: &Canvas) -> Result<Rect, ViewerError> {
        let color_mode = self.pipeline.config().color_mode;
        let source_format = color_mode.source_format();

        let started = Instant::now();
        let converted;
        let source = if image.format() == source_format {
            image
        } else {
            converted = Canvas::converted(image, source_format)?;
            tracing::info!(
                from = %image.format(),
                to = %source_format,
                elapsed_ms = elapsed_ms(started),
                "Converted image"
            );
            &converted
        };

        let started = Instant::now();
        let backbuffer = self.presenter.backbuffer();
        let mut scaled = Canvas::new(backbuffer.width(), backbuffer.height(), source_format)?;
        scaled.fill(background(color_mode, self.display.background));
        let region = scale_fit(source, &mut scaled)?;
        tracing::info!(
            region = ?region,
            elapsed_ms = elapsed_ms(started),
            "Scaled image"
        );

        let started = Instant::now();
        self.pipeline
            .process(&scaled, Rect::ZERO, Rect::ZERO, self.presenter.backbuffer_mut())?;
        tracing::info!(elapsed_ms = elapsed_ms(started), "Filtered image");

        let started = Instant::now();
        self.presenter.present(
            Rect::ZERO,
            self.display.waveform,
            self.display.partial,
            self.display.wait,
        )?;
        tracing::info!(
            waveform = %self.display.waveform,
            partial = self.display.partial,
            wait = self.display.wait,
            elapsed_ms = elapsed_ms(started),
            "Presented image"
        );
        Ok(region)
    }

    /// Release the panel.
    pub fn close(self) {
        self.presenter.deinit();
    }
}

/// Letterbox fill in the pipeline's source format.
fn background(mode: ColorMode, level: u8) -> u32 {
    match mode {
        ColorMode::Monochrome => level as u32,
        ColorMode::Subpixel => level as u32 * 0x0001_0101,
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
