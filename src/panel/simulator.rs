//! In-memory panel.
//!
//! The visible surface is an ARGB8888 canvas. Updates are synchronous: the
//! requested region is copied to the surface and the marker completes
//! before `submit` returns.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eink_pipeline::{Canvas, PipelineError, PixelFormat};

use super::protocol::{CompletionTracker, UpdateMarker, UpdateRequest};
use super::PanelBackend;
use crate::error::PanelError;
use crate::models::WaveformMode;

pub struct SimulatorBackend {
    surface: Canvas,
    tracker: Arc<CompletionTracker>,
    snapshot: Option<PathBuf>,
    last_waveform: Option<WaveformMode>,
    updates: u32,
}

impl SimulatorBackend {
    pub fn new(width: u32, height: u32) -> Result<Self, PanelError> {
        let mut surface = Canvas::new(width, height, PixelFormat::Argb8888)?;
        surface.fill(0xff00_0000);
        Ok(Self {
            surface,
            tracker: Arc::new(CompletionTracker::new()),
            snapshot: None,
            last_waveform: None,
            updates: 0,
        })
    }

    /// Write the surface to `path` as PNG after every update.
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    /// What is currently on the simulated glass.
    pub fn surface(&self) -> &Canvas {
        &self.surface
    }

    pub fn last_waveform(&self) -> Option<WaveformMode> {
        self.last_waveform
    }

    pub fn update_count(&self) -> u32 {
        self.updates
    }

    pub fn tracker(&self) -> Arc<CompletionTracker> {
        Arc::clone(&self.tracker)
    }

    /// Encode the surface as an 8-bit RGBA PNG at `path`.
    pub fn write_png(&self, path: &Path) -> Result<(), PanelError> {
        let file = File::create(path).map_err(|e| {
            PanelError::DegradedUpdate(format!("snapshot {}: {e}", path.display()))
        })?;
        let mut encoder = png::Encoder::new(
            BufWriter::new(file),
            self.surface.width(),
            self.surface.height(),
        );
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);

        let rgba: Vec<u8> = self
            .surface
            .as_bytes()
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect();

        let mut writer = encoder
            .write_header()
            .map_err(|e| PanelError::DegradedUpdate(format!("PNG encode error: {e}")))?;
        writer
            .write_image_data(&rgba)
            .map_err(|e| PanelError::DegradedUpdate(format!("PNG encode error: {e}")))?;
        Ok(())
    }
}

impl PanelBackend for SimulatorBackend {
    fn native_size(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }

    fn backbuffer_format(&self) -> PixelFormat {
        PixelFormat::Argb8888
    }

    fn submit(&mut self, backbuffer: &Canvas, request: &UpdateRequest) -> Result<(), PanelError> {
        if backbuffer.format() != PixelFormat::Argb8888 {
            return Err(PipelineError::FormatMismatch {
                expected: PixelFormat::Argb8888,
                actual: backbuffer.format(),
            }
            .into());
        }
        if backbuffer.width() != self.surface.width()
            || backbuffer.height() != self.surface.height()
        {
            return Err(PipelineError::DimensionMismatch {
                src_width: backbuffer.width(),
                src_height: backbuffer.height(),
                dst_width: self.surface.width(),
                dst_height: self.surface.height(),
            }
            .into());
        }
        let region = request.region;
        region.check_within(self.surface.width(), self.surface.height())?;

        let stride = self.surface.stride();
        let start_x = region.x as usize * 4;
        let row_len = region.w as usize * 4;
        let src = backbuffer.as_bytes();
        let dst = self.surface.as_bytes_mut();
        for y in region.y as usize..(region.y + region.h) as usize {
            let at = y * stride + start_x;
            dst[at..at + row_len].copy_from_slice(&src[at..at + row_len]);
        }

        self.updates += 1;
        self.last_waveform = Some(request.waveform);
        tracing::debug!(
            update = self.updates,
            waveform = %request.waveform,
            mode = ?request.mode,
            region = ?region,
            "Simulated update"
        );

        if let Some(path) = &self.snapshot {
            self.write_png(path)?;
        }

        self.tracker.complete(request.marker);
        Ok(())
    }

    fn wait_for_completion(&mut self, marker: UpdateMarker) -> Result<(), PanelError> {
        self.tracker.wait(marker);
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "simulator {}x{}",
            self.surface.width(),
            self.surface.height()
        )
    }
}
