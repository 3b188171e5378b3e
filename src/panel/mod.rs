//! Panel presentation.
//!
//! [`PanelPresenter`] owns the backbuffer the filter pipeline writes into
//! and turns `present` calls into update requests for a [`PanelBackend`].
//! Two backends exist: an in-memory simulator and, on Linux, the i.MX EPDC
//! framebuffer.

#[cfg(target_os = "linux")]
pub mod fbdev;
pub mod protocol;
pub mod simulator;

use eink_pipeline::{Canvas, PixelFormat, Rect};

use crate::error::PanelError;
use crate::models::WaveformMode;

pub use protocol::{
    CompletionTracker, MarkerSequence, Temperature, UpdateMarker, UpdateMode, UpdateRequest,
};
pub use simulator::SimulatorBackend;

/// A display the presenter can drive.
///
/// Backends hold their device resources for their whole lifetime and
/// release them on drop.
pub trait PanelBackend {
    /// Panel width and height in pixels.
    fn native_size(&self) -> (u32, u32);

    /// Pixel format the backbuffer must use.
    fn backbuffer_format(&self) -> PixelFormat;

    /// Send `request.region` of `backbuffer` to the panel.
    fn submit(&mut self, backbuffer: &Canvas, request: &UpdateRequest) -> Result<(), PanelError>;

    /// Block until the update tagged `marker` has finished.
    fn wait_for_completion(&mut self, marker: UpdateMarker) -> Result<(), PanelError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

impl<B: PanelBackend + ?Sized> PanelBackend for Box<B> {
    fn native_size(&self) -> (u32, u32) {
        (**self).native_size()
    }

    fn backbuffer_format(&self) -> PixelFormat {
        (**self).backbuffer_format()
    }

    fn submit(&mut self, backbuffer: &Canvas, request: &UpdateRequest) -> Result<(), PanelError> {
        (**self).submit(backbuffer, request)
    }

    fn wait_for_completion(&mut self, marker: UpdateMarker) -> Result<(), PanelError> {
        (**self).wait_for_completion(marker)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Packed value of a white pixel in `format`.
fn white(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Argb8888 | PixelFormat::Rgba8888 => 0xffff_ffff,
        PixelFormat::Rgb888 => 0x00ff_ffff,
        _ => 0xff,
    }
}

/// Single owner of a panel and its backbuffer.
pub struct PanelPresenter<B: PanelBackend> {
    backend: B,
    backbuffer: Canvas,
    markers: MarkerSequence,
}

impl<B: PanelBackend> PanelPresenter<B> {
    /// Take ownership of `backend`, allocate a white backbuffer at the
    /// panel's native size and clear the panel with a waited `Init` update.
    pub fn init(mut backend: B) -> Result<Self, PanelError> {
        let (width, height) = backend.native_size();
        let format = backend.backbuffer_format();
        let mut backbuffer = Canvas::new(width, height, format)?;
        backbuffer.fill(white(format));

        let mut markers = MarkerSequence::default();
        let marker = markers.next_marker();
        let request = UpdateRequest {
            mode: UpdateMode::Full,
            waveform: WaveformMode::Init,
            region: Rect::new(0, 0, width, height),
            temperature: Temperature::Ambient,
            marker,
        };
        backend.submit(&backbuffer, &request)?;
        backend.wait_for_completion(marker)?;

        tracing::info!(
            panel = %backend.describe(),
            width,
            height,
            format = %format,
            "Panel initialised"
        );

        Ok(Self {
            backend,
            backbuffer,
            markers,
        })
    }

    pub fn backbuffer(&self) -> &Canvas {
        &self.backbuffer
    }

    /// The buffer the next `present` will show.
    pub fn backbuffer_mut(&mut self) -> &mut Canvas {
        &mut self.backbuffer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Show `rect` of the backbuffer (zero rect: everything).
    ///
    /// With `wait` set the call returns only once the panel has finished
    /// this exact update. Failures to send or confirm the update come back
    /// as [`PanelError::DegradedUpdate`]; the presenter stays usable.
    pub fn present(
        &mut self,
        rect: Rect,
        waveform: WaveformMode,
        partial: bool,
        wait: bool,
    ) -> Result<(), PanelError> {
        let region = rect.or_full(self.backbuffer.width(), self.backbuffer.height());
        region.check_within(self.backbuffer.width(), self.backbuffer.height())?;

        let marker = if wait {
            self.markers.next_marker()
        } else {
            UpdateMarker::NONE
        };
        let request = UpdateRequest {
            mode: if partial {
                UpdateMode::Partial
            } else {
                UpdateMode::Full
            },
            waveform,
            region,
            temperature: Temperature::Ambient,
            marker,
        };

        tracing::debug!(?request, "Presenting");
        self.backend
            .submit(&self.backbuffer, &request)
            .map_err(|e| degraded("send update", e))?;
        if wait {
            self.backend
                .wait_for_completion(marker)
                .map_err(|e| degraded("wait for update", e))?;
        }
        Ok(())
    }

    /// Release the panel.
    pub fn deinit(self) {
        tracing::debug!(panel = %self.backend.describe(), "Releasing panel");
    }
}

fn degraded(action: &str, error: PanelError) -> PanelError {
    tracing::warn!(%error, "Failed to {action}");
    match error {
        PanelError::DegradedUpdate(_) => error,
        other => PanelError::DegradedUpdate(format!("{action}: {other}")),
    }
}
