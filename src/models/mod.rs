pub mod config;
pub mod waveform;

pub use config::{AppConfig, BackendKind, DisplayConfig};
pub use waveform::WaveformMode;
