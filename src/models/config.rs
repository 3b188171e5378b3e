use clap::ValueEnum;
use eink_pipeline::FilterConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::WaveformMode;
use crate::error::ViewerError;

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "CONFIG_FILE";

/// Application configuration loaded from a YAML file.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Output device settings
    pub display: DisplayConfig,

    /// Image pipeline settings
    pub filter: FilterConfig,
}

/// Which panel backend to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
pub enum BackendKind {
    /// In-memory ARGB surface, optionally written to a PNG snapshot
    #[default]
    #[serde(rename = "sim")]
    #[value(name = "sim")]
    Simulator,
    /// i.MX EPDC framebuffer device
    #[serde(rename = "fbdev")]
    #[value(name = "fbdev")]
    Fbdev,
}

/// Output device settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub backend: BackendKind,

    /// Simulated panel width (the framebuffer reports its own size)
    pub width: u32,

    /// Simulated panel height
    pub height: u32,

    /// Write the simulated surface to this PNG after every update
    pub snapshot: Option<PathBuf>,

    /// Waveform for the image update
    pub waveform: WaveformMode,

    /// Use a partial update instead of a full one
    pub partial: bool,

    /// Block until the panel reports the update complete
    pub wait: bool,

    /// Grey level of the letterbox bars
    pub background: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Simulator,
            width: 1024,
            height: 768,
            snapshot: None,
            waveform: WaveformMode::Gc16,
            partial: false,
            wait: true,
            background: 0xff,
        }
    }
}

impl AppConfig {
    /// Parse a YAML document. Missing keys take their defaults.
    pub fn from_yaml(content: &str) -> Result<Self, ViewerError> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| ViewerError::Config(e.to_string()))?;
        if config.display.width == 0 || config.display.height == 0 {
            return Err(ViewerError::Config(format!(
                "display size must be non-zero, got {}x{}",
                config.display.width, config.display.height
            )));
        }
        Ok(config)
    }

    /// Read and parse `path`.
    pub fn from_file(path: &Path) -> Result<Self, ViewerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ViewerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&content)
    }

    /// Load the configuration.
    ///
    /// An explicit `path` must be readable and valid. Without one, the file
    /// named by `CONFIG_FILE` is tried and any problem with it falls back to
    /// defaults with a warning.
    pub fn load(path: Option<&Path>) -> Result<Self, ViewerError> {
        if let Some(path) = path {
            let config = Self::from_file(path)?;
            tracing::info!(path = %path.display(), "Loaded configuration");
            return Ok(config);
        }

        match std::env::var(CONFIG_ENV) {
            Ok(env_path) => match Self::from_file(Path::new(&env_path)) {
                Ok(config) => {
                    tracing::info!(path = %env_path, "Loaded configuration");
                    Ok(config)
                }
                Err(e) => {
                    tracing::warn!(%e, "Failed to load config, using defaults");
                    Ok(Self::default())
                }
            },
            Err(_) => {
                tracing::debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }
}
