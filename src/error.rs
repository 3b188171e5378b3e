use eink_pipeline::PipelineError;
use thiserror::Error;

/// Errors raised by the panel layer.
#[derive(Debug, Error)]
pub enum PanelError {
    /// A device, mapping or file needed at startup could not be acquired.
    #[error("Resource unavailable: {resource}: {reason}")]
    ResourceUnavailable { resource: String, reason: String },

    /// An update could not be sent or confirmed. The frame may be stale but
    /// the panel stays usable.
    #[error("Display update failed: {0}")]
    DegradedUpdate(String),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

impl PanelError {
    pub fn unavailable(resource: impl Into<String>, reason: impl ToString) -> Self {
        PanelError::ResourceUnavailable {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised while loading and showing an image.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Panel error: {0}")]
    Panel(#[from] PanelError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}
