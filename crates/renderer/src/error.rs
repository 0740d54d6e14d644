//! Error types for rendering.

use quickview_common::QuickViewError;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Unknown render target {0}")]
    UnknownTarget(u64),

    #[error("Unknown representation {0}")]
    UnknownRepresentation(u64),

    #[error("Unknown colormap preset '{0}'")]
    UnknownPreset(String),

    /// Preset file could not be parsed
    #[error("Invalid preset: {0}")]
    InvalidPreset(String),

    #[error("PNG encoding failed: {0}")]
    Encoding(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<RenderError> for QuickViewError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::UnknownTarget(_)
            | RenderError::UnknownRepresentation(_)
            | RenderError::UnknownPreset(_) => QuickViewError::reference_not_found(err.to_string()),
            RenderError::InvalidPreset(_) => QuickViewError::StateFile(err.to_string()),
            RenderError::Encoding(msg) | RenderError::Io(msg) => QuickViewError::Io(msg),
        }
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        RenderError::InvalidPreset(err.to_string())
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err.to_string())
    }
}
