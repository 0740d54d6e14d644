//! Error types for QuickView.

use thiserror::Error;

/// Result type alias using QuickViewError.
pub type QvResult<T> = Result<T, QuickViewError>;

/// Primary error type for geometry, projection, pipeline and view operations.
#[derive(Debug, Error)]
pub enum QuickViewError {
    // === Geometry Errors ===
    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error("Invalid range: {0}")]
    Range(String),

    // === Projection Errors ===
    #[error("Unsupported projection: {0}")]
    UnsupportedProjection(String),

    // === Pipeline Errors ===
    #[error("Pipeline load failed: {0}")]
    PipelineLoad(String),

    // === View Errors ===
    #[error("No view registered for '{0}'")]
    ReferenceNotFound(String),

    // === Persistence Errors ===
    #[error("Invalid state file: {0}")]
    StateFile(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl QuickViewError {
    pub fn shape(msg: impl Into<String>) -> Self {
        QuickViewError::Shape(msg.into())
    }

    pub fn range(msg: impl Into<String>) -> Self {
        QuickViewError::Range(msg.into())
    }

    pub fn unsupported_projection(name: impl Into<String>) -> Self {
        QuickViewError::UnsupportedProjection(name.into())
    }

    pub fn pipeline_load(msg: impl Into<String>) -> Self {
        QuickViewError::PipelineLoad(msg.into())
    }

    pub fn reference_not_found(reference: impl Into<String>) -> Self {
        QuickViewError::ReferenceNotFound(reference.into())
    }

    /// Name of the error class, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            QuickViewError::Shape(_) => "ShapeError",
            QuickViewError::Range(_) => "RangeError",
            QuickViewError::UnsupportedProjection(_) => "UnsupportedProjectionError",
            QuickViewError::PipelineLoad(_) => "PipelineLoadError",
            QuickViewError::ReferenceNotFound(_) => "ReferenceNotFoundError",
            QuickViewError::StateFile(_) => "StateFileError",
            QuickViewError::Io(_) => "IoError",
            QuickViewError::Json(_) => "JsonError",
        }
    }

    /// Whether repeating the request with different input can succeed.
    ///
    /// Shape errors describe the grid itself and reference errors describe a
    /// UI/registry desynchronization, so neither goes away on retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            QuickViewError::Shape(_) | QuickViewError::ReferenceNotFound(_)
        )
    }
}

impl From<std::io::Error> for QuickViewError {
    fn from(err: std::io::Error) -> Self {
        QuickViewError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for QuickViewError {
    fn from(err: serde_json::Error) -> Self {
        QuickViewError::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(QuickViewError::shape("x").kind(), "ShapeError");
        assert_eq!(QuickViewError::range("x").kind(), "RangeError");
        assert_eq!(
            QuickViewError::unsupported_projection("x").kind(),
            "UnsupportedProjectionError"
        );
        assert_eq!(QuickViewError::pipeline_load("x").kind(), "PipelineLoadError");
        assert_eq!(
            QuickViewError::reference_not_found("x").kind(),
            "ReferenceNotFoundError"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(!QuickViewError::shape("bad grid").is_retryable());
        assert!(!QuickViewError::reference_not_found("TS").is_retryable());
        assert!(QuickViewError::range("min > max").is_retryable());
        assert!(QuickViewError::pipeline_load("missing file").is_retryable());
    }

    #[test]
    fn test_display() {
        let err = QuickViewError::unsupported_projection("Mercator");
        assert_eq!(err.to_string(), "Unsupported projection: Mercator");
    }
}
