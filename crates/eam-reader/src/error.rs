//! Error types for reading EAM output.

use quickview_common::QuickViewError;
use thiserror::Error;

/// Result type for reader operations.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// Failures while reading a data/connectivity file pair.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReaderError {
    /// Data or connectivity file not set
    #[error("Data and connectivity files must both be provided")]
    FilesNotSet,

    /// File does not exist or cannot be opened
    #[error("Cannot open {path}: {reason}")]
    Open { path: String, reason: String },

    /// Missing required variable or dimension
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Array sizes disagree between the data and connectivity files
    #[error("Inconsistent dimensions: {0}")]
    Dimension(String),

    /// Failure inside the NetCDF library
    #[error("NetCDF error: {0}")]
    NetCdf(String),

    /// Geometry could not be assembled from the arrays read
    #[error("Mesh assembly failed: {0}")]
    Mesh(String),
}

impl From<QuickViewError> for ReaderError {
    fn from(err: QuickViewError) -> Self {
        ReaderError::Mesh(err.to_string())
    }
}

impl From<ReaderError> for QuickViewError {
    fn from(err: ReaderError) -> Self {
        QuickViewError::pipeline_load(err.to_string())
    }
}

#[cfg(feature = "native")]
impl From<netcdf::Error> for ReaderError {
    fn from(err: netcdf::Error) -> Self {
        ReaderError::NetCdf(err.to_string())
    }
}
