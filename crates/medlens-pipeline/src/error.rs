//! Error types for the pipeline

use thiserror::Error;

/// Result type alias using PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while staging or analyzing an image
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Declared format is not one of the supported encodings
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Image decode, resize, or encode failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem error while staging or persisting
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The inference service call failed
    #[error("inference error: {0}")]
    Model(#[from] medlens_ai::Error),

    /// The analysis was cancelled before completion
    #[error("analysis cancelled")]
    Cancelled,
}
