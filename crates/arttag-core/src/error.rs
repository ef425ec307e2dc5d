//! Error types for the arttag tagging pipeline.
//!
//! Errors are organized by stage so that messages carry the relevant context
//! (file path, stage name, category) all the way to the CLI or HTTP boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for arttag operations.
#[derive(Error, Debug)]
pub enum ArtTagError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Image embedding generation failed
    #[error("Image embedding failed: {message}")]
    Embedding { message: String },

    /// Model loading or text encoding failed
    #[error("Model error: {message}")]
    Model { message: String },

    /// Scoring against the taxonomy failed
    #[error("Analysis failed: {message}")]
    Analysis { message: String },

    /// No taxonomy embeddings are available to score against
    #[error("Embeddings not initialized.")]
    Unavailable,

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// Payload exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for arttag results.
pub type Result<T> = std::result::Result<T, ArtTagError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message() {
        let err = PipelineError::Unavailable;
        assert_eq!(err.to_string(), "Embeddings not initialized.");
    }

    #[test]
    fn test_pipeline_error_wraps_into_top_level() {
        let err: ArtTagError = PipelineError::Analysis {
            message: "dimension mismatch".into(),
        }
        .into();
        assert!(err.to_string().contains("dimension mismatch"));
    }
}
