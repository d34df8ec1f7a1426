//! Error types for StudyForge
//!
//! Provides a single error taxonomy shared by every crate:
//! - Distinct variants for input, retrieval, and generation failures
//! - Machine-readable error codes
//! - Recoverability classification for callers
//!
//! Degraded retrieval is not an error: it is reported on the retrieval
//! outcome.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Input errors (1xxx)
    InputError,
    UnsupportedFile,
    FileTooLarge,
    NoUsableText,

    // Generation errors (8xxx)
    GenerationMalformed,
    GenerationFatal,
    IndexError,
    EmbeddingError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::InputError => 1001,
            ErrorCode::UnsupportedFile => 1002,
            ErrorCode::FileTooLarge => 1003,
            ErrorCode::NoUsableText => 1004,

            ErrorCode::GenerationMalformed => 8001,
            ErrorCode::GenerationFatal => 8002,
            ErrorCode::IndexError => 8003,
            ErrorCode::EmbeddingError => 8004,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Invalid input: {message}")]
    Input { message: String },

    #[error("Unsupported file type: {extension}")]
    UnsupportedFile { extension: String },

    #[error("File too large ({size_mb:.1}MB). Maximum size: {limit_mb}MB")]
    FileTooLarge { size_mb: f64, limit_mb: u64 },

    #[error("No usable text in {source_name}")]
    NoUsableText { source_name: String },

    // Generation errors
    #[error("Malformed {section} output: {reason}")]
    GenerationMalformed { section: String, reason: String },

    #[error("Model call failed: {message}")]
    GenerationFatal { message: String },

    // External collaborators
    #[error("Vector index error: {message}")]
    Index { message: String },

    #[error("Embedding error: {message}")]
    Embedding { message: String },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for an input error with a human-readable reason
    pub fn input(message: impl Into<String>) -> Self {
        AppError::Input {
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Input { .. } => ErrorCode::InputError,
            AppError::UnsupportedFile { .. } => ErrorCode::UnsupportedFile,
            AppError::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            AppError::NoUsableText { .. } => ErrorCode::NoUsableText,
            AppError::GenerationMalformed { .. } => ErrorCode::GenerationMalformed,
            AppError::GenerationFatal { .. } => ErrorCode::GenerationFatal,
            AppError::Index { .. } => ErrorCode::IndexError,
            AppError::Embedding { .. } => ErrorCode::EmbeddingError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Input problems the user can fix and retry themselves
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AppError::Input { .. }
                | AppError::UnsupportedFile { .. }
                | AppError::FileTooLarge { .. }
                | AppError::NoUsableText { .. }
        )
    }

    /// Whether the failure came from an external collaborator (model, index, embedder)
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            AppError::GenerationFatal { .. } | AppError::Index { .. } | AppError::Embedding { .. }
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}
