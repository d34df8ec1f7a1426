//! Ingestion error types

use studyforge_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file type: {extension}")]
    UnsupportedFile { extension: String },

    #[error("File too large ({size_mb:.1}MB). Maximum size: {limit_mb}MB")]
    FileTooLarge { size_mb: f64, limit_mb: u64 },

    #[error("No usable text extracted from {source_name}")]
    NoUsableText { source_name: String },

    #[error("PDF parse error for {path}: {message}")]
    PdfParseError { path: String, message: String },

    #[error("Chunking error: {0}")]
    ChunkingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::FileNotFound(path) => AppError::input(format!("File not found: {}", path)),
            IngestionError::UnsupportedFile { extension } => AppError::UnsupportedFile { extension },
            IngestionError::FileTooLarge { size_mb, limit_mb } => {
                AppError::FileTooLarge { size_mb, limit_mb }
            }
            IngestionError::NoUsableText { source_name } => AppError::NoUsableText { source_name },
            IngestionError::PdfParseError { path, message } => {
                AppError::input(format!("Invalid or corrupted PDF file {}: {}", path, message))
            }
            IngestionError::ChunkingError(message) | IngestionError::ConfigError(message) => {
                AppError::Configuration { message }
            }
            IngestionError::IoError(e) => AppError::input(format!("Unable to read file: {}", e)),
            IngestionError::App(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_keeps_input_classification() {
        let err: AppError = IngestionError::FileTooLarge {
            size_mb: 72.4,
            limit_mb: 50,
        }
        .into();
        assert!(err.is_input_error());
        assert_eq!(err.to_string(), "File too large (72.4MB). Maximum size: 50MB");

        let err: AppError = IngestionError::FileNotFound("notes.pdf".into()).into();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_wrapped_app_error_round_trips() {
        let err: AppError = IngestionError::App(AppError::Index {
            message: "down".into(),
        })
        .into();
        assert!(matches!(err, AppError::Index { .. }));
    }
}
