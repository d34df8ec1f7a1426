//! StudyForge Common Library
//!
//! Shared code for all StudyForge crates including:
//! - Passage and chat data model
//! - Embedding and vector index abstractions
//! - Language model abstraction
//! - Context assembly and answer synthesis
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod context;
pub mod embeddings;
pub mod errors;
pub mod index;
pub mod llm;
pub mod metrics;
pub mod models;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{AppError, Result};
pub use index::VectorIndex;
pub use llm::ChatModel;
pub use models::{Metadata, MetadataValue, Passage, ScoredPassage};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding dimension of the bundled hash embedder
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
