//! Core data model shared by ingestion, retrieval and generation

mod chat;
mod metadata;
mod passage;

pub use chat::ChatTurn;
pub use metadata::{
    metadata_from_json, normalize_key, normalize_metadata, Metadata, MetadataValue,
    MAX_COMPLEX_VALUE_CHARS,
};
pub use passage::{
    alphabetic_ratio, estimate_tokens, Passage, ScoredPassage, DEFAULT_SOURCE_LABEL,
};
