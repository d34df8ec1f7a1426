//! Passage: the unit stored in and retrieved from the vector index

use super::metadata::{Metadata, MetadataValue};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Label used when a passage carries no filename
pub const DEFAULT_SOURCE_LABEL: &str = "Document";

/// A bounded slice of document text with provenance metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Cleaned passage text
    pub content: String,

    /// Scalar metadata (filename, chunk_id, chunk_count, ...)
    pub metadata: Metadata,
}

impl Passage {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Provenance label shown in assembled context
    pub fn source_label(&self) -> String {
        match self.metadata.get("filename") {
            Some(MetadataValue::Text(name)) if !name.is_empty() => name.clone(),
            _ => DEFAULT_SOURCE_LABEL.to_string(),
        }
    }

    /// Length in characters, the unit every threshold is expressed in
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Estimated token count (~4 characters per token)
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.content)
    }

    /// Hex SHA-256 of the first `prefix_chars` characters, used for deduplication
    pub fn content_hash(&self, prefix_chars: usize) -> String {
        let prefix: String = self.content.chars().take(prefix_chars).collect();
        hex::encode(Sha256::digest(prefix.as_bytes()))
    }
}

/// Passage paired with a retrieval relevance score in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

impl ScoredPassage {
    pub fn new(passage: Passage, score: f32) -> Self {
        Self {
            passage,
            score: score.clamp(0.0, 1.0),
        }
    }
}

/// Estimate token count (simple approximation: 1 token ~= 4 characters)
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Share of alphabetic characters, 0.0 for empty text
pub fn alphabetic_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let alphabetic = text.chars().filter(|c| c.is_alphabetic()).count();
    alphabetic as f64 / total as f64
}
