//! Query Parser - Classifies questions as broad or narrow
//!
//! Provides:
//! - Overview / specific classification by broad-intent phrases
//! - Kind labels for logs and metrics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad-intent phrases, matched case-insensitively as substrings
pub const OVERVIEW_PHRASES: &[&str] = &[
    "what is",
    "tell me about",
    "describe",
    "overview",
    "summary",
    "about the file",
    "content of",
    "main topic",
    "what does",
    "explain the document",
    "document all about",
    "summarize",
    "what does this cover",
    "main subject",
    "what are we learning",
    "course content",
    "lecture about",
];

/// Query classification driving the retrieval strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Summarize the corpus
    Overview,
    /// Answer a pointed question
    Specific,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Overview => "overview",
            QueryKind::Specific => "specific",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phrase-based query classifier
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    /// Lower-cased phrases
    phrases: Vec<String>,
}

impl Default for QueryClassifier {
    fn default() -> Self {
        Self::new(OVERVIEW_PHRASES.iter().copied())
    }
}

impl QueryClassifier {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Classify a query
    pub fn classify(&self, query: &str) -> QueryKind {
        let query = query.to_lowercase();

        if self.phrases.iter().any(|p| query.contains(p.as_str())) {
            QueryKind::Overview
        } else {
            QueryKind::Specific
        }
    }
}
