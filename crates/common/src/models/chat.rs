//! Chat history entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One answered question in a study session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,

    /// Distinct source labels, first-seen order
    pub sources: Vec<String>,

    /// Whether any document context backed the answer
    pub has_context: bool,

    pub asked_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        sources: Vec<String>,
        has_context: bool,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            sources,
            has_context,
            asked_at: Utc::now(),
        }
    }
}
