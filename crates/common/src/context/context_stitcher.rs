//! Context Stitcher - Packs passages into a token-bounded context
//!
//! Provides:
//! - Provenance-labelled context entries
//! - Token budget management with a truncated trailing entry
//! - Rendering with visible section delimiters

use crate::models::Passage;
use serde::{Deserialize, Serialize};

/// Delimiter placed between provenance blocks
pub const DOCUMENT_SECTION_DELIMITER: &str = "\n\n=== DOCUMENT SECTION ===\n\n";

/// Marker appended to a truncated trailing entry
pub const TRUNCATION_MARKER: &str = "...";

/// One provenance block of a context bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Source label (filename or "Document")
    pub source: String,

    /// Passage text, possibly truncated
    pub content: String,

    /// Whether `content` was cut to fit the budget
    pub truncated: bool,
}

impl ContextEntry {
    fn render(&self) -> String {
        format!("[From: {}]\n{}", self.source, self.content)
    }
}

/// Token-budgeted, ordered concatenation of retrieved passages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextBundle {
    /// Entries in retrieval order
    pub entries: Vec<ContextEntry>,

    /// Running token estimate of the entries
    pub token_estimate: usize,

    /// Budget the bundle was packed against
    pub budget_tokens: usize,

    /// The relevance filter was under-populated and unfiltered results were used
    pub degraded: bool,
}

impl ContextBundle {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries joined by [`DOCUMENT_SECTION_DELIMITER`], each prefixed `[From: <label>]`
    pub fn text(&self) -> String {
        self.entries
            .iter()
            .map(ContextEntry::render)
            .collect::<Vec<_>>()
            .join(DOCUMENT_SECTION_DELIMITER)
    }

    /// Distinct source labels in first-seen order
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !sources.contains(&entry.source) {
                sources.push(entry.source.clone());
            }
        }
        sources
    }
}

/// Context stitcher configuration
#[derive(Debug, Clone)]
pub struct ContextStitcherConfig {
    /// A truncated trailing slice is only kept above this many characters
    pub min_partial_chars: usize,
}

impl Default for ContextStitcherConfig {
    fn default() -> Self {
        Self {
            min_partial_chars: 100,
        }
    }
}

/// Stitcher packing passages into bundles
#[derive(Debug, Clone, Default)]
pub struct ContextStitcher {
    config: ContextStitcherConfig,
}

impl ContextStitcher {
    pub fn new(config: ContextStitcherConfig) -> Self {
        Self { config }
    }

    /// Walk `passages` in order, appending while the rendered text stays
    /// within `budget_tokens`. Each entry is charged for its `[From: ...]`
    /// label and the section delimiter as well as its content. The first
    /// passage that would overflow is cut to what is left and kept only if
    /// that slice is long enough.
    pub fn stitch<'a, I>(&self, passages: I, budget_tokens: usize) -> ContextBundle
    where
        I: IntoIterator<Item = &'a Passage>,
    {
        let mut bundle = ContextBundle {
            budget_tokens,
            ..Default::default()
        };
        let capacity_chars = budget_tokens * 4;
        let delimiter_chars = DOCUMENT_SECTION_DELIMITER.chars().count();
        let mut used_chars = 0;

        for passage in passages {
            let source = passage.source_label();
            let mut overhead = label_chars(&source);
            if !bundle.entries.is_empty() {
                overhead += delimiter_chars;
            }
            let content_chars = passage.char_len();

            if used_chars + overhead + content_chars > capacity_chars {
                let remaining_chars = capacity_chars.saturating_sub(used_chars + overhead);
                if remaining_chars > self.config.min_partial_chars {
                    let mut content: String =
                        passage.content.chars().take(remaining_chars).collect();
                    content.push_str(TRUNCATION_MARKER);

                    used_chars += overhead + content.chars().count();
                    bundle.entries.push(ContextEntry {
                        source,
                        content,
                        truncated: true,
                    });
                }
                break;
            }

            used_chars += overhead + content_chars;
            bundle.entries.push(ContextEntry {
                source,
                content: passage.content.clone(),
                truncated: false,
            });
        }

        bundle.token_estimate = used_chars / 4;
        bundle
    }
}

/// Characters taken by the `[From: <source>]` line of a rendered entry
fn label_chars(source: &str) -> usize {
    "[From: ]\n".chars().count() + source.chars().count()
}
