//! Text chunking module
//!
//! Cleans extracted text and splits it into quality-filtered passages:
//! - Page markers, footers and layout noise are removed
//! - Windows follow paragraph, line, word, then character boundaries
//! - Short or symbol-heavy windows are dropped
//! - Survivors are tagged with their position and provenance

use crate::errors::IngestionError;
use regex_lite::Regex;
use studyforge_common::config::ChunkingConfig;
use studyforge_common::metrics;
use studyforge_common::models::{alphabetic_ratio, normalize_metadata, Metadata, Passage};
use text_splitter::{Characters, ChunkConfig, TextSplitter};
use tracing::debug;

/// Typographic characters mapped to plain ASCII
const PUNCTUATION: &[(char, &str)] = &[
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "--"),
    ('\u{00A0}', " "),
    ('\u{000C}', ""),
];

fn compile(pattern: &str) -> Result<Regex, IngestionError> {
    Regex::new(pattern)
        .map_err(|e| IngestionError::ConfigError(format!("invalid pattern {}: {}", pattern, e)))
}

/// Normalizes raw extracted text and filters noise lines
pub struct TextCleaner {
    page_marker: Regex,
    page_footer: Regex,
    horizontal_space: Regex,
    blank_lines: Regex,
    min_line_chars: usize,
    noise_line_chars: usize,
    min_alpha_ratio: f64,
}

impl TextCleaner {
    pub fn new(config: &ChunkingConfig) -> Result<Self, IngestionError> {
        Ok(Self {
            page_marker: compile(r"\[Page \d+\]\s*")?,
            page_footer: compile(r"(?i)Page\s*\d+\s*of\s*\d+")?,
            horizontal_space: compile(r"[ \t]+")?,
            blank_lines: compile(r"\n\s*\n\s*\n+")?,
            min_line_chars: config.min_line_chars,
            noise_line_chars: config.noise_line_chars,
            min_alpha_ratio: config.min_alpha_ratio,
        })
    }

    /// Strip page artifacts, normalize punctuation and whitespace, drop noise lines
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let text = self.page_marker.replace_all(text, "");
        let text = self.page_footer.replace_all(&text, "");

        let mut text = text.into_owned();
        for (from, to) in PUNCTUATION {
            if text.contains(*from) {
                text = text.replace(*from, to);
            }
        }

        let text = self.horizontal_space.replace_all(&text, " ");
        let text = self.blank_lines.replace_all(&text, "\n\n");

        text.split('\n')
            .map(str::trim)
            .filter(|line| self.keep_line(line))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    fn keep_line(&self, line: &str) -> bool {
        let len = line.chars().count();

        if len < self.min_line_chars {
            return false;
        }

        // Page numbers
        if line.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }

        // Layout noise: long lines with few letters
        if len > self.noise_line_chars && alphabetic_ratio(line) < self.min_alpha_ratio {
            return false;
        }

        true
    }
}

/// Cleans, segments and quality-filters document text
pub struct Chunker {
    cleaner: TextCleaner,
    splitter: TextSplitter<Characters>,
    page_artifact: Regex,
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self, IngestionError> {
        let chunk_config = ChunkConfig::new(config.chunk_size)
            .with_overlap(config.chunk_overlap)
            .map_err(|e| IngestionError::ChunkingError(e.to_string()))?;

        Ok(Self {
            cleaner: TextCleaner::new(&config)?,
            splitter: TextSplitter::new(chunk_config),
            page_artifact: compile(r"(?i)^\s*\[?Page\s*\d+\]?\s*$")?,
            config,
        })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk raw text tagged with the configured source type
    pub fn process(&self, raw_text: &str, extra_metadata: &Metadata) -> Vec<Passage> {
        self.process_as(raw_text, extra_metadata, &self.config.source_type)
    }

    /// Chunk raw text, tagging passages with `source_type`
    pub fn process_as(
        &self,
        raw_text: &str,
        extra_metadata: &Metadata,
        source_type: &str,
    ) -> Vec<Passage> {
        let cleaned = self.cleaner.clean(raw_text);
        if cleaned.is_empty() {
            return Vec::new();
        }

        let windows: Vec<&str> = self.splitter.chunks(&cleaned).collect();
        let chunk_count = windows.len();
        let base = normalize_metadata(extra_metadata.clone());

        let mut passages: Vec<Passage> = Vec::with_capacity(chunk_count);
        for window in windows {
            let content = window.trim();
            if !self.passes_quality_gate(content) {
                continue;
            }

            let mut metadata = base.clone();
            metadata.insert("chunk_id".into(), passages.len().into());
            metadata.insert("chunk_count".into(), chunk_count.into());
            metadata.insert("source_type".into(), source_type.into());
            metadata.insert("content_length".into(), content.chars().count().into());

            passages.push(Passage::new(content, metadata));
        }

        debug!(
            input_len = raw_text.len(),
            cleaned_len = cleaned.len(),
            windows = chunk_count,
            kept = passages.len(),
            "Text chunked"
        );
        metrics::record_chunking(source_type, passages.len(), chunk_count - passages.len());

        passages
    }

    fn passes_quality_gate(&self, content: &str) -> bool {
        if content.chars().count() < self.config.min_chunk_chars {
            return false;
        }

        if alphabetic_ratio(content) < self.config.min_alpha_ratio {
            return false;
        }

        !self.page_artifact.is_match(content)
    }
}
