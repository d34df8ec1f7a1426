//! Text extraction backends
//!
//! Extraction is an ordered capability list: each backend is tried in turn
//! and the first one whose trimmed output is long enough wins. Backend
//! failures are logged and never propagated.

use crate::errors::IngestionError;
use lopdf::{Document, Object};
use std::path::Path;
use studyforge_common::models::{normalize_key, Metadata, MetadataValue};
use tracing::{debug, info, warn};

/// Raw text produced by a backend
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Page-marked raw text
    pub text: String,

    /// Page count, when the format has pages
    pub page_count: Option<usize>,

    /// Document-level metadata (e.g. PDF info dictionary)
    pub metadata: Metadata,
}

/// A text extraction capability
pub trait TextExtractor: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Whether this backend handles the (lower-case) extension
    fn supports(&self, extension: &str) -> bool;

    /// Extract raw text
    fn extract(&self, path: &Path) -> Result<Extraction, IngestionError>;
}

/// Result of running the chain
#[derive(Debug, Clone, Default)]
pub struct ChainOutput {
    pub extraction: Extraction,

    /// Winning backend, `None` when nothing produced usable text
    pub backend: Option<String>,
}

impl ChainOutput {
    pub fn is_empty(&self) -> bool {
        self.backend.is_none()
    }
}

/// Ordered list of extraction backends
pub struct ExtractionChain {
    backends: Vec<Box<dyn TextExtractor>>,
    min_chars: usize,
}

impl ExtractionChain {
    pub fn new(min_chars: usize) -> Self {
        Self {
            backends: Vec::new(),
            min_chars,
        }
    }

    /// Plain text, lopdf page text, then the raw content-stream scan
    pub fn with_default_backends(min_chars: usize) -> Self {
        Self::new(min_chars)
            .with_backend(PlainTextExtractor)
            .with_backend(PdfTextExtractor)
            .with_backend(ContentStreamExtractor)
    }

    pub fn with_backend(mut self, backend: impl TextExtractor + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Try each supporting backend until one yields more than `min_chars`
    /// trimmed characters. Returns an empty output otherwise.
    pub fn extract(&self, path: &Path) -> ChainOutput {
        let extension = file_extension(path);

        for backend in self.backends.iter().filter(|b| b.supports(&extension)) {
            debug!(backend = backend.name(), path = %path.display(), "Trying extraction backend");

            match backend.extract(path) {
                Ok(extraction) => {
                    let chars = extraction.text.trim().chars().count();
                    if chars > self.min_chars {
                        info!(backend = backend.name(), chars, "Text extracted");
                        return ChainOutput {
                            extraction,
                            backend: Some(backend.name().to_string()),
                        };
                    }
                    debug!(backend = backend.name(), chars, "Backend produced minimal text");
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "Extraction backend failed");
                }
            }
        }

        warn!(path = %path.display(), "All extraction backends failed or produced minimal text");
        ChainOutput::default()
    }
}

/// Lower-case extension without the dot
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Reads UTF-8 text and markdown files (invalid bytes are replaced)
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plaintext"
    }

    fn supports(&self, extension: &str) -> bool {
        matches!(extension, "txt" | "md")
    }

    fn extract(&self, path: &Path) -> Result<Extraction, IngestionError> {
        let bytes = std::fs::read(path)?;
        Ok(Extraction {
            text: String::from_utf8_lossy(&bytes).into_owned(),
            ..Default::default()
        })
    }
}

/// lopdf page text extraction
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn name(&self) -> &str {
        "lopdf-text"
    }

    fn supports(&self, extension: &str) -> bool {
        extension == "pdf"
    }

    fn extract(&self, path: &Path) -> Result<Extraction, IngestionError> {
        let doc = load_pdf(path)?;
        let pages = doc.get_pages();
        let mut text = String::new();

        for page_num in pages.keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(page_text) => push_page(&mut text, *page_num, &page_text),
                Err(e) => {
                    warn!(page = page_num, error = %e, "Failed to extract page, skipping");
                }
            }
        }

        Ok(Extraction {
            text,
            page_count: Some(pages.len()),
            metadata: pdf_info(&doc),
        })
    }
}

/// Scans page content streams for text-showing operators
pub struct ContentStreamExtractor;

impl TextExtractor for ContentStreamExtractor {
    fn name(&self) -> &str {
        "content-stream"
    }

    fn supports(&self, extension: &str) -> bool {
        extension == "pdf"
    }

    fn extract(&self, path: &Path) -> Result<Extraction, IngestionError> {
        let doc = load_pdf(path)?;
        let pages = doc.get_pages();
        let mut text = String::new();

        for (page_num, page_id) in pages.iter() {
            match doc.get_page_content(*page_id) {
                Ok(content) => push_page(&mut text, *page_num, &extract_text_from_content(&content)),
                Err(e) => {
                    warn!(page = page_num, error = %e, "Failed to read page content, skipping");
                }
            }
        }

        Ok(Extraction {
            text,
            page_count: Some(pages.len()),
            metadata: pdf_info(&doc),
        })
    }
}

fn load_pdf(path: &Path) -> Result<Document, IngestionError> {
    Document::load(path).map_err(|e| IngestionError::PdfParseError {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })
}

/// Append non-blank page text behind a `[Page N]` marker
fn push_page(text: &mut String, page_num: u32, page_text: &str) {
    if page_text.trim().is_empty() {
        return;
    }
    text.push_str(&format!("\n[Page {}]\n{}\n", page_num, page_text));
}

/// Page count of a PDF, `None` if it cannot be parsed
pub fn pdf_page_count(path: &Path) -> Option<usize> {
    Document::load(path).ok().map(|doc| doc.get_pages().len())
}

/// Info dictionary entries as `pdf_<key>` metadata
fn pdf_info(doc: &Document) -> Metadata {
    let mut metadata = Metadata::new();

    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).ok(),
        Ok(Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };

    if let Some(info) = info {
        for (key, value) in info.iter() {
            let key = normalize_key(&String::from_utf8_lossy(key));
            let value = match value {
                Object::String(bytes, _) => decode_pdf_text(bytes),
                Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
                Object::Integer(i) => i.to_string(),
                Object::Real(r) => r.to_string(),
                Object::Boolean(b) => b.to_string(),
                _ => continue,
            };
            metadata.insert(format!("pdf_{}", key), MetadataValue::Text(value));
        }
    }

    metadata
}

/// Decode a PDF text string (UTF-16BE with BOM, else byte-per-char)
fn decode_pdf_text(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|b| *b as char).collect()
}

/// Extract text from a PDF content stream
fn extract_text_from_content(content: &[u8]) -> String {
    // Text appears between BT and ET operators
    let content_str = String::from_utf8_lossy(content);
    let mut text = String::new();
    let mut in_text_block = false;
    let mut current_text = String::new();

    for line in content_str.lines() {
        let trimmed = line.trim();

        if trimmed == "BT" {
            in_text_block = true;
            continue;
        }

        if trimmed == "ET" {
            in_text_block = false;
            if !current_text.is_empty() {
                text.push_str(&current_text);
                text.push('\n');
                current_text.clear();
            }
            continue;
        }

        if in_text_block {
            if let Some(shown) = extract_text_from_operator(trimmed) {
                current_text.push_str(&shown);
            }
        }
    }

    text
}

/// Text shown by a `Tj`, `'`, `"` or `TJ` operator
fn extract_text_from_operator(line: &str) -> Option<String> {
    if line.ends_with("Tj") || line.ends_with('\'') || line.ends_with('"') {
        let start = line.find('(')?;
        let end = line.rfind(')')?;
        if end > start {
            return Some(decode_pdf_string(&line[start + 1..end]));
        }
        return None;
    }

    if line.ends_with("TJ") {
        let mut result = String::new();
        let mut in_paren = false;
        let mut current = String::new();

        for ch in line.chars() {
            match ch {
                '(' => in_paren = true,
                ')' => {
                    in_paren = false;
                    result.push_str(&decode_pdf_string(&current));
                    current.clear();
                }
                _ if in_paren => current.push(ch),
                _ => {}
            }
        }

        if !result.is_empty() {
            return Some(result);
        }
    }

    None
}

/// Decode PDF string escapes
fn decode_pdf_string(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some(c) => result.push(c),
                None => {}
            }
        } else {
            result.push(ch);
        }
    }

    result
}
