//! Ingestion processor
//!
//! Core logic for turning a document into indexed passages: validation,
//! text extraction, file metadata, chunking and index submission.

use crate::chunker::Chunker;
use crate::errors::IngestionError;
use crate::extract::{file_extension, ExtractionChain};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use studyforge_common::config::{AppConfig, IngestionConfig};
use studyforge_common::index::VectorIndex;
use studyforge_common::metrics;
use studyforge_common::models::{normalize_metadata, Metadata, MetadataValue, Passage};
use tracing::{error, info, instrument};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A file that passed validation
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub filename: String,
    pub extension: String,
    pub size_bytes: u64,
}

impl FileInfo {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / BYTES_PER_MB
    }
}

/// Summary of one ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Path or caller-supplied name
    pub source: String,
    pub filename: String,
    pub file_type: String,

    /// Extraction backend that produced the text
    pub backend: Option<String>,
    pub page_count: Option<usize>,
    pub character_count: usize,
    pub word_count: usize,
    pub size_bytes: u64,
    pub passage_count: usize,

    /// Document-level metadata attached to every passage
    pub metadata: Metadata,
}

/// Passages ready for submission plus their report
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub report: IngestReport,
    pub passages: Vec<Passage>,
}

/// Outcome of a directory ingestion
#[derive(Debug, Default)]
pub struct DirectoryReport {
    pub ingested: Vec<IngestReport>,
    pub failed: Vec<(PathBuf, IngestionError)>,
}

/// Ingestion processor
pub struct IngestionProcessor {
    chunker: Chunker,
    extractors: ExtractionChain,
    index: Arc<dyn VectorIndex>,
    config: IngestionConfig,
}

impl IngestionProcessor {
    pub fn new(
        chunker: Chunker,
        extractors: ExtractionChain,
        index: Arc<dyn VectorIndex>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            chunker,
            extractors,
            index,
            config,
        }
    }

    /// Processor with the default extraction backends
    pub fn from_config(
        config: &AppConfig,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self, IngestionError> {
        Ok(Self::new(
            Chunker::new(config.chunking.clone())?,
            ExtractionChain::with_default_backends(config.ingestion.min_extracted_chars),
            index,
            config.ingestion.clone(),
        ))
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Check existence, extension and size
    pub fn validate(&self, path: &Path) -> Result<FileInfo, IngestionError> {
        if !path.is_file() {
            return Err(IngestionError::FileNotFound(path.display().to_string()));
        }

        let extension = file_extension(path);
        if !self.config.supported_extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension)) {
            return Err(IngestionError::UnsupportedFile { extension });
        }

        let size_bytes = std::fs::metadata(path)?.len();
        let info = FileInfo {
            path: path.to_path_buf(),
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension,
            size_bytes,
        };

        if info.size_mb() > self.config.max_file_size_mb as f64 {
            return Err(IngestionError::FileTooLarge {
                size_mb: info.size_mb(),
                limit_mb: self.config.max_file_size_mb,
            });
        }

        Ok(info)
    }

    /// Validate, extract and chunk a file without touching the index
    #[instrument(skip(self, extra_metadata), fields(path = %path.display()))]
    pub fn prepare_file(
        &self,
        path: &Path,
        extra_metadata: &Metadata,
    ) -> Result<PreparedDocument, IngestionError> {
        let info = self.validate(path)?;
        let output = self.extractors.extract(path);

        if output.is_empty() {
            return Err(IngestionError::NoUsableText {
                source_name: info.filename,
            });
        }

        let text = &output.extraction.text;
        let mut metadata = normalize_metadata(output.extraction.metadata.clone());
        metadata.insert("source".into(), path.display().to_string().into());
        metadata.insert("filename".into(), info.filename.clone().into());
        metadata.insert("file_type".into(), info.extension.clone().into());
        metadata.insert("character_count".into(), text.chars().count().into());
        metadata.insert("word_count".into(), text.split_whitespace().count().into());
        metadata.insert("file_size_bytes".into(), info.size_bytes.into());
        metadata.insert("file_size_mb".into(), MetadataValue::Float(info.size_mb()));
        if let Some(pages) = output.extraction.page_count {
            metadata.insert("page_count".into(), pages.into());
        }
        metadata.extend(normalize_metadata(extra_metadata.clone()));

        let passages = self.chunker.process_as(text, &metadata, &info.extension);
        if passages.is_empty() {
            return Err(IngestionError::NoUsableText {
                source_name: info.filename,
            });
        }

        Ok(PreparedDocument {
            report: IngestReport {
                source: path.display().to_string(),
                filename: info.filename,
                file_type: info.extension,
                backend: output.backend,
                page_count: output.extraction.page_count,
                character_count: text.chars().count(),
                word_count: text.split_whitespace().count(),
                size_bytes: info.size_bytes,
                passage_count: passages.len(),
                metadata,
            },
            passages,
        })
    }

    /// Chunk caller-supplied text under `name`
    pub fn prepare_text(
        &self,
        name: &str,
        text: &str,
        extra_metadata: &Metadata,
    ) -> Result<PreparedDocument, IngestionError> {
        if name.trim().is_empty() {
            return Err(IngestionError::App(studyforge_common::AppError::input(
                "document name must not be empty",
            )));
        }

        let mut metadata = Metadata::new();
        metadata.insert("source".into(), name.into());
        metadata.insert("filename".into(), name.into());
        metadata.insert("file_type".into(), "text".into());
        metadata.insert("character_count".into(), text.chars().count().into());
        metadata.insert("word_count".into(), text.split_whitespace().count().into());
        metadata.extend(normalize_metadata(extra_metadata.clone()));

        let passages = self.chunker.process_as(text, &metadata, "text");
        if passages.is_empty() {
            return Err(IngestionError::NoUsableText {
                source_name: name.to_string(),
            });
        }

        Ok(PreparedDocument {
            report: IngestReport {
                source: name.to_string(),
                filename: name.to_string(),
                file_type: "text".to_string(),
                backend: None,
                page_count: None,
                character_count: text.chars().count(),
                word_count: text.split_whitespace().count(),
                size_bytes: text.len() as u64,
                passage_count: passages.len(),
                metadata,
            },
            passages,
        })
    }

    /// Prepare a file and submit its passages to the index
    pub async fn ingest_file(
        &self,
        path: &Path,
        extra_metadata: &Metadata,
    ) -> Result<IngestReport, IngestionError> {
        let start = Instant::now();
        let extension = file_extension(path);

        let result = match self.prepare_file(path, extra_metadata) {
            Ok(prepared) => self.submit(prepared).await,
            Err(e) => Err(e),
        };

        metrics::record_ingestion(start.elapsed().as_secs_f64(), &extension, result.is_ok());
        result
    }

    /// Chunk text and submit its passages to the index
    pub async fn ingest_text(
        &self,
        name: &str,
        text: &str,
        extra_metadata: &Metadata,
    ) -> Result<IngestReport, IngestionError> {
        let start = Instant::now();

        let result = match self.prepare_text(name, text, extra_metadata) {
            Ok(prepared) => self.submit(prepared).await,
            Err(e) => Err(e),
        };

        metrics::record_ingestion(start.elapsed().as_secs_f64(), "text", result.is_ok());
        result
    }

    async fn submit(&self, prepared: PreparedDocument) -> Result<IngestReport, IngestionError> {
        self.index.index(&prepared.passages).await?;

        info!(
            filename = %prepared.report.filename,
            passages = prepared.report.passage_count,
            backend = ?prepared.report.backend,
            index = self.index.name(),
            "Document indexed"
        );
        Ok(prepared.report)
    }

    /// Ingest every supported file in a directory; failures are logged and skipped
    #[instrument(skip(self, extra_metadata), fields(dir = %dir.display()))]
    pub async fn ingest_directory(
        &self,
        dir: &Path,
        extra_metadata: &Metadata,
    ) -> Result<DirectoryReport, IngestionError> {
        info!("Processing directory");

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| {
                let extension = file_extension(path);
                self.config
                    .supported_extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(&extension))
            })
            .collect();
        paths.sort();

        let mut report = DirectoryReport::default();
        for path in paths {
            match self.ingest_file(&path, extra_metadata).await {
                Ok(ingested) => report.ingested.push(ingested),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to ingest document");
                    report.failed.push((path, e));
                }
            }
        }

        info!(
            ingested = report.ingested.len(),
            failed = report.failed.len(),
            "Directory processing complete"
        );
        Ok(report)
    }
}
