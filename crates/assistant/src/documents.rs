//! Uploaded document tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studyforge_common::models::Metadata;
use studyforge_ingestion::IngestReport;
use uuid::Uuid;

/// A document successfully submitted to the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document_id: Uuid,

    /// Path on disk, or the caller-supplied name for text uploads
    pub path: String,

    pub filename: String,
    pub passage_count: usize,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,

    /// Document-level metadata attached to its passages
    pub metadata: Metadata,
}

impl From<IngestReport> for DocumentRecord {
    fn from(report: IngestReport) -> Self {
        Self {
            document_id: Uuid::new_v4(),
            path: report.source,
            filename: report.filename,
            passage_count: report.passage_count,
            size_bytes: report.size_bytes,
            uploaded_at: Utc::now(),
            metadata: report.metadata,
        }
    }
}
