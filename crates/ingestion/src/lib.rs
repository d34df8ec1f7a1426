//! StudyForge Ingestion Library
//!
//! Turns documents into indexed passages:
//! 1. Validates the file (existence, type, size)
//! 2. Extracts raw text through an ordered list of backends
//! 3. Cleans and chunks the text into quality-filtered passages
//! 4. Submits the passages to the vector index

pub mod chunker;
pub mod errors;
pub mod extract;
pub mod processor;

pub use chunker::{Chunker, TextCleaner};
pub use errors::IngestionError;
pub use extract::{ExtractionChain, TextExtractor};
pub use processor::{IngestReport, IngestionProcessor, PreparedDocument};
