//! Context Engine Core Components
//!
//! The Context Engine turns a user question into grounded model input:
//! - Query classification
//! - Relevance-filtered and overview retrieval
//! - Token-budgeted context stitching
//! - Answer synthesis

mod assembler;
mod context_stitcher;
mod query_parser;
mod synthesizer;

pub use assembler::{
    intro_score, match_vocabulary, BuiltContext, ContextAssembler, ExamContext, Retrieval,
    TECHNICAL_SECTION_DELIMITER,
};
pub use context_stitcher::{
    ContextBundle, ContextEntry, ContextStitcher, ContextStitcherConfig,
    DOCUMENT_SECTION_DELIMITER, TRUNCATION_MARKER,
};
pub use query_parser::{QueryClassifier, QueryKind, OVERVIEW_PHRASES};
pub use synthesizer::{AnswerSynthesizer, Answer, SynthesisOptions, NO_CONTEXT_ANSWER};
