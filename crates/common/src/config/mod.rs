//! Configuration management for StudyForge
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    /// Text cleaning and segmentation
    #[serde(default)]
    #[validate(nested)]
    pub chunking: ChunkingConfig,

    /// Retrieval and context budgeting
    #[serde(default)]
    #[validate(nested)]
    pub retrieval: RetrievalConfig,

    /// Model call parameters
    #[serde(default)]
    #[validate(nested)]
    pub generation: GenerationConfig,

    /// Chat session limits
    #[serde(default)]
    #[validate(nested)]
    pub session: SessionConfig,

    /// Document ingestion
    #[serde(default)]
    #[validate(nested)]
    pub ingestion: IngestionConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ChunkingConfig {
    /// Target window size in characters
    #[serde(default = "default_chunk_size")]
    #[validate(range(min = 100, max = 100_000))]
    pub chunk_size: usize,

    /// Overlap between consecutive windows in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Minimum passage length in characters
    #[serde(default = "default_min_chunk_chars")]
    #[validate(range(min = 1))]
    pub min_chunk_chars: usize,

    /// Minimum share of alphabetic characters in a passage
    #[serde(default = "default_min_alpha_ratio")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_alpha_ratio: f64,

    /// Lines shorter than this are dropped during cleaning
    #[serde(default = "default_min_line_chars")]
    pub min_line_chars: usize,

    /// Lines longer than this are subject to the alphabetic-ratio filter
    #[serde(default = "default_noise_line_chars")]
    pub noise_line_chars: usize,

    /// Value of the `source_type` metadata tag
    #[serde(default = "default_source_type")]
    pub source_type: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RetrievalConfig {
    /// Minimum relevance score for the filtered specific search
    #[serde(default = "default_relevance_threshold")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub relevance_threshold: f32,

    /// Fallback triggers when fewer than `k / fallback_divisor` results pass the threshold
    #[serde(default = "default_fallback_divisor")]
    #[validate(range(min = 1))]
    pub fallback_divisor: usize,

    /// Passages retrieved for direct question answering
    #[serde(default = "default_qa_top_k")]
    #[validate(range(min = 1, max = 100))]
    pub qa_top_k: usize,

    /// Passages retrieved per exam-context query
    #[serde(default = "default_exam_top_k")]
    #[validate(range(min = 1, max = 100))]
    pub exam_top_k: usize,

    /// Token budget for specific questions
    #[serde(default = "default_specific_budget")]
    pub specific_budget_tokens: usize,

    /// Token budget for overview questions
    #[serde(default = "default_overview_budget")]
    pub overview_budget_tokens: usize,

    /// Token budget of each exam-context sub-query
    #[serde(default = "default_exam_section_budget")]
    pub exam_section_budget_tokens: usize,

    /// Token budget of the preliminary subject sample
    #[serde(default = "default_sample_budget")]
    pub sample_budget_tokens: usize,

    /// Passages fetched per overview query
    #[serde(default = "default_overview_query_k")]
    pub overview_query_k: usize,

    /// Stop collecting overview passages once this many are unique
    #[serde(default = "default_max_overview_passages")]
    #[validate(range(min = 1))]
    pub max_overview_passages: usize,

    /// Top up from the generic query below this many overview passages
    #[serde(default = "default_min_overview_passages")]
    pub min_overview_passages: usize,

    /// Characters hashed when deduplicating overview passages
    #[serde(default = "default_dedup_prefix_chars")]
    pub dedup_prefix_chars: usize,

    /// A truncated trailing entry is only included above this many characters
    #[serde(default = "default_min_partial_chars")]
    pub min_partial_chars: usize,

    /// Exam context shorter than this (trimmed) counts as no context
    #[serde(default = "default_min_exam_context_chars")]
    pub min_exam_context_chars: usize,

    /// Introspective queries used for overview questions
    #[serde(default = "default_overview_queries")]
    #[validate(length(min = 1))]
    pub overview_queries: Vec<String>,

    /// Generic top-up query when overview retrieval is thin
    #[serde(default = "default_overview_fallback_query")]
    pub overview_fallback_query: String,

    /// Passages fetched by the top-up query
    #[serde(default = "default_overview_fallback_k")]
    pub overview_fallback_k: usize,

    /// Topical queries used to gather exam material
    #[serde(default = "default_exam_queries")]
    #[validate(length(min = 1))]
    pub exam_queries: Vec<String>,

    /// Query used to sample the subject before exam retrieval
    #[serde(default = "default_subject_sample_query")]
    pub subject_sample_query: String,

    /// Controlled vocabulary matched against the subject sample
    #[serde(default = "default_domain_vocabulary")]
    pub domain_vocabulary: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct GenerationConfig {
    /// Model identifier passed through to the model service
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for answers and exam sections
    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,

    /// Output token ceiling for answers
    #[serde(default = "default_answer_max_tokens")]
    #[validate(range(min = 1))]
    pub answer_max_tokens: u32,

    /// Output token ceiling for the multiple-choice section
    #[serde(default = "default_multiple_choice_max_tokens")]
    #[validate(range(min = 1))]
    pub multiple_choice_max_tokens: u32,

    /// Output token ceiling for the other exam sections
    #[serde(default = "default_section_max_tokens")]
    #[validate(range(min = 1))]
    pub section_max_tokens: u32,

    /// Context is hard-truncated to this many characters in exam prompts
    #[serde(default = "default_exam_context_chars")]
    #[validate(range(min = 1))]
    pub exam_context_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SessionConfig {
    /// Maximum retained chat turns
    #[serde(default = "default_max_history_length")]
    #[validate(range(min = 1))]
    pub max_history_length: usize,

    /// Most recent turns replayed into the answer prompt
    #[serde(default = "default_history_turns_in_prompt")]
    pub history_turns_in_prompt: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct IngestionConfig {
    /// Largest accepted upload in megabytes
    #[serde(default = "default_max_file_size_mb")]
    #[validate(range(min = 1))]
    pub max_file_size_mb: u64,

    /// Accepted file extensions (lower-case, without dot)
    #[serde(default = "default_supported_extensions")]
    #[validate(length(min = 1))]
    pub supported_extensions: Vec<String>,

    /// An extraction backend wins once its trimmed output exceeds this
    #[serde(default = "default_min_extracted_chars")]
    pub min_extracted_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (debug, info, warn, error, or EnvFilter syntax)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,

    /// Prometheus exporter port (0 to disable)
    #[serde(default)]
    pub metrics_port: u16,
}

// Default value functions
fn default_chunk_size() -> usize { 1000 }
fn default_chunk_overlap() -> usize { 200 }
fn default_min_chunk_chars() -> usize { 50 }
fn default_min_alpha_ratio() -> f64 { 0.3 }
fn default_min_line_chars() -> usize { 5 }
fn default_noise_line_chars() -> usize { 10 }
fn default_source_type() -> String { "pdf".to_string() }
fn default_relevance_threshold() -> f32 { 0.1 }
fn default_fallback_divisor() -> usize { 2 }
fn default_qa_top_k() -> usize { 5 }
fn default_exam_top_k() -> usize { 10 }
fn default_specific_budget() -> usize { 3000 }
fn default_overview_budget() -> usize { 4000 }
fn default_exam_section_budget() -> usize { 1500 }
fn default_sample_budget() -> usize { 500 }
fn default_overview_query_k() -> usize { 5 }
fn default_max_overview_passages() -> usize { 15 }
fn default_min_overview_passages() -> usize { 5 }
fn default_dedup_prefix_chars() -> usize { 200 }
fn default_min_partial_chars() -> usize { 100 }
fn default_min_exam_context_chars() -> usize { 100 }
fn default_overview_fallback_query() -> String { "main content".to_string() }
fn default_overview_fallback_k() -> usize { 10 }
fn default_subject_sample_query() -> String { "main topic subject matter focus".to_string() }
fn default_model() -> String { "gpt-3.5-turbo".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_answer_max_tokens() -> u32 { 1000 }
fn default_multiple_choice_max_tokens() -> u32 { 2000 }
fn default_section_max_tokens() -> u32 { 1500 }
fn default_exam_context_chars() -> usize { 3500 }
fn default_max_history_length() -> usize { 10 }
fn default_history_turns_in_prompt() -> usize { 5 }
fn default_max_file_size_mb() -> u64 { 50 }
fn default_min_extracted_chars() -> usize { 100 }
fn default_log_level() -> String { "info".to_string() }

fn default_overview_queries() -> Vec<String> {
    to_strings(&[
        "introduction overview summary definition",
        "objectives goals purpose learning outcomes",
        "abstract conclusion summary",
        "introduction definition what is",
    ])
}

fn default_exam_queries() -> Vec<String> {
    to_strings(&[
        "testing methods techniques procedures processes",
        "equipment tools instruments technology",
        "defects flaws inspection evaluation",
        "applications materials components specimens",
    ])
}

fn default_domain_vocabulary() -> Vec<String> {
    to_strings(&[
        "NDT",
        "non-destructive",
        "testing",
        "ultrasonic",
        "radiographic",
        "magnetic particle",
        "penetrant",
        "eddy current",
        "visual inspection",
    ])
}

fn default_supported_extensions() -> Vec<String> {
    to_strings(&["pdf", "txt", "md"])
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_chars: default_min_chunk_chars(),
            min_alpha_ratio: default_min_alpha_ratio(),
            min_line_chars: default_min_line_chars(),
            noise_line_chars: default_noise_line_chars(),
            source_type: default_source_type(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: default_relevance_threshold(),
            fallback_divisor: default_fallback_divisor(),
            qa_top_k: default_qa_top_k(),
            exam_top_k: default_exam_top_k(),
            specific_budget_tokens: default_specific_budget(),
            overview_budget_tokens: default_overview_budget(),
            exam_section_budget_tokens: default_exam_section_budget(),
            sample_budget_tokens: default_sample_budget(),
            overview_query_k: default_overview_query_k(),
            max_overview_passages: default_max_overview_passages(),
            min_overview_passages: default_min_overview_passages(),
            dedup_prefix_chars: default_dedup_prefix_chars(),
            min_partial_chars: default_min_partial_chars(),
            min_exam_context_chars: default_min_exam_context_chars(),
            overview_queries: default_overview_queries(),
            overview_fallback_query: default_overview_fallback_query(),
            overview_fallback_k: default_overview_fallback_k(),
            exam_queries: default_exam_queries(),
            subject_sample_query: default_subject_sample_query(),
            domain_vocabulary: default_domain_vocabulary(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            answer_max_tokens: default_answer_max_tokens(),
            multiple_choice_max_tokens: default_multiple_choice_max_tokens(),
            section_max_tokens: default_section_max_tokens(),
            exam_context_chars: default_exam_context_chars(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history_length: default_max_history_length(),
            history_turns_in_prompt: default_history_turns_in_prompt(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            supported_extensions: default_supported_extensions(),
            min_extracted_chars: default_min_extracted_chars(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
            metrics_port: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__RETRIEVAL__QA_TOP_K=8
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load from a specific configuration file
    pub fn from_file(path: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate_all()?;
        Ok(config)
    }

    /// Field ranges plus the checks that span several fields
    pub fn validate_all(&self) -> Result<()> {
        self.validate()?;

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AppError::Configuration {
                message: format!(
                    "chunk_overlap ({}) must be smaller than chunk_size ({})",
                    self.chunking.chunk_overlap, self.chunking.chunk_size
                ),
            });
        }

        if self.retrieval.min_overview_passages > self.retrieval.max_overview_passages {
            return Err(AppError::Configuration {
                message: "min_overview_passages exceeds max_overview_passages".to_string(),
            });
        }

        Ok(())
    }
}
