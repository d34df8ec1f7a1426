//! Metrics and observability utilities
//!
//! Provides Prometheus-compatible metrics through the `metrics` facade
//! with standardized naming. Binaries decide whether an exporter is installed;
//! without one every helper is a no-op.

use crate::llm::TokenUsage;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all StudyForge metrics
pub const METRICS_PREFIX: &str = "studyforge";

/// Buckets for model call latency (in seconds)
pub const MODEL_LATENCY_BUCKETS: &[f64] = &[
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.000,  // 2s
    5.000,  // 5s
    10.00,  // 10s
    20.00,  // 20s
    30.00,  // 30s
    60.00,  // 60s
];

/// Buckets for document ingestion latency (in seconds)
pub const INGESTION_BUCKETS: &[f64] = &[
    0.010,  // 10ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.500,  // 500ms
    1.000,  // 1s
    5.000,  // 5s
    15.00,  // 15s
    60.00,  // 60s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Ingestion metrics
    describe_counter!(
        format!("{}_documents_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Total documents submitted for ingestion"
    );

    describe_histogram!(
        format!("{}_ingestion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Document ingestion latency in seconds"
    );

    describe_counter!(
        format!("{}_passages_created_total", METRICS_PREFIX),
        Unit::Count,
        "Passages that passed the quality gate"
    );

    describe_counter!(
        format!("{}_passages_rejected_total", METRICS_PREFIX),
        Unit::Count,
        "Windows dropped by the quality gate"
    );

    // Retrieval metrics
    describe_counter!(
        format!("{}_context_builds_total", METRICS_PREFIX),
        Unit::Count,
        "Context bundles assembled"
    );

    describe_histogram!(
        format!("{}_context_tokens", METRICS_PREFIX),
        Unit::Count,
        "Estimated tokens per assembled context"
    );

    describe_counter!(
        format!("{}_retrieval_degraded_total", METRICS_PREFIX),
        Unit::Count,
        "Specific searches that fell back to unfiltered results"
    );

    // Model metrics
    describe_counter!(
        format!("{}_model_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total language model calls"
    );

    describe_histogram!(
        format!("{}_model_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Language model call latency in seconds"
    );

    describe_counter!(
        format!("{}_model_tokens_total", METRICS_PREFIX),
        Unit::Count,
        "Tokens reported by the model service"
    );

    // Session metrics
    describe_counter!(
        format!("{}_questions_answered_total", METRICS_PREFIX),
        Unit::Count,
        "Questions answered in study sessions"
    );

    describe_counter!(
        format!("{}_exam_sections_total", METRICS_PREFIX),
        Unit::Count,
        "Exam sections by outcome"
    );

    describe_histogram!(
        format!("{}_exam_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end exam generation latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record ingestion metrics
pub fn record_ingestion(duration_secs: f64, source_type: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_documents_ingested_total", METRICS_PREFIX),
        "source_type" => source_type.to_string(),
        "status" => status
    )
    .increment(1);

    histogram!(format!("{}_ingestion_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Helper to record chunking outcome
pub fn record_chunking(source_type: &str, created: usize, rejected: usize) {
    counter!(
        format!("{}_passages_created_total", METRICS_PREFIX),
        "source_type" => source_type.to_string()
    )
    .increment(created as u64);

    counter!(
        format!("{}_passages_rejected_total", METRICS_PREFIX),
        "source_type" => source_type.to_string()
    )
    .increment(rejected as u64);
}

/// Helper to record a context build
pub fn record_context_build(kind: &str, entries: usize, tokens: usize) {
    counter!(
        format!("{}_context_builds_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "empty" => (entries == 0).to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_context_tokens", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .record(tokens as f64);
}

/// Helper to record a relevance-filter fallback
pub fn record_degraded_retrieval() {
    counter!(format!("{}_retrieval_degraded_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record model call metrics
pub fn record_model_call(
    purpose: &str,
    duration_secs: f64,
    success: bool,
    usage: Option<&TokenUsage>,
) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_model_calls_total", METRICS_PREFIX),
        "purpose" => purpose.to_string(),
        "status" => status
    )
    .increment(1);

    histogram!(
        format!("{}_model_duration_seconds", METRICS_PREFIX),
        "purpose" => purpose.to_string()
    )
    .record(duration_secs);

    if let Some(usage) = usage {
        counter!(
            format!("{}_model_tokens_total", METRICS_PREFIX),
            "purpose" => purpose.to_string(),
            "direction" => "prompt"
        )
        .increment(u64::from(usage.prompt_tokens));

        counter!(
            format!("{}_model_tokens_total", METRICS_PREFIX),
            "purpose" => purpose.to_string(),
            "direction" => "completion"
        )
        .increment(u64::from(usage.completion_tokens));
    }
}

/// Helper to record an answered question
pub fn record_question(kind: &str, has_context: bool) {
    counter!(
        format!("{}_questions_answered_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "has_context" => has_context.to_string()
    )
    .increment(1);
}

/// Helper to record a section outcome (`generated` or `dropped`)
pub fn record_exam_section(section: &str, outcome: &str) {
    counter!(
        format!("{}_exam_sections_total", METRICS_PREFIX),
        "section" => section.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Helper to record exam generation latency
pub fn record_exam_generation(duration_secs: f64, total_questions: usize) {
    histogram!(
        format!("{}_exam_generation_duration_seconds", METRICS_PREFIX),
        "empty" => (total_questions == 0).to_string()
    )
    .record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_are_sorted() {
        for buckets in [MODEL_LATENCY_BUCKETS, INGESTION_BUCKETS] {
            let mut prev = 0.0;
            for &bucket in buckets {
                assert!(bucket > prev);
                prev = bucket;
            }
        }
    }

    #[test]
    fn test_helpers_without_recorder() {
        let usage = TokenUsage {
            prompt_tokens: 120,
            completion_tokens: 40,
            total_tokens: 160,
        };
        record_model_call("answer", 0.2, true, Some(&usage));
        record_context_build("specific", 3, 900);
        record_degraded_retrieval();
        // Just verify it runs without panic
    }
}
