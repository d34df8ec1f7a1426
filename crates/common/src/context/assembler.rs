//! Context Assembler - Turns a query into a budgeted context
//!
//! Provides:
//! - Relevance-filtered specific retrieval with unfiltered fallback
//! - Multi-query overview retrieval with deduplication and intro ranking
//! - Topical exam-context gathering with per-query sub-budgets

use super::context_stitcher::{ContextBundle, ContextStitcher, ContextStitcherConfig};
use super::query_parser::{QueryClassifier, QueryKind};
use crate::config::RetrievalConfig;
use crate::errors::Result;
use crate::index::VectorIndex;
use crate::metrics;
use crate::models::{Passage, ScoredPassage};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Delimiter placed between exam-context sub-contexts
pub const TECHNICAL_SECTION_DELIMITER: &str = "\n\n=== TECHNICAL CONTENT SECTION ===\n\n";

/// Terms counted when ranking overview passages
const INTRO_KEYWORDS: &[&str] = &[
    "introduction",
    "overview",
    "summary",
    "define",
    "definition",
    "objectives",
    "goals",
    "purpose",
    "outline",
    "after this lesson",
];

/// Outcome of a specific search
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub passages: Vec<ScoredPassage>,

    /// Fewer than `k / fallback_divisor` passages passed the threshold
    pub degraded: bool,
}

/// Flattened context for callers that only need text and provenance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuiltContext {
    pub content: String,
    pub sources: Vec<String>,
}

impl From<&ContextBundle> for BuiltContext {
    fn from(bundle: &ContextBundle) -> Self {
        Self {
            content: bundle.text(),
            sources: bundle.sources(),
        }
    }
}

/// Material gathered for exam synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamContext {
    /// Sub-contexts joined by [`TECHNICAL_SECTION_DELIMITER`]
    pub text: String,

    /// Distinct source labels across all sub-contexts
    pub sources: Vec<String>,

    /// Vocabulary terms found in the subject sample
    pub subject_terms: Vec<String>,

    /// Number of non-empty sub-contexts
    pub section_count: usize,
}

/// Query-to-context pipeline over a vector index
pub struct ContextAssembler {
    index: Arc<dyn VectorIndex>,
    classifier: QueryClassifier,
    stitcher: ContextStitcher,
    config: RetrievalConfig,
}

impl ContextAssembler {
    pub fn new(index: Arc<dyn VectorIndex>, config: RetrievalConfig) -> Self {
        let stitcher = ContextStitcher::new(ContextStitcherConfig {
            min_partial_chars: config.min_partial_chars,
        });

        Self {
            index,
            classifier: QueryClassifier::default(),
            stitcher,
            config,
        }
    }

    /// Replace the broad-intent classifier
    pub fn with_classifier(mut self, classifier: QueryClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Classify a query as overview or specific
    pub fn classify(&self, query: &str) -> QueryKind {
        self.classifier.classify(query)
    }

    /// Default token budget for a query kind
    pub fn budget_for(&self, kind: QueryKind) -> usize {
        match kind {
            QueryKind::Overview => self.config.overview_budget_tokens,
            QueryKind::Specific => self.config.specific_budget_tokens,
        }
    }

    /// Fetch `2k`, keep scores above the threshold up to `k`; below
    /// `k / fallback_divisor` survivors, re-fetch exactly `k` unfiltered.
    #[instrument(skip(self), fields(index = self.index.name()))]
    pub async fn retrieve_specific(&self, query: &str, k: usize) -> Result<Retrieval> {
        let candidates = self.index.search(query, k.saturating_mul(2)).await?;

        let filtered: Vec<ScoredPassage> = candidates
            .into_iter()
            .filter(|c| c.score > self.config.relevance_threshold)
            .take(k)
            .collect();

        let floor = k / self.config.fallback_divisor.max(1);
        if filtered.len() < floor {
            warn!(
                kept = filtered.len(),
                floor,
                threshold = self.config.relevance_threshold,
                "Low relevance scores, falling back to unfiltered search"
            );
            metrics::record_degraded_retrieval();

            let passages = self.index.search(query, k).await?;
            return Ok(Retrieval {
                passages,
                degraded: true,
            });
        }

        debug!(kept = filtered.len(), "Relevance filter applied");
        Ok(Retrieval {
            passages: filtered,
            degraded: false,
        })
    }

    /// Collect deduplicated introductory passages, ranked by intro score
    #[instrument(skip(self), fields(index = self.index.name()))]
    pub async fn retrieve_overview(&self) -> Result<Vec<Passage>> {
        let max = self.config.max_overview_passages;
        let mut seen: HashSet<String> = HashSet::new();
        let mut collected: Vec<Passage> = Vec::new();

        for query in &self.config.overview_queries {
            let results = self.index.search(query, self.config.overview_query_k).await?;
            self.collect_unique(results, &mut seen, &mut collected);
            if collected.len() >= max {
                break;
            }
        }

        if collected.len() < self.config.min_overview_passages {
            debug!(
                found = collected.len(),
                "Thin overview retrieval, topping up from generic query"
            );
            let results = self
                .index
                .search(
                    &self.config.overview_fallback_query,
                    self.config.overview_fallback_k,
                )
                .await?;
            self.collect_unique(results, &mut seen, &mut collected);
        }

        // Stable: equal scores keep retrieval order
        collected.sort_by_key(|p| std::cmp::Reverse(intro_score(&p.content)));

        debug!(passages = collected.len(), "Overview passages collected");
        Ok(collected)
    }

    fn collect_unique(
        &self,
        results: Vec<ScoredPassage>,
        seen: &mut HashSet<String>,
        collected: &mut Vec<Passage>,
    ) {
        for result in results {
            if collected.len() >= self.config.max_overview_passages {
                break;
            }
            let hash = result.passage.content_hash(self.config.dedup_prefix_chars);
            if seen.insert(hash) {
                collected.push(result.passage);
            }
        }
    }

    /// Budgeted context from a specific search with `k` passages
    pub async fn specific_context(
        &self,
        query: &str,
        k: usize,
        budget_tokens: usize,
    ) -> Result<ContextBundle> {
        let retrieval = self.retrieve_specific(query, k).await?;
        let mut bundle = self
            .stitcher
            .stitch(retrieval.passages.iter().map(|s| &s.passage), budget_tokens);
        bundle.degraded = retrieval.degraded;

        metrics::record_context_build(
            QueryKind::Specific.as_str(),
            bundle.len(),
            bundle.token_estimate,
        );
        Ok(bundle)
    }

    /// Budgeted context from overview retrieval
    pub async fn overview_context(&self, budget_tokens: usize) -> Result<ContextBundle> {
        let passages = self.retrieve_overview().await?;
        let bundle = self.stitcher.stitch(&passages, budget_tokens);

        metrics::record_context_build(
            QueryKind::Overview.as_str(),
            bundle.len(),
            bundle.token_estimate,
        );
        Ok(bundle)
    }

    /// Classify `query` and assemble a context within `budget_tokens`
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn answer_context(&self, query: &str, budget_tokens: usize) -> Result<ContextBundle> {
        match self.classify(query) {
            QueryKind::Overview => self.overview_context(budget_tokens).await,
            QueryKind::Specific => {
                self.specific_context(query, self.config.qa_top_k, budget_tokens)
                    .await
            }
        }
    }

    /// Classify `query` and assemble a context with the configured budget
    pub async fn question_context(&self, query: &str) -> Result<(QueryKind, ContextBundle)> {
        let kind = self.classify(query);
        let bundle = self.answer_context(query, self.budget_for(kind)).await?;
        info!(
            kind = %kind,
            entries = bundle.len(),
            tokens = bundle.token_estimate,
            degraded = bundle.degraded,
            "Context assembled"
        );
        Ok((kind, bundle))
    }

    /// Assemble a context and flatten it to text plus sources
    pub async fn build_context(&self, query: &str, budget_tokens: usize) -> Result<BuiltContext> {
        let bundle = self.answer_context(query, budget_tokens).await?;
        Ok(BuiltContext::from(&bundle))
    }

    /// Gather topical material for exam synthesis.
    ///
    /// Returns `None` when the combined trimmed text is shorter than
    /// `min_exam_context_chars`.
    #[instrument(skip(self), fields(index = self.index.name()))]
    pub async fn exam_context(&self) -> Result<Option<ExamContext>> {
        let k = self.config.exam_top_k;
        let section_budget = self.config.exam_section_budget_tokens;

        let sample = self
            .specific_context(
                &self.config.subject_sample_query,
                k,
                self.config.sample_budget_tokens,
            )
            .await?;
        let subject_terms = match_vocabulary(&sample.text(), &self.config.domain_vocabulary);

        let mut queries: Vec<String> = Vec::with_capacity(self.config.exam_queries.len() + 1);
        if !subject_terms.is_empty() {
            let lead: Vec<&str> = subject_terms.iter().take(3).map(String::as_str).collect();
            queries.push(format!("{} methods principles", lead.join(" ")));
        }
        queries.extend(self.config.exam_queries.iter().cloned());

        let mut parts: Vec<String> = Vec::new();
        let mut sources: Vec<String> = Vec::new();
        for query in &queries {
            let bundle = self.specific_context(query, k, section_budget).await?;
            if bundle.is_empty() {
                continue;
            }
            for source in bundle.sources() {
                if !sources.contains(&source) {
                    sources.push(source);
                }
            }
            parts.push(bundle.text());
        }

        let text = parts.join(TECHNICAL_SECTION_DELIMITER);
        let trimmed_chars = text.trim().chars().count();
        if trimmed_chars < self.config.min_exam_context_chars {
            warn!(chars = trimmed_chars, "Insufficient exam context");
            return Ok(None);
        }

        info!(
            sections = parts.len(),
            chars = trimmed_chars,
            subject_terms = ?subject_terms,
            "Exam context assembled"
        );

        Ok(Some(ExamContext {
            text,
            sources,
            subject_terms,
            section_count: parts.len(),
        }))
    }
}

/// Count of intro keywords, +2 for a first-page or introduction marker
pub fn intro_score(content: &str) -> usize {
    let content = content.to_lowercase();
    let mut score = INTRO_KEYWORDS
        .iter()
        .filter(|k| content.contains(*k))
        .count();
    if content.contains("page 1") || content.contains("introduction") {
        score += 2;
    }
    score
}

/// Vocabulary terms that occur in `text`, case-insensitively, in vocabulary order
pub fn match_vocabulary(text: &str, vocabulary: &[String]) -> Vec<String> {
    let text = text.to_lowercase();
    vocabulary
        .iter()
        .filter(|term| text.contains(&term.to_lowercase()))
        .cloned()
        .collect()
}
