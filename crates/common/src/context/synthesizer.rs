//! Answer Synthesizer - Generates grounded answers from context
//!
//! Provides:
//! - Overview and specific system prompts
//! - Recent chat history replay
//! - Fixed reply when no context was retrieved

use super::context_stitcher::ContextBundle;
use super::query_parser::QueryKind;
use crate::config::{GenerationConfig, SessionConfig};
use crate::errors::Result;
use crate::llm::{ChatMessage, ChatModel, CompletionOptions, TokenUsage};
use crate::metrics;
use crate::models::ChatTurn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Reply given when retrieval produced no context
pub const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant information in your uploaded \
documents to answer this question. Please make sure you've uploaded relevant materials or try \
rephrasing your question.";

/// Synthesized answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text
    pub answer: String,

    /// Source labels of the context used
    pub sources: Vec<String>,

    /// Whether retrieval produced any context
    pub has_context: bool,

    /// Classification that drove retrieval
    pub kind: QueryKind,

    /// Token usage reported by the model, if any
    pub usage: Option<TokenUsage>,
}

/// Synthesis options
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// Maximum output tokens
    pub max_tokens: u32,

    /// Temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Most recent turns replayed before the question
    pub history_turns: usize,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
            history_turns: 5,
        }
    }
}

impl SynthesisOptions {
    pub fn from_config(generation: &GenerationConfig, session: &SessionConfig) -> Self {
        Self {
            max_tokens: generation.answer_max_tokens,
            temperature: generation.temperature,
            history_turns: session.history_turns_in_prompt,
        }
    }
}

/// Synthesizer for generating answers
pub struct AnswerSynthesizer {
    model: Arc<dyn ChatModel>,
    options: SynthesisOptions,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn ChatModel>, options: SynthesisOptions) -> Self {
        Self { model, options }
    }

    /// Answer `question` from `context`. An empty context short-circuits to
    /// [`NO_CONTEXT_ANSWER`] without a model call.
    #[instrument(skip_all, fields(kind = %kind, entries = context.len(), history = history.len()))]
    pub async fn synthesize(
        &self,
        question: &str,
        kind: QueryKind,
        context: &ContextBundle,
        history: &[ChatTurn],
    ) -> Result<Answer> {
        if context.is_empty() {
            warn!("No relevant context found in documents");
            return Ok(Answer {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
                has_context: false,
                kind,
                usage: None,
            });
        }

        let messages = self.build_messages(question, kind, &context.text(), history);
        let options = CompletionOptions {
            temperature: self.options.temperature,
            max_output_tokens: self.options.max_tokens,
        };

        let start = Instant::now();
        let result = self.model.complete(&messages, &options).await;
        let elapsed = start.elapsed().as_secs_f64();

        let completion = match result {
            Ok(completion) => completion,
            Err(e) => {
                metrics::record_model_call("answer", elapsed, false, None);
                return Err(e);
            }
        };
        metrics::record_model_call("answer", elapsed, true, completion.usage.as_ref());

        info!(
            model = self.model.model_name(),
            duration_ms = (elapsed * 1000.0) as u64,
            "Answer generated"
        );

        Ok(Answer {
            answer: completion.content,
            sources: context.sources(),
            has_context: true,
            kind,
            usage: completion.usage,
        })
    }

    /// System prompt, replayed history, then the question
    pub fn build_messages(
        &self,
        question: &str,
        kind: QueryKind,
        context: &str,
        history: &[ChatTurn],
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(system_prompt(kind, context))];

        let skip = history.len().saturating_sub(self.options.history_turns);
        for turn in &history[skip..] {
            messages.push(ChatMessage::user(turn.question.clone()));
            messages.push(ChatMessage::assistant(turn.answer.clone()));
        }

        messages.push(ChatMessage::user(question));
        messages
    }
}

fn system_prompt(kind: QueryKind, context: &str) -> String {
    match kind {
        QueryKind::Overview => format!(
            "You are a helpful AI study assistant. The user is asking for an overview of their \
uploaded document(s). Analyze the content below and provide a comprehensive summary.

Document Content:
{context}

Instructions:
1. Identify the main subject/topic of the document(s)
2. Summarize the key themes and concepts covered
3. Highlight important sections or chapters
4. Mention specific topics, methods, or areas discussed
5. Be specific about what the document teaches or covers
6. Structure your response clearly with main points
7. Use information directly from the provided content"
        ),
        QueryKind::Specific => format!(
            "You are a helpful AI study assistant. Answer the user's question based on the \
provided context from their academic documents.

Context from uploaded documents:
{context}

Instructions:
1. Answer based primarily on the provided context
2. Be accurate and cite specific information from the documents
3. If the context doesn't fully answer the question, say so
4. Use clear, educational language
5. Structure your response for easy understanding"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextEntry;
    use crate::llm::{ChatRole, ScriptedModel};

    fn bundle() -> ContextBundle {
        ContextBundle {
            entries: vec![ContextEntry {
                source: "ut-basics.pdf".to_string(),
                content: "Couplant removes the air gap between transducer and part.".to_string(),
                truncated: false,
            }],
            token_estimate: 14,
            budget_tokens: 3000,
            degraded: false,
        }
    }

    fn history(n: usize) -> Vec<ChatTurn> {
        (0..n)
            .map(|i| ChatTurn::new(format!("question {}", i), format!("answer {}", i), vec![], true))
            .collect()
    }

    #[tokio::test]
    async fn test_no_context_skips_model() {
        let model = Arc::new(ScriptedModel::new("should not be used"));
        let synthesizer = AnswerSynthesizer::new(model.clone(), SynthesisOptions::default());

        let answer = synthesizer
            .synthesize("why couplant?", QueryKind::Specific, &ContextBundle::default(), &[])
            .await
            .unwrap();

        assert_eq!(answer.answer, NO_CONTEXT_ANSWER);
        assert!(!answer.has_context);
        assert!(answer.sources.is_empty());
        assert_eq!(model.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_answer_carries_sources() {
        let model = Arc::new(ScriptedModel::new("It removes the air gap."));
        let synthesizer = AnswerSynthesizer::new(model.clone(), SynthesisOptions::default());

        let answer = synthesizer
            .synthesize("why couplant?", QueryKind::Specific, &bundle(), &[])
            .await
            .unwrap();

        assert_eq!(answer.answer, "It removes the air gap.");
        assert!(answer.has_context);
        assert_eq!(answer.sources, vec!["ut-basics.pdf".to_string()]);

        let calls = model.calls().await;
        assert!(calls[0][0].content.contains("[From: ut-basics.pdf]"));
        assert!(calls[0][0].content.starts_with("You are a helpful AI study assistant. Answer"));
    }

    #[test]
    fn test_history_is_limited_to_recent_turns() {
        let synthesizer = AnswerSynthesizer::new(
            Arc::new(ScriptedModel::new("")),
            SynthesisOptions::default(),
        );

        let messages = synthesizer.build_messages("latest", QueryKind::Overview, "ctx", &history(8));

        // system + 5 pairs + question
        assert_eq!(messages.len(), 12);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.contains("overview of their uploaded document"));
        assert_eq!(messages[1].content, "question 3");
        assert_eq!(messages[11].content, "latest");
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let synthesizer = AnswerSynthesizer::new(
            Arc::new(ScriptedModel::failing("timeout")),
            SynthesisOptions::default(),
        );

        let result = synthesizer
            .synthesize("why couplant?", QueryKind::Specific, &bundle(), &[])
            .await;
        assert!(result.is_err());
    }
}
