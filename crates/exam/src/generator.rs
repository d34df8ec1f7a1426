//! Exam Synthesizer - Generates multi-section exams from study context
//!
//! Provides:
//! - One model call per requested section, run concurrently
//! - Strict per-section decoding; malformed sections are dropped
//! - Fixed presentation order regardless of completion order
//! - Phase notifications for progress reporting

use crate::models::{Exam, ExamConfig, ExamSection, Question, SectionKind};
use crate::parser::parse_section;
use crate::prompts::{section_prompt, SYSTEM_PROMPT};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use studyforge_common::config::GenerationConfig;
use studyforge_common::errors::Result;
use studyforge_common::llm::{ChatMessage, ChatModel, CompletionOptions};
use studyforge_common::metrics;
use tracing::{error, info, instrument, warn};

/// Progress of one generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamPhase {
    Idle,
    Generating(SectionKind),
    Assembling,
    Complete,
    Failed,
}

/// Receives every phase transition
pub type PhaseCallback = Arc<dyn Fn(ExamPhase) + Send + Sync>;

/// Generation options
#[derive(Debug, Clone)]
pub struct ExamOptions {
    /// Temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Output token ceiling for multiple-choice sections
    pub multiple_choice_max_tokens: u32,

    /// Output token ceiling for the other sections
    pub section_max_tokens: u32,

    /// Context characters included in each prompt
    pub max_context_chars: usize,
}

impl Default for ExamOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            multiple_choice_max_tokens: 2000,
            section_max_tokens: 1500,
            max_context_chars: 3500,
        }
    }
}

impl ExamOptions {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            multiple_choice_max_tokens: config.multiple_choice_max_tokens,
            section_max_tokens: config.section_max_tokens,
            max_context_chars: config.exam_context_chars,
        }
    }

    fn completion_options(&self, kind: SectionKind) -> CompletionOptions {
        let max_output_tokens = match kind {
            SectionKind::MultipleChoice => self.multiple_choice_max_tokens,
            _ => self.section_max_tokens,
        };

        CompletionOptions {
            temperature: self.temperature,
            max_output_tokens,
        }
    }
}

/// Synthesizer for practice exams
pub struct ExamSynthesizer {
    model: Arc<dyn ChatModel>,
    options: ExamOptions,
    on_phase: Option<PhaseCallback>,
}

impl ExamSynthesizer {
    pub fn new(model: Arc<dyn ChatModel>, options: ExamOptions) -> Self {
        Self {
            model,
            options,
            on_phase: None,
        }
    }

    pub fn with_phase_callback(mut self, callback: PhaseCallback) -> Self {
        self.on_phase = Some(callback);
        self
    }

    pub fn options(&self) -> &ExamOptions {
        &self.options
    }

    fn notify(&self, phase: ExamPhase) {
        if let Some(callback) = &self.on_phase {
            callback(phase);
        }
    }

    /// Generate an exam from `context`.
    ///
    /// Sections that come back malformed are left out. A failed model call
    /// fails the whole request. An exam without sections is returned as is;
    /// callers decide whether that is usable.
    #[instrument(skip(self, context), fields(difficulty = %config.difficulty, context_len = context.len()))]
    pub async fn generate(&self, context: &str, config: &ExamConfig) -> Result<Exam> {
        let start = Instant::now();
        self.notify(ExamPhase::Idle);

        let requested = config.requested();
        if requested.is_empty() {
            warn!("No questions requested");
        }

        let calls = requested.iter().map(|&(kind, count)| {
            self.notify(ExamPhase::Generating(kind));
            self.generate_section(kind, count, config, context)
        });
        let outcomes = join_all(calls).await;

        self.notify(ExamPhase::Assembling);

        let mut sections = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(Some(section)) => sections.push(section),
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "Exam generation failed");
                    self.notify(ExamPhase::Failed);
                    return Err(e);
                }
            }
        }

        let exam = Exam::new(config.difficulty, sections);
        let elapsed = start.elapsed().as_secs_f64();
        metrics::record_exam_generation(elapsed, exam.total_questions);

        info!(
            sections = exam.sections.len(),
            total_questions = exam.total_questions,
            duration_ms = (elapsed * 1000.0) as u64,
            "Exam generated"
        );

        self.notify(ExamPhase::Complete);
        Ok(exam)
    }

    /// `Ok(None)` when the reply could not be used
    async fn generate_section(
        &self,
        kind: SectionKind,
        count: u32,
        config: &ExamConfig,
        context: &str,
    ) -> Result<Option<ExamSection>> {
        let prompt = section_prompt(
            kind,
            count,
            config.difficulty,
            context,
            self.options.max_context_chars,
        );
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];

        let start = Instant::now();
        let result = self
            .model
            .complete(&messages, &self.options.completion_options(kind))
            .await;
        let elapsed = start.elapsed().as_secs_f64();

        let completion = match result {
            Ok(completion) => completion,
            Err(e) => {
                metrics::record_model_call(kind.as_str(), elapsed, false, None);
                metrics::record_exam_section(kind.as_str(), "failed");
                return Err(e);
            }
        };
        metrics::record_model_call(kind.as_str(), elapsed, true, completion.usage.as_ref());

        let questions: Vec<Question> = match parse_section(kind, &completion.content, count as usize) {
            Ok(questions) => questions,
            Err(reason) => {
                let e = reason.into_app_error(kind);
                warn!(section = %kind, error = %e, "Dropping section");
                metrics::record_exam_section(kind.as_str(), "dropped");
                return Ok(None);
            }
        };

        info!(
            section = %kind,
            questions = questions.len(),
            difficulty = %config.difficulty,
            "Section generated"
        );
        metrics::record_exam_section(kind.as_str(), "generated");

        Ok(Some(ExamSection::new(kind, questions)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use studyforge_common::llm::{Completion, ScriptedModel};
    use studyforge_common::AppError;

    const MC_TRIGGER: &str = "multiple choice questions based";
    const TF_TRIGGER: &str = "true/false questions based";
    const SA_TRIGGER: &str = "short answer questions based";
    const ESSAY_TRIGGER: &str = "essay questions based";

    const MC_REPLY: &str = r#"[{"question": "Which method finds subsurface flaws?",
        "choices": {"A": "Visual", "B": "Ultrasonic", "C": "Penetrant", "D": "Magnetic"},
        "correct_answer": "B", "explanation": "Sound penetrates the part."}]"#;
    const TF_REPLY: &str = r#"[
        {"statement": "Penetrant testing finds surface cracks.", "correct_answer": true, "explanation": "It relies on capillary action."},
        {"statement": "Radiography needs couplant.", "correct_answer": false, "explanation": "Couplant is for ultrasound."}
    ]"#;
    const SA_REPLY: &str = r#"```json
[{"question": "What is couplant?", "sample_answer": "A medium that transmits sound.", "key_points": "acoustic impedance"}]
```"#;
    const ESSAY_REPLY: &str = r#"[{"question": "Compare UT and RT.", "key_points": "sensitivity, safety", "guidance": "Use examples."}]"#;

    fn full_model() -> ScriptedModel {
        ScriptedModel::new("unused")
            .on(MC_TRIGGER, MC_REPLY)
            .on(TF_TRIGGER, TF_REPLY)
            .on(SA_TRIGGER, SA_REPLY)
            .on(ESSAY_TRIGGER, ESSAY_REPLY)
    }

    fn synthesizer(model: Arc<dyn ChatModel>) -> ExamSynthesizer {
        ExamSynthesizer::new(model, ExamOptions::default())
    }

    #[tokio::test]
    async fn test_full_exam() {
        let model = Arc::new(full_model());
        let exam = synthesizer(model.clone())
            .generate("Ultrasonic testing context", &ExamConfig::default())
            .await
            .unwrap();

        assert_eq!(exam.sections.len(), 4);
        assert_eq!(exam.total_questions, 5);
        assert_eq!(exam.title, "AI-Generated Practice Exam (Medium Difficulty)");
        assert_eq!(model.call_count().await, 4);
    }

    #[tokio::test]
    async fn test_malformed_section_is_dropped() {
        let model = Arc::new(
            ScriptedModel::new("unused")
                .on(MC_TRIGGER, "Sure! Here are five questions about ultrasound.")
                .on(TF_TRIGGER, TF_REPLY)
                .on(SA_TRIGGER, SA_REPLY)
                .on(ESSAY_TRIGGER, ESSAY_REPLY),
        );

        let exam = synthesizer(model)
            .generate("context", &ExamConfig::default())
            .await
            .unwrap();

        assert!(exam.section(SectionKind::MultipleChoice).is_none());
        assert_eq!(
            exam.sections.keys().copied().collect::<Vec<_>>(),
            vec![SectionKind::TrueFalse, SectionKind::ShortAnswer, SectionKind::Essay]
        );
        assert_eq!(exam.total_questions, 4);
    }

    #[tokio::test]
    async fn test_model_failure_is_fatal() {
        let model = Arc::new(
            ScriptedModel::new("unused")
                .fail_on(ESSAY_TRIGGER, "connection reset")
                .on(MC_TRIGGER, MC_REPLY)
                .on(TF_TRIGGER, TF_REPLY),
        );
        let phases = Arc::new(Mutex::new(Vec::new()));
        let recorded = phases.clone();

        let err = synthesizer(model)
            .with_phase_callback(Arc::new(move |phase| recorded.lock().unwrap().push(phase)))
            .generate("context", &ExamConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::GenerationFatal { .. }));
        assert_eq!(phases.lock().unwrap().last(), Some(&ExamPhase::Failed));
    }

    #[tokio::test]
    async fn test_all_zero_config() {
        let model = Arc::new(full_model());
        let config = ExamConfig::new(0, 0, 0, 0, Difficulty::Medium);

        let exam = synthesizer(model.clone()).generate("context", &config).await.unwrap();

        assert!(exam.is_empty());
        assert_eq!(exam.total_questions, 0);
        assert_eq!(model.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_phases_in_order() {
        let phases = Arc::new(Mutex::new(Vec::new()));
        let recorded = phases.clone();
        let config = ExamConfig::new(1, 0, 0, 1, Difficulty::Easy);

        synthesizer(Arc::new(full_model()))
            .with_phase_callback(Arc::new(move |phase| recorded.lock().unwrap().push(phase)))
            .generate("context", &config)
            .await
            .unwrap();

        assert_eq!(
            *phases.lock().unwrap(),
            vec![
                ExamPhase::Idle,
                ExamPhase::Generating(SectionKind::MultipleChoice),
                ExamPhase::Generating(SectionKind::Essay),
                ExamPhase::Assembling,
                ExamPhase::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn test_prompt_and_options_per_section() {
        let model = Arc::new(full_model());
        let config = ExamConfig::new(3, 0, 0, 0, Difficulty::Expert);

        synthesizer(model.clone())
            .generate(&"c".repeat(4000), &config)
            .await
            .unwrap();

        let calls = model.calls().await;
        assert_eq!(calls[0][0].content, SYSTEM_PROMPT);
        assert!(calls[0][1].content.starts_with("Create 3 multiple choice questions"));
        assert!(calls[0][1].content.contains("Difficulty Level: EXPERT"));
        assert!(!calls[0][1].content.contains(&"c".repeat(3501)));

        let options = ExamOptions::default();
        assert_eq!(options.completion_options(SectionKind::MultipleChoice).max_output_tokens, 2000);
        assert_eq!(options.completion_options(SectionKind::Essay).max_output_tokens, 1500);
    }

    /// Answers slowest for the first section so completion order is reversed
    struct DelayedModel;

    #[async_trait]
    impl ChatModel for DelayedModel {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _options: &CompletionOptions,
        ) -> Result<Completion> {
            let prompt = &messages[1].content;
            if prompt.contains(MC_TRIGGER) {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(Completion::text(MC_REPLY))
            } else {
                Ok(Completion::text(TF_REPLY))
            }
        }

        fn model_name(&self) -> &str {
            "delayed"
        }
    }

    #[tokio::test]
    async fn test_order_independent_of_completion() {
        let config = ExamConfig::new(1, 2, 0, 0, Difficulty::Medium);
        let exam = synthesizer(Arc::new(DelayedModel))
            .generate("context", &config)
            .await
            .unwrap();

        assert_eq!(
            exam.sections.keys().copied().collect::<Vec<_>>(),
            vec![SectionKind::MultipleChoice, SectionKind::TrueFalse]
        );
        assert_eq!(exam.total_questions, 3);
    }
}
