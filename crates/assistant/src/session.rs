//! Study session
//!
//! Owns the services a learner interacts with and the state they build up:
//! - Document uploads into the shared index
//! - Question answering with bounded chat history
//! - Practice exams over everything uploaded

use crate::documents::DocumentRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use studyforge_common::config::AppConfig;
use studyforge_common::context::{Answer, AnswerSynthesizer, ContextAssembler, SynthesisOptions};
use studyforge_common::errors::{AppError, Result};
use studyforge_common::llm::ChatModel;
use studyforge_common::metrics;
use studyforge_common::models::{ChatTurn, Metadata};
use studyforge_common::VectorIndex;
use studyforge_exam::{
    render_questions_only, render_with_answer_key, Exam, ExamConfig, ExamOptions, ExamSynthesizer,
    PhaseCallback,
};
use studyforge_ingestion::IngestionProcessor;
use tracing::{info, instrument, warn};

pub const NO_DOCUMENTS: &str = "No documents uploaded. Please upload study materials first.";

pub const INSUFFICIENT_CONTENT: &str = "Could not extract sufficient content from uploaded \
documents. Please ensure your PDFs contain readable text and try uploading again.";

pub const NO_QUESTIONS_REQUESTED: &str =
    "The exam configuration requests no questions. Select at least one question type.";

pub const NO_QUESTIONS_GENERATED: &str =
    "Failed to generate exam questions from the uploaded content.";

/// An exam with both renderings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedExam {
    pub exam: Exam,
    pub questions_only: String,
    pub answer_key: String,

    /// Source labels of the context the exam was built from
    pub sources: Vec<String>,
}

/// Snapshot of session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub model: String,
    pub index: String,
    pub passages_indexed: usize,
    pub uploaded_documents: usize,
    pub history_length: usize,
}

/// One learner's session over a shared index and model
pub struct StudySession {
    processor: IngestionProcessor,
    index: Arc<dyn VectorIndex>,
    model: Arc<dyn ChatModel>,
    assembler: ContextAssembler,
    synthesizer: AnswerSynthesizer,
    exams: ExamSynthesizer,
    history: Vec<ChatTurn>,
    documents: Vec<DocumentRecord>,
    max_history_length: usize,
}

impl StudySession {
    /// Build every service from `config` around the given index and model
    pub fn new(
        config: &AppConfig,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let processor = IngestionProcessor::from_config(config, index.clone())?;
        let assembler = ContextAssembler::new(index.clone(), config.retrieval.clone());
        let synthesizer = AnswerSynthesizer::new(
            model.clone(),
            SynthesisOptions::from_config(&config.generation, &config.session),
        );
        let exams = ExamSynthesizer::new(model.clone(), ExamOptions::from_config(&config.generation));

        info!(
            index = index.name(),
            model = model.model_name(),
            "Study session created"
        );

        Ok(Self {
            processor,
            index,
            model,
            assembler,
            synthesizer,
            exams,
            history: Vec::new(),
            documents: Vec::new(),
            max_history_length: config.session.max_history_length,
        })
    }

    /// Report exam progress through `callback`
    pub fn with_exam_phase_callback(mut self, callback: PhaseCallback) -> Self {
        self.exams = self.exams.with_phase_callback(callback);
        self
    }

    pub fn assembler(&self) -> &ContextAssembler {
        &self.assembler
    }

    /// Ingest a file and track it
    #[instrument(skip(self, metadata), fields(path = %path.display()))]
    pub async fn upload_document(
        &mut self,
        path: &Path,
        metadata: &Metadata,
    ) -> Result<DocumentRecord> {
        let mut metadata = metadata.clone();
        metadata
            .entry("upload_method".to_string())
            .or_insert_with(|| "session".into());

        let report = self.processor.ingest_file(path, &metadata).await?;
        let record = DocumentRecord::from(report);

        info!(
            document_id = %record.document_id,
            filename = %record.filename,
            passages = record.passage_count,
            "Document uploaded"
        );
        self.documents.push(record.clone());
        Ok(record)
    }

    /// Ingest caller-supplied text under `name` and track it
    #[instrument(skip(self, text, metadata), fields(chars = text.len()))]
    pub async fn upload_text(
        &mut self,
        name: &str,
        text: &str,
        metadata: &Metadata,
    ) -> Result<DocumentRecord> {
        let report = self.processor.ingest_text(name, text, metadata).await?;
        let record = DocumentRecord::from(report);

        info!(
            document_id = %record.document_id,
            passages = record.passage_count,
            "Text uploaded"
        );
        self.documents.push(record.clone());
        Ok(record)
    }

    /// Answer a question from the uploaded documents and record the turn
    #[instrument(skip(self), fields(history = self.history.len()))]
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::input("Please enter a question."));
        }

        let (kind, context) = self.assembler.question_context(question).await?;
        let answer = self
            .synthesizer
            .synthesize(question, kind, &context, &self.history)
            .await?;

        metrics::record_question(kind.as_str(), answer.has_context);

        self.history.push(ChatTurn::new(
            question,
            answer.answer.clone(),
            answer.sources.clone(),
            answer.has_context,
        ));
        if self.history.len() > self.max_history_length {
            let excess = self.history.len() - self.max_history_length;
            self.history.drain(..excess);
        }

        Ok(answer)
    }

    /// Build a practice exam from everything uploaded so far
    #[instrument(skip(self, config), fields(documents = self.documents.len()))]
    pub async fn generate_exam(&self, config: &ExamConfig) -> Result<GeneratedExam> {
        if self.documents.is_empty() {
            return Err(AppError::input(NO_DOCUMENTS));
        }

        if config.total_requested() == 0 {
            return Err(AppError::input(NO_QUESTIONS_REQUESTED));
        }

        let context = self
            .assembler
            .exam_context()
            .await?
            .ok_or_else(|| AppError::input(INSUFFICIENT_CONTENT))?;

        let exam = self.exams.generate(&context.text, config).await?;
        if exam.is_empty() {
            warn!("Every exam section was dropped");
            return Err(AppError::input(NO_QUESTIONS_GENERATED));
        }

        Ok(GeneratedExam {
            questions_only: render_questions_only(&exam),
            answer_key: render_with_answer_key(&exam),
            sources: context.sources,
            exam,
        })
    }

    /// Chat turns, oldest first
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        info!("Chat history cleared");
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub async fn status(&self) -> Result<SessionStatus> {
        Ok(SessionStatus {
            model: self.model.model_name().to_string(),
            index: self.index.name().to_string(),
            passages_indexed: self.index.count().await?,
            uploaded_documents: self.documents.len(),
            history_length: self.history.len(),
        })
    }

    /// Clear history, document tracking and the index
    pub async fn reset(&mut self) -> Result<()> {
        info!("Resetting session");
        self.history.clear();
        self.documents.clear();
        self.index.reset().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyforge_common::context::NO_CONTEXT_ANSWER;
    use studyforge_common::embeddings::HashEmbedder;
    use studyforge_common::index::InMemoryIndex;
    use studyforge_common::llm::ScriptedModel;
    use studyforge_exam::{Difficulty, SectionKind};

    const NOTES: &str = "Ultrasonic testing sends high-frequency sound waves into a part to \
        locate internal flaws. Reflections from cracks and voids return to the probe and \
        are displayed as echoes on the instrument screen.\n\nRadiographic testing uses \
        x-rays or gamma rays passing through the specimen. Denser regions absorb more \
        radiation, so voids and inclusions appear darker on the exposed film.\n\n\
        Magnetic particle testing magnetizes ferromagnetic components so that surface \
        defects disturb the flux and attract fine iron particles, forming indications.";

    const TF_REPLY: &str = r#"[{"statement": "Ultrasonic testing uses sound.", "correct_answer": true, "explanation": "High-frequency sound waves."}]"#;

    fn session(model: ScriptedModel) -> (StudySession, Arc<ScriptedModel>) {
        let mut config = AppConfig::default();
        config.session.max_history_length = 3;

        let model = Arc::new(model);
        let index = Arc::new(InMemoryIndex::new(Arc::new(HashEmbedder::default())));
        let session = StudySession::new(&config, index, model.clone()).unwrap();
        (session, model)
    }

    #[tokio::test]
    async fn test_ask_without_documents_returns_fixed_message() {
        let (mut session, model) = session(ScriptedModel::new("should not be called"));

        let answer = session.ask("How does ultrasonic testing work?").await.unwrap();

        assert_eq!(answer.answer, NO_CONTEXT_ANSWER);
        assert!(!answer.has_context);
        assert_eq!(model.call_count().await, 0);
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_ask_uses_uploaded_text() {
        let (mut session, model) = session(ScriptedModel::new("Sound waves reflect off flaws."));
        session.upload_text("ndt-notes", NOTES, &Metadata::new()).await.unwrap();

        let answer = session.ask("How does ultrasonic testing find flaws?").await.unwrap();

        assert!(answer.has_context);
        assert_eq!(answer.answer, "Sound waves reflect off flaws.");
        assert_eq!(answer.sources, vec!["ndt-notes".to_string()]);
        assert_eq!(model.call_count().await, 1);

        let turn = &session.history()[0];
        assert_eq!(turn.question, "How does ultrasonic testing find flaws?");
        assert_eq!(turn.sources, answer.sources);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let (mut session, _) = session(ScriptedModel::new("ok"));

        for i in 0..5 {
            session.ask(&format!("question {}", i)).await.unwrap();
        }

        let questions: Vec<&str> = session.history().iter().map(|t| t.question.as_str()).collect();
        assert_eq!(questions, vec!["question 2", "question 3", "question 4"]);

        session.clear_history();
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_is_not_recorded() {
        let (mut session, _) = session(ScriptedModel::failing("unauthorized"));
        session.upload_text("ndt-notes", NOTES, &Metadata::new()).await.unwrap();

        let err = session.ask("What is radiographic testing?").await.unwrap_err();

        assert!(matches!(err, AppError::GenerationFatal { .. }));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let (mut session, _) = session(ScriptedModel::new("ok"));
        assert!(session.ask("   ").await.unwrap_err().is_input_error());
    }

    #[tokio::test]
    async fn test_exam_requires_documents() {
        let (session, _) = session(ScriptedModel::new(TF_REPLY));
        let err = session.generate_exam(&ExamConfig::default()).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Invalid input: {}", NO_DOCUMENTS));
    }

    #[tokio::test]
    async fn test_exam_with_no_requested_questions_fails() {
        let (mut session, model) = session(ScriptedModel::new(TF_REPLY));
        session.upload_text("ndt-notes", NOTES, &Metadata::new()).await.unwrap();

        let config = ExamConfig::new(0, 0, 0, 0, Difficulty::Medium);
        let err = session.generate_exam(&config).await.unwrap_err();

        assert!(err.is_input_error());
        assert_eq!(model.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_exam_with_no_surviving_sections_fails() {
        let (mut session, _) = session(ScriptedModel::new("not json"));
        session.upload_text("ndt-notes", NOTES, &Metadata::new()).await.unwrap();

        let err = session.generate_exam(&ExamConfig::default()).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Invalid input: {}", NO_QUESTIONS_GENERATED));
    }

    #[tokio::test]
    async fn test_generate_exam() {
        let (mut session, _) = session(ScriptedModel::new("not json").on("true/false", TF_REPLY));
        session.upload_text("ndt-notes", NOTES, &Metadata::new()).await.unwrap();

        let generated = session
            .generate_exam(&ExamConfig::new(2, 3, 0, 0, Difficulty::Easy))
            .await
            .unwrap();

        assert_eq!(
            generated.exam.sections.keys().copied().collect::<Vec<_>>(),
            vec![SectionKind::TrueFalse]
        );
        assert_eq!(generated.exam.total_questions, 1);
        assert!(generated.answer_key.contains("**Correct Answer:** True"));
        assert!(!generated.questions_only.contains("Correct Answer"));
        assert_eq!(generated.sources, vec!["ndt-notes".to_string()]);
    }

    #[tokio::test]
    async fn test_status_and_reset() {
        let (mut session, _) = session(ScriptedModel::new("ok"));
        let record = session.upload_text("ndt-notes", NOTES, &Metadata::new()).await.unwrap();
        session.ask("What is magnetic particle testing?").await.unwrap();

        assert_eq!(record.filename, "ndt-notes");
        assert!(record.passage_count >= 1);

        let status = session.status().await.unwrap();
        assert_eq!(status.uploaded_documents, 1);
        assert_eq!(status.history_length, 1);
        assert_eq!(status.passages_indexed, record.passage_count);
        assert_eq!(status.model, "scripted");

        session.reset().await.unwrap();
        let status = session.status().await.unwrap();
        assert_eq!(status.passages_indexed, 0);
        assert_eq!(status.uploaded_documents, 0);
        assert_eq!(status.history_length, 0);
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let (mut session, _) = session(ScriptedModel::new("ok"));
        let err = session
            .upload_document(Path::new("/nonexistent/notes.pdf"), &Metadata::new())
            .await
            .unwrap_err();

        assert!(err.is_input_error());
        assert!(session.documents().is_empty());
    }
}
