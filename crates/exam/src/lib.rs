//! StudyForge Exam Synthesizer
//!
//! Turns study context into a practice exam:
//! - Section prompts with difficulty tiers
//! - Concurrent section generation
//! - Strict decoding of model replies
//! - Question-only and answer-key renderings

pub mod generator;
pub mod models;
pub mod parser;
pub mod prompts;
pub mod render;

pub use generator::{ExamOptions, ExamPhase, ExamSynthesizer, PhaseCallback};
pub use models::{
    Difficulty, EssayQuestion, Exam, ExamConfig, ExamSection, MultipleChoiceQuestion, Question,
    SectionKind, ShortAnswerQuestion, TrueFalseQuestion,
};
pub use parser::{parse_section, MalformedOutput};
pub use render::{render_questions_only, render_with_answer_key};
