//! Exam data model
//!
//! Provides:
//! - Section kinds in their fixed presentation order
//! - Difficulty tiers
//! - Exam configuration
//! - Question variants, sections and the assembled exam

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use studyforge_common::AppError;

/// Question-type group; declaration order is presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::MultipleChoice,
        SectionKind::TrueFalse,
        SectionKind::ShortAnswer,
        SectionKind::Essay,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::MultipleChoice => "multiple_choice",
            SectionKind::TrueFalse => "true_false",
            SectionKind::ShortAnswer => "short_answer",
            SectionKind::Essay => "essay",
        }
    }

    /// Noun used in prompts, e.g. "multiple choice"
    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::MultipleChoice => "multiple choice",
            SectionKind::TrueFalse => "true/false",
            SectionKind::ShortAnswer => "short answer",
            SectionKind::Essay => "essay",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::MultipleChoice => "Multiple Choice Questions",
            SectionKind::TrueFalse => "True/False Questions",
            SectionKind::ShortAnswer => "Short Answer Questions",
            SectionKind::Essay => "Essay Questions",
        }
    }

    pub fn instructions(&self) -> &'static str {
        match self {
            SectionKind::MultipleChoice => "Choose the best answer for each question.",
            SectionKind::TrueFalse => "Mark each statement as true or false.",
            SectionKind::ShortAnswer => "Provide concise answers in 2-3 sentences.",
            SectionKind::Essay => "Provide detailed, well-structured answers.",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cognitive demand of the generated questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    /// Capitalized name, e.g. "Medium"
    pub fn title(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Expert => "Expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            other => Err(AppError::input(format!(
                "Unknown difficulty '{}': expected easy, medium, hard or expert",
                other
            ))),
        }
    }
}

/// Requested question counts and difficulty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamConfig {
    /// Questions requested per section; missing kinds request none
    pub section_counts: BTreeMap<SectionKind, u32>,

    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self::new(5, 5, 3, 2, Difficulty::Medium)
    }
}

impl ExamConfig {
    pub fn new(
        multiple_choice: u32,
        true_false: u32,
        short_answer: u32,
        essay: u32,
        difficulty: Difficulty,
    ) -> Self {
        let section_counts = BTreeMap::from([
            (SectionKind::MultipleChoice, multiple_choice),
            (SectionKind::TrueFalse, true_false),
            (SectionKind::ShortAnswer, short_answer),
            (SectionKind::Essay, essay),
        ]);

        Self {
            section_counts,
            difficulty,
        }
    }

    pub fn count(&self, kind: SectionKind) -> u32 {
        self.section_counts.get(&kind).copied().unwrap_or(0)
    }

    /// Kinds with a non-zero count, in presentation order
    pub fn requested(&self) -> Vec<(SectionKind, u32)> {
        SectionKind::ALL
            .iter()
            .map(|&kind| (kind, self.count(kind)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    pub fn total_requested(&self) -> u32 {
        self.section_counts.values().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
    pub text: String,

    /// Letter to choice text, exactly A through D
    pub choices: BTreeMap<String, String>,

    /// Always a key of `choices`
    pub correct_letter: String,

    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrueFalseQuestion {
    pub statement: String,
    pub correct: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortAnswerQuestion {
    pub text: String,
    pub sample_answer: String,
    pub key_points: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EssayQuestion {
    pub text: String,
    pub key_points: String,
    pub guidance: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_outline: Option<String>,
}

/// One exam question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Question {
    MultipleChoice(MultipleChoiceQuestion),
    TrueFalse(TrueFalseQuestion),
    ShortAnswer(ShortAnswerQuestion),
    Essay(EssayQuestion),
}

impl Question {
    pub fn kind(&self) -> SectionKind {
        match self {
            Question::MultipleChoice(_) => SectionKind::MultipleChoice,
            Question::TrueFalse(_) => SectionKind::TrueFalse,
            Question::ShortAnswer(_) => SectionKind::ShortAnswer,
            Question::Essay(_) => SectionKind::Essay,
        }
    }
}

/// A group of questions of one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSection {
    pub kind: SectionKind,
    pub title: String,
    pub instructions: String,
    pub questions: Vec<Question>,
}

impl ExamSection {
    pub fn new(kind: SectionKind, questions: Vec<Question>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            instructions: kind.instructions().to_string(),
            questions,
        }
    }
}

/// An assembled exam. Sections whose generation failed are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub title: String,
    pub instructions: String,
    pub difficulty: Difficulty,

    /// Present sections, iterated in presentation order
    pub sections: BTreeMap<SectionKind, ExamSection>,

    pub total_questions: usize,
}

impl Exam {
    pub fn new(difficulty: Difficulty, sections: Vec<ExamSection>) -> Self {
        let sections: BTreeMap<SectionKind, ExamSection> = sections
            .into_iter()
            .filter(|section| !section.questions.is_empty())
            .map(|section| (section.kind, section))
            .collect();
        let total_questions = sections.values().map(|s| s.questions.len()).sum();

        Self {
            title: format!("AI-Generated Practice Exam ({} Difficulty)", difficulty.title()),
            instructions: format!(
                "Answer all questions to the best of your ability. This exam is set to {} \
difficulty level.",
                difficulty.as_str().to_uppercase()
            ),
            difficulty,
            sections,
            total_questions,
        }
    }

    pub fn section(&self, kind: SectionKind) -> Option<&ExamSection> {
        self.sections.get(&kind)
    }

    /// No section survived
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn true_false(statement: &str) -> Question {
        Question::TrueFalse(TrueFalseQuestion {
            statement: statement.into(),
            correct: true,
            explanation: String::new(),
        })
    }

    #[test]
    fn test_default_config() {
        let config = ExamConfig::default();
        assert_eq!(config.count(SectionKind::MultipleChoice), 5);
        assert_eq!(config.count(SectionKind::Essay), 2);
        assert_eq!(config.total_requested(), 15);
        assert_eq!(config.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_requested_skips_zero_counts() {
        let config = ExamConfig::new(0, 4, 0, 1, Difficulty::Hard);
        assert_eq!(
            config.requested(),
            vec![(SectionKind::TrueFalse, 4), (SectionKind::Essay, 1)]
        );
    }

    #[test]
    fn test_config_deserializes_partial_counts() {
        let config: ExamConfig =
            serde_json::from_str(r#"{"section_counts": {"essay": 3}, "difficulty": "expert"}"#)
                .unwrap();
        assert_eq!(config.count(SectionKind::Essay), 3);
        assert_eq!(config.count(SectionKind::MultipleChoice), 0);
        assert_eq!(config.difficulty, Difficulty::Expert);
    }

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_exam_totals_and_order() {
        let exam = Exam::new(
            Difficulty::Easy,
            vec![
                ExamSection::new(SectionKind::Essay, Vec::new()),
                ExamSection::new(SectionKind::TrueFalse, vec![true_false("a"), true_false("b")]),
            ],
        );

        assert_eq!(exam.title, "AI-Generated Practice Exam (Easy Difficulty)");
        assert!(exam.instructions.contains("EASY difficulty level"));
        assert_eq!(exam.total_questions, 2);
        assert!(exam.section(SectionKind::Essay).is_none());
        assert_eq!(exam.sections.keys().copied().collect::<Vec<_>>(), vec![SectionKind::TrueFalse]);
    }

    #[test]
    fn test_section_kind_order() {
        let mut kinds = vec![SectionKind::Essay, SectionKind::MultipleChoice, SectionKind::ShortAnswer];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![SectionKind::MultipleChoice, SectionKind::ShortAnswer, SectionKind::Essay]
        );
    }
}
