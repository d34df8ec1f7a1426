//! Strict decoding of section replies
//!
//! A reply must be a JSON array of objects with exactly the fields of the
//! section's contract. Any violation rejects the whole section.

use crate::models::{
    EssayQuestion, MultipleChoiceQuestion, Question, SectionKind, ShortAnswerQuestion,
    TrueFalseQuestion,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use studyforge_common::AppError;
use thiserror::Error;

const CHOICE_LETTERS: [&str; 4] = ["A", "B", "C", "D"];

/// Reason a section reply was rejected
#[derive(Error, Debug)]
pub enum MalformedOutput {
    #[error("reply is not a valid question array: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("reply contains no questions")]
    Empty,

    #[error("question {index}: {reason}")]
    InvalidQuestion { index: usize, reason: String },
}

impl MalformedOutput {
    pub fn into_app_error(self, kind: SectionKind) -> AppError {
        AppError::GenerationMalformed {
            section: kind.as_str().to_string(),
            reason: self.to_string(),
        }
    }
}

/// Key points arrive either as one string or as a list of strings
#[derive(Deserialize)]
#[serde(untagged)]
enum KeyPoints {
    Text(String),
    List(Vec<String>),
}

impl KeyPoints {
    fn into_text(self) -> String {
        match self {
            KeyPoints::Text(text) => text,
            KeyPoints::List(points) => points.join("; "),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMultipleChoice {
    question: String,
    choices: BTreeMap<String, String>,
    correct_answer: String,
    explanation: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTrueFalse {
    statement: String,
    correct_answer: bool,
    explanation: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawShortAnswer {
    question: String,
    #[serde(alias = "answer")]
    sample_answer: String,
    key_points: KeyPoints,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEssay {
    question: String,
    key_points: KeyPoints,
    guidance: String,
    #[serde(default)]
    sample_outline: Option<String>,
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn decode_array<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, MalformedOutput> {
    let items: Vec<T> = serde_json::from_str(strip_code_fences(raw))?;
    if items.is_empty() {
        return Err(MalformedOutput::Empty);
    }
    Ok(items)
}

fn require_text(index: usize, field: &str, value: &str) -> Result<(), MalformedOutput> {
    if value.trim().is_empty() {
        return Err(MalformedOutput::InvalidQuestion {
            index,
            reason: format!("empty {}", field),
        });
    }
    Ok(())
}

fn multiple_choice(index: usize, raw: RawMultipleChoice) -> Result<Question, MalformedOutput> {
    require_text(index, "question", &raw.question)?;

    let choices: BTreeMap<String, String> = raw
        .choices
        .into_iter()
        .map(|(letter, text)| (letter.trim().to_uppercase(), text))
        .collect();

    if choices.len() != CHOICE_LETTERS.len()
        || !CHOICE_LETTERS.iter().all(|letter| choices.contains_key(*letter))
    {
        return Err(MalformedOutput::InvalidQuestion {
            index,
            reason: format!(
                "choices must be exactly A-D, got [{}]",
                choices.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    let correct_letter = raw.correct_answer.trim().to_uppercase();
    if !choices.contains_key(&correct_letter) {
        return Err(MalformedOutput::InvalidQuestion {
            index,
            reason: format!("correct answer '{}' is not a choice", raw.correct_answer),
        });
    }

    Ok(Question::MultipleChoice(MultipleChoiceQuestion {
        text: raw.question,
        choices,
        correct_letter,
        explanation: raw.explanation,
    }))
}

/// Decode a reply for `kind`, keeping at most `requested` questions
pub fn parse_section(
    kind: SectionKind,
    raw: &str,
    requested: usize,
) -> Result<Vec<Question>, MalformedOutput> {
    let mut questions = match kind {
        SectionKind::MultipleChoice => decode_array::<RawMultipleChoice>(raw)?
            .into_iter()
            .enumerate()
            .map(|(i, q)| multiple_choice(i, q))
            .collect::<Result<Vec<_>, _>>()?,

        SectionKind::TrueFalse => decode_array::<RawTrueFalse>(raw)?
            .into_iter()
            .enumerate()
            .map(|(i, q)| {
                require_text(i, "statement", &q.statement)?;
                Ok(Question::TrueFalse(TrueFalseQuestion {
                    statement: q.statement,
                    correct: q.correct_answer,
                    explanation: q.explanation,
                }))
            })
            .collect::<Result<Vec<_>, MalformedOutput>>()?,

        SectionKind::ShortAnswer => decode_array::<RawShortAnswer>(raw)?
            .into_iter()
            .enumerate()
            .map(|(i, q)| {
                require_text(i, "question", &q.question)?;
                Ok(Question::ShortAnswer(ShortAnswerQuestion {
                    text: q.question,
                    sample_answer: q.sample_answer,
                    key_points: q.key_points.into_text(),
                }))
            })
            .collect::<Result<Vec<_>, MalformedOutput>>()?,

        SectionKind::Essay => decode_array::<RawEssay>(raw)?
            .into_iter()
            .enumerate()
            .map(|(i, q)| {
                require_text(i, "question", &q.question)?;
                Ok(Question::Essay(EssayQuestion {
                    text: q.question,
                    key_points: q.key_points.into_text(),
                    guidance: q.guidance,
                    sample_outline: q.sample_outline.filter(|o| !o.trim().is_empty()),
                }))
            })
            .collect::<Result<Vec<_>, MalformedOutput>>()?,
    };

    questions.truncate(requested);
    Ok(questions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MC: &str = r#"[
        {"question": "Which wave mode travels fastest in steel?",
         "choices": {"A": "Shear", "B": "Longitudinal", "C": "Surface", "D": "Lamb"},
         "correct_answer": "B",
         "explanation": "Compression waves have the highest velocity."}
    ]"#;

    #[test]
    fn test_multiple_choice() {
        let questions = parse_section(SectionKind::MultipleChoice, MC, 5).unwrap();
        assert_eq!(questions.len(), 1);

        let Question::MultipleChoice(q) = &questions[0] else {
            panic!("wrong variant");
        };
        assert_eq!(q.correct_letter, "B");
        assert_eq!(q.choices["B"], "Longitudinal");
    }

    #[test]
    fn test_code_fences_are_tolerated() {
        let fenced = format!("```json\n{}\n```", MC);
        assert_eq!(parse_section(SectionKind::MultipleChoice, &fenced, 5).unwrap().len(), 1);

        let bare = format!("```\n{}```", MC);
        assert_eq!(parse_section(SectionKind::MultipleChoice, &bare, 5).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_field_rejects_section() {
        let raw = r#"[{"statement": "Sound needs a medium.", "correct_answer": true,
                       "explanation": "Yes.", "difficulty": "easy"}]"#;
        let err = parse_section(SectionKind::TrueFalse, raw, 5).unwrap_err();
        assert!(matches!(err, MalformedOutput::InvalidJson(_)));
    }

    #[test]
    fn test_missing_field_rejects_section() {
        let raw = r#"[{"statement": "Sound needs a medium.", "correct_answer": true}]"#;
        assert!(parse_section(SectionKind::TrueFalse, raw, 5).is_err());
    }

    #[test]
    fn test_empty_array_rejects_section() {
        let err = parse_section(SectionKind::Essay, "[]", 2).unwrap_err();
        assert!(matches!(err, MalformedOutput::Empty));
    }

    #[test]
    fn test_prose_reply_rejects_section() {
        let err = parse_section(SectionKind::Essay, "Here are your questions!", 2).unwrap_err();
        assert!(matches!(err, MalformedOutput::InvalidJson(_)));
    }

    #[test]
    fn test_invalid_choice_sets() {
        let three = r#"[{"question": "Q?", "choices": {"A": "1", "B": "2", "C": "3"},
                         "correct_answer": "A", "explanation": "E"}]"#;
        assert!(matches!(
            parse_section(SectionKind::MultipleChoice, three, 5),
            Err(MalformedOutput::InvalidQuestion { index: 0, .. })
        ));

        let wrong_answer = r#"[{"question": "Q?", "choices": {"A": "1", "B": "2", "C": "3", "D": "4"},
                                "correct_answer": "E", "explanation": "E"}]"#;
        assert!(parse_section(SectionKind::MultipleChoice, wrong_answer, 5).is_err());
    }

    #[test]
    fn test_one_bad_question_rejects_whole_section() {
        let raw = r#"[
            {"question": "Q1", "choices": {"A": "1", "B": "2", "C": "3", "D": "4"},
             "correct_answer": "a", "explanation": "E"},
            {"question": "Q2", "choices": {"A": "1", "B": "2", "C": "3", "D": "4"},
             "correct_answer": "Z", "explanation": "E"}
        ]"#;
        assert!(matches!(
            parse_section(SectionKind::MultipleChoice, raw, 5),
            Err(MalformedOutput::InvalidQuestion { index: 1, .. })
        ));
    }

    #[test]
    fn test_extra_questions_are_truncated() {
        let raw = r#"[
            {"question": "Q1", "key_points": "k", "guidance": "g"},
            {"question": "Q2", "key_points": "k", "guidance": "g"},
            {"question": "Q3", "key_points": "k", "guidance": "g"}
        ]"#;
        assert_eq!(parse_section(SectionKind::Essay, raw, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_short_answer_aliases_and_key_point_lists() {
        let raw = r#"[{"question": "Define attenuation.",
                       "answer": "Loss of energy as the wave travels.",
                       "key_points": ["scattering", "absorption"]}]"#;
        let questions = parse_section(SectionKind::ShortAnswer, raw, 3).unwrap();

        let Question::ShortAnswer(q) = &questions[0] else {
            panic!("wrong variant");
        };
        assert_eq!(q.sample_answer, "Loss of energy as the wave travels.");
        assert_eq!(q.key_points, "scattering; absorption");
    }

    #[test]
    fn test_malformed_maps_to_app_error() {
        let err = MalformedOutput::Empty.into_app_error(SectionKind::Essay);
        assert_eq!(err.to_string(), "Malformed essay output: reply contains no questions");
    }
}
