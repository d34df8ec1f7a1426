//! Markdown renderings of an exam
//!
//! Both views keep section order and number questions from 1 across
//! sections.

use crate::models::{Exam, Question};

const RULE: &str = "==================================================";
const SECTION_RULE: &str = "------------------------------";
const ANSWER_BLANK: &str = "_____________________";
const ESSAY_ANSWER_LINES: usize = 4;

/// Exam for the student: no answers, blanks for free response
pub fn render_questions_only(exam: &Exam) -> String {
    let mut out: Vec<String> = vec![
        format!("# {}", exam.title),
        format!("\n**Instructions:** {}", exam.instructions),
        format!("\n**Total Questions:** {}", exam.total_questions),
        format!("\n{}\n", RULE),
    ];

    let mut number = 1;
    for section in exam.sections.values() {
        out.push(format!("## {}", section.title));
        out.push(format!("*{}*\n", section.instructions));

        for question in &section.questions {
            match question {
                Question::MultipleChoice(q) => {
                    out.push(format!("**Question {}:** {}", number, q.text));
                    for (letter, text) in &q.choices {
                        out.push(format!("  {}) {}", letter, text));
                    }
                }
                Question::TrueFalse(q) => {
                    out.push(format!("**Question {}:** {} (True/False)", number, q.statement));
                }
                Question::ShortAnswer(q) => {
                    out.push(format!("**Question {}:** {}", number, q.text));
                    out.push(ANSWER_BLANK.to_string());
                }
                Question::Essay(q) => {
                    out.push(format!("**Question {}:** {}", number, q.text));
                    if !q.guidance.is_empty() {
                        out.push(format!("*Guidance: {}*", q.guidance));
                    }
                    out.extend(std::iter::repeat(ANSWER_BLANK.to_string()).take(ESSAY_ANSWER_LINES));
                }
            }
            out.push(String::new());
            number += 1;
        }

        out.push(format!("\n{}\n", SECTION_RULE));
    }

    out.join("\n")
}

/// Exam with correct choices marked and explanations included
pub fn render_with_answer_key(exam: &Exam) -> String {
    let mut out: Vec<String> = vec![
        format!("# {} - Answer Key", exam.title),
        "\n**Complete Answer Key with Explanations**".to_string(),
        format!("**Total Questions:** {}", exam.total_questions),
        format!("\n{}\n", RULE),
    ];

    let mut number = 1;
    for section in exam.sections.values() {
        out.push(format!("## {} - Answers", section.title));

        for question in &section.questions {
            match question {
                Question::MultipleChoice(q) => {
                    out.push(format!("**Question {}:** {}", number, q.text));
                    for (letter, text) in &q.choices {
                        if *letter == q.correct_letter {
                            out.push(format!("  **{}) {}** <- CORRECT ANSWER", letter, text));
                        } else {
                            out.push(format!("  {}) {}", letter, text));
                        }
                    }
                    push_labeled(&mut out, "Explanation", &q.explanation);
                }
                Question::TrueFalse(q) => {
                    out.push(format!("**Question {}:** {} (True/False)", number, q.statement));
                    let answer = if q.correct { "True" } else { "False" };
                    out.push(format!("**Correct Answer:** {}", answer));
                    push_labeled(&mut out, "Explanation", &q.explanation);
                }
                Question::ShortAnswer(q) => {
                    out.push(format!("**Question {}:** {}", number, q.text));
                    push_labeled(&mut out, "Sample Answer", &q.sample_answer);
                    push_labeled(&mut out, "Key Points", &q.key_points);
                }
                Question::Essay(q) => {
                    out.push(format!("**Question {}:** {}", number, q.text));
                    push_labeled(&mut out, "Key Points to Address", &q.key_points);
                    if let Some(outline) = &q.sample_outline {
                        push_labeled(&mut out, "Sample Essay Outline", outline);
                    }
                    push_labeled(&mut out, "Additional Guidance", &q.guidance);
                }
            }
            out.push(String::new());
            number += 1;
        }

        out.push(format!("\n{}\n", SECTION_RULE));
    }

    out.join("\n")
}

fn push_labeled(out: &mut Vec<String>, label: &str, value: &str) {
    if !value.trim().is_empty() {
        out.push(format!("**{}:** {}", label, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Difficulty, EssayQuestion, ExamSection, MultipleChoiceQuestion, SectionKind,
        TrueFalseQuestion,
    };
    use std::collections::BTreeMap;

    fn exam() -> Exam {
        let choices = BTreeMap::from([
            ("A".to_string(), "Visual inspection".to_string()),
            ("B".to_string(), "Ultrasonic testing".to_string()),
            ("C".to_string(), "Dye penetrant".to_string()),
            ("D".to_string(), "Leak testing".to_string()),
        ]);

        Exam::new(
            Difficulty::Medium,
            vec![
                ExamSection::new(
                    SectionKind::Essay,
                    vec![Question::Essay(EssayQuestion {
                        text: "Discuss probe selection.".into(),
                        key_points: "frequency, footprint".into(),
                        guidance: "Refer to material thickness.".into(),
                        sample_outline: None,
                    })],
                ),
                ExamSection::new(
                    SectionKind::MultipleChoice,
                    vec![Question::MultipleChoice(MultipleChoiceQuestion {
                        text: "Which method detects internal voids?".into(),
                        choices,
                        correct_letter: "B".into(),
                        explanation: "Sound reflects off internal interfaces.".into(),
                    })],
                ),
                ExamSection::new(
                    SectionKind::TrueFalse,
                    vec![Question::TrueFalse(TrueFalseQuestion {
                        statement: "Penetrant finds subsurface flaws.".into(),
                        correct: false,
                        explanation: "Only surface-breaking flaws.".into(),
                    })],
                ),
            ],
        )
    }

    #[test]
    fn test_answer_key_marks_correct_choice() {
        let exam = exam();

        let key = render_with_answer_key(&exam);
        assert!(key.contains("**B) Ultrasonic testing** <- CORRECT ANSWER"));
        assert!(key.contains("  A) Visual inspection"));
        assert!(key.contains("**Explanation:** Sound reflects off internal interfaces."));
        assert!(key.contains("**Correct Answer:** False"));

        let questions = render_questions_only(&exam);
        assert!(questions.contains("  B) Ultrasonic testing"));
        assert!(!questions.contains("CORRECT"));
        assert!(!questions.contains("Sound reflects"));
        assert!(!questions.contains("Correct Answer"));
    }

    #[test]
    fn test_numbering_runs_across_sections_in_order() {
        let text = render_questions_only(&exam());

        let mc = text.find("**Question 1:** Which method").unwrap();
        let tf = text.find("**Question 2:** Penetrant").unwrap();
        let essay = text.find("**Question 3:** Discuss").unwrap();
        assert!(mc < tf && tf < essay);
        assert!(text.contains("*Guidance: Refer to material thickness.*"));
        let essay_blanks = text[essay..].lines().filter(|l| *l == ANSWER_BLANK).count();
        assert_eq!(essay_blanks, ESSAY_ANSWER_LINES);

        let key = render_with_answer_key(&exam());
        assert!(key.contains("**Question 3:** Discuss probe selection."));
        assert!(key.contains("## Essay Questions - Answers"));
    }

    #[test]
    fn test_empty_exam_renders_header_only() {
        let exam = Exam::new(Difficulty::Hard, Vec::new());
        let text = render_questions_only(&exam);
        assert!(text.starts_with("# AI-Generated Practice Exam (Hard Difficulty)"));
        assert!(text.contains("**Total Questions:** 0"));
        assert!(!text.contains("**Question"));
    }
}
