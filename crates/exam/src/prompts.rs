//! Section prompts
//!
//! Each prompt carries the truncated context, a difficulty block specific to
//! the section kind and the JSON shape the reply must follow.

use crate::models::{Difficulty, SectionKind};

/// System message for every section call
pub const SYSTEM_PROMPT: &str =
    "You are an expert educator creating exam questions. Respond only with valid JSON.";

const FOCUS: &str = "IMPORTANT: Focus on the CORE TECHNICAL CONCEPTS, methods, procedures, and \
practical applications.
AVOID questions about standards, regulations, organizations, or administrative topics unless \
they are central to the technical content.";

/// Instruction block for `kind` at `difficulty`
pub fn difficulty_guidance(kind: SectionKind, difficulty: Difficulty) -> &'static str {
    use Difficulty::*;
    use SectionKind::*;

    match (kind, difficulty) {
        (MultipleChoice, Easy) => "1. Focus on basic concepts, definitions, and direct facts
2. Use straightforward, clear language
3. Make correct answers obvious to someone who studied
4. Test recall and recognition",
        (MultipleChoice, Medium) => "1. Test understanding and application of concepts
2. Require some analysis and connection-making
3. Include scenarios that apply the knowledge
4. Balance recall with comprehension",
        (MultipleChoice, Hard) => "1. Require analysis, synthesis, and evaluation
2. Include complex scenarios and problem-solving
3. Test ability to distinguish between similar concepts
4. Require deep understanding of relationships",
        (MultipleChoice, Expert) => "1. Focus on critical thinking and expert-level analysis
2. Include edge cases and complex applications
3. Test mastery of nuanced distinctions
4. Require integration of multiple concepts",

        (TrueFalse, Easy) => "Create straightforward statements about basic facts and definitions",
        (TrueFalse, Medium) => {
            "Create statements that require understanding of concepts and their applications"
        }
        (TrueFalse, Hard) => {
            "Create statements that require analysis of relationships and complex reasoning"
        }
        (TrueFalse, Expert) => {
            "Create statements that test mastery of nuanced distinctions and expert knowledge"
        }

        (ShortAnswer, Easy) => {
            "Create questions asking for basic definitions, simple explanations, or direct facts \
(1-2 sentences)"
        }
        (ShortAnswer, Medium) => {
            "Create questions requiring explanation of concepts, processes, or applications \
(2-3 sentences)"
        }
        (ShortAnswer, Hard) => {
            "Create questions requiring analysis, comparison, or synthesis of multiple concepts \
(3-4 sentences)"
        }
        (ShortAnswer, Expert) => {
            "Create questions requiring critical evaluation, complex reasoning, or expert insights \
(4-5 sentences)"
        }

        (Essay, Easy) => "Create questions asking for basic explanations or descriptions of concepts",
        (Essay, Medium) => {
            "Create questions requiring detailed analysis, comparison, or application of concepts"
        }
        (Essay, Hard) => {
            "Create questions requiring synthesis, evaluation, or complex problem-solving"
        }
        (Essay, Expert) => {
            "Create questions requiring critical analysis, original thinking, or expert-level \
evaluation"
        }
    }
}

/// Reply shape for `kind`
pub fn output_contract(kind: SectionKind) -> &'static str {
    match kind {
        SectionKind::MultipleChoice => r#"Each question must have:
- Question text based on technical content
- 4 answer choices (A, B, C, D)
- Correct answer marked
- Brief explanation

Respond with ONLY valid JSON array:
[
  {
    "question": "Question about technical content",
    "choices": {
      "A": "Option A",
      "B": "Option B",
      "C": "Option C",
      "D": "Option D"
    },
    "correct_answer": "A",
    "explanation": "Brief explanation"
  }
]"#,
        SectionKind::TrueFalse => r#"Create statements that can be verified from the technical content provided.
Mix true and false statements evenly.

Respond with ONLY valid JSON array:
[
  {
    "statement": "Statement about technical content",
    "correct_answer": true,
    "explanation": "Brief explanation"
  }
]"#,
        SectionKind::ShortAnswer => r#"Respond with ONLY valid JSON array:
[
  {
    "question": "Question about technical content",
    "sample_answer": "Sample answer based on content",
    "key_points": "Key technical points to mention"
  }
]"#,
        SectionKind::Essay => r#"Respond with ONLY valid JSON array:
[
  {
    "question": "Essay question about technical content",
    "key_points": "Main technical points to address",
    "guidance": "Guidance for answering"
  }
]"#,
    }
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// User prompt requesting `count` questions of `kind`
pub fn section_prompt(
    kind: SectionKind,
    count: u32,
    difficulty: Difficulty,
    context: &str,
    max_context_chars: usize,
) -> String {
    format!(
        "Create {count} {label} questions based ONLY on the technical content provided below.

{FOCUS}

Content:
{content}

Difficulty Level: {level}
{guidance}

{contract}",
        label = kind.label(),
        content = truncate_chars(context, max_context_chars),
        level = difficulty.as_str().to_uppercase(),
        guidance = difficulty_guidance(kind, difficulty),
        contract = output_contract(kind),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_truncates_context() {
        let context = "x".repeat(5000);
        let prompt = section_prompt(SectionKind::Essay, 2, Difficulty::Medium, &context, 3500);

        assert!(prompt.contains(&"x".repeat(3500)));
        assert!(!prompt.contains(&"x".repeat(3501)));
        assert!(prompt.starts_with("Create 2 essay questions"));
        assert!(prompt.contains("Difficulty Level: MEDIUM"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("échographie", 3), "éch");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_difficulty_changes_guidance() {
        let easy = section_prompt(SectionKind::MultipleChoice, 5, Difficulty::Easy, "ctx", 3500);
        let expert = section_prompt(SectionKind::MultipleChoice, 5, Difficulty::Expert, "ctx", 3500);

        assert!(easy.contains("Test recall and recognition"));
        assert!(expert.contains("Require integration of multiple concepts"));
        assert!(!easy.contains("Require integration of multiple concepts"));
    }

    #[test]
    fn test_each_kind_has_its_own_contract() {
        let prompt = section_prompt(SectionKind::TrueFalse, 5, Difficulty::Hard, "ctx", 3500);
        assert!(prompt.contains("\"statement\""));
        assert!(prompt.contains("Create 5 true/false questions"));
        assert!(!prompt.contains("\"choices\""));
    }
}
