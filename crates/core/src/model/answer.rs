use serde::{Deserialize, Serialize};

use crate::model::mode::QuizMode;
use crate::model::vocabulary::VocabularyEntry;

/// Text stored in the answer log when the learner asked to see the answer.
pub const REVEALED_ANSWER_TEXT: &str = "(answer revealed)";

//
// ─── EVALUATION ────────────────────────────────────────────────────────────────
//

/// Outcome of checking one answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub is_correct: bool,
    pub correct_answer: String,
}

/// Check `user_answer` against the answer `mode` expects for `entry`.
///
/// Leading/trailing whitespace is ignored and the comparison is case-insensitive.
/// Everything else must match exactly: accents and punctuation count.
///
/// Callers reject blank input before getting here.
#[must_use]
pub fn evaluate(mode: QuizMode, entry: &VocabularyEntry, user_answer: &str) -> Evaluation {
    let correct_answer = mode.expected_answer(entry);
    let is_correct = normalize(user_answer) == normalize(correct_answer);
    Evaluation {
        is_correct,
        correct_answer: correct_answer.to_owned(),
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

//
// ─── ANSWER LOG ────────────────────────────────────────────────────────────────
//

/// What the learner gave for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum UserAnswer {
    /// Typed (or chosen) text, as submitted.
    Submitted(String),
    /// The answer was revealed without being checked.
    Revealed,
}

impl UserAnswer {
    /// Display text; `Revealed` maps to `REVEALED_ANSWER_TEXT`.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            UserAnswer::Submitted(text) => text,
            UserAnswer::Revealed => REVEALED_ANSWER_TEXT,
        }
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        matches!(self, UserAnswer::Revealed)
    }
}

/// One finished question in the answer log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub prompt: String,
    pub user_answer: UserAnswer,
    pub correct_answer: String,
    pub is_correct: bool,
}
