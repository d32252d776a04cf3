use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::vocabulary::VocabularyEntry;

/// Which side of an entry is asked and which side is expected back.
///
/// - `Vocabulary`: shows the meaning, expects the word.
/// - `Meaning`: shows the word, expects the meaning.
/// - `Listening`: speaks the word, expects it typed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizMode {
    #[default]
    Vocabulary,
    Meaning,
    Listening,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown quiz mode: {0}")]
pub struct ParseQuizModeError(String);

impl QuizMode {
    pub const ALL: [QuizMode; 3] = [QuizMode::Vocabulary, QuizMode::Meaning, QuizMode::Listening];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::Vocabulary => "vocabulary",
            QuizMode::Meaning => "meaning",
            QuizMode::Listening => "listening",
        }
    }

    /// Text shown to the learner. For `Listening` this is the text to speak.
    #[must_use]
    pub fn prompt_for(self, entry: &VocabularyEntry) -> &str {
        match self {
            QuizMode::Vocabulary => entry.meaning(),
            QuizMode::Meaning | QuizMode::Listening => entry.word(),
        }
    }

    #[must_use]
    pub fn expected_answer(self, entry: &VocabularyEntry) -> &str {
        match self {
            QuizMode::Vocabulary | QuizMode::Listening => entry.word(),
            QuizMode::Meaning => entry.meaning(),
        }
    }

    /// Whether the prompt is spoken instead of displayed.
    #[must_use]
    pub fn is_spoken(self) -> bool {
        matches!(self, QuizMode::Listening)
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizMode {
    type Err = ParseQuizModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vocabulary" => Ok(Self::Vocabulary),
            "meaning" => Ok(Self::Meaning),
            "listening" => Ok(Self::Listening),
            _ => Err(ParseQuizModeError(s.to_owned())),
        }
    }
}
