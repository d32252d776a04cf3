use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::answer::AnswerRecord;
use crate::model::mode::QuizMode;
use crate::model::summary::ScoreSummary;

/// Outcome of a completed quiz, ready to persist or display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizResult {
    mode: QuizMode,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    summary: ScoreSummary,
    answers: Vec<AnswerRecord>,
}

impl QuizResult {
    #[must_use]
    pub fn new(
        mode: QuizMode,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        summary: ScoreSummary,
        answers: Vec<AnswerRecord>,
    ) -> Self {
        Self {
            mode,
            started_at,
            completed_at,
            summary,
            answers,
        }
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn summary(&self) -> &ScoreSummary {
        &self.summary
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    /// Answers that were wrong or revealed, for a review list.
    pub fn missed(&self) -> impl Iterator<Item = &AnswerRecord> {
        self.answers.iter().filter(|a| !a.is_correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::answer::UserAnswer;
    use crate::time::fixed_now;

    fn record(prompt: &str, is_correct: bool) -> AnswerRecord {
        AnswerRecord {
            prompt: prompt.into(),
            user_answer: if is_correct {
                UserAnswer::Submitted(prompt.into())
            } else {
                UserAnswer::Revealed
            },
            correct_answer: prompt.into(),
            is_correct,
        }
    }

    #[test]
    fn missed_lists_incorrect_answers() {
        let result = QuizResult::new(
            QuizMode::Meaning,
            fixed_now(),
            fixed_now(),
            ScoreSummary::new(1, 3).unwrap(),
            vec![record("a", true), record("b", false), record("c", false)],
        );
        let missed: Vec<_> = result.missed().map(|a| a.prompt.as_str()).collect();
        assert_eq!(missed, vec!["b", "c"]);
    }
}
