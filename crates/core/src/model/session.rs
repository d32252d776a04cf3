use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;
use thiserror::Error;

use crate::model::answer::{AnswerRecord, Evaluation, UserAnswer, evaluate};
use crate::model::mode::QuizMode;
use crate::model::result::QuizResult;
use crate::model::summary::{ScoreSummary, SummaryError};
use crate::model::vocabulary::VocabularyEntry;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("cannot start a quiz without vocabulary")]
    EmptyVocabulary,

    #[error("too many entries for a single quiz: {len}")]
    TooManyEntries { len: usize },

    #[error("please enter an answer")]
    EmptyAnswer,

    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: QuizAction,
        phase: &'static str,
    },

    #[error("quiz is not completed yet")]
    NotCompleted,

    #[error(transparent)]
    Summary(#[from] SummaryError),
}

/// Learner-driven transitions, used to report invalid ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizAction {
    Submit,
    Reveal,
    Advance,
}

impl fmt::Display for QuizAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuizAction::Submit => "submit an answer",
            QuizAction::Reveal => "reveal the answer",
            QuizAction::Advance => "advance",
        })
    }
}

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Feedback for the current question, held until the learner advances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub evaluation: Evaluation,
    pub user_answer: UserAnswer,
}

impl Feedback {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.evaluation.is_correct
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.evaluation.correct_answer
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizPhase {
    AwaitingAnswer,
    FeedbackShown(Feedback),
    Completed,
}

impl QuizPhase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            QuizPhase::AwaitingAnswer => "awaiting an answer",
            QuizPhase::FeedbackShown(_) => "showing feedback",
            QuizPhase::Completed => "completed",
        }
    }
}

/// Aggregated view of quiz progress for front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub score: u32,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A single run through a shuffled word list.
///
/// Invariants held between calls:
/// - `current <= sequence.len()`, with equality only once `Completed`
/// - `answers.len() == current`
/// - `score <= answers.len()`
/// - `sequence` is a permutation of `vocabulary`, reshuffled only by `restart`
#[derive(Clone)]
pub struct QuizSession {
    mode: QuizMode,
    vocabulary: Vec<VocabularyEntry>,
    sequence: Vec<VocabularyEntry>,
    current: usize,
    score: u32,
    answers: Vec<AnswerRecord>,
    phase: QuizPhase,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a quiz over `vocabulary` in a fresh random order.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyVocabulary` if no entries are given.
    pub fn start(
        vocabulary: Vec<VocabularyEntry>,
        mode: QuizMode,
        started_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        Self::start_with_rng(vocabulary, mode, started_at, &mut rand::rng())
    }

    /// Like [`QuizSession::start`], drawing the order from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyVocabulary` if no entries are given.
    pub fn start_with_rng<R: Rng + ?Sized>(
        vocabulary: Vec<VocabularyEntry>,
        mode: QuizMode,
        started_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Self, QuizError> {
        if vocabulary.is_empty() {
            return Err(QuizError::EmptyVocabulary);
        }
        if u32::try_from(vocabulary.len()).is_err() {
            return Err(QuizError::TooManyEntries {
                len: vocabulary.len(),
            });
        }

        let sequence = shuffled(&vocabulary, rng);
        Ok(Self {
            mode,
            vocabulary,
            sequence,
            current: 0,
            score: 0,
            answers: Vec::new(),
            phase: QuizPhase::AwaitingAnswer,
            started_at,
            completed_at: None,
        })
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    /// Entries in the order they were supplied.
    #[must_use]
    pub fn vocabulary(&self) -> &[VocabularyEntry] {
        &self.vocabulary
    }

    /// Entries in quiz order.
    #[must_use]
    pub fn sequence(&self) -> &[VocabularyEntry] {
        &self.sequence
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    #[must_use]
    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.sequence.len()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.phase, QuizPhase::Completed)
    }

    /// True only while a new answer may be submitted.
    ///
    /// Keyboard shortcuts check this so a repeated Enter cannot submit twice.
    #[must_use]
    pub fn accepts_submission(&self) -> bool {
        matches!(self.phase, QuizPhase::AwaitingAnswer)
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        match &self.phase {
            QuizPhase::FeedbackShown(feedback) => Some(feedback),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_entry(&self) -> Option<&VocabularyEntry> {
        if self.is_complete() {
            return None;
        }
        self.sequence.get(self.current)
    }

    /// Prompt for the current question; in listening mode this is the text to speak.
    #[must_use]
    pub fn current_prompt(&self) -> Option<&str> {
        self.current_entry().map(|e| self.mode.prompt_for(e))
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total(),
            answered: self.answers.len(),
            remaining: self.total().saturating_sub(self.current),
            score: self.score,
            is_complete: self.is_complete(),
        }
    }

    /// Check `text` against the current question and show feedback.
    ///
    /// Score and log are updated on [`QuizSession::advance`].
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyAnswer` if `text` is blank, or
    /// `QuizError::InvalidTransition` outside `AwaitingAnswer`.
    pub fn submit_answer(&mut self, text: &str) -> Result<&Feedback, QuizError> {
        let entry = self.awaiting_entry(QuizAction::Submit)?;
        if text.trim().is_empty() {
            return Err(QuizError::EmptyAnswer);
        }
        let evaluation = evaluate(self.mode, entry, text);
        self.show_feedback(
            QuizAction::Submit,
            Feedback {
                evaluation,
                user_answer: UserAnswer::Submitted(text.to_owned()),
            },
        )
    }

    /// Show the correct answer for the current question, counting it as wrong.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidTransition` outside `AwaitingAnswer`.
    pub fn reveal_answer(&mut self) -> Result<&Feedback, QuizError> {
        let entry = self.awaiting_entry(QuizAction::Reveal)?;
        let evaluation = Evaluation {
            is_correct: false,
            correct_answer: self.mode.expected_answer(entry).to_owned(),
        };
        self.show_feedback(
            QuizAction::Reveal,
            Feedback {
                evaluation,
                user_answer: UserAnswer::Revealed,
            },
        )
    }

    /// Log the current question and move to the next one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidTransition` unless feedback is being shown.
    pub fn advance(&mut self, at: DateTime<Utc>) -> Result<&AnswerRecord, QuizError> {
        if !matches!(self.phase, QuizPhase::FeedbackShown(_)) {
            return Err(self.invalid(QuizAction::Advance));
        }
        let QuizPhase::FeedbackShown(feedback) =
            std::mem::replace(&mut self.phase, QuizPhase::AwaitingAnswer)
        else {
            return Err(self.invalid(QuizAction::Advance));
        };

        let prompt = self
            .sequence
            .get(self.current)
            .map(|e| self.mode.prompt_for(e).to_owned())
            .unwrap_or_default();

        if feedback.is_correct() {
            self.score += 1;
        }
        self.answers.push(AnswerRecord {
            prompt,
            user_answer: feedback.user_answer,
            correct_answer: feedback.evaluation.correct_answer,
            is_correct: feedback.evaluation.is_correct,
        });

        self.current += 1;
        if self.current >= self.sequence.len() {
            self.phase = QuizPhase::Completed;
            self.completed_at = Some(at);
        }

        self.answers.last().ok_or(QuizError::NotCompleted)
    }

    /// Begin again with a new order, clearing score and log.
    pub fn restart(&mut self, started_at: DateTime<Utc>) {
        self.restart_with_rng(started_at, &mut rand::rng());
    }

    pub fn restart_with_rng<R: Rng + ?Sized>(&mut self, started_at: DateTime<Utc>, rng: &mut R) {
        self.sequence = shuffled(&self.vocabulary, rng);
        self.current = 0;
        self.score = 0;
        self.answers.clear();
        self.phase = QuizPhase::AwaitingAnswer;
        self.started_at = started_at;
        self.completed_at = None;
    }

    /// Score summary of a completed quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotCompleted` before the last question is logged.
    pub fn summary(&self) -> Result<ScoreSummary, QuizError> {
        if !self.is_complete() {
            return Err(QuizError::NotCompleted);
        }
        let total = u32::try_from(self.total())
            .map_err(|_| QuizError::TooManyEntries { len: self.total() })?;
        Ok(ScoreSummary::new(self.score, total)?)
    }

    /// Everything worth keeping about a completed quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotCompleted` before the last question is logged.
    pub fn result(&self) -> Result<QuizResult, QuizError> {
        let summary = self.summary()?;
        let completed_at = self.completed_at.ok_or(QuizError::NotCompleted)?;
        Ok(QuizResult::new(
            self.mode,
            self.started_at,
            completed_at,
            summary,
            self.answers.clone(),
        ))
    }

    fn awaiting_entry(&self, action: QuizAction) -> Result<&VocabularyEntry, QuizError> {
        match self.phase {
            QuizPhase::AwaitingAnswer => self
                .sequence
                .get(self.current)
                .ok_or_else(|| self.invalid(action)),
            _ => Err(self.invalid(action)),
        }
    }

    fn show_feedback(
        &mut self,
        action: QuizAction,
        feedback: Feedback,
    ) -> Result<&Feedback, QuizError> {
        self.phase = QuizPhase::FeedbackShown(feedback);
        self.feedback().ok_or_else(|| self.invalid(action))
    }

    fn invalid(&self, action: QuizAction) -> QuizError {
        QuizError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }
}

fn shuffled<R: Rng + ?Sized>(vocabulary: &[VocabularyEntry], rng: &mut R) -> Vec<VocabularyEntry> {
    let mut sequence = vocabulary.to_vec();
    sequence.shuffle(rng);
    sequence
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("mode", &self.mode)
            .field("len", &self.sequence.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("phase", &self.phase.name())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::answer::REVEALED_ANSWER_TEXT;
    use crate::model::summary::Tier;
    use crate::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn entry(word: &str, meaning: &str) -> VocabularyEntry {
        VocabularyEntry::new(word, meaning).unwrap()
    }

    fn two_words() -> Vec<VocabularyEntry> {
        vec![entry("hello", "xin chào"), entry("world", "thế giới")]
    }

    fn numbered(n: usize) -> Vec<VocabularyEntry> {
        (0..n)
            .map(|i| entry(&format!("w{i}"), &format!("m{i}")))
            .collect()
    }

    fn sorted(mut entries: Vec<VocabularyEntry>) -> Vec<VocabularyEntry> {
        entries.sort_by(|a, b| a.word().cmp(b.word()));
        entries
    }

    #[test]
    fn empty_vocabulary_is_rejected() {
        let err = QuizSession::start(Vec::new(), QuizMode::Vocabulary, fixed_now()).unwrap_err();
        assert_eq!(err, QuizError::EmptyVocabulary);
    }

    #[test]
    fn start_produces_permutation() {
        let words = numbered(20);
        let mut rng = StdRng::seed_from_u64(7);
        let session =
            QuizSession::start_with_rng(words.clone(), QuizMode::Meaning, fixed_now(), &mut rng)
                .unwrap();

        assert_eq!(session.sequence().len(), words.len());
        assert_eq!(sorted(session.sequence().to_vec()), sorted(words.clone()));
        assert_eq!(session.vocabulary(), words.as_slice());
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.score(), 0);
        assert!(session.answers().is_empty());
        assert!(session.accepts_submission());
    }

    #[test]
    fn duplicate_entries_survive_shuffle() {
        let words = vec![entry("a", "1"), entry("a", "1"), entry("b", "2")];
        let session = QuizSession::start(words.clone(), QuizMode::Vocabulary, fixed_now()).unwrap();
        assert_eq!(sorted(session.sequence().to_vec()), sorted(words));
    }

    #[test]
    fn submit_defers_scoring_until_advance() {
        let mut session =
            QuizSession::start(two_words(), QuizMode::Listening, fixed_now()).unwrap();
        let word = session.current_entry().unwrap().word().to_owned();

        let feedback = session.submit_answer(&word.to_uppercase()).unwrap();
        assert!(feedback.is_correct());
        assert_eq!(session.score(), 0);
        assert!(session.answers().is_empty());
        assert!(!session.accepts_submission());

        let record = session.advance(fixed_now()).unwrap();
        assert!(record.is_correct);
        assert_eq!(record.prompt, word);
        assert_eq!(session.score(), 1);
        assert_eq!(session.current_index(), 1);
        assert!(session.feedback().is_none());
    }

    #[test]
    fn blank_answer_is_rejected_without_state_change() {
        let mut session =
            QuizSession::start(two_words(), QuizMode::Vocabulary, fixed_now()).unwrap();
        assert_eq!(session.submit_answer("   ").unwrap_err(), QuizError::EmptyAnswer);
        assert!(session.accepts_submission());
        assert_eq!(session.phase(), &QuizPhase::AwaitingAnswer);
    }

    #[test]
    fn double_submit_is_an_invalid_transition() {
        let mut session =
            QuizSession::start(two_words(), QuizMode::Vocabulary, fixed_now()).unwrap();
        session.submit_answer("nope").unwrap();
        let before = session.feedback().cloned();

        let err = session.submit_answer("hello").unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidTransition {
                action: QuizAction::Submit,
                ..
            }
        ));
        assert!(matches!(
            session.reveal_answer().unwrap_err(),
            QuizError::InvalidTransition {
                action: QuizAction::Reveal,
                ..
            }
        ));
        assert_eq!(session.feedback().cloned(), before);
    }

    #[test]
    fn advance_without_feedback_fails() {
        let mut session =
            QuizSession::start(two_words(), QuizMode::Vocabulary, fixed_now()).unwrap();
        let err = session.advance(fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidTransition {
                action: QuizAction::Advance,
                phase: "awaiting an answer"
            }
        ));
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn reveal_records_sentinel_and_counts_wrong() {
        let mut session = QuizSession::start(two_words(), QuizMode::Meaning, fixed_now()).unwrap();
        let expected = session.current_entry().unwrap().meaning().to_owned();

        let feedback = session.reveal_answer().unwrap();
        assert!(!feedback.is_correct());
        assert_eq!(feedback.correct_answer(), expected);

        let record = session.advance(fixed_now()).unwrap();
        assert_eq!(record.user_answer, UserAnswer::Revealed);
        assert_eq!(record.user_answer.text(), REVEALED_ANSWER_TEXT);
        assert!(!record.is_correct);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn completes_after_exactly_len_advances() {
        let n = 5;
        let mut session =
            QuizSession::start(numbered(n), QuizMode::Vocabulary, fixed_now()).unwrap();

        for i in 0..n {
            assert!(!session.is_complete(), "completed early at {i}");
            session.reveal_answer().unwrap();
            session.advance(fixed_now()).unwrap();

            let p = session.progress();
            assert!(p.score as usize <= p.answered);
            assert!(p.answered <= p.total);
            assert_eq!(p.answered, session.current_index());
        }

        assert!(session.is_complete());
        assert_eq!(session.completed_at(), Some(fixed_now()));
        assert!(session.current_entry().is_none());
        assert!(session.submit_answer("x").is_err());
        assert!(session.advance(fixed_now()).is_err());
    }

    #[test]
    fn summary_requires_completion() {
        let session = QuizSession::start(two_words(), QuizMode::Vocabulary, fixed_now()).unwrap();
        assert_eq!(session.summary().unwrap_err(), QuizError::NotCompleted);
        assert!(session.result().is_err());
    }

    #[test]
    fn restart_resets_state() {
        let words = numbered(6);
        let mut session =
            QuizSession::start(words.clone(), QuizMode::Vocabulary, fixed_now()).unwrap();
        let first = session.current_entry().unwrap().word().to_owned();
        session.submit_answer(&first).unwrap();
        session.advance(fixed_now()).unwrap();
        session.reveal_answer().unwrap();

        let later = fixed_now() + chrono::Duration::minutes(5);
        session.restart(later);

        assert_eq!(session.score(), 0);
        assert!(session.answers().is_empty());
        assert_eq!(session.current_index(), 0);
        assert!(session.accepts_submission());
        assert_eq!(session.started_at(), later);
        assert_eq!(session.completed_at(), None);
        assert_eq!(sorted(session.sequence().to_vec()), sorted(words));
    }

    #[test]
    fn end_to_end_two_word_scenario() {
        let mut session =
            QuizSession::start(two_words(), QuizMode::Vocabulary, fixed_now()).unwrap();

        // answer whichever comes first correctly, the second wrongly
        let first = session.current_entry().unwrap().word().to_owned();
        assert!(session.submit_answer(&first).unwrap().is_correct());
        session.advance(fixed_now()).unwrap();

        assert!(!session.submit_answer("abc").unwrap().is_correct());
        session.advance(fixed_now()).unwrap();

        assert!(session.is_complete());
        assert_eq!(session.score(), 1);
        assert_eq!(session.answers().len(), 2);

        let summary = session.summary().unwrap();
        assert_eq!(summary.percentage(), 50);
        assert_eq!(summary.tier(), Tier::Fair);

        let result = session.result().unwrap();
        assert_eq!(result.mode(), QuizMode::Vocabulary);
        assert_eq!(result.answers().len(), 2);
        assert_eq!(result.answers()[1].user_answer.text(), "abc");
    }
}
