use std::sync::Arc;

use quiz_core::choices::build_choices;
use quiz_core::model::{
    AnswerRecord, Feedback, QuizError, QuizMode, QuizSession, ResultId, VocabularyEntry,
};
use storage::repository::QuizResultRepository;
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::QuizServiceError;

/// A running quiz plus the id of its persisted result, once written.
#[derive(Debug, Clone)]
pub struct ActiveQuiz {
    session: QuizSession,
    result_id: Option<ResultId>,
}

impl ActiveQuiz {
    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn result_id(&self) -> Option<ResultId> {
        self.result_id
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.is_complete()
    }
}

/// Result of moving past one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceOutcome {
    pub record: AnswerRecord,
    pub is_complete: bool,
    pub result_id: Option<ResultId>,
}

/// Drives quiz sessions and persists the result when one completes.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    results: Arc<dyn QuizResultRepository>,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(clock: Clock, results: Arc<dyn QuizResultRepository>) -> Self {
        Self { clock, results }
    }

    /// Start a quiz over `vocabulary` in a random order.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` if the vocabulary is empty.
    pub fn start(
        &self,
        vocabulary: Vec<VocabularyEntry>,
        mode: QuizMode,
    ) -> Result<ActiveQuiz, QuizServiceError> {
        let session = QuizSession::start(vocabulary, mode, self.clock.now())?;
        info!(mode = %mode, total = session.total(), "quiz started");
        Ok(ActiveQuiz {
            session,
            result_id: None,
        })
    }

    /// Check an answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` for blank answers or when feedback is
    /// already shown.
    pub fn submit<'a>(
        &self,
        quiz: &'a mut ActiveQuiz,
        answer: &str,
    ) -> Result<&'a Feedback, QuizServiceError> {
        let feedback = quiz.session.submit_answer(answer)?;
        debug!(correct = feedback.is_correct(), "answer checked");
        Ok(feedback)
    }

    /// Reveal the correct answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` when feedback is already shown.
    pub fn reveal<'a>(&self, quiz: &'a mut ActiveQuiz) -> Result<&'a Feedback, QuizServiceError> {
        let feedback = quiz.session.reveal_answer()?;
        debug!("answer revealed");
        Ok(feedback)
    }

    /// Log the current question and move on; persists the result on the last one.
    ///
    /// The session advances even if persistence fails. Retry the write with
    /// [`QuizSessionService::finalize_result`].
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Quiz` unless feedback is shown, or
    /// `QuizServiceError::Storage` if the result cannot be written.
    pub async fn advance(&self, quiz: &mut ActiveQuiz) -> Result<AdvanceOutcome, QuizServiceError> {
        let record = quiz.session.advance(self.clock.now())?.clone();

        if quiz.session.is_complete() && quiz.result_id.is_none() {
            let result = quiz.session.result()?;
            let id = self.results.append_result(&result).await.inspect_err(|err| {
                warn!(error = %err, "failed to persist quiz result");
            })?;
            info!(
                result_id = %id,
                score = result.summary().score(),
                total = result.summary().total(),
                "quiz completed"
            );
            quiz.result_id = Some(id);
        }

        Ok(AdvanceOutcome {
            record,
            is_complete: quiz.session.is_complete(),
            result_id: quiz.result_id,
        })
    }

    /// Retry result persistence for a completed quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotCompleted` (wrapped) if the quiz is still running,
    /// or `QuizServiceError::Storage` if persistence fails.
    pub async fn finalize_result(
        &self,
        quiz: &mut ActiveQuiz,
    ) -> Result<ResultId, QuizServiceError> {
        if let Some(id) = quiz.result_id {
            return Ok(id);
        }
        if !quiz.session.is_complete() {
            return Err(QuizError::NotCompleted.into());
        }

        let result = quiz.session.result()?;
        let id = self.results.append_result(&result).await?;
        quiz.result_id = Some(id);
        Ok(id)
    }

    /// Start over with the same vocabulary and a new order.
    pub fn restart(&self, quiz: &mut ActiveQuiz) {
        quiz.session.restart(self.clock.now());
        quiz.result_id = None;
        info!(total = quiz.session.total(), "quiz restarted");
    }

    /// Options for the current question when presenting multiple choice.
    #[must_use]
    pub fn choices(&self, quiz: &ActiveQuiz, count: usize) -> Vec<String> {
        build_choices(&quiz.session, count, &mut rand::rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuizPhase, UserAnswer};
    use quiz_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, StorageError};

    fn entries() -> Vec<VocabularyEntry> {
        vec![
            VocabularyEntry::new("hello", "xin chào").unwrap(),
            VocabularyEntry::new("goodbye", "tạm biệt").unwrap(),
        ]
    }

    fn service(repo: &InMemoryRepository) -> QuizSessionService {
        QuizSessionService::new(Clock::fixed(fixed_now()), Arc::new(repo.clone()))
    }

    struct FailingResults;

    #[async_trait::async_trait]
    impl QuizResultRepository for FailingResults {
        async fn append_result(
            &self,
            _result: &quiz_core::model::QuizResult,
        ) -> Result<ResultId, StorageError> {
            Err(StorageError::Connection("offline".into()))
        }

        async fn get_result(
            &self,
            _id: ResultId,
        ) -> Result<quiz_core::model::QuizResult, StorageError> {
            Err(StorageError::NotFound)
        }

        async fn list_results(
            &self,
            _limit: u32,
        ) -> Result<Vec<storage::repository::QuizResultRow>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn completing_a_quiz_persists_once() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let mut quiz = service.start(entries(), QuizMode::Vocabulary).unwrap();

        let first = quiz.session().current_entry().unwrap().word().to_owned();
        service.submit(&mut quiz, &first).unwrap();
        let outcome = service.advance(&mut quiz).await.unwrap();
        assert!(!outcome.is_complete);
        assert!(outcome.result_id.is_none());

        service.reveal(&mut quiz).unwrap();
        let outcome = service.advance(&mut quiz).await.unwrap();
        assert!(outcome.is_complete);
        assert_eq!(outcome.record.user_answer, UserAnswer::Revealed);
        let id = outcome.result_id.unwrap();

        assert_eq!(service.finalize_result(&mut quiz).await.unwrap(), id);
        let stored = repo.get_result(id).await.unwrap();
        assert_eq!(stored.summary().score(), 1);
        assert_eq!(stored.summary().percentage(), 50);
        assert_eq!(repo.list_results(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_write_can_be_retried() {
        let failing = QuizSessionService::new(Clock::fixed(fixed_now()), Arc::new(FailingResults));
        let mut quiz = failing
            .start(entries()[..1].to_vec(), QuizMode::Meaning)
            .unwrap();
        failing.submit(&mut quiz, "xin chào").unwrap();

        let err = failing.advance(&mut quiz).await.unwrap_err();
        assert!(matches!(err, QuizServiceError::Storage(_)));
        assert_eq!(quiz.session().phase(), &QuizPhase::Completed);
        assert!(quiz.result_id().is_none());

        let repo = InMemoryRepository::new();
        let id = service(&repo).finalize_result(&mut quiz).await.unwrap();
        assert_eq!(quiz.result_id(), Some(id));
    }

    #[tokio::test]
    async fn finalize_requires_completion() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let mut quiz = service.start(entries(), QuizMode::Vocabulary).unwrap();

        assert!(matches!(
            service.finalize_result(&mut quiz).await,
            Err(QuizServiceError::Quiz(QuizError::NotCompleted))
        ));
    }

    #[test]
    fn restart_clears_result_id_and_choices_include_answer() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let mut quiz = service.start(entries(), QuizMode::Meaning).unwrap();

        let expected = quiz.session().current_entry().unwrap().meaning().to_owned();
        let options = service.choices(&quiz, 4);
        assert_eq!(options.len(), 2);
        assert!(options.contains(&expected));

        service.submit(&mut quiz, "wrong").unwrap();
        service.restart(&mut quiz);
        assert!(quiz.session().accepts_submission());
        assert_eq!(quiz.session().score(), 0);
        assert!(quiz.result_id().is_none());
    }

    #[test]
    fn empty_vocabulary_is_rejected() {
        let repo = InMemoryRepository::new();
        assert!(matches!(
            service(&repo).start(Vec::new(), QuizMode::Listening),
            Err(QuizServiceError::Quiz(QuizError::EmptyVocabulary))
        ));
    }
}
