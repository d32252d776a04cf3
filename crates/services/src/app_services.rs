use std::sync::Arc;

use storage::repository::Storage;
use tracing::info;

use crate::Clock;
use crate::error::AppServicesError;
use crate::sessions::{QuizHistoryService, QuizSessionService};
use crate::speech::{SpeechEngine, SpeechService};
use crate::word_list_service::WordListService;

/// Assembles the services a front end needs over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz_sessions: Arc<QuizSessionService>,
    history: Arc<QuizHistoryService>,
    word_lists: Arc<WordListService>,
    speech: Arc<SpeechService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        engine: Arc<dyn SpeechEngine>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        info!(%db_url, "storage ready");
        Ok(Self::from_storage(&storage, clock, engine))
    }

    /// Build services over an existing storage aggregate.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, engine: Arc<dyn SpeechEngine>) -> Self {
        let quiz_sessions = Arc::new(QuizSessionService::new(
            clock,
            Arc::clone(&storage.results),
        ));
        let history = Arc::new(QuizHistoryService::new(Arc::clone(&storage.results)));
        let word_lists = Arc::new(WordListService::new(
            clock,
            Arc::clone(&storage.word_lists),
        ));
        let speech = Arc::new(SpeechService::new(engine));

        Self {
            quiz_sessions,
            history,
            word_lists,
            speech,
        }
    }

    #[must_use]
    pub fn quiz_sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.quiz_sessions)
    }

    #[must_use]
    pub fn history(&self) -> Arc<QuizHistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn word_lists(&self) -> Arc<WordListService> {
        Arc::clone(&self.word_lists)
    }

    #[must_use]
    pub fn speech(&self) -> Arc<SpeechService> {
        Arc::clone(&self.speech)
    }
}
