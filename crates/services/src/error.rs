//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuizError, VocabularyParseError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::speech::SpeechEngineError;

/// Errors emitted by quiz session and history services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `WordListService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WordListServiceError {
    #[error("word list name cannot be empty")]
    EmptyName,
    #[error("word list has no entries")]
    EmptyList,
    #[error("word list not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Parse(#[from] VocabularyParseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SpeechService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpeechError {
    #[error("text-to-speech is not available on this system")]
    CapabilityUnavailable,
    #[error("nothing to speak")]
    EmptyText,
    #[error(transparent)]
    Engine(#[from] SpeechEngineError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
