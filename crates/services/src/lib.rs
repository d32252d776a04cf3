#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod sessions;
pub mod speech;
pub mod word_list_service;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, QuizServiceError, SpeechError, WordListServiceError};
pub use sessions::{
    ActiveQuiz, AdvanceOutcome, QuizHistoryItem, QuizHistoryService, QuizSessionService,
};
pub use speech::{
    CommandSpeechEngine, SpeechEngine, SpeechEngineError, SpeechService, UnavailableSpeechEngine,
    Utterance, UtteranceCallback, UtteranceEvent,
};
pub use word_list_service::WordListService;
