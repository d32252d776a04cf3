mod history;
mod workflow;

// Public API of the quiz session subsystem.
pub use history::{QuizHistoryItem, QuizHistoryService};
pub use workflow::{ActiveQuiz, AdvanceOutcome, QuizSessionService};
