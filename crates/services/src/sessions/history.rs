use chrono::{DateTime, Utc};
use std::sync::Arc;

use quiz_core::model::{QuizMode, QuizResult, ResultId, Tier};
use storage::repository::{QuizResultRepository, QuizResultRow};

use crate::error::QuizServiceError;

/// Presentation-agnostic row for a past quiz.
///
/// Timestamps are left unformatted; the front end decides how to show them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizHistoryItem {
    pub id: ResultId,
    pub mode: QuizMode,
    pub completed_at: DateTime<Utc>,
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub tier: Tier,
}

impl QuizHistoryItem {
    #[must_use]
    pub fn from_row(row: &QuizResultRow) -> Self {
        let summary = row.result.summary();
        Self {
            id: row.id,
            mode: row.result.mode(),
            completed_at: row.result.completed_at(),
            score: summary.score(),
            total: summary.total(),
            percentage: summary.percentage(),
            tier: summary.tier(),
        }
    }
}

/// Read access to completed quizzes.
#[derive(Clone)]
pub struct QuizHistoryService {
    results: Arc<dyn QuizResultRepository>,
}

impl QuizHistoryService {
    #[must_use]
    pub fn new(results: Arc<dyn QuizResultRepository>) -> Self {
        Self { results }
    }

    /// Most recent quizzes first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if results cannot be read.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<QuizHistoryItem>, QuizServiceError> {
        let rows = self.results.list_results(limit).await?;
        Ok(rows.iter().map(QuizHistoryItem::from_row).collect())
    }

    /// Full result including the answer log.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the result is missing or unreadable.
    pub async fn get(&self, id: ResultId) -> Result<QuizResult, QuizServiceError> {
        Ok(self.results.get_result(id).await?)
    }
}
