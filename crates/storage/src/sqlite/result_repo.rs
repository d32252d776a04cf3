use quiz_core::model::{QuizResult, ResultId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_result_row, result_id_from_i64, ser};
use crate::repository::{QuizResultRepository, QuizResultRow, StorageError};

#[async_trait::async_trait]
impl QuizResultRepository for SqliteRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<ResultId, StorageError> {
        let answers = serde_json::to_string(result.answers()).map_err(ser)?;
        let summary = result.summary();

        let res = sqlx::query(
            r"
                INSERT INTO quiz_results (
                    mode, started_at, completed_at, score, total, answers
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(result.mode().as_str())
        .bind(result.started_at())
        .bind(result.completed_at())
        .bind(i64::from(summary.score()))
        .bind(i64::from(summary.total()))
        .bind(answers)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        result_id_from_i64(res.last_insert_rowid())
    }

    async fn get_result(&self, id: ResultId) -> Result<QuizResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT mode, started_at, completed_at, score, total, answers
                FROM quiz_results
                WHERE id = ?1
            ",
        )
        .bind(id_to_i64("result_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<QuizResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, mode, started_at, completed_at, score, total, answers
                FROM quiz_results
                ORDER BY completed_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| {
                let id = result_id_from_i64(row.try_get("id").map_err(ser)?)?;
                Ok(QuizResultRow::new(id, map_result_row(row)?))
            })
            .collect()
    }
}
