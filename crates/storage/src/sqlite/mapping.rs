use chrono::{DateTime, Utc};
use quiz_core::model::{
    AnswerRecord, QuizMode, QuizResult, ResultId, ScoreSummary, VocabularyEntry, WordListId,
};
use sqlx::Row;

use crate::repository::{StorageError, WordListSummary};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn result_id_from_i64(v: i64) -> Result<ResultId, StorageError> {
    Ok(ResultId::new(i64_to_u64("result_id", v)?))
}

pub(crate) fn word_list_id_from_i64(v: i64) -> Result<WordListId, StorageError> {
    Ok(WordListId::new(i64_to_u64("word_list_id", v)?))
}

pub(crate) fn map_entry_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<VocabularyEntry, StorageError> {
    let word: String = row.try_get("word").map_err(ser)?;
    let meaning: String = row.try_get("meaning").map_err(ser)?;
    VocabularyEntry::new(word, meaning).map_err(ser)
}

pub(crate) fn map_word_list_summary_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<WordListSummary, StorageError> {
    Ok(WordListSummary {
        id: word_list_id_from_i64(row.try_get("id").map_err(ser)?)?,
        name: row.try_get("name").map_err(ser)?,
        entry_count: u32_from_i64("entry_count", row.try_get("entry_count").map_err(ser)?)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizResult, StorageError> {
    let mode: QuizMode = row
        .try_get::<String, _>("mode")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get("score").map_err(ser)?)?;
    let total = u32_from_i64("total", row.try_get("total").map_err(ser)?)?;
    let summary = ScoreSummary::new(score, total).map_err(ser)?;

    let answers_json: String = row.try_get("answers").map_err(ser)?;
    let answers: Vec<AnswerRecord> = serde_json::from_str(&answers_json).map_err(ser)?;

    Ok(QuizResult::new(
        mode,
        started_at,
        completed_at,
        summary,
        answers,
    ))
}
