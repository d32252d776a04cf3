use chrono::{DateTime, Utc};
use quiz_core::model::{VocabularyEntry, WordListId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    conn, map_entry_row, map_word_list_summary_row, ser, word_list_id_from_i64,
};
use crate::repository::{StorageError, WordListRecord, WordListRepository, WordListSummary};

#[async_trait::async_trait]
impl WordListRepository for SqliteRepository {
    async fn save_word_list(
        &self,
        name: &str,
        entries: &[VocabularyEntry],
        saved_at: DateTime<Utc>,
    ) -> Result<WordListId, StorageError> {
        let name = name.trim();
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let row = sqlx::query(
            r"
                INSERT INTO word_lists (name, updated_at)
                VALUES (?1, ?2)
                ON CONFLICT(name) DO UPDATE SET updated_at = excluded.updated_at
                RETURNING id
            ",
        )
        .bind(name)
        .bind(saved_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(conn)?;
        let id: i64 = row.try_get("id").map_err(ser)?;

        sqlx::query("DELETE FROM word_list_entries WHERE word_list_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, entry) in entries.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            sqlx::query(
                r"
                    INSERT INTO word_list_entries (word_list_id, position, word, meaning)
                    VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(id)
            .bind(position)
            .bind(entry.word())
            .bind(entry.meaning())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        word_list_id_from_i64(id)
    }

    async fn get_word_list(&self, name: &str) -> Result<Option<WordListRecord>, StorageError> {
        let Some(row) = sqlx::query("SELECT id, name, updated_at FROM word_lists WHERE name = ?1")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
        else {
            return Ok(None);
        };

        let id: i64 = row.try_get("id").map_err(ser)?;
        let entries = sqlx::query(
            r"
                SELECT word, meaning
                FROM word_list_entries
                WHERE word_list_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?
        .iter()
        .map(map_entry_row)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(WordListRecord {
            id: word_list_id_from_i64(id)?,
            name: row.try_get("name").map_err(ser)?,
            entries,
            updated_at: row.try_get("updated_at").map_err(ser)?,
        }))
    }

    async fn list_word_lists(&self) -> Result<Vec<WordListSummary>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    l.id, l.name, l.updated_at,
                    COUNT(e.position) AS entry_count
                FROM word_lists l
                LEFT JOIN word_list_entries e ON e.word_list_id = l.id
                GROUP BY l.id
                ORDER BY l.name ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_word_list_summary_row).collect()
    }

    async fn delete_word_list(&self, name: &str) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM word_lists WHERE name = ?1")
            .bind(name.trim())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
