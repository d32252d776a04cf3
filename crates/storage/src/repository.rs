use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{QuizResult, ResultId, VocabularyEntry, WordListId};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// A stored word list with its entries in original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordListRecord {
    pub id: WordListId,
    pub name: String,
    pub entries: Vec<VocabularyEntry>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row for a word list, without its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordListSummary {
    pub id: WordListId,
    pub name: String,
    pub entry_count: u32,
    pub updated_at: DateTime<Utc>,
}

/// A persisted quiz result with its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResultRow {
    pub id: ResultId,
    pub result: QuizResult,
}

impl QuizResultRow {
    #[must_use]
    pub fn new(id: ResultId, result: QuizResult) -> Self {
        Self { id, result }
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Named word lists. Names are unique; saving an existing name replaces its entries.
#[async_trait]
pub trait WordListRepository: Send + Sync {
    /// Create or replace the list called `name`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be stored.
    async fn save_word_list(
        &self,
        name: &str,
        entries: &[VocabularyEntry],
        saved_at: DateTime<Utc>,
    ) -> Result<WordListId, StorageError>;

    /// Fetch a list by name, `None` if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn get_word_list(&self, name: &str) -> Result<Option<WordListRecord>, StorageError>;

    /// All lists ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn list_word_lists(&self) -> Result<Vec<WordListSummary>, StorageError>;

    /// Remove a list and its entries.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no list has that name.
    async fn delete_word_list(&self, name: &str) -> Result<(), StorageError>;
}

/// Append-only history of completed quizzes.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// Persist a result and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &QuizResult) -> Result<ResultId, StorageError>;

    /// Fetch a result by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: ResultId) -> Result<QuizResult, StorageError>;

    /// Most recently completed results first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decoding failures.
    async fn list_results(&self, limit: u32) -> Result<Vec<QuizResultRow>, StorageError>;
}

//
// ─── IN MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    word_lists: BTreeMap<String, WordListRecord>,
    results: BTreeMap<ResultId, QuizResult>,
    next_word_list_id: u64,
    next_result_id: u64,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl WordListRepository for InMemoryRepository {
    async fn save_word_list(
        &self,
        name: &str,
        entries: &[VocabularyEntry],
        saved_at: DateTime<Utc>,
    ) -> Result<WordListId, StorageError> {
        let mut guard = self.lock()?;
        let name = name.trim().to_owned();
        let existing = guard.word_lists.get(&name).map(|list| list.id);
        let id = match existing {
            Some(id) => id,
            None => {
                guard.next_word_list_id += 1;
                WordListId::new(guard.next_word_list_id)
            }
        };
        guard.word_lists.insert(
            name.clone(),
            WordListRecord {
                id,
                name,
                entries: entries.to_vec(),
                updated_at: saved_at,
            },
        );
        Ok(id)
    }

    async fn get_word_list(&self, name: &str) -> Result<Option<WordListRecord>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.word_lists.get(name.trim()).cloned())
    }

    async fn list_word_lists(&self) -> Result<Vec<WordListSummary>, StorageError> {
        let guard = self.lock()?;
        guard
            .word_lists
            .values()
            .map(|list| {
                let entry_count = u32::try_from(list.entries.len())
                    .map_err(|_| StorageError::Serialization("entry count overflow".into()))?;
                Ok(WordListSummary {
                    id: list.id,
                    name: list.name.clone(),
                    entry_count,
                    updated_at: list.updated_at,
                })
            })
            .collect()
    }

    async fn delete_word_list(&self, name: &str) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard
            .word_lists
            .remove(name.trim())
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<ResultId, StorageError> {
        let mut guard = self.lock()?;
        guard.next_result_id += 1;
        let id = ResultId::new(guard.next_result_id);
        guard.results.insert(id, result.clone());
        Ok(id)
    }

    async fn get_result(&self, id: ResultId) -> Result<QuizResult, StorageError> {
        let guard = self.lock()?;
        guard.results.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_results(&self, limit: u32) -> Result<Vec<QuizResultRow>, StorageError> {
        let guard = self.lock()?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut rows: Vec<QuizResultRow> = guard
            .results
            .iter()
            .map(|(id, result)| QuizResultRow::new(*id, result.clone()))
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at()
                .cmp(&a.result.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(limit);
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub word_lists: Arc<dyn WordListRepository>,
    pub results: Arc<dyn QuizResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let word_lists: Arc<dyn WordListRepository> = Arc::new(repo.clone());
        let results: Arc<dyn QuizResultRepository> = Arc::new(repo);
        Self {
            word_lists,
            results,
        }
    }
}
