use std::sync::Arc;

use quiz_core::model::{VocabularyEntry, WordListId, parse_word_list};
use storage::repository::{StorageError, WordListRepository, WordListSummary};
use tracing::info;

use crate::Clock;
use crate::error::WordListServiceError;

/// Imports and loads named word lists.
#[derive(Clone)]
pub struct WordListService {
    clock: Clock,
    word_lists: Arc<dyn WordListRepository>,
}

impl WordListService {
    #[must_use]
    pub fn new(clock: Clock, word_lists: Arc<dyn WordListRepository>) -> Self {
        Self { clock, word_lists }
    }

    /// Parse `text` and store it under `name`, replacing any list with that name.
    ///
    /// # Errors
    ///
    /// Returns `WordListServiceError` for blank names, unparsable or empty
    /// text, or storage failures.
    pub async fn import_text(
        &self,
        name: &str,
        text: &str,
    ) -> Result<(WordListId, usize), WordListServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WordListServiceError::EmptyName);
        }
        let entries = parse_word_list(text)?;
        if entries.is_empty() {
            return Err(WordListServiceError::EmptyList);
        }

        let id = self
            .word_lists
            .save_word_list(name, &entries, self.clock.now())
            .await?;
        info!(%name, entries = entries.len(), "word list imported");
        Ok((id, entries.len()))
    }

    /// Entries of the list called `name`, in stored order.
    ///
    /// # Errors
    ///
    /// Returns `WordListServiceError::NotFound` if no such list exists.
    pub async fn load(&self, name: &str) -> Result<Vec<VocabularyEntry>, WordListServiceError> {
        self.word_lists
            .get_word_list(name)
            .await?
            .map(|list| list.entries)
            .ok_or_else(|| WordListServiceError::NotFound(name.trim().to_owned()))
    }

    /// # Errors
    ///
    /// Returns `WordListServiceError::Storage` if lists cannot be read.
    pub async fn list(&self) -> Result<Vec<WordListSummary>, WordListServiceError> {
        Ok(self.word_lists.list_word_lists().await?)
    }

    /// Remove the list called `name` together with its entries.
    ///
    /// # Errors
    ///
    /// Returns `WordListServiceError::NotFound` if no such list exists.
    pub async fn delete(&self, name: &str) -> Result<(), WordListServiceError> {
        let name = name.trim();
        match self.word_lists.delete_word_list(name).await {
            Ok(()) => {
                info!(%name, "word list deleted");
                Ok(())
            }
            Err(StorageError::NotFound) => Err(WordListServiceError::NotFound(name.to_owned())),
            Err(err) => Err(err.into()),
        }
    }
}
