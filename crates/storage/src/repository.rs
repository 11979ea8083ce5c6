use async_trait::async_trait;
use quiz_core::model::QuestionHistory;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Fixed key under which the served-question history is stored.
pub const HISTORY_KEY: &str = "quiz_question_history";

/// Fixed key under which the last raw JSON input is stored.
pub const INPUT_DRAFT_KEY: &str = "quiz_json_input";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable memory of recently served question ids.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Load the stored history, or an empty one if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or holds malformed data.
    async fn load_history(&self) -> Result<QuestionHistory, StorageError>;

    /// Replace the stored history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be stored.
    async fn save_history(&self, history: &QuestionHistory) -> Result<(), StorageError>;
}

/// Last raw JSON text the user submitted.
#[async_trait]
pub trait InputDraftRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load_draft(&self) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the draft cannot be stored.
    async fn save_draft(&self, text: &str) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    history: Arc<Mutex<QuestionHistory>>,
    draft: Arc<Mutex<Option<String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn load_history(&self) -> Result<QuestionHistory, StorageError> {
        let guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_history(&self, history: &QuestionHistory) -> Result<(), StorageError> {
        let mut guard = self
            .history
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = history.clone();
        Ok(())
    }
}

#[async_trait]
impl InputDraftRepository for InMemoryRepository {
    async fn load_draft(&self) -> Result<Option<String>, StorageError> {
        let guard = self
            .draft
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_draft(&self, text: &str) -> Result<(), StorageError> {
        let mut guard = self
            .draft
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(text.to_owned());
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub history: Arc<dyn HistoryRepository>,
    pub drafts: Arc<dyn InputDraftRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let history: Arc<dyn HistoryRepository> = Arc::new(repo.clone());
        let drafts: Arc<dyn InputDraftRepository> = Arc::new(repo);
        Self { history, drafts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;

    #[tokio::test]
    async fn history_round_trips() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_history().await.unwrap().is_empty());

        let mut history = QuestionHistory::new();
        history.record([QuestionId::new("a"), QuestionId::new("b")]);
        repo.save_history(&history).await.unwrap();

        assert_eq!(repo.load_history().await.unwrap(), history);
    }

    #[tokio::test]
    async fn storage_handles_share_state() {
        let storage = Storage::in_memory();
        storage.drafts.save_draft("[]").await.unwrap();
        assert_eq!(storage.drafts.load_draft().await.unwrap().as_deref(), Some("[]"));
    }
}
