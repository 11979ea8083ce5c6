use async_trait::async_trait;
use quiz_core::model::QuestionHistory;

use crate::repository::{HISTORY_KEY, HistoryRepository, StorageError};

use super::SqliteRepository;
use super::kv::{read_value, write_value};
use super::mapping::{history_from_json, history_to_json};

#[async_trait]
impl HistoryRepository for SqliteRepository {
    async fn load_history(&self) -> Result<QuestionHistory, StorageError> {
        match read_value(&self.pool, HISTORY_KEY).await? {
            Some(raw) => history_from_json(&raw),
            None => Ok(QuestionHistory::new()),
        }
    }

    async fn save_history(&self, history: &QuestionHistory) -> Result<(), StorageError> {
        let json = history_to_json(history)?;
        write_value(&self.pool, HISTORY_KEY, &json).await?;
        tracing::debug!(entries = history.len(), "history saved");
        Ok(())
    }
}
