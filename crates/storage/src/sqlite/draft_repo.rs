use async_trait::async_trait;

use crate::repository::{INPUT_DRAFT_KEY, InputDraftRepository, StorageError};

use super::SqliteRepository;
use super::kv::{read_value, write_value};

#[async_trait]
impl InputDraftRepository for SqliteRepository {
    async fn load_draft(&self) -> Result<Option<String>, StorageError> {
        read_value(&self.pool, INPUT_DRAFT_KEY).await
    }

    async fn save_draft(&self, text: &str) -> Result<(), StorageError> {
        write_value(&self.pool, INPUT_DRAFT_KEY, text).await
    }
}
