use std::sync::Arc;

use storage::repository::InputDraftRepository;

use crate::error::InputDraftError;

/// Remembers the last raw JSON text the user submitted.
#[derive(Clone)]
pub struct InputDraftService {
    repo: Arc<dyn InputDraftRepository>,
}

impl InputDraftService {
    #[must_use]
    pub fn new(repo: Arc<dyn InputDraftRepository>) -> Self {
        Self { repo }
    }

    /// # Errors
    ///
    /// Returns `InputDraftError::Storage` if the repository cannot be read.
    pub async fn last_input(&self) -> Result<Option<String>, InputDraftError> {
        Ok(self.repo.load_draft().await?)
    }

    /// # Errors
    ///
    /// Returns `InputDraftError::Storage` if the draft cannot be stored.
    pub async fn remember(&self, text: &str) -> Result<(), InputDraftError> {
        self.repo.save_draft(text).await?;
        tracing::debug!(bytes = text.len(), "input draft saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn remembers_latest_input() {
        let service = InputDraftService::new(Arc::new(InMemoryRepository::new()));
        assert_eq!(service.last_input().await.unwrap(), None);

        service.remember("[1]").await.unwrap();
        service.remember("[2]").await.unwrap();
        assert_eq!(service.last_input().await.unwrap().as_deref(), Some("[2]"));
    }
}
