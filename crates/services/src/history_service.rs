use std::sync::Arc;

use quiz_core::model::{QuestionHistory, QuestionId};
use storage::repository::HistoryRepository;

use crate::error::HistoryServiceError;

/// Reads and updates the served-question history.
#[derive(Clone)]
pub struct HistoryService {
    repo: Arc<dyn HistoryRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(repo: Arc<dyn HistoryRepository>) -> Self {
        Self { repo }
    }

    /// Load the stored history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` if the repository cannot be read.
    pub async fn load(&self) -> Result<QuestionHistory, HistoryServiceError> {
        Ok(self.repo.load_history().await?)
    }

    /// Merge `ids` in front of the stored history and persist the result.
    ///
    /// Returns the history as it was saved.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` if loading or saving fails.
    pub async fn record(&self, ids: &[QuestionId]) -> Result<QuestionHistory, HistoryServiceError> {
        let mut history = self.repo.load_history().await?;
        history.record(ids.iter().cloned());
        self.repo.save_history(&history).await?;
        tracing::debug!(recorded = ids.len(), stored = history.len(), "history updated");
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::MAX_HISTORY;
    use storage::repository::InMemoryRepository;

    fn ids(prefix: &str, n: usize) -> Vec<QuestionId> {
        (0..n).map(|i| QuestionId::new(format!("{prefix}{i}"))).collect()
    }

    #[tokio::test]
    async fn record_puts_new_ids_first() {
        let service = HistoryService::new(Arc::new(InMemoryRepository::new()));
        service.record(&ids("a", 2)).await.unwrap();
        let history = service
            .record(&[QuestionId::new("b"), QuestionId::new("a1")])
            .await
            .unwrap();

        let order: Vec<&str> = history.ids().iter().map(QuestionId::as_str).collect();
        assert_eq!(order, ["b", "a1", "a0"]);
        assert_eq!(service.load().await.unwrap(), history);
    }

    #[tokio::test]
    async fn record_rolls_over_at_capacity() {
        let service = HistoryService::new(Arc::new(InMemoryRepository::new()));
        let batch = ids("q", 55);
        let history = service.record(&batch).await.unwrap();

        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.ids(), &batch[..MAX_HISTORY]);
    }
}
