use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::draft_service::InputDraftService;
use crate::error::AppServicesError;
use crate::history_service::HistoryService;
use crate::sessions::SessionLoopService;

/// Assembles the services a front end needs over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    history: Arc<HistoryService>,
    drafts: Arc<InputDraftService>,
    session_loop: Arc<SessionLoopService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over volatile in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        Self {
            history: Arc::new(HistoryService::new(Arc::clone(&storage.history))),
            drafts: Arc::new(InputDraftService::new(Arc::clone(&storage.drafts))),
            session_loop: Arc::new(SessionLoopService::new(
                clock,
                Arc::clone(&storage.history),
            )),
        }
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn drafts(&self) -> Arc<InputDraftService> {
        Arc::clone(&self.drafts)
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<SessionLoopService> {
        Arc::clone(&self.session_loop)
    }
}
