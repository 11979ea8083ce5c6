//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `HistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `InputDraftService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InputDraftError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error(transparent)]
    History(#[from] HistoryServiceError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
