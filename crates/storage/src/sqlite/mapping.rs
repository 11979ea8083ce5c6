use quiz_core::model::{QuestionHistory, QuestionId};

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// History is stored as a JSON array of id strings, newest first.
pub(crate) fn history_to_json(history: &QuestionHistory) -> Result<String, StorageError> {
    serde_json::to_string(history).map_err(ser)
}

pub(crate) fn history_from_json(raw: &str) -> Result<QuestionHistory, StorageError> {
    let ids: Vec<QuestionId> = serde_json::from_str(raw).map_err(ser)?;
    Ok(QuestionHistory::from_persisted(ids))
}
