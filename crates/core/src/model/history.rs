use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::ids::QuestionId;

/// Maximum number of ids kept in the history.
pub const MAX_HISTORY: usize = 50;

/// Recently served question ids, newest first, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionHistory {
    ids: Vec<QuestionId>,
}

impl QuestionHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a history from storage.
    ///
    /// Persisted data is normalized the same way `record` would leave it:
    /// later duplicates are dropped and the list is capped at [`MAX_HISTORY`].
    #[must_use]
    pub fn from_persisted(ids: Vec<QuestionId>) -> Self {
        let mut history = Self::new();
        history.record(ids);
        history
    }

    /// Put `new_ids` in front of the existing entries.
    ///
    /// The first occurrence of an id wins, so a re-served id moves to the
    /// front. The result is truncated to the newest [`MAX_HISTORY`] entries.
    pub fn record<I>(&mut self, new_ids: I)
    where
        I: IntoIterator<Item = QuestionId>,
    {
        let existing = std::mem::take(&mut self.ids);
        let mut seen = HashSet::new();
        self.ids = new_ids
            .into_iter()
            .chain(existing)
            .filter(|id| seen.insert(id.clone()))
            .take(MAX_HISTORY)
            .collect();
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn ids(&self) -> &[QuestionId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn into_ids(self) -> Vec<QuestionId> {
        self.ids
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<QuestionId> {
        raw.iter().map(|s| QuestionId::from(*s)).collect()
    }

    #[test]
    fn record_prepends_and_dedupes() {
        let mut history = QuestionHistory::from_persisted(ids(&["a", "b", "c"]));
        history.record(ids(&["d", "b"]));
        assert_eq!(history.ids(), ids(&["d", "b", "a", "c"]).as_slice());
    }

    #[test]
    fn duplicates_inside_new_batch_keep_first() {
        let mut history = QuestionHistory::new();
        history.record(ids(&["x", "y", "x"]));
        assert_eq!(history.ids(), ids(&["x", "y"]).as_slice());
    }

    #[test]
    fn rollover_keeps_newest_fifty() {
        let mut history = QuestionHistory::new();
        let batch: Vec<QuestionId> = (0..55).map(|i| QuestionId::new(format!("q{i}"))).collect();
        history.record(batch.clone());

        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.ids(), &batch[..MAX_HISTORY]);
        assert!(!history.contains(&QuestionId::new("q54")));

        let unique: HashSet<_> = history.ids().iter().collect();
        assert_eq!(unique.len(), MAX_HISTORY);
    }

    #[test]
    fn from_persisted_normalizes_bad_data() {
        let mut raw = ids(&["a", "a", "b"]);
        raw.extend((0..60).map(|i| QuestionId::new(format!("z{i}"))));
        let history = QuestionHistory::from_persisted(raw);
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history.ids()[0], QuestionId::new("a"));
        assert_eq!(history.ids()[1], QuestionId::new("b"));
    }
}
