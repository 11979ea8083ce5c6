/// Aggregated view of session progress, useful for a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    /// Zero-based position of the current question.
    pub index: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}
