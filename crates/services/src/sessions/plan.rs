use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{Question, QuestionHistory};

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    pub unseen_selected: usize,
    pub seen_selected: usize,
}

impl SessionPlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Returns true when no questions were selected for this session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Picks a session's questions from a pool, preferring ids missing from the history.
pub struct SessionBuilder<'a> {
    history: &'a QuestionHistory,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(history: &'a QuestionHistory) -> Self {
        Self { history }
    }

    /// Build a session plan from the validated pool.
    ///
    /// - The pool is shuffled uniformly (Fisher–Yates).
    /// - A stable sort then moves every question already in the history behind
    ///   the unseen ones, keeping the shuffled order inside both groups.
    /// - The first `min(desired_count, pool.len())` questions are taken.
    ///
    /// The history itself is left untouched.
    pub fn build<R>(self, pool: &[Question], desired_count: usize, rng: &mut R) -> SessionPlan
    where
        R: Rng + ?Sized,
    {
        let mut candidates = pool.to_vec();
        candidates.as_mut_slice().shuffle(rng);
        candidates.sort_by_key(|q| self.history.contains(q.id()));
        candidates.truncate(desired_count.min(pool.len()));

        let seen_selected = candidates
            .iter()
            .filter(|q| self.history.contains(q.id()))
            .count();

        SessionPlan {
            unseen_selected: candidates.len() - seen_selected,
            seen_selected,
            questions: candidates,
        }
    }
}

/// Shorthand for [`SessionBuilder::build`] returning only the questions.
pub fn select_questions<R>(
    pool: &[Question],
    desired_count: usize,
    history: &QuestionHistory,
    rng: &mut R,
) -> Vec<Question>
where
    R: Rng + ?Sized,
{
    SessionBuilder::new(history)
        .build(pool, desired_count, rng)
        .questions
}
