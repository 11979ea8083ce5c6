use std::sync::Arc;

use rand::Rng;

use quiz_core::model::{Question, QuestionId, QuizMode};
use storage::repository::HistoryRepository;

use super::plan::{SessionBuilder, SessionPlan};
use super::service::QuizSession;
use crate::Clock;
use crate::error::SessionError;
use crate::history_service::HistoryService;

/// Orchestrates session start: selection against the history, then history update.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    history: HistoryService,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(clock: Clock, history: Arc<dyn HistoryRepository>) -> Self {
        Self {
            clock,
            history: HistoryService::new(history),
        }
    }

    #[must_use]
    pub fn history(&self) -> &HistoryService {
        &self.history
    }

    /// Start a new session over up to `desired_count` questions from `pool`.
    ///
    /// The ids of the selected questions are recorded in the history before
    /// the session is returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if nothing was selected.
    /// Returns `SessionError::History` if the history cannot be read or written.
    pub async fn start_session(
        &self,
        pool: &[Question],
        mode: QuizMode,
        desired_count: usize,
    ) -> Result<QuizSession, SessionError> {
        let history = self.history.load().await?;
        let plan = {
            let mut rng = rand::rng();
            SessionBuilder::new(&history).build(pool, desired_count, &mut rng)
        };
        self.begin(plan, mode).await
    }

    /// Like [`Self::start_session`], drawing randomness from `rng`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if nothing was selected.
    /// Returns `SessionError::History` if the history cannot be read or written.
    pub async fn start_session_with_rng<R>(
        &self,
        pool: &[Question],
        mode: QuizMode,
        desired_count: usize,
        rng: &mut R,
    ) -> Result<QuizSession, SessionError>
    where
        R: Rng + ?Sized,
    {
        let history = self.history.load().await?;
        let plan = SessionBuilder::new(&history).build(pool, desired_count, rng);
        self.begin(plan, mode).await
    }

    async fn begin(&self, plan: SessionPlan, mode: QuizMode) -> Result<QuizSession, SessionError> {
        if plan.is_empty() {
            return Err(SessionError::Empty);
        }

        let ids: Vec<QuestionId> = plan.questions.iter().map(|q| q.id().clone()).collect();
        self.history.record(&ids).await?;

        tracing::info!(
            %mode,
            selected = plan.total(),
            unseen = plan.unseen_selected,
            seen = plan.seen_selected,
            "session started"
        );
        QuizSession::new(plan.questions, mode, self.clock)
    }
}
