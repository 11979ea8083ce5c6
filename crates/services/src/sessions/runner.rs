use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::input::SessionInput;
use super::service::{AdvanceOutcome, AnswerOutcome, QuizSession, TickOutcome};
use super::timer::{CountdownTimer, DEFAULT_TICK_PERIOD, Tick};

/// What a single input did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerEvent {
    Answer(AnswerOutcome),
    Advance(AdvanceOutcome),
    /// The caller should drop the runner via [`SessionRunner::quit`].
    Quit,
}

/// Drives a [`QuizSession`] in real time.
///
/// Owns the session and at most one [`CountdownTimer`]. The timer is re-armed
/// with a fresh generation whenever a new question becomes current and is
/// dropped as soon as the current question has an answer, the session ends or
/// the user quits. Ticks carrying an older generation are discarded.
pub struct SessionRunner {
    session: QuizSession,
    period: Duration,
    generation: u64,
    timer: Option<CountdownTimer>,
    tick_tx: UnboundedSender<Tick>,
    tick_rx: UnboundedReceiver<Tick>,
}

impl SessionRunner {
    /// Wrap `session`, ticking once per second.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime while the session needs a timer.
    #[must_use]
    pub fn new(session: QuizSession) -> Self {
        Self::with_period(session, DEFAULT_TICK_PERIOD)
    }

    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime while the session needs a timer.
    #[must_use]
    pub fn with_period(session: QuizSession, period: Duration) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let mut runner = Self {
            session,
            period,
            generation: 0,
            timer: None,
            tick_tx,
            tick_rx,
        };
        runner.sync_timer();
        runner
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn handle_input(&mut self, input: SessionInput) -> RunnerEvent {
        match input {
            SessionInput::Choose(index) => {
                let outcome = self.session.select_choice(index);
                self.sync_timer();
                RunnerEvent::Answer(outcome)
            }
            SessionInput::Next => RunnerEvent::Advance(self.advance()),
            SessionInput::Quit => {
                self.disarm();
                RunnerEvent::Quit
            }
        }
    }

    pub fn select_choice(&mut self, index: usize) -> AnswerOutcome {
        let outcome = self.session.select_choice(index);
        self.sync_timer();
        outcome
    }

    pub fn advance(&mut self) -> AdvanceOutcome {
        let outcome = self.session.advance();
        if matches!(outcome, AdvanceOutcome::Moved { .. }) {
            self.rearm();
        } else {
            self.sync_timer();
        }
        outcome
    }

    /// Wait for the next countdown tick and apply it.
    ///
    /// Never resolves while no timer is armed. Cancel safe: dropping the
    /// future before it resolves loses no tick.
    pub async fn next_tick(&mut self) -> TickOutcome {
        loop {
            let Some(current) = self.timer.as_ref().map(CountdownTimer::generation) else {
                return std::future::pending().await;
            };
            let Some(tick) = self.tick_rx.recv().await else {
                return std::future::pending().await;
            };
            if tick.generation != current {
                tracing::trace!(stale = tick.generation, current, "dropping stale tick");
                continue;
            }

            let outcome = self.session.tick();
            if matches!(outcome, TickOutcome::TimedOut { .. }) {
                self.rearm();
            } else {
                self.sync_timer();
            }
            return outcome;
        }
    }

    /// Stop the timer and discard the session.
    pub fn quit(mut self) {
        self.disarm();
        let Self { session, .. } = self;
        session.quit();
    }

    /// Finish with the session, stopping any timer.
    #[must_use]
    pub fn into_session(mut self) -> QuizSession {
        self.disarm();
        let Self { session, .. } = self;
        session
    }

    fn sync_timer(&mut self) {
        match (self.session.timer_running(), self.timer.is_some()) {
            (true, false) => self.arm(),
            (false, true) => self.disarm(),
            _ => {}
        }
    }

    fn rearm(&mut self) {
        self.disarm();
        self.sync_timer();
    }

    fn arm(&mut self) {
        self.disarm();
        self.generation += 1;
        self.timer = Some(CountdownTimer::start(
            self.generation,
            self.period,
            self.tick_tx.clone(),
        ));
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AnswerRecord, Choice, Question, QuestionId, QuizMode};
    use quiz_core::time::fixed_clock;
    use crate::sessions::service::TEST_TIME_LIMIT_SECS;
    use tokio::time::Instant;

    fn build_session(n: usize, mode: QuizMode) -> QuizSession {
        let questions = (0..n)
            .map(|i| Question {
                id: QuestionId::new(format!("q{i}")),
                question: format!("Question {i}?"),
                background_knowledge: None,
                explanation: None,
                choices: vec![Choice::new("right", true), Choice::new("wrong", false)],
            })
            .collect();
        QuizSession::new(questions, mode, fixed_clock()).unwrap()
    }

    async fn wait_for_timeout(runner: &mut SessionRunner) -> TickOutcome {
        loop {
            let outcome = runner.next_tick().await;
            if !matches!(outcome, TickOutcome::Counting { .. }) {
                return outcome;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_times_out_after_budget() {
        let mut runner = SessionRunner::new(build_session(2, QuizMode::Test));
        assert!(runner.timer_armed());

        let started = Instant::now();
        let outcome = wait_for_timeout(&mut runner).await;

        assert!(matches!(
            outcome,
            TickOutcome::TimedOut {
                index: 0,
                advance: AdvanceOutcome::Moved { index: 1 }
            }
        ));
        assert_eq!(
            started.elapsed(),
            DEFAULT_TICK_PERIOD * TEST_TIME_LIMIT_SECS
        );
        assert_eq!(runner.session().answers()[0], AnswerRecord::TimedOut);
        assert!(runner.timer_armed());
        assert_eq!(runner.session().time_remaining(), Some(TEST_TIME_LIMIT_SECS));
    }

    #[tokio::test(start_paused = true)]
    async fn answering_disarms_and_advancing_rearms() {
        let mut runner = SessionRunner::new(build_session(2, QuizMode::Test));
        runner.next_tick().await;

        runner.handle_input(SessionInput::Choose(0));
        assert!(!runner.timer_armed());

        let event = runner.handle_input(SessionInput::Next);
        assert_eq!(event, RunnerEvent::Advance(AdvanceOutcome::Moved { index: 1 }));
        assert!(runner.timer_armed());
        assert_eq!(runner.next_tick().await, TickOutcome::Counting { remaining: 29 });
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticks_never_count() {
        let mut runner = SessionRunner::new(build_session(2, QuizMode::Test));

        // Let a tick from the first timer sit in the channel, then move on.
        tokio::time::sleep(DEFAULT_TICK_PERIOD).await;
        runner.select_choice(1);
        runner.advance();

        assert_eq!(runner.next_tick().await, TickOutcome::Counting { remaining: 29 });
        assert_eq!(runner.session().current_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn learning_mode_never_arms() {
        let mut runner = SessionRunner::new(build_session(1, QuizMode::Learning));
        assert!(!runner.timer_armed());

        let tick = tokio::time::timeout(DEFAULT_TICK_PERIOD * 60, runner.next_tick()).await;
        assert!(tick.is_err());
        assert_eq!(runner.session().current_answer(), AnswerRecord::Unanswered);
    }

    #[tokio::test(start_paused = true)]
    async fn finishing_disarms() {
        let mut runner = SessionRunner::new(build_session(1, QuizMode::Test));
        runner.select_choice(0);
        let AdvanceOutcome::Finished(log) = runner.advance() else {
            panic!("expected the session to finish");
        };
        assert_eq!(log.answers, [AnswerRecord::Chosen(0)]);
        assert!(!runner.timer_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn quit_is_accepted_mid_question() {
        let mut runner = SessionRunner::new(build_session(3, QuizMode::Test));
        assert_eq!(runner.handle_input(SessionInput::Quit), RunnerEvent::Quit);
        assert!(!runner.timer_armed());
        runner.quit();
    }
}
