use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::Clock;
use quiz_core::model::{
    AnswerRecord, AnswerReview, Question, QuizMode, SessionSummary, SessionSummaryError,
    review_answers,
};

use super::progress::SessionProgress;
use crate::error::SessionError;

/// Countdown budget per question in test mode, in timer ticks.
pub const TEST_TIME_LIMIT_SECS: u32 = 30;

//
// ─── PHASES AND OUTCOMES ───────────────────────────────────────────────────────
//

/// Where the session stands with respect to the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No answer is recorded for the current question.
    Answering,
    /// Learning mode: an answer is recorded and its feedback is visible.
    Feedback,
    /// Test mode: an answer is recorded and the session may move on.
    Advancing,
    Finished,
}

/// Result of selecting a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded { choice: usize, is_correct: bool },
    /// The current question already has an answer.
    Locked,
    /// The choice index does not exist on the current question.
    OutOfRange,
    /// The session is finished.
    Ignored,
}

/// Result of asking the session to move on.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// Nothing is recorded for the current question yet, or the session is over.
    Ignored,
    Moved { index: usize },
    Finished(AnswerLog),
}

/// Result of one countdown tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The countdown is not running.
    Idle,
    Counting { remaining: u32 },
    /// The countdown hit zero; `index` was marked as timed out and the session advanced.
    TimedOut { index: usize, advance: AdvanceOutcome },
}

//
// ─── ANSWER LOG ────────────────────────────────────────────────────────────────
//

/// Ordered answers of a finished session, one per question.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerLog {
    pub questions: Vec<Question>,
    pub answers: Vec<AnswerRecord>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl AnswerLog {
    /// Score the log.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError` if the log is inconsistent with its questions.
    pub fn summary(&self) -> Result<SessionSummary, SessionSummaryError> {
        SessionSummary::from_answers(
            &self.questions,
            &self.answers,
            self.started_at,
            self.completed_at,
        )
    }

    #[must_use]
    pub fn review(&self) -> Vec<AnswerReview<'_>> {
        review_answers(&self.questions, &self.answers)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One run through a selected list of questions.
///
/// The session is a plain state machine: it never sleeps and never spawns.
/// Time enters only through [`QuizSession::tick`], which a driver such as
/// `SessionRunner` calls once per elapsed unit.
pub struct QuizSession {
    mode: QuizMode,
    clock: Clock,
    questions: Vec<Question>,
    answers: Vec<AnswerRecord>,
    current: usize,
    time_remaining: u32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a session over `questions` in their given order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(questions: Vec<Question>, mode: QuizMode, clock: Clock) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            mode,
            clock,
            answers: vec![AnswerRecord::Unanswered; questions.len()],
            questions,
            current: 0,
            time_remaining: TEST_TIME_LIMIT_SECS,
            started_at: clock.now(),
            completed_at: None,
        })
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    /// Zero-based position of the current question.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_complete() {
            return None;
        }
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn current_answer(&self) -> AnswerRecord {
        self.answers.get(self.current).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_complete() {
            SessionPhase::Finished
        } else if !self.current_answer().is_recorded() {
            SessionPhase::Answering
        } else if self.mode.shows_feedback() {
            SessionPhase::Feedback
        } else {
            SessionPhase::Advancing
        }
    }

    /// Seconds left on the current question's countdown; `None` outside test mode.
    #[must_use]
    pub fn time_remaining(&self) -> Option<u32> {
        self.mode.is_timed().then_some(self.time_remaining)
    }

    /// True while the countdown should be ticking.
    #[must_use]
    pub fn timer_running(&self) -> bool {
        self.mode.is_timed() && self.phase() == SessionPhase::Answering
    }

    /// Feedback for the current question, available in the `Feedback` phase only.
    #[must_use]
    pub fn feedback(&self) -> Option<AnswerReview<'_>> {
        if self.phase() != SessionPhase::Feedback {
            return None;
        }
        review_answers(&self.questions, &self.answers)
            .into_iter()
            .nth(self.current)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self.answers.iter().filter(|a| a.is_recorded()).count();
        SessionProgress {
            index: self.current,
            total: self.questions.len(),
            answered,
            remaining: self.questions.len().saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }

    /// The full answer log, once the session is finished.
    #[must_use]
    pub fn answer_log(&self) -> Option<AnswerLog> {
        let completed_at = self.completed_at?;
        Some(AnswerLog {
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            started_at: self.started_at,
            completed_at,
        })
    }

    /// Record choice `index` for the current question.
    ///
    /// A question accepts exactly one answer; later selections leave it unchanged.
    pub fn select_choice(&mut self, index: usize) -> AnswerOutcome {
        if self.is_complete() {
            return AnswerOutcome::Ignored;
        }
        if self.current_answer().is_recorded() {
            return AnswerOutcome::Locked;
        }
        let Some(question) = self.questions.get(self.current) else {
            return AnswerOutcome::Ignored;
        };
        let Some(choice) = question.choice(index) else {
            return AnswerOutcome::OutOfRange;
        };
        let is_correct = choice.is_correct;

        self.answers[self.current] = AnswerRecord::Chosen(index);
        tracing::debug!(index = self.current, choice = index, is_correct, "answer recorded");

        AnswerOutcome::Recorded {
            choice: index,
            is_correct,
        }
    }

    /// Move past the current question once it has an answer.
    ///
    /// Advancing from the last question finishes the session and returns its log.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.is_complete() || !self.current_answer().is_recorded() {
            return AdvanceOutcome::Ignored;
        }

        if self.current + 1 >= self.questions.len() {
            let completed_at = self.clock.now().max(self.started_at);
            self.completed_at = Some(completed_at);
            tracing::info!(questions = self.questions.len(), mode = %self.mode, "session finished");
            return self
                .answer_log()
                .map_or(AdvanceOutcome::Ignored, AdvanceOutcome::Finished);
        }

        self.current += 1;
        self.time_remaining = TEST_TIME_LIMIT_SECS;
        AdvanceOutcome::Moved {
            index: self.current,
        }
    }

    /// Count down one unit of time.
    ///
    /// Outside test mode, or once the current question has an answer, this does
    /// nothing. When the countdown reaches zero the current question is marked
    /// as timed out and the session advances.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.timer_running() {
            return TickOutcome::Idle;
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return TickOutcome::Counting {
                remaining: self.time_remaining,
            };
        }

        let index = self.current;
        self.answers[index] = AnswerRecord::TimedOut;
        tracing::info!(index, "question timed out");
        TickOutcome::TimedOut {
            index,
            advance: self.advance(),
        }
    }

    /// Abandon the session without producing a log.
    pub fn quit(self) {
        tracing::info!(
            index = self.current,
            total = self.questions.len(),
            "session abandoned"
        );
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("mode", &self.mode)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("time_remaining", &self.time_remaining)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
