mod input;
mod plan;
mod progress;
mod runner;
mod service;
mod timer;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use input::SessionInput;
pub use plan::{SessionBuilder, SessionPlan, select_questions};
pub use progress::SessionProgress;
pub use runner::{RunnerEvent, SessionRunner};
pub use service::{
    AdvanceOutcome, AnswerLog, AnswerOutcome, QuizSession, SessionPhase, TEST_TIME_LIMIT_SECS,
    TickOutcome,
};
pub use timer::{CountdownTimer, DEFAULT_TICK_PERIOD, Tick};
pub use workflow::SessionLoopService;
