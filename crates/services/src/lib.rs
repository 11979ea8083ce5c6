#![forbid(unsafe_code)]

pub mod app_services;
pub mod draft_service;
pub mod error;
pub mod history_service;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use draft_service::InputDraftService;
pub use error::{AppServicesError, HistoryServiceError, InputDraftError, SessionError};
pub use history_service::HistoryService;

pub use sessions::{
    AdvanceOutcome, AnswerLog, AnswerOutcome, CountdownTimer, QuizSession, RunnerEvent,
    SessionBuilder, SessionInput, SessionLoopService, SessionPhase, SessionPlan, SessionProgress,
    SessionRunner, TEST_TIME_LIMIT_SECS, TickOutcome, select_questions,
};
