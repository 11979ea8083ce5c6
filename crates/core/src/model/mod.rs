mod answer;
mod history;
mod ids;
mod question;
mod session;

pub use answer::{AnswerRecord, ParseModeError, QuizMode};
pub use history::{MAX_HISTORY, QuestionHistory};
pub use ids::QuestionId;
pub use question::{Choice, Question};
pub use session::{AnswerReview, SessionSummary, SessionSummaryError, review_answers};
