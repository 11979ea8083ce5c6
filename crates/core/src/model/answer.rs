use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── QUIZ MODE ─────────────────────────────────────────────────────────────────
//

/// How a session presents questions.
///
/// - `Learning`: feedback after every answer, no time limit.
/// - `Test`: no feedback, each question is timed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    #[default]
    Learning,
    Test,
}

impl QuizMode {
    #[must_use]
    pub fn is_timed(self) -> bool {
        matches!(self, QuizMode::Test)
    }

    #[must_use]
    pub fn shows_feedback(self) -> bool {
        matches!(self, QuizMode::Learning)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::Learning => "learning",
            QuizMode::Test => "test",
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown quiz mode: {raw} (expected \"learning\" or \"test\")")]
pub struct ParseModeError {
    raw: String,
}

impl FromStr for QuizMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "learning" | "learn" => Ok(QuizMode::Learning),
            "test" => Ok(QuizMode::Test),
            _ => Err(ParseModeError { raw: s.to_owned() }),
        }
    }
}

//
// ─── ANSWER RECORD ─────────────────────────────────────────────────────────────
//

/// What happened at one position of a session.
///
/// `TimedOut` and `Unanswered` are distinct: the first means the countdown
/// expired, the second that the session ended before the question was reached
/// or answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "choice", rename_all = "snake_case")]
pub enum AnswerRecord {
    #[default]
    Unanswered,
    Chosen(usize),
    TimedOut,
}

impl AnswerRecord {
    /// True for a chosen answer or a timeout; such a question is locked.
    #[must_use]
    pub fn is_recorded(self) -> bool {
        !matches!(self, AnswerRecord::Unanswered)
    }

    #[must_use]
    pub fn choice_index(self) -> Option<usize> {
        match self {
            AnswerRecord::Chosen(index) => Some(index),
            AnswerRecord::Unanswered | AnswerRecord::TimedOut => None,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
