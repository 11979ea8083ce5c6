use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{AnswerRecord, Choice, Question};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("answer log has {answers} entries for {questions} questions")]
    LengthMismatch { questions: usize, answers: usize },

    #[error("answer at position {position} points at choice {choice}, but the question has {len} choices")]
    ChoiceOutOfRange {
        position: usize,
        choice: usize,
        len: usize,
    },

    #[error("too many questions for a single session: {len}")]
    TooManyQuestions { len: usize },
}

/// Aggregate score for a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total: u32,
    correct: u32,
    incorrect: u32,
    timed_out: u32,
    unanswered: u32,
}

impl SessionSummary {
    /// Score an answer log against the questions it was recorded for.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    /// Returns `SessionSummaryError::LengthMismatch` if the log does not cover every question.
    /// Returns `SessionSummaryError::ChoiceOutOfRange` if an answer names a missing choice.
    pub fn from_answers(
        questions: &[Question],
        answers: &[AnswerRecord],
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        if questions.len() != answers.len() {
            return Err(SessionSummaryError::LengthMismatch {
                questions: questions.len(),
                answers: answers.len(),
            });
        }

        let mut correct = 0_u32;
        let mut incorrect = 0_u32;
        let mut timed_out = 0_u32;
        let mut unanswered = 0_u32;

        for (position, (question, answer)) in questions.iter().zip(answers).enumerate() {
            match *answer {
                AnswerRecord::Chosen(choice) => {
                    let Some(picked) = question.choice(choice) else {
                        return Err(SessionSummaryError::ChoiceOutOfRange {
                            position,
                            choice,
                            len: question.choices.len(),
                        });
                    };
                    if picked.is_correct {
                        correct = correct.saturating_add(1);
                    } else {
                        incorrect = incorrect.saturating_add(1);
                    }
                }
                AnswerRecord::TimedOut => timed_out = timed_out.saturating_add(1),
                AnswerRecord::Unanswered => unanswered = unanswered.saturating_add(1),
            }
        }

        let total = u32::try_from(questions.len())
            .map_err(|_| SessionSummaryError::TooManyQuestions {
                len: questions.len(),
            })?;

        Ok(Self {
            started_at,
            completed_at,
            total,
            correct,
            incorrect,
            timed_out,
            unanswered,
        })
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn timed_out(&self) -> u32 {
        self.timed_out
    }

    #[must_use]
    pub fn unanswered(&self) -> u32 {
        self.unanswered
    }

    /// Share of correct answers in whole percent, rounded half up.
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let correct = u64::from(self.correct);
        let total = u64::from(self.total);
        // floor(100 * c / t + 1/2) without floats
        let pct = (200 * correct + total) / (2 * total);
        u32::try_from(pct).unwrap_or(100)
    }
}

/// Per-question line of a result report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerReview<'a> {
    pub position: usize,
    pub question: &'a Question,
    pub answer: AnswerRecord,
    pub chosen: Option<&'a Choice>,
    pub correct: Option<&'a Choice>,
}

impl AnswerReview<'_> {
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.chosen.is_some_and(|c| c.is_correct)
    }
}

/// Pair each question with its recorded answer for a detailed report.
///
/// Positions without an entry in `answers` are reported as unanswered.
#[must_use]
pub fn review_answers<'a>(questions: &'a [Question], answers: &[AnswerRecord]) -> Vec<AnswerReview<'a>> {
    questions
        .iter()
        .enumerate()
        .map(|(position, question)| {
            let answer = answers.get(position).copied().unwrap_or_default();
            AnswerReview {
                position,
                question,
                answer,
                chosen: answer.choice_index().and_then(|i| question.choice(i)),
                correct: question.first_correct_choice(),
            }
        })
        .collect()
}
