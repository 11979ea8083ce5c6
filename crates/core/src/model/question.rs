use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

//
// ─── CHOICE ────────────────────────────────────────────────────────────────────
//

/// One answer option of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Choice {
    #[must_use]
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
            explanation: None,
        }
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question.
///
/// Values of this type are produced by [`crate::validation`]; the field names
/// match the JSON input format one to one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_knowledge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub choices: Vec<Choice>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn choice(&self, index: usize) -> Option<&Choice> {
        self.choices.get(index)
    }

    /// Returns true when `index` points at a choice marked correct.
    #[must_use]
    pub fn is_correct_choice(&self, index: usize) -> bool {
        self.choice(index).is_some_and(|c| c.is_correct)
    }

    /// First choice marked correct, if any.
    #[must_use]
    pub fn first_correct_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.is_correct)
    }

    pub fn correct_choice_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.choices
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_correct)
            .map(|(i, _)| i)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
