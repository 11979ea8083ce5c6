//! Turns untyped JSON into validated [`Question`]s.
//!
//! Validation never stops at the first problem: every issue in the batch is
//! collected so the user can fix them in one pass. Two repairs are applied
//! while scanning (missing ids are generated, missing `is_correct` flags become
//! `false`); they land in [`Validation::normalized`] even when the batch as a
//! whole is rejected.

use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::model::{Choice, Question, QuestionId};

//
// ─── ISSUES ────────────────────────────────────────────────────────────────────
//

/// Coarse classification of a [`ValidationIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// The input is not a non-empty array.
    Structural,
    /// An element of the array is not an object.
    Item,
    /// A present field has the wrong type, or a required one is missing.
    Field,
    /// No choice of a question is marked correct.
    Correctness,
}

/// One problem found in the input. `Display` gives the user-facing message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationIssue {
    #[error("input must be a top-level JSON array of questions")]
    NotAnArray,

    #[error("no questions found: the array is empty")]
    Empty,

    #[error("item at index {index} is not an object")]
    NotAnObject { index: usize },

    #[error("question at index {index}: 'id' must be a string when provided")]
    InvalidId { index: usize },

    #[error("question at index {index}: 'id' \"{id}\" is already used by the question at index {first}")]
    DuplicateId {
        index: usize,
        first: usize,
        id: String,
    },

    #[error("question at index {index} must have a string 'question'")]
    MissingQuestionText { index: usize },

    #[error("question at index {index}: '{field}' must be a string when provided")]
    InvalidQuestionField { index: usize, field: &'static str },

    #[error("question at index {index} must have a 'choices' array")]
    MissingChoices { index: usize },

    #[error("choice {choice} in question {index} is not an object")]
    ChoiceNotAnObject { index: usize, choice: usize },

    #[error("choice {choice} in question {index} must have a string 'text'")]
    MissingChoiceText { index: usize, choice: usize },

    #[error("choice {choice} in question {index}: 'explanation' must be a string when provided")]
    InvalidChoiceExplanation { index: usize, choice: usize },

    #[error("choice {choice} in question {index}: 'is_correct' must be a boolean")]
    InvalidIsCorrect { index: usize, choice: usize },

    #[error("question at index {index} must have at least one choice where 'is_correct' is true")]
    NoCorrectChoice { index: usize },
}

impl ValidationIssue {
    #[must_use]
    pub fn kind(&self) -> IssueKind {
        match self {
            Self::NotAnArray | Self::Empty => IssueKind::Structural,
            Self::NotAnObject { .. } => IssueKind::Item,
            Self::NoCorrectChoice { .. } => IssueKind::Correctness,
            Self::InvalidId { .. }
            | Self::DuplicateId { .. }
            | Self::MissingQuestionText { .. }
            | Self::InvalidQuestionField { .. }
            | Self::MissingChoices { .. }
            | Self::ChoiceNotAnObject { .. }
            | Self::MissingChoiceText { .. }
            | Self::InvalidChoiceExplanation { .. }
            | Self::InvalidIsCorrect { .. } => IssueKind::Field,
        }
    }

    /// Position of the offending question in the input array.
    #[must_use]
    pub fn question_index(&self) -> Option<usize> {
        match self {
            Self::NotAnArray | Self::Empty => None,
            Self::NotAnObject { index }
            | Self::InvalidId { index }
            | Self::DuplicateId { index, .. }
            | Self::MissingQuestionText { index }
            | Self::InvalidQuestionField { index, .. }
            | Self::MissingChoices { index }
            | Self::ChoiceNotAnObject { index, .. }
            | Self::MissingChoiceText { index, .. }
            | Self::InvalidChoiceExplanation { index, .. }
            | Self::InvalidIsCorrect { index, .. }
            | Self::NoCorrectChoice { index } => Some(*index),
        }
    }

    /// Position of the offending choice inside its question, if the issue is choice-level.
    #[must_use]
    pub fn choice_index(&self) -> Option<usize> {
        match self {
            Self::ChoiceNotAnObject { choice, .. }
            | Self::MissingChoiceText { choice, .. }
            | Self::InvalidChoiceExplanation { choice, .. }
            | Self::InvalidIsCorrect { choice, .. } => Some(*choice),
            _ => None,
        }
    }

    /// Name of the JSON field the issue is about, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidId { .. } | Self::DuplicateId { .. } => Some("id"),
            Self::MissingQuestionText { .. } => Some("question"),
            Self::InvalidQuestionField { field, .. } => Some(*field),
            Self::MissingChoices { .. } => Some("choices"),
            Self::MissingChoiceText { .. } => Some("text"),
            Self::InvalidChoiceExplanation { .. } => Some("explanation"),
            Self::InvalidIsCorrect { .. } | Self::NoCorrectChoice { .. } => Some("is_correct"),
            Self::NotAnArray | Self::Empty | Self::NotAnObject { .. } | Self::ChoiceNotAnObject { .. } => {
                None
            }
        }
    }
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// Outcome of validating a batch.
///
/// The batch is all-or-nothing: `questions()` is empty unless `issues()` is.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    normalized: Value,
    issues: Vec<ValidationIssue>,
    questions: Vec<Question>,
}

impl Validation {
    fn rejected(normalized: Value, issue: ValidationIssue) -> Self {
        Self {
            normalized,
            issues: vec![issue],
            questions: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Copy of the input with ids generated and `is_correct` defaulted.
    #[must_use]
    pub fn normalized(&self) -> &Value {
        &self.normalized
    }

    /// The normalized copy as indented JSON, ready to hand back to the user.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn normalized_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.normalized)
    }

    /// # Errors
    ///
    /// Returns every collected issue when the batch is rejected.
    pub fn into_result(self) -> Result<Vec<Question>, Vec<ValidationIssue>> {
        if self.issues.is_empty() {
            Ok(self.questions)
        } else {
            Err(self.issues)
        }
    }
}

//
// ─── ENTRY POINTS ──────────────────────────────────────────────────────────────
//

/// Parse JSON text, then validate it.
///
/// # Errors
///
/// Returns `serde_json::Error` if `text` is not well-formed JSON.
pub fn parse_and_validate(text: &str) -> Result<Validation, serde_json::Error> {
    let raw: Value = serde_json::from_str(text)?;
    Ok(validate_questions(&raw))
}

/// Validate `raw`, generating random ids where they are missing.
#[must_use]
pub fn validate_questions(raw: &Value) -> Validation {
    validate_questions_with(raw, QuestionId::generate)
}

/// Validate `raw`, using `generate_id` for every missing id.
pub fn validate_questions_with<F>(raw: &Value, mut generate_id: F) -> Validation
where
    F: FnMut() -> QuestionId,
{
    let items = match raw {
        Value::Array(items) if items.is_empty() => {
            return Validation::rejected(raw.clone(), ValidationIssue::Empty);
        }
        Value::Array(items) => items,
        _ => return Validation::rejected(raw.clone(), ValidationIssue::NotAnArray),
    };

    let mut issues = Vec::new();
    let mut questions = Vec::with_capacity(items.len());
    let mut normalized = Vec::with_capacity(items.len());
    let mut first_seen: HashMap<String, usize> = HashMap::new();

    for (index, item) in items.iter().enumerate() {
        let mut item = item.clone();
        if let Some(question) = check_question(
            index,
            &mut item,
            &mut generate_id,
            &mut first_seen,
            &mut issues,
        ) {
            questions.push(question);
        }
        normalized.push(item);
    }

    if !issues.is_empty() {
        questions.clear();
    }

    Validation {
        normalized: Value::Array(normalized),
        issues,
        questions,
    }
}

//
// ─── FIELD CHECKS ──────────────────────────────────────────────────────────────
//

struct WrongType;

fn optional_string(fields: &Map<String, Value>, key: &str) -> Result<Option<String>, WrongType> {
    match fields.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(WrongType),
    }
}

fn required_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn id_is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn check_question<F>(
    index: usize,
    item: &mut Value,
    generate_id: &mut F,
    first_seen: &mut HashMap<String, usize>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Question>
where
    F: FnMut() -> QuestionId,
{
    let Some(fields) = item.as_object_mut() else {
        issues.push(ValidationIssue::NotAnObject { index });
        return None;
    };
    let before = issues.len();

    if id_is_missing(fields.get("id")) {
        fields.insert("id".to_owned(), Value::String(generate_id().into_inner()));
    }
    let id = match fields.get("id") {
        Some(Value::String(s)) => {
            if let Some(&first) = first_seen.get(s) {
                issues.push(ValidationIssue::DuplicateId {
                    index,
                    first,
                    id: s.clone(),
                });
            } else {
                first_seen.insert(s.clone(), index);
            }
            Some(QuestionId::new(s.as_str()))
        }
        _ => {
            issues.push(ValidationIssue::InvalidId { index });
            None
        }
    };

    let text = required_string(fields, "question");
    if text.is_none() {
        issues.push(ValidationIssue::MissingQuestionText { index });
    }

    let background_knowledge = optional_string(fields, "background_knowledge").map_err(|_| {
        issues.push(ValidationIssue::InvalidQuestionField {
            index,
            field: "background_knowledge",
        });
    });
    let explanation = optional_string(fields, "explanation").map_err(|_| {
        issues.push(ValidationIssue::InvalidQuestionField {
            index,
            field: "explanation",
        });
    });

    let choices = match fields.get_mut("choices") {
        Some(Value::Array(raw_choices)) => {
            let mut choices = Vec::with_capacity(raw_choices.len());
            let mut has_correct = false;
            for (choice, raw_choice) in raw_choices.iter_mut().enumerate() {
                if let Some(parsed) = check_choice(index, choice, raw_choice, issues) {
                    choices.push(parsed);
                }
                has_correct |= raw_choice.get("is_correct") == Some(&Value::Bool(true));
            }
            if !has_correct {
                issues.push(ValidationIssue::NoCorrectChoice { index });
            }
            Some(choices)
        }
        _ => {
            issues.push(ValidationIssue::MissingChoices { index });
            None
        }
    };

    if issues.len() > before {
        return None;
    }

    Some(Question {
        id: id?,
        question: text?,
        background_knowledge: background_knowledge.ok()?,
        explanation: explanation.ok()?,
        choices: choices?,
    })
}

fn check_choice(
    index: usize,
    choice: usize,
    raw: &mut Value,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Choice> {
    let Some(fields) = raw.as_object_mut() else {
        issues.push(ValidationIssue::ChoiceNotAnObject { index, choice });
        return None;
    };

    let text = required_string(fields, "text");
    if text.is_none() {
        issues.push(ValidationIssue::MissingChoiceText { index, choice });
    }

    let explanation = optional_string(fields, "explanation").map_err(|_| {
        issues.push(ValidationIssue::InvalidChoiceExplanation { index, choice });
    });

    if !fields.contains_key("is_correct") {
        fields.insert("is_correct".to_owned(), Value::Bool(false));
    }
    let is_correct = match fields.get("is_correct") {
        Some(Value::Bool(flag)) => Some(*flag),
        _ => {
            issues.push(ValidationIssue::InvalidIsCorrect { index, choice });
            None
        }
    };

    Some(Choice {
        text: text?,
        is_correct: is_correct?,
        explanation: explanation.ok()?,
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counter_ids() -> impl FnMut() -> QuestionId {
        let mut next = 0;
        move || {
            next += 1;
            QuestionId::new(format!("gen-{next}"))
        }
    }

    fn valid_item(id: &str) -> Value {
        json!({
            "id": id,
            "question": "What is a firewall?",
            "background_knowledge": "Networks need filtering.",
            "explanation": "It filters traffic.",
            "choices": [
                { "text": "A barrier", "is_correct": true, "explanation": "Right." },
                { "text": "A toaster", "is_correct": false }
            ]
        })
    }

    #[test]
    fn valid_batch_produces_questions() {
        let raw = json!([valid_item("q1"), valid_item("q2")]);
        let validation = validate_questions(&raw);

        assert!(validation.is_valid());
        let questions = validation.into_result().unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].id, QuestionId::new("q1"));
        assert_eq!(questions[0].background_knowledge.as_deref(), Some("Networks need filtering."));
        assert_eq!(questions[0].choices[0].explanation.as_deref(), Some("Right."));
        assert!(questions[0].choices[0].is_correct);
    }

    #[test]
    fn non_array_and_empty_are_structural() {
        let validation = validate_questions(&json!({ "question": "x" }));
        assert_eq!(validation.issues(), &[ValidationIssue::NotAnArray]);
        assert_eq!(validation.issues()[0].kind(), IssueKind::Structural);

        let validation = validate_questions(&json!([]));
        assert_eq!(validation.issues(), &[ValidationIssue::Empty]);
        assert!(validation.questions().is_empty());
    }

    #[test]
    fn non_object_item_is_reported_and_batch_fails() {
        let raw = json!([valid_item("q1"), 42, null]);
        let validation = validate_questions(&raw);

        assert!(!validation.is_valid());
        assert!(validation.questions().is_empty());
        assert_eq!(
            validation.issues(),
            &[
                ValidationIssue::NotAnObject { index: 1 },
                ValidationIssue::NotAnObject { index: 2 },
            ]
        );
        assert_eq!(validation.issues()[0].kind(), IssueKind::Item);
    }

    #[test]
    fn missing_required_fields_name_field_and_location() {
        let raw = json!([
            valid_item("ok"),
            { "id": "q2", "choices": [{ "text": "a", "is_correct": true }] },
            { "id": "q3", "question": "?" }
        ]);
        let validation = validate_questions(&raw);
        let issues = validation.issues();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0], ValidationIssue::MissingQuestionText { index: 1 });
        assert_eq!(issues[0].field(), Some("question"));
        assert_eq!(issues[0].question_index(), Some(1));
        assert!(issues[0].to_string().contains("index 1"));
        assert!(issues[0].to_string().contains("'question'"));

        assert_eq!(issues[1], ValidationIssue::MissingChoices { index: 2 });
        assert!(issues[1].to_string().contains("'choices'"));
    }

    #[test]
    fn wrong_typed_optional_fields_are_errors() {
        let raw = json!([{
            "id": "q1",
            "question": "?",
            "background_knowledge": 5,
            "explanation": ["no"],
            "choices": [{ "text": "a", "is_correct": true, "explanation": false }]
        }]);
        let validation = validate_questions(&raw);

        assert_eq!(
            validation.issues(),
            &[
                ValidationIssue::InvalidQuestionField { index: 0, field: "background_knowledge" },
                ValidationIssue::InvalidQuestionField { index: 0, field: "explanation" },
                ValidationIssue::InvalidChoiceExplanation { index: 0, choice: 0 },
            ]
        );
        assert_eq!(validation.issues()[2].choice_index(), Some(0));
        assert!(validation.issues()[2].to_string().contains("choice 0 in question 0"));
    }

    #[test]
    fn non_string_id_is_an_error_not_repaired() {
        let mut raw = valid_item("x");
        raw["id"] = json!(17);
        let validation = validate_questions(&json!([raw]));

        assert_eq!(validation.issues(), &[ValidationIssue::InvalidId { index: 0 }]);
        assert_eq!(validation.normalized()[0]["id"], json!(17));
    }

    #[test]
    fn missing_id_is_generated_and_visible_even_when_batch_fails() {
        let raw = json!([
            { "question": "?", "choices": [{ "text": "a" }] }
        ]);
        let validation = validate_questions_with(&raw, counter_ids());

        assert!(!validation.is_valid());
        assert_eq!(validation.issues(), &[ValidationIssue::NoCorrectChoice { index: 0 }]);
        assert_eq!(validation.normalized()[0]["id"], json!("gen-1"));
        assert_eq!(validation.normalized()[0]["choices"][0]["is_correct"], json!(false));
        // caller's value is untouched
        assert!(raw[0].get("id").is_none());
    }

    #[test]
    fn null_and_empty_ids_are_generated() {
        let mut a = valid_item("");
        let mut b = valid_item("");
        a["id"] = Value::Null;
        b["id"] = json!("");
        let validation = validate_questions_with(&json!([a, b]), counter_ids());

        let questions = validation.into_result().unwrap();
        assert_eq!(questions[0].id, QuestionId::new("gen-1"));
        assert_eq!(questions[1].id, QuestionId::new("gen-2"));
    }

    #[test]
    fn is_correct_absent_defaults_false_present_wrong_type_errors() {
        let raw = json!([{
            "id": "q1",
            "question": "?",
            "choices": [
                { "text": "a" },
                { "text": "b", "is_correct": "true" },
                { "text": "c", "is_correct": true }
            ]
        }]);
        let validation = validate_questions(&raw);

        assert_eq!(
            validation.issues(),
            &[ValidationIssue::InvalidIsCorrect { index: 0, choice: 1 }]
        );
        assert_eq!(validation.normalized()[0]["choices"][0]["is_correct"], json!(false));
    }

    #[test]
    fn zero_and_false_ids_are_errors_not_regenerated() {
        let mut a = valid_item("");
        let mut b = valid_item("");
        a["id"] = json!(0);
        b["id"] = json!(false);
        let validation = validate_questions_with(&json!([a, b]), counter_ids());

        assert_eq!(
            validation.issues(),
            &[
                ValidationIssue::InvalidId { index: 0 },
                ValidationIssue::InvalidId { index: 1 }
            ]
        );
        assert_eq!(validation.normalized()[0]["id"], json!(0));
        assert_eq!(validation.normalized()[1]["id"], json!(false));
    }

    #[test]
    fn numeric_is_correct_does_not_count_as_correct() {
        let raw = json!([{
            "id": "q1",
            "question": "?",
            "choices": [{ "text": "a", "is_correct": 1 }, { "text": "b" }]
        }]);
        let validation = validate_questions(&raw);

        assert_eq!(
            validation.issues(),
            &[
                ValidationIssue::InvalidIsCorrect { index: 0, choice: 0 },
                ValidationIssue::NoCorrectChoice { index: 0 }
            ]
        );
    }

    #[test]
    fn bad_choice_is_skipped_but_others_checked() {
        let raw = json!([{
            "id": "q1",
            "question": "?",
            "choices": ["plain string", { "is_correct": true }]
        }]);
        let validation = validate_questions(&raw);

        assert_eq!(
            validation.issues(),
            &[
                ValidationIssue::ChoiceNotAnObject { index: 0, choice: 0 },
                ValidationIssue::MissingChoiceText { index: 0, choice: 1 },
            ]
        );
    }

    #[test]
    fn all_false_choices_fail_single_true_passes() {
        let all_false = json!([{
            "id": "q1",
            "question": "?",
            "choices": [{ "text": "a", "is_correct": false }, { "text": "b" }]
        }]);
        let validation = validate_questions(&all_false);
        assert_eq!(validation.issues(), &[ValidationIssue::NoCorrectChoice { index: 0 }]);
        assert_eq!(validation.issues()[0].kind(), IssueKind::Correctness);
        assert_eq!(validation.issues()[0].choice_index(), None);

        let one_true = json!([{
            "id": "q1",
            "question": "?",
            "choices": [{ "text": "a", "is_correct": false }, { "text": "b", "is_correct": true }]
        }]);
        assert!(validate_questions(&one_true).is_valid());
    }

    #[test]
    fn empty_choices_fail_on_correctness() {
        let raw = json!([{ "id": "q1", "question": "?", "choices": [] }]);
        let validation = validate_questions(&raw);
        assert_eq!(validation.issues(), &[ValidationIssue::NoCorrectChoice { index: 0 }]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = json!([valid_item("same"), valid_item("other"), valid_item("same")]);
        let validation = validate_questions(&raw);

        assert_eq!(
            validation.issues(),
            &[ValidationIssue::DuplicateId {
                index: 2,
                first: 0,
                id: "same".into()
            }]
        );
    }

    #[test]
    fn one_bad_item_empties_the_whole_batch() {
        let mut bad = valid_item("q2");
        bad["question"] = json!(null);
        let validation = validate_questions(&json!([valid_item("q1"), bad]));

        assert!(validation.questions().is_empty());
        assert_eq!(validation.into_result().unwrap_err().len(), 1);
    }

    #[test]
    fn parse_and_validate_reports_syntax_errors() {
        assert!(parse_and_validate("[{").is_err());
        let validation = parse_and_validate(r#"[{"question":"?","choices":[{"text":"a","is_correct":true}]}]"#)
            .unwrap();
        assert!(validation.is_valid());
        assert!(validation.normalized_pretty().unwrap().contains("\"id\""));
    }
}
