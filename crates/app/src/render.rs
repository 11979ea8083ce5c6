//! Plain-text rendering of questions, feedback and results for the terminal.

use std::fmt::Write;

use quiz_core::model::{AnswerRecord, AnswerReview, Question, SessionSummary};
use quiz_core::validation::ValidationIssue;
use services::{QuizSession, SessionProgress};

const CHOICE_LABELS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

fn label(index: usize) -> String {
    CHOICE_LABELS
        .get(index)
        .map_or_else(|| (index + 1).to_string(), char::to_string)
}

pub fn question(session: &QuizSession) -> String {
    let mut out = String::new();
    let Some(question) = session.current_question() else {
        return out;
    };
    let SessionProgress { index, total, .. } = session.progress();

    let _ = write!(out, "\nQuestion {} of {}", index + 1, total);
    if let Some(remaining) = session.time_remaining() {
        let _ = write!(out, "  [{remaining}s]");
    }
    out.push('\n');
    if let Some(background) = &question.background_knowledge {
        let _ = writeln!(out, "  ({background})");
    }
    let _ = writeln!(out, "{}", question.question);
    write_choices(&mut out, question);
    out.push_str("Answer with 1-9 or a-h, q to quit.\n");
    out
}

fn write_choices(out: &mut String, question: &Question) {
    for (i, choice) in question.choices.iter().enumerate() {
        let _ = writeln!(out, "  {}) {}", label(i), choice.text);
    }
}

pub fn feedback(review: &AnswerReview<'_>) -> String {
    let mut out = String::new();
    if review.is_correct() {
        out.push_str("Correct!\n");
    } else {
        out.push_str("Incorrect.\n");
    }
    if let Some(explanation) = review.chosen.and_then(|c| c.explanation.as_deref()) {
        let _ = writeln!(out, "  {explanation}");
    }
    if !review.is_correct() {
        for index in review.question.correct_choice_indices() {
            let choice = &review.question.choices[index];
            let _ = writeln!(out, "  Correct answer: {}) {}", label(index), choice.text);
            if let Some(explanation) = &choice.explanation {
                let _ = writeln!(out, "    {explanation}");
            }
        }
    }
    if let Some(explanation) = &review.question.explanation {
        let _ = writeln!(out, "  Explanation: {explanation}");
    }
    out.push_str("Press Enter for the next question.\n");
    out
}

pub fn summary(summary: &SessionSummary, reviews: &[AnswerReview<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nScore: {}/{} ({}%)",
        summary.correct(),
        summary.total(),
        summary.percentage()
    );
    if summary.timed_out() > 0 {
        let _ = writeln!(out, "Timed out: {}", summary.timed_out());
    }

    for review in reviews {
        let mark = if review.is_correct() { "+" } else { "-" };
        let _ = writeln!(out, "{mark} {}. {}", review.position + 1, review.question.question);
        let answer = match (review.answer, review.chosen) {
            (AnswerRecord::Chosen(i), Some(choice)) => format!("{}) {}", label(i), choice.text),
            (AnswerRecord::TimedOut, _) => "time ran out".to_owned(),
            _ => "no answer".to_owned(),
        };
        let _ = writeln!(out, "    Your answer: {answer}");
        if !review.is_correct() {
            if let Some(correct) = review.correct {
                let _ = writeln!(out, "    Correct answer: {}", correct.text);
            }
        }
        if let Some(explanation) = &review.question.explanation {
            let _ = writeln!(out, "    {explanation}");
        }
    }
    out
}

/// Template to hand to an assistant that turns notes into quiz input.
pub const SCHEMA_PROMPT: &str = r#"Please convert the following text/knowledge into a JSON array of quiz questions. The JSON must exactly match this structure:
[
  {
    "id": "unique-id-1",
    "question": "The question text?",
    "background_knowledge": "Helpful context to read before answering.",
    "explanation": "Why the correct answer is correct.",
    "choices": [
      {
        "text": "First choice",
        "is_correct": true,
        "explanation": "Explanation for this choice"
      },
      {
        "text": "Second choice",
        "is_correct": false,
        "explanation": "Explanation for this choice"
      }
    ]
  }
]

Here is the text to convert: "#;

/// Request asking an assistant to repair rejected input.
pub fn fix_request(input: &str, issues: &[ValidationIssue]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "I have the following JSON for a quiz app:");
    let _ = writeln!(out, "```json\n{}\n```\n", input.trim_end());
    let _ = writeln!(out, "But I am getting these validation errors:");
    for (i, issue) in issues.iter().enumerate() {
        let _ = writeln!(out, "{}. {issue}", i + 1);
    }
    out.push_str("\nCan you fix the JSON for me?\n");
    out
}

/// Plain-text export of a finished session.
pub fn results_report(summary: &SessionSummary, reviews: &[AnswerReview<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Quiz Results:\nScore: {} / {} ({}%)\n",
        summary.correct(),
        summary.total(),
        summary.percentage()
    );
    for review in reviews {
        let _ = writeln!(out, "Question {}: {}", review.position + 1, review.question.question);
        let status = if review.is_correct() { "Correct" } else { "Incorrect" };
        let _ = writeln!(out, "Status: {status}");
        let answer = match review.answer {
            AnswerRecord::TimedOut => "Timed out",
            _ => review.chosen.map_or("Skipped", |c| c.text.as_str()),
        };
        let _ = writeln!(out, "User Answer: {answer}");
        if !review.is_correct() {
            let correct = review.correct.map_or("Unknown", |c| c.text.as_str());
            let _ = writeln!(out, "Correct Answer: {correct}");
        }
        let explanation = review
            .question
            .explanation
            .as_deref()
            .unwrap_or("None provided");
        let _ = writeln!(out, "Explanation: {explanation}\n");
    }
    out.push_str("Please analyze these results and tell me what areas I need to study more.\n");
    out
}

pub fn issues(issues: &[ValidationIssue]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Found {} problem(s):", issues.len());
    for issue in issues {
        let _ = writeln!(out, "  - {issue}");
    }
    out
}
