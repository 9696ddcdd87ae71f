use serde::Serialize;
use serde_json::Value;

use crate::{constants::quiz_prompt::EXPLANATION_PLACEHOLDER, models::domain::QuizQuestion};

/// Counts collected while filtering one batch of candidate records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub kept: usize,
    pub dropped: usize,
    /// Kept records whose correct answer is not one of their options.
    pub answer_not_in_options: usize,
}

impl ValidationReport {
    pub fn merge(&mut self, other: ValidationReport) {
        self.kept += other.kept;
        self.dropped += other.dropped;
        self.answer_not_in_options += other.answer_not_in_options;
    }
}

/// Filters raw candidate records down to well-formed questions, preserving
/// order. A record needs `question`, `options` and `correct_answer` present
/// and non-null; a missing or blank `explanation` gets the placeholder.
pub fn validate_records(records: Vec<Value>) -> (Vec<QuizQuestion>, ValidationReport) {
    let mut report = ValidationReport::default();
    let mut questions = Vec::with_capacity(records.len());

    for (position, record) in records.iter().enumerate() {
        match record_to_question(record).and_then(normalize_question) {
            Some(question) => {
                if !question.correct_answer_in_options() {
                    report.answer_not_in_options += 1;
                }
                report.kept += 1;
                questions.push(question);
            }
            None => {
                log::debug!("Dropping malformed record at position {}", position);
                report.dropped += 1;
            }
        }
    }

    (questions, report)
}

/// Same rules as [`validate_records`] for records that are already typed.
pub fn revalidate_questions(questions: Vec<QuizQuestion>) -> (Vec<QuizQuestion>, ValidationReport) {
    let mut report = ValidationReport::default();
    let mut kept = Vec::with_capacity(questions.len());

    for question in questions {
        match normalize_question(question) {
            Some(question) => {
                if !question.correct_answer_in_options() {
                    report.answer_not_in_options += 1;
                }
                report.kept += 1;
                kept.push(question);
            }
            None => report.dropped += 1,
        }
    }

    (kept, report)
}

fn record_to_question(record: &Value) -> Option<QuizQuestion> {
    let object = record.as_object()?;

    let question = scalar_text(object.get("question")?)?;
    let options = object
        .get("options")?
        .as_array()?
        .iter()
        .filter_map(scalar_text)
        .collect();
    let correct_answer = scalar_text(object.get("correct_answer")?)?;
    let explanation = object
        .get("explanation")
        .and_then(scalar_text)
        .unwrap_or_default();

    Some(QuizQuestion::new(question, options, correct_answer, explanation))
}

fn normalize_question(mut question: QuizQuestion) -> Option<QuizQuestion> {
    if question.question.trim().is_empty() || question.correct_answer.trim().is_empty() {
        return None;
    }

    let mut options: Vec<String> = Vec::with_capacity(question.options.len());
    for option in question.options.drain(..) {
        if !option.trim().is_empty() && !options.contains(&option) {
            options.push(option);
        }
    }
    if options.len() < 2 {
        return None;
    }
    question.options = options;

    if question.explanation.trim().is_empty() {
        question.explanation = EXPLANATION_PLACEHOLDER.to_string();
    }

    Some(question)
}

// Numbers and booleans are rendered as text; null, arrays and objects are not scalars.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
