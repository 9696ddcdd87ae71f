use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{AnswerMap, GradeSummary, Quiz};

/// One question as shown to the learner. Answers and explanations stay
/// hidden until the quiz has been graded.
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuestionView {
    pub index: i32,
    pub question: String,
    pub options: Vec<String>,
    pub selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuizView {
    pub id: String,
    pub source: String,
    pub question_count: i32,
    pub created_at: DateTime<Utc>,
    pub questions: Vec<QuestionView>,
}

impl QuizView {
    /// Passing a grade reveals the correct answers and per-question feedback.
    pub fn build(quiz: &Quiz, answers: &AnswerMap, grade: Option<&GradeSummary>) -> Self {
        let questions = quiz
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let revealed = grade.is_some();
                QuestionView {
                    index: index as i32,
                    question: question.question.clone(),
                    options: question.options.clone(),
                    selected: answers.get(index).map(str::to_string),
                    correct_answer: revealed.then(|| question.correct_answer.clone()),
                    explanation: revealed.then(|| question.explanation.clone()),
                    is_correct: grade.and_then(|g| g.correctness.get(index).copied()),
                }
            })
            .collect();

        QuizView {
            id: quiz.id().to_string(),
            source: quiz.source().describe(),
            question_count: quiz.len() as i32,
            created_at: quiz.created_at(),
            questions,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct GradeView {
    pub score: i32,
    pub total: i32,
    pub score_display: String,
    pub pass_fail: String,
    pub score_out_of_ten: f64,
    pub perfect: bool,
    pub correctness: Vec<bool>,
}

impl From<&GradeSummary> for GradeView {
    fn from(grade: &GradeSummary) -> Self {
        GradeView {
            score: grade.score as i32,
            total: grade.total as i32,
            score_display: grade.score_display.clone(),
            pass_fail: grade.pass_fail.to_string(),
            score_out_of_ten: grade.score_out_of_ten,
            perfect: grade.perfect,
            correctness: grade.correctness.clone(),
        }
    }
}
