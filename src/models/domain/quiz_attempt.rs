use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::Quiz;

/// Selected option text per question index. Absent means unanswered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<usize, String>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(&index).map(String::as_str)
    }

    /// `None` clears a previous selection.
    pub fn set(&mut self, index: usize, answer: Option<String>) {
        match answer {
            Some(answer) => {
                self.0.insert(index, answer);
            }
            None => {
                self.0.remove(&index);
            }
        }
    }

    pub fn answered_count(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(i, a)| (*i, a.as_str()))
    }

    /// JSON object with one stringified key per question index and `null`
    /// for unanswered questions.
    pub fn to_serialized(&self, total_questions: usize) -> Result<String, serde_json::Error> {
        let rows: BTreeMap<String, Option<&str>> = (0..total_questions)
            .map(|i| (i.to_string(), self.get(i)))
            .collect();
        serde_json::to_string(&rows)
    }

    /// Keys that are not indices and `null` values are skipped.
    pub fn from_serialized(raw: &str) -> Result<Self, serde_json::Error> {
        let rows: BTreeMap<String, Option<String>> = serde_json::from_str(raw)?;
        let answers = rows
            .into_iter()
            .filter_map(|(key, value)| Some((key.trim().parse::<usize>().ok()?, value?)))
            .collect();
        Ok(AnswerMap(answers))
    }
}

impl FromIterator<(usize, String)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (usize, String)>>(iter: T) -> Self {
        AnswerMap(iter.into_iter().collect())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassFail {
    Pass,
    Fail,
}

impl PassFail {
    /// Pass when at least half of the questions are correct.
    pub fn from_score(score: usize, total: usize) -> Self {
        if score * 2 >= total {
            PassFail::Pass
        } else {
            PassFail::Fail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PassFail::Pass => "pass",
            PassFail::Fail => "fail",
        }
    }
}

impl std::fmt::Display for PassFail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GradeSummary {
    pub score: usize,
    pub total: usize,
    pub correctness: Vec<bool>,
    pub score_display: String,
    pub pass_fail: PassFail,
    pub score_out_of_ten: f64,
    pub perfect: bool,
}

impl GradeSummary {
    pub fn from_correctness(correctness: Vec<bool>) -> Self {
        let total = correctness.len();
        let score = correctness.iter().filter(|c| **c).count();
        let score_out_of_ten = if total == 0 {
            0.0
        } else {
            (score as f64 * 100.0 / total as f64).round() / 10.0
        };

        GradeSummary {
            score,
            total,
            correctness,
            score_display: format!("{}/{}", score, total),
            pass_fail: PassFail::from_score(score, total),
            score_out_of_ten,
            perfect: total > 0 && score == total,
        }
    }
}

/// One persisted submission. Rows are only ever appended.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizAttempt {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub score_display: String,
    pub pass_fail_label: PassFail,
    pub serialized_quiz: String,
    pub serialized_answers: String,
}

impl QuizAttempt {
    pub fn new(
        quiz: &Quiz,
        answers: &AnswerMap,
        grade: &GradeSummary,
    ) -> Result<Self, serde_json::Error> {
        Ok(QuizAttempt {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            score_display: grade.score_display.clone(),
            pass_fail_label: grade.pass_fail,
            serialized_quiz: serde_json::to_string(quiz)?,
            serialized_answers: answers.to_serialized(quiz.len())?,
        })
    }

    pub fn decode(&self) -> Result<(Quiz, AnswerMap), serde_json::Error> {
        let quiz: Quiz = serde_json::from_str(&self.serialized_quiz)?;
        let answers = AnswerMap::from_serialized(&self.serialized_answers)?;
        Ok((quiz, answers))
    }
}
