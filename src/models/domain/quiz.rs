use async_graphql::Enum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::quiz_question::QuizQuestion;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    /// Wording used inside the generation prompt.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::VeryHard => "very hard",
        }
    }
}

/// Where the questions of a quiz came from.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuizSource {
    Topic { topic: String, difficulty: Difficulty },
    Document { file_name: String, chunk_count: usize },
}

impl QuizSource {
    pub fn describe(&self) -> String {
        match self {
            QuizSource::Topic { topic, difficulty } => {
                format!("topic \"{}\" ({})", topic, difficulty.prompt_label())
            }
            QuizSource::Document {
                file_name,
                chunk_count,
            } => format!("document \"{}\" ({} chunks)", file_name, chunk_count),
        }
    }
}

/// An assembled quiz. Read-only once built: there are no mutating methods and
/// it is shared between sessions and jobs behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    id: String,
    source: QuizSource,
    questions: Vec<QuizQuestion>,
    created_at: DateTime<Utc>,
}

impl Quiz {
    pub fn new(source: QuizSource, questions: Vec<QuizQuestion>) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            source,
            questions,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> &QuizSource {
        &self.source
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    pub fn question(&self, index: usize) -> Option<&QuizQuestion> {
        self.questions.get(index)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
