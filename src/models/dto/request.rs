use std::collections::HashMap;

use async_graphql::InputObject;
use serde::Deserialize;
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{AnswerMap, Difficulty},
    services::quiz_service::TopicQuizInput,
};

#[derive(Debug, Clone, Deserialize, Validate, InputObject)]
pub struct GenerateTopicQuizRequest {
    #[validate(length(min = 1, max = 500))]
    pub topic: String,

    // Upper bound comes from configuration and is enforced by the service.
    #[validate(range(min = 1))]
    pub question_count: i32,

    #[serde(default)]
    #[graphql(default)]
    pub difficulty: Difficulty,

    /// Regenerate into this session instead of opening a new one.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl GenerateTopicQuizRequest {
    pub fn into_input(self) -> AppResult<TopicQuizInput> {
        let question_count = u16::try_from(self.question_count).map_err(|_| {
            AppError::ValidationError(format!(
                "Question count {} is out of range",
                self.question_count
            ))
        })?;

        Ok(TopicQuizInput {
            topic: self.topic,
            question_count,
            difficulty: self.difficulty,
            session_id: self.session_id,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DocumentUploadQuery {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordAnswerRequest {
    /// `null` clears the selection.
    pub answer: Option<String>,
}

/// Final answers keyed by stringified question index. Any answer given here
/// overrides the one recorded on the session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitQuizRequest {
    #[serde(default)]
    pub answers: Option<HashMap<String, String>>,
}

impl SubmitQuizRequest {
    pub fn into_answer_map(self) -> AppResult<Option<AnswerMap>> {
        self.answers
            .map(|answers| {
                answers
                    .into_iter()
                    .map(|(key, answer)| Ok((parse_index(&key)?, answer)))
                    .collect::<AppResult<AnswerMap>>()
            })
            .transpose()
    }
}

#[derive(Debug, Clone, InputObject)]
pub struct AnswerInput {
    pub index: i32,
    pub answer: String,
}

pub fn answers_from_inputs(inputs: Vec<AnswerInput>) -> AppResult<AnswerMap> {
    inputs
        .into_iter()
        .map(|input| {
            let index = usize::try_from(input.index).map_err(|_| {
                AppError::ValidationError(format!("Invalid question index {}", input.index))
            })?;
            Ok((index, input.answer))
        })
        .collect()
}

fn parse_index(key: &str) -> AppResult<usize> {
    key.trim()
        .parse()
        .map_err(|_| AppError::ValidationError(format!("Invalid question index '{}'", key)))
}
