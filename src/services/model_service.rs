use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    constants::quiz_prompt::{CHUNK_QUIZ_PROMPT, OUTPUT_CONTRACT, TOPIC_QUIZ_PROMPT},
    models::domain::{Difficulty, QuizQuestion},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("Rate limited by model backend: {0}")]
    RateLimited(String),

    #[error("Model request timed out")]
    Timeout,

    #[error("Model transport error: {0}")]
    Transport(String),

    #[error("Model backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Could not decode model response: {0}")]
    Decode(String),
}

impl ModelError {
    /// Quota exhaustion and HTTP 429 are worth one retry after a backoff.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            ModelError::RateLimited(_) => true,
            ModelError::Api { status, message } => {
                *status == 429 || mentions_quota(message)
            }
            _ => false,
        }
    }
}

fn mentions_quota(message: &str) -> bool {
    let lowered = message.to_lowercase();
    lowered.contains("resource_exhausted") || lowered.contains("quota")
}

/// The generative text backend: one prompt in, unconstrained text out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicParams {
    pub topic: String,
    pub question_count: u16,
    pub difficulty: Difficulty,
}

/// Builds the fixed instructions and performs exactly one backend call per
/// invocation. Retry policy belongs to the caller.
pub struct ModelService {
    model: Arc<dyn GenerativeModel>,
    language: String,
}

impl ModelService {
    pub fn new(model: Arc<dyn GenerativeModel>, language: impl Into<String>) -> Self {
        Self {
            model,
            language: language.into(),
        }
    }

    pub async fn generate_for_topic(&self, params: &TopicParams) -> Result<String, ModelError> {
        let prompt = build_topic_prompt(params, &self.language);
        log::debug!(
            "Requesting {} {} questions about '{}'",
            params.question_count,
            params.difficulty.prompt_label(),
            params.topic
        );
        self.model.generate(&prompt).await
    }

    pub async fn generate_for_chunk(&self, chunk: &str) -> Result<String, ModelError> {
        let prompt = build_chunk_prompt(chunk, &self.language);
        log::debug!("Requesting questions for a {} character chunk", chunk.chars().count());
        self.model.generate(&prompt).await
    }
}

/// Describes the expected JSON array, including the record schema.
pub fn output_contract() -> String {
    let schema = schemars::schema_for!(QuizQuestion);
    let schema_json =
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());
    OUTPUT_CONTRACT.replace("{schema}", &schema_json)
}

pub fn build_topic_prompt(params: &TopicParams, language: &str) -> String {
    TOPIC_QUIZ_PROMPT
        .replace("{count}", &params.question_count.to_string())
        .replace("{difficulty}", params.difficulty.prompt_label())
        .replace("{language}", language)
        .replace("{contract}", &output_contract())
        .replace("{topic}", params.topic.trim())
}

// The chunk is substituted last so text inside it is never treated as a placeholder.
pub fn build_chunk_prompt(chunk: &str, language: &str) -> String {
    CHUNK_QUIZ_PROMPT
        .replace("{language}", language)
        .replace("{contract}", &output_contract())
        .replace("{chunk}", chunk)
}
