use std::{env, time::Duration};

use secrecy::{ExposeSecret, SecretString};

use crate::{
    errors::{AppError, AppResult},
    services::chunk_orchestrator::OrchestratorSettings,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub results_collection: String,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub gemini_api_key: SecretString,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub model_temperature: f32,
    pub model_timeout_secs: u64,
    pub quiz_language: String,
    pub max_question_count: u16,
    pub chunk_size: usize,
    pub inter_request_delay_ms: u64,
    pub rate_limit_backoff_ms: u64,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "quizcraft-local".to_string()),
            results_collection: env::var("RESULTS_COLLECTION")
                .unwrap_or_else(|_| "quiz_results".to_string()),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "localhost".to_string()),
            web_server_port: parse_var("WEB_SERVER_PORT", 8080),
            gemini_api_key: SecretString::from(env::var("GEMINI_API_KEY").unwrap_or_default()),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            model_temperature: parse_var("MODEL_TEMPERATURE", 0.9),
            model_timeout_secs: parse_var("MODEL_TIMEOUT_SECS", 60),
            quiz_language: env::var("QUIZ_LANGUAGE").unwrap_or_else(|_| "Vietnamese".to_string()),
            max_question_count: parse_var("MAX_QUESTION_COUNT", 50),
            chunk_size: parse_var("CHUNK_SIZE", 4000),
            inter_request_delay_ms: parse_var("INTER_REQUEST_DELAY_MS", 4000),
            rate_limit_backoff_ms: parse_var("RATE_LIMIT_BACKOFF_MS", 30_000),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
        }
    }

    /// Reject configurations the generation pipeline cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.gemini_api_key.expose_secret().trim().is_empty() {
            return Err(AppError::ValidationError(
                "GEMINI_API_KEY is not set".to_string(),
            ));
        }

        if self.chunk_size == 0 {
            return Err(AppError::ValidationError(
                "CHUNK_SIZE must be greater than zero".to_string(),
            ));
        }

        if self.max_question_count == 0 {
            return Err(AppError::ValidationError(
                "MAX_QUESTION_COUNT must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            chunk_size: self.chunk_size,
            inter_request_delay: Duration::from_millis(self.inter_request_delay_ms),
            rate_limit_backoff: Duration::from_millis(self.rate_limit_backoff_ms),
        }
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "quizcraft-test".to_string(),
            results_collection: "quiz_results".to_string(),
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8080,
            gemini_api_key: SecretString::from("test-gemini-key".to_string()),
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_base_url: "http://127.0.0.1:9".to_string(),
            model_temperature: 0.9,
            model_timeout_secs: 5,
            quiz_language: "English".to_string(),
            max_question_count: 50,
            chunk_size: 4000,
            inter_request_delay_ms: 0,
            rate_limit_backoff_ms: 0,
            max_upload_bytes: 1024 * 1024,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
