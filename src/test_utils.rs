#[cfg(test)]
pub mod fixtures {
    use std::{
        collections::VecDeque,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::{Mutex, RwLock};

    use crate::{
        errors::{AppError, AppResult},
        models::domain::{Difficulty, Quiz, QuizAttempt, QuizQuestion, QuizSource},
        repositories::QuizAttemptRepository,
        services::{
            chunk_orchestrator::{ChunkProgress, ChunkReport, ProgressSink},
            model_service::{GenerativeModel, ModelError},
        },
    };

    /// Four photosynthesis questions with correct answers Oxygen,
    /// Chloroplast, Carbon dioxide and Light.
    pub fn sample_quiz() -> Quiz {
        let options =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Quiz::new(
            QuizSource::Topic {
                topic: "Photosynthesis".to_string(),
                difficulty: Difficulty::Medium,
            },
            vec![
                QuizQuestion::new(
                    "What gas do plants release during photosynthesis?",
                    options(&["Oxygen", "Nitrogen", "Helium", "Argon"]),
                    "Oxygen",
                    "Oxygen is released when water is split.",
                ),
                QuizQuestion::new(
                    "Where does photosynthesis take place?",
                    options(&["Nucleus", "Chloroplast", "Mitochondrion", "Ribosome"]),
                    "Chloroplast",
                    "Chloroplasts hold the chlorophyll.",
                ),
                QuizQuestion::new(
                    "Which molecule do plants take from the air?",
                    options(&["Glucose", "Carbon dioxide", "Starch", "Oxygen"]),
                    "Carbon dioxide",
                    "CO2 is fixed into sugars.",
                ),
                QuizQuestion::new(
                    "What powers photosynthesis?",
                    options(&["Light", "Sound", "Heat", "Magnetism"]),
                    "Light",
                    "Light energy drives the reactions.",
                ),
            ],
        )
    }

    /// A model response holding one valid record per title. Each record's
    /// correct answer is `"<title> correct"`.
    pub fn question_array_json(titles: &[&str]) -> String {
        let records: Vec<_> = titles
            .iter()
            .map(|title| {
                json!({
                    "question": title,
                    "options": [
                        format!("{} correct", title),
                        format!("{} wrong", title),
                        format!("{} also wrong", title),
                    ],
                    "correct_answer": format!("{} correct", title),
                    "explanation": format!("Because {}.", title),
                })
            })
            .collect();
        serde_json::Value::Array(records).to_string()
    }

    /// Replays canned responses in order and records every prompt. Once the
    /// script runs out every call returns an empty-response error.
    pub struct ScriptedModel {
        script: Mutex<VecDeque<Result<String, ModelError>>>,
        prompts: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        pub fn new(script: Vec<Result<String, ModelError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                prompts: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub async fn prompts(&self) -> Vec<String> {
            self.prompts.lock().await.clone()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().await.push(prompt.to_string());
            self.script
                .lock()
                .await
                .pop_front()
                .unwrap_or(Err(ModelError::EmptyResponse))
        }
    }

    #[derive(Default)]
    pub struct RecordingProgress {
        seen: Mutex<Vec<(usize, usize)>>,
    }

    impl RecordingProgress {
        pub async fn snapshots(&self) -> Vec<(usize, usize)> {
            self.seen.lock().await.clone()
        }
    }

    #[async_trait]
    impl ProgressSink for RecordingProgress {
        async fn chunk_finished(&self, progress: ChunkProgress, _report: &ChunkReport) {
            self.seen
                .lock()
                .await
                .push((progress.completed, progress.total));
        }
    }

    #[derive(Default)]
    pub struct InMemoryAttemptRepository {
        attempts: RwLock<Vec<QuizAttempt>>,
    }

    impl InMemoryAttemptRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl QuizAttemptRepository for InMemoryAttemptRepository {
        async fn append(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
            let mut attempts = self.attempts.write().await;
            if attempts.iter().any(|a| a.id == attempt.id) {
                return Err(AppError::AlreadyExists(format!(
                    "Attempt '{}' already exists",
                    attempt.id
                )));
            }
            attempts.push(attempt.clone());
            Ok(attempt)
        }

        async fn find_all(&self) -> AppResult<Vec<QuizAttempt>> {
            let mut attempts = self.attempts.read().await.clone();
            attempts.sort_by_key(|a| a.timestamp);
            Ok(attempts)
        }

        async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
            Ok(self
                .attempts
                .read()
                .await
                .iter()
                .find(|a| a.id == id)
                .cloned())
        }
    }

    /// Every write fails as if the database were unreachable.
    pub struct FailingAttemptRepository;

    #[async_trait]
    impl QuizAttemptRepository for FailingAttemptRepository {
        async fn append(&self, _attempt: QuizAttempt) -> AppResult<QuizAttempt> {
            Err(AppError::DatabaseError("connection refused".to_string()))
        }

        async fn find_all(&self) -> AppResult<Vec<QuizAttempt>> {
            Ok(Vec::new())
        }

        async fn find_by_id(&self, _id: &str) -> AppResult<Option<QuizAttempt>> {
            Ok(None)
        }

        async fn ping(&self) -> AppResult<()> {
            Err(AppError::DatabaseError("connection refused".to_string()))
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::services::response_parser::parse_records;

    #[test]
    fn test_sample_quiz_has_valid_answers() {
        let quiz = sample_quiz();

        assert_eq!(quiz.len(), 4);
        assert!(quiz.questions().iter().all(|q| q.correct_answer_in_options()));
    }

    #[test]
    fn test_question_array_json_parses_directly() {
        let recovered = parse_records(&question_array_json(&["A", "B"]))
            .expect("fixture should parse");

        assert_eq!(recovered.records.len(), 2);
        assert_eq!(recovered.records[1]["correct_answer"], "B correct");
    }
}
