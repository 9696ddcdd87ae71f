use std::sync::Arc;

use crate::{
    config::Config,
    db::Database,
    errors::{AppError, AppResult},
    repositories::{MongoQuizAttemptRepository, QuizAttemptRepository},
    services::{
        chunk_orchestrator::ChunkOrchestrator,
        gemini_client::GeminiClient,
        generation_job_service::GenerationJobService,
        model_service::{GenerativeModel, ModelService},
        quiz_attempt_service::QuizAttemptService,
        quiz_service::QuizService,
        session_service::SessionService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: Arc<QuizService>,
    pub quiz_attempt_service: Arc<QuizAttemptService>,
    pub sessions: SessionService,
    pub jobs: GenerationJobService,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let attempt_repository = Arc::new(MongoQuizAttemptRepository::new(
            &db,
            &config.results_collection,
        ));
        attempt_repository.ensure_indexes().await?;

        let model = GeminiClient::from_config(&config)
            .map_err(|e| AppError::InternalError(format!("Could not build model client: {}", e)))?;
        log::info!(
            "Using model {} (temperature {}, {}s timeout)",
            config.gemini_model,
            config.model_temperature,
            config.model_timeout_secs
        );

        Ok(Self::from_parts(config, Arc::new(model), attempt_repository))
    }

    /// Wires the services around an arbitrary model backend and result store.
    pub fn from_parts(
        config: Config,
        model: Arc<dyn GenerativeModel>,
        attempt_repository: Arc<dyn QuizAttemptRepository>,
    ) -> Self {
        let sessions = SessionService::new();
        let jobs = GenerationJobService::new();

        let model_service = Arc::new(ModelService::new(model, config.quiz_language.clone()));
        let orchestrator = Arc::new(ChunkOrchestrator::new(
            model_service,
            config.orchestrator_settings(),
        ));

        let quiz_service = Arc::new(QuizService::new(
            orchestrator,
            sessions.clone(),
            jobs.clone(),
            config.max_question_count,
        ));
        let quiz_attempt_service = Arc::new(QuizAttemptService::new(
            attempt_repository,
            sessions.clone(),
        ));

        Self {
            quiz_service,
            quiz_attempt_service,
            sessions,
            jobs,
            config: Arc::new(config),
        }
    }
}
