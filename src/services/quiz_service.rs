use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Difficulty, Quiz, QuizQuestion, QuizSource},
    services::{
        chunk_orchestrator::{ChunkOrchestrator, ChunkOutcome, GenerationRun},
        document_extractor::{extract_text, DocumentKind},
        generation_job_service::{GenerationJob, GenerationJobService},
        model_service::TopicParams,
        session_service::{QuizSession, SessionService},
    },
};

/// Concatenates per-chunk batches in chunk order. Duplicates across chunks
/// are kept.
pub fn assemble_quiz(batches: Vec<Vec<QuizQuestion>>, source: QuizSource) -> Quiz {
    let questions = batches.into_iter().flatten().collect();
    Quiz::new(source, questions)
}

#[derive(Debug, Clone)]
pub struct TopicQuizInput {
    pub topic: String,
    pub question_count: u16,
    pub difficulty: Difficulty,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct QuizService {
    orchestrator: Arc<ChunkOrchestrator>,
    sessions: SessionService,
    jobs: GenerationJobService,
    max_question_count: u16,
}

impl QuizService {
    pub fn new(
        orchestrator: Arc<ChunkOrchestrator>,
        sessions: SessionService,
        jobs: GenerationJobService,
        max_question_count: u16,
    ) -> Self {
        Self {
            orchestrator,
            sessions,
            jobs,
            max_question_count,
        }
    }

    /// Runs the single topic call inline. An empty result is reported as
    /// [`AppError::NothingExtracted`] and leaves any existing session as it was.
    pub async fn generate_from_topic(&self, input: TopicQuizInput) -> AppResult<QuizSession> {
        let topic = input.topic.trim();
        if topic.is_empty() {
            return Err(AppError::ValidationError("Topic must not be empty".to_string()));
        }
        if input.question_count == 0 || input.question_count > self.max_question_count {
            return Err(AppError::ValidationError(format!(
                "Question count must be between 1 and {}",
                self.max_question_count
            )));
        }
        if let Some(id) = input.session_id.as_deref() {
            self.sessions.get(id).await?;
        }

        let params = TopicParams {
            topic: topic.to_string(),
            question_count: input.question_count,
            difficulty: input.difficulty,
        };
        let run = self.orchestrator.run_topic(&params).await;

        if run.is_empty() {
            let reason = run
                .warnings()
                .into_iter()
                .next()
                .unwrap_or_else(|| "the model returned no usable questions".to_string());
            log::warn!("No questions generated for topic '{}': {}", topic, reason);
            return Err(AppError::NothingExtracted(reason));
        }

        let quiz = assemble_quiz(
            run.batches,
            QuizSource::Topic {
                topic: topic.to_string(),
                difficulty: input.difficulty,
            },
        );
        log::info!(
            "Generated {} question(s) for topic '{}' (requested {})",
            quiz.len(),
            topic,
            input.question_count
        );

        self.sessions
            .start(input.session_id.as_deref(), Arc::new(quiz))
            .await
    }

    /// Extracts text up front, then hands the run to a background task and
    /// returns the tracking job. Extraction failures are returned directly and
    /// no model call is made.
    pub async fn start_document_generation(&self, upload: DocumentUpload) -> AppResult<GenerationJob> {
        let kind = DocumentKind::detect(&upload.file_name, upload.content_type.as_deref())?;
        let bytes = upload.bytes;
        let text = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
            .await
            .map_err(|e| AppError::InternalError(format!("Extraction task failed: {}", e)))??;

        let total = self.orchestrator.chunker().count(&text);
        let job = self.jobs.create(&upload.file_name, total).await;

        let orchestrator = Arc::clone(&self.orchestrator);
        let sessions = self.sessions.clone();
        let jobs = self.jobs.clone();
        let job_id = job.id.clone();
        let file_name = upload.file_name;

        tokio::spawn(async move {
            if let Err(e) = jobs.mark_running(&job_id).await {
                log::error!("Generation job {} vanished before start: {}", job_id, e);
                return;
            }

            let sink = jobs.progress_sink(&job_id);
            let run = orchestrator.run_document(&text, &sink).await;

            if let Err(e) = finish_document_job(&jobs, &sessions, &job_id, file_name, run).await {
                log::error!("Could not finalize generation job {}: {}", job_id, e);
            }
        });

        Ok(job)
    }
}

async fn finish_document_job(
    jobs: &GenerationJobService,
    sessions: &SessionService,
    job_id: &str,
    file_name: String,
    run: GenerationRun,
) -> AppResult<()> {
    if run.is_empty() {
        let all_calls_failed = !run.chunks.is_empty()
            && run
                .chunks
                .iter()
                .all(|c| matches!(c.outcome, ChunkOutcome::ModelFailed { .. }));

        return if all_calls_failed {
            let reason = run
                .warnings()
                .pop()
                .unwrap_or_else(|| "every model call failed".to_string());
            jobs.fail(job_id, &reason).await
        } else {
            jobs.finish_without_questions(
                job_id,
                "No questions could be extracted from this document",
            )
            .await
        };
    }

    let chunk_count = run.chunks.len();
    let quiz = assemble_quiz(
        run.batches,
        QuizSource::Document {
            file_name,
            chunk_count,
        },
    );
    let question_count = quiz.len();
    let session = sessions.create(Arc::new(quiz)).await;

    jobs.complete(job_id, &session.id, question_count).await
}
