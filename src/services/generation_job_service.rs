use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    services::chunk_orchestrator::{ChunkProgress, ChunkReport, ProgressSink},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Pending,
    Running,
    Completed,
    /// The run finished but no usable question came out of it.
    NoQuestions,
    Failed,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationStatus::Completed | GenerationStatus::NoQuestions | GenerationStatus::Failed
        )
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationStatus::Pending => write!(f, "pending"),
            GenerationStatus::Running => write!(f, "running"),
            GenerationStatus::Completed => write!(f, "completed"),
            GenerationStatus::NoQuestions => write!(f, "no_questions"),
            GenerationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Progress and outcome of one document generation run.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationJob {
    pub id: String,
    pub file_name: String,
    pub status: GenerationStatus,
    pub completed_chunks: usize,
    pub total_chunks: usize,
    pub session_id: Option<String>,
    pub question_count: usize,
    pub message: Option<String>,
    pub diagnostics: Vec<ChunkReport>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl GenerationJob {
    fn new(file_name: impl Into<String>, total_chunks: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            status: GenerationStatus::Pending,
            completed_chunks: 0,
            total_chunks,
            session_id: None,
            question_count: 0,
            message: None,
            diagnostics: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Chunk warnings collected so far, in chunk order.
    pub fn warnings(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter_map(ChunkReport::warning)
            .collect()
    }
}

/// In-memory tracker for document runs. Clones share the same job table.
#[derive(Clone, Default)]
pub struct GenerationJobService {
    jobs: Arc<RwLock<HashMap<String, GenerationJob>>>,
}

impl GenerationJobService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, file_name: &str, total_chunks: usize) -> GenerationJob {
        let job = GenerationJob::new(file_name, total_chunks);
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        log::info!(
            "Created generation job {} for '{}' ({} chunks)",
            job.id,
            file_name,
            total_chunks
        );
        job
    }

    pub async fn get(&self, id: &str) -> AppResult<GenerationJob> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Generation job '{}' not found", id)))
    }

    pub async fn mark_running(&self, id: &str) -> AppResult<()> {
        self.update(id, |job| job.status = GenerationStatus::Running)
            .await
    }

    pub async fn record_chunk(
        &self,
        id: &str,
        progress: ChunkProgress,
        report: &ChunkReport,
    ) -> AppResult<()> {
        let report = report.clone();
        self.update(id, move |job| {
            job.completed_chunks = progress.completed;
            job.total_chunks = progress.total;
            job.diagnostics.push(report);
        })
        .await
    }

    pub async fn complete(&self, id: &str, session_id: &str, question_count: usize) -> AppResult<()> {
        let session_id = session_id.to_string();
        self.update(id, move |job| {
            job.status = GenerationStatus::Completed;
            job.session_id = Some(session_id);
            job.question_count = question_count;
            job.finished_at = Some(Utc::now());
        })
        .await
    }

    pub async fn finish_without_questions(&self, id: &str, message: &str) -> AppResult<()> {
        self.finish(id, GenerationStatus::NoQuestions, message).await
    }

    pub async fn fail(&self, id: &str, message: &str) -> AppResult<()> {
        self.finish(id, GenerationStatus::Failed, message).await
    }

    pub fn progress_sink(&self, id: &str) -> JobProgress {
        JobProgress {
            jobs: self.clone(),
            job_id: id.to_string(),
        }
    }

    async fn finish(&self, id: &str, status: GenerationStatus, message: &str) -> AppResult<()> {
        let message = message.to_string();
        self.update(id, move |job| {
            job.status = status;
            job.message = Some(message);
            job.finished_at = Some(Utc::now());
        })
        .await
    }

    async fn update<F>(&self, id: &str, apply: F) -> AppResult<()>
    where
        F: FnOnce(&mut GenerationJob),
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Generation job '{}' not found", id)))?;
        apply(job);
        Ok(())
    }
}

/// Writes orchestrator progress into one tracked job.
pub struct JobProgress {
    jobs: GenerationJobService,
    job_id: String,
}

#[async_trait]
impl ProgressSink for JobProgress {
    async fn chunk_finished(&self, progress: ChunkProgress, report: &ChunkReport) {
        if let Err(e) = self.jobs.record_chunk(&self.job_id, progress, report).await {
            log::warn!("Could not record progress for job {}: {}", self.job_id, e);
        }
    }
}
