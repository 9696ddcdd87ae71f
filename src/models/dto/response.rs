use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    models::{
        domain::QuizAttempt,
        dto::quiz_dto::{GradeView, QuizView},
    },
    services::{
        chunk_orchestrator::{ChunkOutcome, ChunkReport},
        generation_job_service::GenerationJob,
        quiz_attempt_service::{ReplayedAttempt, SubmissionResult},
        session_service::QuizSession,
    },
};

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct TopicQuizResponse {
    pub session_id: String,
    pub quiz: QuizView,
}

impl From<&QuizSession> for TopicQuizResponse {
    fn from(session: &QuizSession) -> Self {
        TopicQuizResponse {
            session_id: session.id.clone(),
            quiz: QuizView::build(&session.quiz, &session.answers, None),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentJobAccepted {
    pub job_id: String,
    pub total_chunks: usize,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct SessionResponse {
    pub session_id: String,
    pub submitted: bool,
    pub answered_count: i32,
    pub quiz: QuizView,
    pub grade: Option<GradeView>,
}

impl From<&QuizSession> for SessionResponse {
    fn from(session: &QuizSession) -> Self {
        SessionResponse {
            session_id: session.id.clone(),
            submitted: session.submitted,
            answered_count: session.answers.answered_count() as i32,
            quiz: QuizView::build(&session.quiz, &session.answers, session.grade.as_ref()),
            grade: session.grade.as_ref().map(GradeView::from),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct SubmissionResponse {
    pub session_id: String,
    pub attempt_id: Option<String>,
    pub saved: bool,
    pub warning: Option<String>,
    pub grade: GradeView,
    pub feedback: QuizView,
}

impl From<&SubmissionResult> for SubmissionResponse {
    fn from(result: &SubmissionResult) -> Self {
        SubmissionResponse {
            session_id: result.session_id.clone(),
            attempt_id: result.attempt_id.clone(),
            saved: result.saved,
            warning: result.warning.clone(),
            grade: GradeView::from(&result.grade),
            feedback: QuizView::build(&result.quiz, &result.answers, Some(&result.grade)),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AttemptSummary {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub score_display: String,
    pub pass_fail: String,
}

impl From<&QuizAttempt> for AttemptSummary {
    fn from(attempt: &QuizAttempt) -> Self {
        AttemptSummary {
            id: attempt.id.clone(),
            timestamp: attempt.timestamp,
            score_display: attempt.score_display.clone(),
            pass_fail: attempt.pass_fail_label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AttemptReplay {
    pub attempt: AttemptSummary,
    pub grade: GradeView,
    pub quiz: QuizView,
}

impl From<&ReplayedAttempt> for AttemptReplay {
    fn from(replay: &ReplayedAttempt) -> Self {
        AttemptReplay {
            attempt: AttemptSummary::from(&replay.attempt),
            grade: GradeView::from(&replay.grade),
            quiz: QuizView::build(&replay.quiz, &replay.answers, Some(&replay.grade)),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct ChunkDiagnostic {
    pub index: i32,
    pub status: String,
    pub tier: Option<String>,
    pub kept: i32,
    pub dropped: i32,
    pub answer_not_in_options: i32,
    pub attempts: i32,
    pub warning: Option<String>,
}

impl From<&ChunkReport> for ChunkDiagnostic {
    fn from(report: &ChunkReport) -> Self {
        let status = match report.outcome {
            ChunkOutcome::Produced => "produced",
            ChunkOutcome::NoValidRecords => "no_valid_records",
            ChunkOutcome::ModelFailed { .. } => "model_failed",
            ChunkOutcome::Unparseable { .. } => "unparseable",
        };

        ChunkDiagnostic {
            index: report.index as i32,
            status: status.to_string(),
            tier: report.tier.map(|t| format!("{:?}", t).to_lowercase()),
            kept: report.kept as i32,
            dropped: report.dropped as i32,
            answer_not_in_options: report.answer_not_in_options as i32,
            attempts: i32::from(report.attempts),
            warning: report.warning(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct GenerationJobView {
    pub id: String,
    pub file_name: String,
    pub status: String,
    pub completed_chunks: i32,
    pub total_chunks: i32,
    pub session_id: Option<String>,
    pub question_count: i32,
    pub message: Option<String>,
    pub diagnostics: Vec<ChunkDiagnostic>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&GenerationJob> for GenerationJobView {
    fn from(job: &GenerationJob) -> Self {
        GenerationJobView {
            id: job.id.clone(),
            file_name: job.file_name.clone(),
            status: job.status.to_string(),
            completed_chunks: job.completed_chunks as i32,
            total_chunks: job.total_chunks as i32,
            session_id: job.session_id.clone(),
            question_count: job.question_count as i32,
            message: job.message.clone(),
            diagnostics: job.diagnostics.iter().map(ChunkDiagnostic::from).collect(),
            created_at: job.created_at,
            finished_at: job.finished_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::response_parser::ParseTier;

    #[test]
    fn chunk_diagnostic_labels_outcome_and_tier() {
        let report = ChunkReport {
            index: 2,
            outcome: ChunkOutcome::Unparseable {
                error: "no array".into(),
            },
            tier: Some(ParseTier::Repaired),
            kept: 0,
            dropped: 0,
            answer_not_in_options: 0,
            attempts: 2,
        };

        let diagnostic = ChunkDiagnostic::from(&report);

        assert_eq!(diagnostic.status, "unparseable");
        assert_eq!(diagnostic.tier.as_deref(), Some("repaired"));
        assert_eq!(diagnostic.attempts, 2);
        assert_eq!(diagnostic.answer_not_in_options, 0);
        assert!(diagnostic
            .warning
            .as_deref()
            .is_some_and(|w| w.starts_with("Chunk 3")));
    }
}
