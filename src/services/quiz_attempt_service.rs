use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{AnswerMap, GradeSummary, Quiz, QuizAttempt},
    repositories::QuizAttemptRepository,
    services::session_service::SessionService,
};

/// A graded submission as returned to the client.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub session_id: String,
    pub quiz: Arc<Quiz>,
    pub answers: AnswerMap,
    pub grade: GradeSummary,
    pub attempt_id: Option<String>,
    pub saved: bool,
    pub warning: Option<String>,
}

/// A stored attempt decoded back into a read-only quiz view.
#[derive(Debug, Clone)]
pub struct ReplayedAttempt {
    pub attempt: QuizAttempt,
    pub quiz: Quiz,
    pub answers: AnswerMap,
    pub grade: GradeSummary,
}

pub struct QuizAttemptService {
    repository: Arc<dyn QuizAttemptRepository>,
    sessions: SessionService,
}

impl QuizAttemptService {
    pub fn new(repository: Arc<dyn QuizAttemptRepository>, sessions: SessionService) -> Self {
        Self {
            repository,
            sessions,
        }
    }

    /// Exact string equality per question; an unanswered question is wrong.
    pub fn grade_attempt(quiz: &Quiz, answers: &AnswerMap) -> GradeSummary {
        let correctness = quiz
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| question.is_correct(answers.get(index)))
            .collect();
        GradeSummary::from_correctness(correctness)
    }

    /// Grades the session, freezes it and appends a history row. Overrides are
    /// all-or-nothing. A failed append is reported on the result instead of
    /// failing the submission.
    pub async fn submit(
        &self,
        session_id: &str,
        answers: Option<AnswerMap>,
    ) -> AppResult<SubmissionResult> {
        let session = self
            .sessions
            .submit(session_id, answers, Self::grade_attempt)
            .await?;
        let grade = session.grade.clone().ok_or_else(|| {
            AppError::InternalError(format!("Session '{}' was frozen without a grade", session_id))
        })?;
        log::info!(
            "Session {} submitted: {} ({})",
            session_id,
            grade.score_display,
            grade.pass_fail
        );

        let (attempt_id, warning) = match self.persist(&session.quiz, &session.answers, &grade).await {
            Ok(id) => (Some(id), None),
            Err(e) => {
                log::error!("Failed to save result for session {}: {}", session_id, e);
                (None, Some(format!("Result was graded but not saved: {}", e)))
            }
        };

        Ok(SubmissionResult {
            session_id: session.id,
            quiz: session.quiz,
            answers: session.answers,
            grade,
            saved: attempt_id.is_some(),
            attempt_id,
            warning,
        })
    }

    pub async fn check_store(&self) -> AppResult<()> {
        self.repository.ping().await
    }

    pub async fn list_attempts(&self) -> AppResult<Vec<QuizAttempt>> {
        self.repository.find_all().await
    }

    /// Grading is pure, so re-grading the stored answers reproduces the
    /// submitted result.
    pub async fn reopen_attempt(&self, id: &str) -> AppResult<ReplayedAttempt> {
        let attempt = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Attempt '{}' not found", id)))?;

        let (quiz, answers) = attempt.decode().map_err(|e| {
            AppError::InternalError(format!("Stored attempt '{}' is corrupt: {}", id, e))
        })?;
        let grade = Self::grade_attempt(&quiz, &answers);

        Ok(ReplayedAttempt {
            attempt,
            quiz,
            answers,
            grade,
        })
    }

    async fn persist(
        &self,
        quiz: &Quiz,
        answers: &AnswerMap,
        grade: &GradeSummary,
    ) -> AppResult<String> {
        let attempt = QuizAttempt::new(quiz, answers, grade)?;
        let saved = self.repository.append(attempt).await?;
        Ok(saved.id)
    }
}
