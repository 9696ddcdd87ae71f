use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{AnswerMap, GradeSummary, Quiz},
};

/// State owned by one quiz-taking session.
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub id: String,
    pub quiz: Arc<Quiz>,
    pub answers: AnswerMap,
    pub submitted: bool,
    pub grade: Option<GradeSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QuizSession {
    fn new(quiz: Arc<Quiz>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            quiz,
            answers: AnswerMap::new(),
            submitted: false,
            grade: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn reset(&mut self, quiz: Arc<Quiz>) {
        self.quiz = quiz;
        self.answers = AnswerMap::new();
        self.submitted = false;
        self.grade = None;
        self.updated_at = Utc::now();
    }
}

/// In-memory session table. Clones share the same table.
#[derive(Clone, Default)]
pub struct SessionService {
    sessions: Arc<RwLock<HashMap<String, QuizSession>>>,
}

impl SessionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, quiz: Arc<Quiz>) -> QuizSession {
        let session = QuizSession::new(quiz);
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        log::info!(
            "Started session {} with {} question(s)",
            session.id,
            session.quiz.len()
        );
        session
    }

    /// Regenerating into an existing session discards its answers and grade.
    pub async fn replace_quiz(&self, id: &str, quiz: Arc<Quiz>) -> AppResult<QuizSession> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| session_not_found(id))?;
        session.reset(quiz);
        log::info!("Session {} reset with a new quiz", id);
        Ok(session.clone())
    }

    /// Creates a new session, or resets `existing` when one is given.
    pub async fn start(&self, existing: Option<&str>, quiz: Arc<Quiz>) -> AppResult<QuizSession> {
        match existing {
            Some(id) => self.replace_quiz(id, quiz).await,
            None => Ok(self.create(quiz).await),
        }
    }

    pub async fn get(&self, id: &str) -> AppResult<QuizSession> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| session_not_found(id))
    }

    /// `None` clears the answer. A non-empty answer must be one of the
    /// question's options.
    pub async fn record_answer(
        &self,
        id: &str,
        index: usize,
        answer: Option<String>,
    ) -> AppResult<QuizSession> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| session_not_found(id))?;

        ensure_open(session)?;
        if let Some(answer) = answer.as_deref() {
            check_answer(&session.quiz, index, answer)?;
        } else {
            check_index(&session.quiz, index)?;
        }

        session.answers.set(index, answer);
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    /// Applies `overrides`, grades and freezes the session under one lock, so
    /// the stored grade always matches the stored answers. Every override is
    /// checked before any is applied. A session can only be submitted once.
    pub async fn submit<F>(
        &self,
        id: &str,
        overrides: Option<AnswerMap>,
        grade: F,
    ) -> AppResult<QuizSession>
    where
        F: FnOnce(&Quiz, &AnswerMap) -> GradeSummary,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| session_not_found(id))?;
        ensure_open(session)?;

        if let Some(overrides) = overrides {
            for (index, answer) in overrides.iter() {
                check_answer(&session.quiz, index, answer)?;
            }
            for (index, answer) in overrides.iter() {
                session.answers.set(index, Some(answer.to_string()));
            }
        }

        session.grade = Some(grade(&session.quiz, &session.answers));
        session.submitted = true;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }
}

fn ensure_open(session: &QuizSession) -> AppResult<()> {
    if session.submitted {
        return Err(AppError::BadRequest(format!(
            "Session '{}' has already been submitted",
            session.id
        )));
    }
    Ok(())
}

fn check_index(quiz: &Quiz, index: usize) -> AppResult<()> {
    if index >= quiz.len() {
        return Err(AppError::ValidationError(format!(
            "Question index {} is out of range (quiz has {} questions)",
            index,
            quiz.len()
        )));
    }
    Ok(())
}

fn check_answer(quiz: &Quiz, index: usize, answer: &str) -> AppResult<()> {
    check_index(quiz, index)?;
    match quiz.question(index) {
        Some(question) if question.has_option(answer) => Ok(()),
        _ => Err(AppError::ValidationError(format!(
            "'{}' is not an option of question {}",
            answer, index
        ))),
    }
}

fn session_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Session '{}' not found", id))
}
