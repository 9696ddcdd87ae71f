use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::QuizAttempt,
};

const DUPLICATE_KEY: i32 = 11000;

/// Append-only log of graded submissions.
#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    async fn append(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt>;
    /// Oldest first.
    async fn find_all(&self) -> AppResult<Vec<QuizAttempt>>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>>;

    /// Reachability of the backing store.
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct MongoQuizAttemptRepository {
    db: Database,
    collection: Collection<QuizAttempt>,
}

impl MongoQuizAttemptRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            db: db.clone(),
            collection: db.collection(collection_name),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!(
            "Creating indexes for {} collection",
            self.collection.name()
        );

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let timestamp_index = IndexModel::builder()
            .keys(doc! { "timestamp": 1 })
            .options(
                IndexOptions::builder()
                    .name("timestamp".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(timestamp_index).await?;

        log::info!(
            "Successfully created indexes for {} collection",
            self.collection.name()
        );
        Ok(())
    }
}

#[async_trait]
impl QuizAttemptRepository for MongoQuizAttemptRepository {
    async fn append(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        match self.collection.insert_one(&attempt).await {
            Ok(_) => Ok(attempt),
            Err(err) => Err(insert_error(&attempt.id, write_error_code(&err), err.to_string())),
        }
    }

    async fn find_all(&self) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .collection
            .find(doc! {})
            .sort(doc! { "timestamp": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn ping(&self) -> AppResult<()> {
        self.db.ping().await
    }
}

fn write_error_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => Some(write_error.code),
        _ => None,
    }
}

fn insert_error(id: &str, code: Option<i32>, message: String) -> AppError {
    if code == Some(DUPLICATE_KEY) {
        AppError::AlreadyExists(format!("Attempt '{}' already exists", id))
    } else {
        AppError::DatabaseError(message)
    }
}
