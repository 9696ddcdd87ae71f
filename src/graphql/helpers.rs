use crate::errors::{AppError, AppResult};
use uuid::Uuid;

/// Session, job and attempt ids are UUIDs; reject anything else up front.
pub fn parse_id(id: &str) -> AppResult<String> {
    Uuid::parse_str(id.trim())
        .map(|uuid| uuid.to_string())
        .map_err(|_| AppError::ValidationError("Invalid UUID format".to_string()))
}

pub fn parse_index(index: i32) -> AppResult<usize> {
    usize::try_from(index)
        .map_err(|_| AppError::ValidationError(format!("Invalid question index {}", index)))
}
