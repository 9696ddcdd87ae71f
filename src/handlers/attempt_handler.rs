use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::response::{AttemptReplay, AttemptSummary},
};

#[get("/api/attempts")]
async fn list_attempts(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let attempts = state.quiz_attempt_service.list_attempts().await?;
    let summaries: Vec<AttemptSummary> = attempts.iter().map(AttemptSummary::from).collect();
    Ok(HttpResponse::Ok().json(summaries))
}

#[get("/api/attempts/{id}")]
async fn get_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let replay = state.quiz_attempt_service.reopen_attempt(&id).await?;
    Ok(HttpResponse::Ok().json(AttemptReplay::from(&replay)))
}
