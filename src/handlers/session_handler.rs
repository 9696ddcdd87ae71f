use actix_web::{get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{
        request::{RecordAnswerRequest, SubmitQuizRequest},
        response::{SessionResponse, SubmissionResponse},
    },
};

#[get("/api/sessions/{id}")]
async fn get_session(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = state.sessions.get(&id).await?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(&session)))
}

#[put("/api/sessions/{id}/answers/{index}")]
async fn record_answer(
    state: web::Data<AppState>,
    path: web::Path<(String, usize)>,
    request: web::Json<RecordAnswerRequest>,
) -> Result<HttpResponse, AppError> {
    let (id, index) = path.into_inner();
    let session = state
        .sessions
        .record_answer(&id, index, request.into_inner().answer)
        .await?;
    Ok(HttpResponse::Ok().json(SessionResponse::from(&session)))
}

/// The body is optional; answers in it override those already recorded.
#[post("/api/sessions/{id}/submit")]
async fn submit_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: Option<web::Json<SubmitQuizRequest>>,
) -> Result<HttpResponse, AppError> {
    let answers = match request {
        Some(request) => request.into_inner().into_answer_map()?,
        None => None,
    };

    let result = state.quiz_attempt_service.submit(&id, answers).await?;
    Ok(HttpResponse::Ok().json(SubmissionResponse::from(&result)))
}
