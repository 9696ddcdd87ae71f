use actix_web::{get, http::header, post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    middleware::get_request_id,
    models::dto::{
        request::{DocumentUploadQuery, GenerateTopicQuizRequest},
        response::{DocumentJobAccepted, GenerationJobView, TopicQuizResponse},
    },
    services::quiz_service::DocumentUpload,
};

#[post("/api/quizzes/topic")]
async fn generate_topic_quiz(
    state: web::Data<AppState>,
    request: web::Json<GenerateTopicQuizRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let session = state
        .quiz_service
        .generate_from_topic(request.into_input()?)
        .await?;
    Ok(HttpResponse::Created().json(TopicQuizResponse::from(&session)))
}

/// The request body is the raw file. Extraction happens before the response
/// is sent; generation continues in the background.
#[post("/api/quizzes/document")]
async fn upload_document(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<DocumentUploadQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    query.validate()?;

    if body.is_empty() {
        return Err(AppError::BadRequest("Uploaded document is empty".to_string()));
    }
    if body.len() > state.config.max_upload_bytes {
        return Err(AppError::BadRequest(format!(
            "Uploaded document exceeds {} bytes",
            state.config.max_upload_bytes
        )));
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    log::info!(
        "[{}] Document upload '{}' ({} bytes)",
        get_request_id(&req).unwrap_or_default(),
        query.file_name,
        body.len()
    );

    let job = state
        .quiz_service
        .start_document_generation(DocumentUpload {
            file_name: query.file_name,
            content_type,
            bytes: body.to_vec(),
        })
        .await?;

    Ok(HttpResponse::Accepted().json(DocumentJobAccepted {
        job_id: job.id,
        total_chunks: job.total_chunks,
    }))
}

#[get("/api/jobs/{id}")]
async fn get_generation_job(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let job = state.jobs.get(&id).await?;
    Ok(HttpResponse::Ok().json(GenerationJobView::from(&job)))
}
