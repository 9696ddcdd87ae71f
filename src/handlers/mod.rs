pub mod attempt_handler;
pub mod graphql_handler;
pub mod quiz_handler;
pub mod session_handler;

use actix_web::{get, web, HttpResponse};

use crate::app_state::AppState;

pub use attempt_handler::{get_attempt, list_attempts};
pub use quiz_handler::{generate_topic_quiz, get_generation_job, upload_document};
pub use session_handler::{get_session, record_answer, submit_quiz};

/// 503 when the result store cannot be reached.
#[get("/health")]
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let store = state.quiz_attempt_service.check_store().await;
    if let Err(e) = &store {
        log::warn!("Health check failed: {}", e);
    }

    let response = serde_json::json!({
        "status": if store.is_ok() { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "mongodb": if store.is_ok() { "ok" } else { "error" }
        }
    });

    if store.is_ok() {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// Registers every REST route. GraphQL routes are mounted separately.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(generate_topic_quiz)
        .service(upload_document)
        .service(get_generation_job)
        .service(get_session)
        .service(record_answer)
        .service(submit_quiz)
        .service(list_attempts)
        .service(get_attempt);
}
