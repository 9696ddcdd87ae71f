pub mod chunk_orchestrator;
pub mod chunker;
pub mod document_extractor;
pub mod gemini_client;
pub mod generation_job_service;
pub mod model_service;
pub mod quiz_attempt_service;
pub mod quiz_service;
pub mod record_validator;
pub mod response_parser;
pub mod session_service;
