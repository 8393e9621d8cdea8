use std::fmt::Display;

use annotation::AnnotationError;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

/// Handler failure: status plus a `{"error": ...}` body.
pub type ApiError = (StatusCode, Json<Value>);

pub type ApiResult<T> = Result<T, ApiError>;

pub fn api_error(status: StatusCode, msg: impl Display) -> ApiError {
    (status, Json(json!({ "error": msg.to_string() })))
}

pub fn annotation_error(e: AnnotationError) -> ApiError {
    let status = match &e {
        AnnotationError::NotFound { .. } => StatusCode::NOT_FOUND,
        AnnotationError::InvalidInput(_) | AnnotationError::EmptyPrompt => StatusCode::BAD_REQUEST,
        AnnotationError::InvalidTransition { .. } | AnnotationError::IncompleteExample { .. } => {
            StatusCode::CONFLICT
        }
    };
    api_error(status, e)
}

pub fn join_error(e: tokio::task::JoinError) -> ApiError {
    tracing::error!(error = %e, "store task panicked");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}
