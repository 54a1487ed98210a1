use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// A single failed constraint, named after the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldViolation>),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// A body that parses as JSON but does not fit the input type is a field
// problem; anything else (syntax, content type, size) is a bad request.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                AppError::Validation(vec![FieldViolation::new("body", e.body_text())])
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(violations) => serde_json::json!({
                "error": "Validation failed",
                "code": "VALIDATION_ERROR",
                "violations": violations,
            }),
            AppError::BadRequest(msg) => {
                serde_json::json!({ "error": msg, "code": "BAD_REQUEST" })
            }
            AppError::Conflict(msg) => serde_json::json!({ "error": msg, "code": "CONFLICT" }),
            AppError::NotFound(msg) => serde_json::json!({ "error": msg, "code": "NOT_FOUND" }),
            AppError::Forbidden(msg) => serde_json::json!({ "error": msg, "code": "FORBIDDEN" }),
            AppError::Unauthorized(msg) => {
                serde_json::json!({ "error": msg, "code": "UNAUTHORIZED" })
            }
            AppError::Database(e) => {
                error!(error = %e, "database error");
                serde_json::json!({ "error": "Internal server error", "code": "INTERNAL_ERROR" })
            }
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                serde_json::json!({ "error": "Internal server error", "code": "INTERNAL_ERROR" })
            }
        };
        (status, Json(body)).into_response()
    }
}
