use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::ValidationReport;
use domain::services::{CallbackError, RuntimeError, WorkflowError};
use serde::Serialize;
use shared::pagination::CursorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {} issue(s)", .0.len())]
    InvalidRequest(Vec<ValidationDetail>),

    #[error("Submission has {} validation error(s)", .0.error_count)]
    Unprocessable(Box<ValidationReport>),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ValidationReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error_code, message, details, report) = match self {
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None, None),
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg, None, None)
            }
            ApiError::InvalidRequest(details) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                Some(details),
                None,
            ),
            ApiError::Unprocessable(report) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                message,
                None,
                Some(*report),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                    None,
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
                None,
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
            report,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                ApiError::ServiceUnavailable("Database unavailable".into())
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
                })
            })
            .collect();

        if details.len() == 1 {
            ApiError::Validation(details[0].message.clone())
        } else {
            ApiError::InvalidRequest(details)
        }
    }
}

impl From<CursorError> for ApiError {
    fn from(err: CursorError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::UnknownField(_) => ApiError::NotFound(err.to_string()),
            RuntimeError::TemplateMismatch { .. } => ApiError::Conflict(err.to_string()),
            RuntimeError::Workflow(WorkflowError::MissingStartState) => {
                ApiError::Validation(err.to_string())
            }
            RuntimeError::Workflow(_) => ApiError::Conflict(err.to_string()),
            RuntimeError::InvalidInput(e) => ApiError::Validation(e.to_string()),
            RuntimeError::DraftSaveDisabled(_) => ApiError::Forbidden(err.to_string()),
            RuntimeError::ValidationFailed(report) => ApiError::Unprocessable(report),
            RuntimeError::Persistence(CallbackError::VersionConflict { .. }) => {
                ApiError::Conflict(err.to_string())
            }
            RuntimeError::Persistence(CallbackError::Rejected(_)) => {
                ApiError::Conflict(err.to_string())
            }
            RuntimeError::Persistence(CallbackError::Unavailable(_)) => {
                ApiError::ServiceUnavailable(err.to_string())
            }
        }
    }
}
