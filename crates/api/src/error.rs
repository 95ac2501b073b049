use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::TemplateError;
use serde::Serialize;
use shared::validation::{field_violations, FieldViolation};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        details: Vec<FieldViolation>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rendering error: {0}")]
    Rendering(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<FieldViolation>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Validation { message, details } => {
                (StatusCode::BAD_REQUEST, "validation_error", message, details)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, Vec::new()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, Vec::new()),
            ApiError::Rendering(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "rendering_error",
                msg,
                Vec::new(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                    Vec::new(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: error_code,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<TemplateError> for ApiError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::Validation(msg) => ApiError::validation(msg),
            TemplateError::NotFound(_) => ApiError::NotFound("Template not found".into()),
            TemplateError::Conflict(msg) => ApiError::Conflict(msg),
            TemplateError::Rendering(msg) => ApiError::Rendering(msg),
            TemplateError::Persistence(store_err) => ApiError::Internal(store_err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = field_violations(&errors);

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation { message, details }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}
