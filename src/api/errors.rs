use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::WorkflowError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(String),
    BadRequest(String),
    /// A batch whose items failed validation; every item message is returned.
    Rejected(Vec<String>),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

impl From<WorkflowError> for ApiError {
    fn from(error: WorkflowError) -> Self {
        match error {
            WorkflowError::Forbidden(message) => Self::Forbidden(message),
            WorkflowError::NotFound(message) => Self::NotFound(message),
            WorkflowError::InvalidRequest(message) => Self::BadRequest(message),
            WorkflowError::Rejected(errors) => {
                Self::Rejected(errors.iter().map(|error| error.message().to_string()).collect())
            }
            WorkflowError::Store(err) => Self::internal(err, "Storage failure"),
        }
    }
}

fn body(status: StatusCode, detail: String, errors: Option<Vec<String>>) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), detail, errors })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let mut response = body(StatusCode::UNAUTHORIZED, message.to_string(), None);
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => body(StatusCode::FORBIDDEN, message, None),
            ApiError::BadRequest(message) => body(StatusCode::BAD_REQUEST, message, None),
            ApiError::Rejected(errors) => body(
                StatusCode::BAD_REQUEST,
                "Request contains invalid items".to_string(),
                Some(errors),
            ),
            ApiError::NotFound(message) => body(StatusCode::NOT_FOUND, message, None),
            ApiError::Conflict(message) => body(StatusCode::CONFLICT, message, None),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                body(StatusCode::INTERNAL_SERVER_ERROR, message, None)
            }
        }
    }
}
