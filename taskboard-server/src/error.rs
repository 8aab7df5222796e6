//! The one place core errors become HTTP status codes.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use taskboard_core::{Error, FieldError, ValidationErrors};
use tracing::{debug, error};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] Error),
    #[error("Route {method} {path} not found")]
    RouteNotFound { method: Method, path: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        ErrorBody {
            success: false,
            error: error.into(),
            details: None,
            stack: None,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Core(Error::Validation(errors))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationErrors::single("body", rejection.body_text()).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ValidationErrors::single("query", rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::RouteNotFound { method, path } => {
                let message = format!("Route {method} {path} not found");
                (StatusCode::NOT_FOUND, ErrorBody::new(message))
            }
            ApiError::Core(err) => core_error_response(err),
        };
        (status, Json(body)).into_response()
    }
}

fn core_error_response(err: Error) -> (StatusCode, ErrorBody) {
    match err {
        Error::Validation(errors) => {
            debug!(%errors, "request failed validation");
            let mut body = ErrorBody::new("Validation error");
            body.details = Some(errors.into_field_errors());
            (StatusCode::BAD_REQUEST, body)
        }
        Error::Unauthorized => (StatusCode::UNAUTHORIZED, ErrorBody::new("Unauthorized")),
        Error::NotFound(entity) => {
            debug!(entity, "not found");
            (StatusCode::NOT_FOUND, ErrorBody::new(format!("{entity} not found")))
        }
        Error::ShareAccess => (
            StatusCode::NOT_FOUND,
            ErrorBody::new("Workspace not found or is not public"),
        ),
        err @ (Error::Storage(_) | Error::Migrate(_) | Error::Io(_)) => {
            error!(error = %err, "request failed");
            let mut body = ErrorBody::new("Internal server error");
            if cfg!(debug_assertions) {
                body.stack = Some(format!("{err:?}"));
            }
            (StatusCode::INTERNAL_SERVER_ERROR, body)
        }
    }
}
