pub mod subtasks;
pub mod tasks;
pub mod workspaces;

use axum::Json;
use axum::extract::OriginalUri;
use axum::http::Method;
use serde_json::{Value, json};

use crate::error::ApiError;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::RouteNotFound {
        method,
        path: uri.path().to_owned(),
    }
}
