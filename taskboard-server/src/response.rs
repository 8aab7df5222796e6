use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope { success: true, data })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
    pub message: String,
}

pub fn deleted(entity: &str) -> Json<Deleted> {
    Json(Deleted {
        success: true,
        message: format!("{entity} deleted successfully"),
    })
}
