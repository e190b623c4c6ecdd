//! Success side of the JSON envelope. Failures go through [`crate::error::AppError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// `{success: true, data}` with the given status.
pub fn data<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({ "success": true, "data": data }))).into_response()
}

/// `{success: true, message, data}` with the given status.
pub fn data_with_message<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (status, Json(json!({ "success": true, "message": message, "data": data }))).into_response()
}

/// `{success: true, message}` with the given status.
pub fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": true, "message": message }))).into_response()
}
