// handlers/mod.rs - Two-tier handler architecture
//
// Public (no auth) → Protected (bearer token required). The tier a handler
// lives in decides which middleware the router wraps it with.
pub mod public; // /api/health, /api/auth/register, /api/auth/login
pub mod protected; // /api/auth/profile, /api/notes/*

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::Multipart;
use axum::Json;

use crate::error::ApiError;

/// Unwrap a JSON body, turning axum's plain-text rejection into our JSON error
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::invalid_json(rejection.body_text()))
}

/// Same as `json_body` for multipart forms, e.g. a JSON body sent to an upload route
pub(crate) fn multipart_body(payload: Result<Multipart, MultipartRejection>) -> Result<Multipart, ApiError> {
    payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}
