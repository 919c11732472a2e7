// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::app::AppState;
use crate::database::models::normalize_email;
use crate::error::ApiError;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/**
 * POST /api/auth/login - Authenticate and receive a bearer token
 *
 * Input: `{ "email": "...", "password": "..." }`
 * Output: `{ success, message, data: { user, token } }`
 *
 * Unknown email and wrong password produce the same 401 body after the
 * same Argon2 work, so neither the response nor its timing reveals which
 * emails are registered.
 */
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let mut request = json_body(payload)?;
    request.email = normalize_email(&request.email);
    request.validate()?;

    let Some(user) = state.store.find_user_by_email(&request.email).await? else {
        state.passwords.verify_dummy(&request.password);
        tracing::info!("Login failed: no account for {}", request.email);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let password_ok = state
        .passwords
        .verify_password(&request.password, &user.password_hash)
        .unwrap_or_else(|e| {
            tracing::error!("Stored password hash for user {} is unusable: {}", user.id, e);
            false
        });

    if !password_ok {
        tracing::info!("Login failed: wrong password for user {}", user.id);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.tokens.issue(user.id)?;
    tracing::info!("User {} logged in", user.id);

    Ok(ApiResponse::success(json!({ "user": user, "token": token })).with_message("Login successful"))
}
