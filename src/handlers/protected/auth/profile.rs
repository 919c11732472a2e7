// handlers/protected/auth/profile.rs - GET /api/auth/profile handler

use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, CurrentUser};

/// GET /api/auth/profile - the user the bearer token resolves to
pub async fn profile_get(Extension(CurrentUser(user)): Extension<CurrentUser>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "user": user })))
}
