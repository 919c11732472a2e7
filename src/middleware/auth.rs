use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;

/// Authenticated user resolved from the bearer token, injected into request extensions
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// JWT authentication middleware: validates the bearer token, loads the user
/// it names, and attaches that user to the request.
///
/// Every rejection produces the same 401 body; the reason is only logged.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers())
        .map(str::to_owned)
        .map_err(|reason| {
            debug!("Authentication rejected: {}", reason);
            ApiError::unauthorized()
        })?;

    let claims = state.tokens.verify(&token).map_err(|e| {
        debug!("Authentication rejected: {}", e);
        ApiError::unauthorized()
    })?;

    let user = state
        .store
        .find_user_by_id(claims.user_id)
        .await?
        .ok_or_else(|| {
            debug!("Authentication rejected: user {} no longer exists", claims.user_id);
            ApiError::unauthorized()
        })?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or("missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Authorization header is not valid UTF-8")?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or("Authorization header must use Bearer token format")?
        .trim();

    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(token)
}
