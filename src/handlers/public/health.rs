use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/health - liveness plus a store round-trip
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Share Me API is running",
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            let err = ApiError::service_unavailable("database unavailable");
            let mut body = err.to_json();
            body["data"] = json!({
                "status": "degraded",
                "timestamp": now,
                "database": "unavailable"
            });
            (err.status_code(), Json(body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::{DatabaseManager, PgStore};
    use axum::body::to_bytes;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn unreachable_database_is_a_503_error_envelope() {
        let db = DatabaseManager::new("postgres://user:pw@127.0.0.1:1/share_me", 1, Duration::from_millis(200));
        let mut config = AppConfig::development();
        config.uploads.upload_dir = std::env::temp_dir().join("share-me-health-tests");
        let state = AppState::new(config, Arc::new(PgStore::new(db))).unwrap();

        let response = health(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
        assert_eq!(body["message"], "database unavailable");
        assert_eq!(body["data"]["database"], "unavailable");
    }
}
