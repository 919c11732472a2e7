use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::{JwtError, PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::database::Store;
use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::require_auth;
use crate::uploads::{UploadStore, URL_PREFIX};

/// Room for the text fields and multipart framing around an uploaded file
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Shared handles every handler can reach
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub uploads: UploadStore,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, JwtError> {
        let tokens = TokenService::from_config(&config.security)?;
        let uploads = UploadStore::new(config.uploads.upload_dir.clone());

        Ok(Self {
            config: Arc::new(config),
            store,
            uploads,
            tokens,
            passwords: PasswordHasher::new(),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/api/health", get(public::health))
        // Public auth routes
        .merge(auth_public_routes(&config))
        // Protected API
        .merge(protected_routes(state.clone()))
        // Uploaded files
        .nest_service(URL_PREFIX, ServeDir::new(state.uploads.root()))
        .fallback(not_found)
        // Global middleware
        .layer(middleware::map_response(method_mismatch_as_not_found))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(state)
}

fn auth_public_routes(config: &AppConfig) -> Router<AppState> {
    use public::auth;

    Router::new()
        .route(
            "/api/auth/register",
            post(auth::register_post)
                .layer(body_limit(config.uploads.max_photo_bytes)),
        )
        .route("/api/auth/login", post(auth::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, notes};

    let max_pdf_bytes = state.config.uploads.max_pdf_bytes;

    Router::new()
        .route("/api/auth/profile", get(auth::profile_get))
        .route(
            "/api/notes/upload-pdf",
            post(notes::upload_pdf_post)
                .layer(body_limit(max_pdf_bytes)),
        )
        .route("/api/notes/share-link", post(notes::share_link_post))
        .route("/api/notes", get(notes::notes_get))
        .route("/api/notes/type/:type", get(notes::notes_by_type_get))
        .route("/api/notes/my-notes", get(notes::my_notes_get))
        .route("/api/notes/:note_id", delete(notes::note_delete))
        // Applied only to matched routes so unknown paths still 404
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// Overflow surfaces as a multipart read error, which uploads map to a 400
fn body_limit(max_file_bytes: u64) -> DefaultBodyLimit {
    DefaultBodyLimit::max((max_file_bytes + MULTIPART_OVERHEAD_BYTES) as usize)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let allow_origin = if config.security.cors_origins.iter().any(|o| o == "*") {
        // Credentials forbid a literal wildcard, so echo the caller's origin
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(parse_origins(&config.security.cors_origins))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

fn parse_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect()
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// A known path with an unsupported method is just another unmatched route
async fn method_mismatch_as_not_found(response: Response) -> Response {
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return not_found().await.into_response();
    }
    response
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!("Handler panicked: {}", detail);

    ApiError::internal_server_error("Something went wrong!").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt; // for `oneshot`

    fn test_state() -> AppState {
        let mut config = AppConfig::development();
        config.uploads.upload_dir = std::env::temp_dir().join("share-me-router-tests");
        AppState::new(config, Arc::new(MemoryStore::new())).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn boom() -> &'static str {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn panics_become_generic_500() {
        let app: Router = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(handle_panic));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Something went wrong!");
    }

    #[tokio::test]
    async fn fallback_is_json_404() {
        let response = create_router(test_state())
            .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "Route not found");
    }

    #[tokio::test]
    async fn wrong_method_on_known_path_is_json_404() {
        let response = create_router(test_state())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Route not found");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_only() {
        let preflight = |origin: &'static str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/notes")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap()
        };

        let allowed = create_router(test_state())
            .oneshot(preflight("http://localhost:5173"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );

        let deployed = create_router(test_state())
            .oneshot(preflight("https://shareme-tau-one.vercel.app"))
            .await
            .unwrap();
        assert_eq!(
            deployed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://shareme-tau-one.vercel.app"
        );

        let denied = create_router(test_state())
            .oneshot(preflight("https://evil.example"))
            .await
            .unwrap();
        assert!(denied.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
