//! Almanac REST API
//!
//! HTTP API layer for Almanac, built with Axum.
//!
//! # Endpoints
//!
//! - `GET /` - Welcome message
//!
//! ## Questions
//! - `POST /api/v1/ask` - Answer a question about cultural events
//!
//! ## Operations
//! - `POST /api/v1/rebuild` - Refetch the agenda and rebuild the index
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe (503 until an index is serving)
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use almanac::api::{serve, AppState};
//! use almanac::config::Config;
//! use almanac::rag::Services;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let services = Services::from_config(&config)?;
//!     services.rebuilder.load_persisted().await;
//!
//!     let state = AppState::new(services, config.api.clone());
//!     serve(state, &config.api).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let ask_timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config.cors_origins);

    let api_routes = Router::new()
        .route(
            "/ask",
            post(routes::ask::ask).layer(TimeoutLayer::new(ask_timeout)),
        )
        .route("/rebuild", post(routes::rebuild::rebuild));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::welcome::welcome))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive when no origin is configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Almanac API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Almanac API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rag::Services;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.catalog.data_dir = dir.path().to_string_lossy().to_string();
        config.source.mock = true;

        let services = Services::from_config(&config).unwrap();
        let router = build_router(AppState::new(services, config.api.clone()));

        (router, dir)
    }

    async fn get(app: &Router, uri: &str) -> Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(app: &Router, uri: &str, body: &str) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_welcome() {
        let (app, _dir) = create_test_app();

        let response = get(&app, "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert!(body["message"].as_str().unwrap().starts_with("Bienvenue"));
    }

    #[tokio::test]
    async fn test_health_live() {
        let (app, _dir) = create_test_app();
        assert_eq!(get(&app, "/health/live").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_follows_index() {
        let (app, _dir) = create_test_app();

        assert_eq!(
            get(&app, "/health/ready").await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let rebuild = post_json(&app, "/api/v1/rebuild", "").await;
        assert_eq!(rebuild.status(), StatusCode::OK);
        let body = json_body(rebuild).await;
        assert_eq!(body["report"]["events"], 1);
        assert!(body["message"].as_str().unwrap().contains("reconstruit avec succès"));

        assert_eq!(get(&app, "/health/ready").await.status(), StatusCode::OK);

        let health = json_body(get(&app, "/health").await).await;
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["chunks"], 1);
    }

    #[tokio::test]
    async fn test_ask_empty_question() {
        let (app, _dir) = create_test_app();

        let response = post_json(&app, "/api/v1/ask", r#"{"question": "   "}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_ask_before_rebuild() {
        let (app, _dir) = create_test_app();

        let response = post_json(&app, "/api/v1/ask", r#"{"question": "Que faire ce week-end ?"}"#).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let greeting = post_json(&app, "/api/v1/ask", r#"{"question": "Bonjour !"}"#).await;
        assert_eq!(greeting.status(), StatusCode::OK);
        let body = json_body(greeting).await;
        assert_eq!(body["intent"]["kind"], "greeting");
        assert_eq!(body["sources"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_ask_after_rebuild() {
        let (app, _dir) = create_test_app();
        post_json(&app, "/api/v1/rebuild", "").await;

        let response = post_json(
            &app,
            "/api/v1/ask",
            r#"{"question": "Un atelier de cuisine sauvage ?"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["intent"]["kind"], "any_future");
        assert!(body["intent"]["end_ts"].is_null());
        assert_eq!(body["sources"][0]["url"], "http://mock.url");
        assert!(body["answer"]
            .as_str()
            .unwrap()
            .contains("Atelier Cuisine Sauvage Mock"));
    }

    #[tokio::test]
    async fn test_ask_invalid_json() {
        let (app, _dir) = create_test_app();
        let response = post_json(&app, "/api/v1/ask", "not json").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
