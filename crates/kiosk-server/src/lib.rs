//! # kiosk-server
//!
//! HTTP composition layer for the kiosk loader.
//!
//! This crate is a **thin composition layer** with no domain policy: it
//! receives object-created notifications over HTTP, hands them to the
//! dispatcher, and maps the outcome onto an HTTP response. All loader
//! semantics live in `kiosk-loader`.
//!
//! ## Endpoints
//!
//! ```text
//! GET  /health - Liveness check (always 200)
//! POST /events - Storage object-created notification
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use kiosk_loader::{Dispatcher, StorageEvent};

/// Shared application state for all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event dispatcher over the configured loader.
    pub dispatcher: Dispatcher,
}

/// Builds the application router.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/events", post(event_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

/// Storage notification body. Extra fields in the notification payload are
/// ignored; bucket and name are validated explicitly so a malformed payload
/// reports 400 rather than a deserialization error.
#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    bucket: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

async fn event_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EventPayload>,
) -> (StatusCode, String) {
    let (Some(bucket), Some(name)) = (payload.bucket, payload.name) else {
        error!("missing bucket or name in event data");
        return (
            StatusCode::BAD_REQUEST,
            "missing bucket or name in event data".to_string(),
        );
    };

    let outcome = state
        .dispatcher
        .handle(&StorageEvent { bucket, name })
        .await;

    let status =
        StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, outcome.message)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use std::sync::Arc;
    use tower::ServiceExt;

    use kiosk_core::storage::{MemoryBackend, StorageBackend};
    use kiosk_core::warehouse::MemoryWarehouse;
    use kiosk_loader::{Loader, LoaderConfig};
    use kiosk_test_utils::{archive_record, ndjson};

    fn test_config() -> LoaderConfig {
        LoaderConfig {
            bucket: "news-bucket".into(),
            root_prefix: "nyt-ingest".into(),
            staging_dataset: "staging".into(),
            metadata_dataset: "metadata".into(),
            prod_dataset: "prod".into(),
        }
    }

    async fn test_router() -> (Arc<MemoryBackend>, Router) {
        let storage = Arc::new(MemoryBackend::new());
        let warehouse = Arc::new(MemoryWarehouse::new());
        let loader = Loader::new(storage.clone(), warehouse, test_config());
        loader.ensure_tables().await.expect("ensure tables");
        let state = Arc::new(AppState {
            dispatcher: Dispatcher::new(loader),
        });
        (storage, router(state))
    }

    fn post_event(body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/events")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    #[tokio::test]
    async fn test_health() {
        let (_storage, router) = test_router().await;
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_event_loads_file() {
        let (storage, router) = test_router().await;
        let path = "nyt-ingest/archive_slim/2020/05.ndjson";
        storage
            .put(path, ndjson(&[archive_record("a1", "2020-05-03T00:00:00+0000")]))
            .await
            .unwrap();

        let response = router
            .oneshot(post_event(&serde_json::json!({
                "bucket": "news-bucket",
                "name": path,
                "contentType": "application/x-ndjson"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            "archive_slim loaded successfully"
        );
    }

    #[tokio::test]
    async fn test_event_missing_name_is_bad_request() {
        let (_storage, router) = test_router().await;

        let response = router
            .oneshot(post_event(&serde_json::json!({"bucket": "news-bucket"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_event_unmatched_path_is_ok() {
        let (_storage, router) = test_router().await;

        let response = router
            .oneshot(post_event(&serde_json::json!({
                "bucket": "news-bucket",
                "name": "nyt-ingest/other/x.ndjson"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_string(response).await,
            "file ignored (not a recognized prefix)"
        );
    }

    #[tokio::test]
    async fn test_event_malformed_most_popular_path_is_bad_request() {
        let (_storage, router) = test_router().await;

        let response = router
            .oneshot(post_event(&serde_json::json!({
                "bucket": "news-bucket",
                "name": "nyt-ingest/most_popular_slim/viewed_30.ndjson"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_event_load_failure_is_internal_error() {
        let (_storage, router) = test_router().await;

        let response = router
            .oneshot(post_event(&serde_json::json!({
                "bucket": "news-bucket",
                "name": "nyt-ingest/archive_slim/2099/01.ndjson"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
