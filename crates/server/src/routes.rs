//! HTTP API

use crate::error::{ServerError, ServerResult};
use crate::reconciler::SnapshotReconciler;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderValue, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use mastermind_config::ServerConfig;
use mastermind_core::SnapshotError;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Builds the router
///
/// - `GET /health`: liveness probe used by client connectivity checks
/// - `POST /{collection}`: reconcile the collection against a JSON array snapshot
/// - `GET /{collection}`: stored records in insertion order
///
/// Request bodies above `config.max_body_bytes` get 413. Browsers on
/// `config.allowed_origins` may call every route.
pub fn build_router(reconciler: Arc<SnapshotReconciler>, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/{collection}", get(list_collection).post(reconcile_collection))
        .with_state(reconciler)
        .layer(DefaultBodyLimit::max(config.max_body_bytes));

    match cors_layer(&config.allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring allowed origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

async fn health() -> &'static str {
    "ok"
}

async fn list_collection(
    State(reconciler): State<Arc<SnapshotReconciler>>,
    Path(collection): Path<String>,
) -> ServerResult<Json<Vec<Value>>> {
    Ok(Json(reconciler.list(&collection).await?))
}

async fn reconcile_collection(
    State(reconciler): State<Arc<SnapshotReconciler>>,
    Path(collection): Path<String>,
    Json(snapshot): Json<Value>,
) -> ServerResult<StatusCode> {
    let Value::Array(records) = snapshot else {
        return Err(ServerError::InvalidSnapshot(
            SnapshotError::NotAnArray.to_string(),
        ));
    };

    reconciler.reconcile(&collection, records).await?;
    Ok(StatusCode::OK)
}
