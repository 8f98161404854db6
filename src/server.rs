//! HTTP server exposing the activity tracker.
//!
//! Routes:
//! - `GET /` returns cached stats for every entity
//! - `GET /:thing` returns cached stats for one entity
//! - `POST /:thing` records `{"activities": [...]}` and refreshes its stats
//!
//! Queries never trigger recomputation; only an ingest does.

use crate::store::{create_shared_tracker, EntityStats, SharedTracker};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: IpAddr,
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self { host, port }
    }
}

impl From<&crate::config::Config> for ServerConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self::new(config.host, config.port)
    }
}

/// Ingest request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// Activity kinds, one event per entry
    pub activities: Vec<String>,
}

/// Response from ingest endpoint
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub status: String,
    pub recorded: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: String) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error,
            code: code.to_string(),
        }),
    )
}

/// GET /
async fn list_stats(State(tracker): State<SharedTracker>) -> Json<BTreeMap<String, EntityStats>> {
    Json(tracker.all_stats())
}

/// GET /:thing
async fn get_thing(
    State(tracker): State<SharedTracker>,
    Path(name): Path<String>,
) -> Result<Json<EntityStats>, ApiError> {
    tracker.stats(&name).map(Json).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("No stats recorded for '{}'", name),
        )
    })
}

/// POST /:thing
///
/// The body is decoded by hand so that content-type and shape errors are
/// reported separately and nothing is recorded for a rejected request.
async fn post_thing(
    State(tracker): State<SharedTracker>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    if !is_json(&headers) {
        tracing::warn!("Rejected ingest for {:?}: not application/json", name);
        return Err(api_error(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UNSUPPORTED_MEDIA_TYPE",
            "expected application/json".to_string(),
        ));
    }

    let request: IngestRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Rejected ingest for {:?}: {}", name, e);
        api_error(
            StatusCode::BAD_REQUEST,
            "MALFORMED_INPUT",
            format!("Invalid ingest payload: {}", e),
        )
    })?;

    let recorded = tracker.ingest(&name, &request.activities);

    Ok(Json(IngestResponse {
        status: "ok".to_string(),
        recorded,
    }))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .map(|value| value.as_bytes() == b"application/json")
        .unwrap_or(false)
}

/// Build the router over an existing tracker.
pub fn create_router(tracker: SharedTracker) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(list_stats))
        .route("/:thing", get(get_thing).post(post_thing))
        .layer(cors)
        .with_state(tracker)
}

/// Run the HTTP server with a fresh tracker.
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = create_router(create_shared_tracker());

    let addr = SocketAddr::new(config.host, config.port);
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Reckoning server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
