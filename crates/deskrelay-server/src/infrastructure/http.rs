//! HTTP surface of the relay: routes, handlers, and the serve loop.
//!
//! | Method & path                       | Handler          |
//! |-------------------------------------|------------------|
//! | `POST /api/session/{id}/image`      | [`post_image`]    |
//! | `GET  /api/session/{id}/image`      | [`get_image`]     |
//! | `POST /api/session/{id}/controls`   | [`post_controls`] |
//! | `GET  /api/session/{id}/controls`   | [`get_controls`]  |
//! | `GET  /api/session/{id}/stream`     | [`stream`]        |

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use deskrelay_core::ControlSnapshot;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use super::error::ApiError;
use crate::application::{frame_stream, stream_content_type, SessionRegistry};
use crate::domain::{sniff_content_type, ControlsBody, ControlsQuery, PostControlsBody, ServerConfig, StatusBody};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub config: Arc<ServerConfig>,
    /// Cleared on shutdown; open frame streams end when it is.
    pub running: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_running(config, Arc::new(AtomicBool::new(true)))
    }

    pub fn with_running(config: ServerConfig, running: Arc<AtomicBool>) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(config.control_queue_cap)),
            config: Arc::new(config),
            running,
        }
    }
}

/// Builds the relay router.
pub fn router(state: AppState) -> Router {
    let max_image_bytes = state.config.max_image_bytes;
    Router::new()
        .route(
            "/api/session/{id}/image",
            post(post_image)
                .get(get_image)
                .layer(DefaultBodyLimit::max(max_image_bytes)),
        )
        .route(
            "/api/session/{id}/controls",
            post(post_controls).get(get_controls),
        )
        .route("/api/session/{id}/stream", get(stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub(crate) async fn post_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Json<StatusBody> {
    state.registry.post_image(&id, body);
    Json(StatusBody::ok())
}

pub(crate) async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let image = state
        .registry
        .latest_image(&id)
        .ok_or_else(|| ApiError::NoImage(id))?;
    let content_type = sniff_content_type(&image);
    Ok(([(header::CONTENT_TYPE, content_type)], image).into_response())
}

pub(crate) async fn post_controls(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<PostControlsBody>, ApiError> {
    let snapshot = ControlSnapshot::from_slice(&body)?;
    let stored = state.registry.post_controls(&id, snapshot);
    let time = stored.time.unwrap_or_default();
    debug!(session = %id, time, "controls posted");
    Ok(Json(PostControlsBody::ok(time)))
}

pub(crate) async fn get_controls(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ControlsQuery>,
) -> Json<ControlsBody> {
    Json(ControlsBody {
        controls: state.registry.controls_since(&id, query.since),
    })
}

pub(crate) async fn stream(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    info!(session = %id, "viewer attached to frame stream");
    let frames = frame_stream(
        Arc::clone(&state.registry),
        id,
        state.config.frame_interval,
        Arc::clone(&state.running),
    );
    let mut response = Body::from_stream(frames).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&stream_content_type()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
    response
}

// ── Serve loop ────────────────────────────────────────────────────────────────

/// Binds the listener and serves the relay until `running` is cleared.
///
/// When `config.session_ttl` is set, an idle sweeper runs alongside the
/// server and stops with it.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (e.g., the port is
/// already in use or the process lacks permission to bind).
pub async fn run_server(config: ServerConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.bind_addr))?;

    info!("relay listening on {}", config.bind_addr);

    let state = AppState::with_running(config, Arc::clone(&running));

    if let Some(ttl) = state.config.session_ttl {
        tokio::spawn(sweep_idle_sessions(
            Arc::clone(&state.registry),
            ttl,
            Arc::clone(&running),
        ));
    }

    let shutdown_flag = Arc::clone(&running);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            while shutdown_flag.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            info!("shutdown flag set; draining connections");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Evicts sessions idle for `ttl`, every quarter TTL, until `running` clears.
async fn sweep_idle_sessions(registry: Arc<SessionRegistry>, ttl: Duration, running: Arc<AtomicBool>) {
    let mut ticker = tokio::time::interval(ServerConfig::sweep_interval(ttl));
    while running.load(Ordering::Relaxed) {
        ticker.tick().await;
        let evicted = registry.evict_idle(ttl);
        if evicted > 0 {
            info!(evicted, remaining = registry.len(), "idle sessions evicted");
        }
    }
}
