//! HTTP liveness endpoints for container platforms.
//!
//! `GET /` and `GET /health` answer as soon as the process is up; they do
//! not depend on the Slack connection.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{AppError, Result};

/// Service name reported by the health endpoints.
pub const SERVICE_NAME: &str = "pushpin-bot";

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    /// Always `healthy` while the process serves requests.
    pub status: String,
    /// Service name.
    pub service: String,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotStatus {
    /// Human-readable state.
    pub message: String,
    /// What the bot does.
    pub function: String,
    /// Port the health server listens on.
    pub port: u16,
    /// Seconds since the health server started.
    pub uptime_secs: u64,
}

#[derive(Clone)]
struct HealthState {
    started_at: Instant,
    port: u16,
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Pushpin bot server is online.",
        "status": "running",
        "bot": SERVICE_NAME,
    }))
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".into(),
        service: SERVICE_NAME.into(),
    })
}

async fn status(State(state): State<HealthState>) -> Json<BotStatus> {
    Json(BotStatus {
        message: "Bot is running".into(),
        function: "Pin messages with the pushpin reaction".into(),
        port: state.port,
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// Build the health router reporting `port` on `/status`.
#[must_use]
pub fn router(port: u16) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/status", get(status))
        .with_state(HealthState {
            started_at: Instant::now(),
            port,
        })
}

/// Bind `0.0.0.0:port` and serve until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if the port cannot be bound or the server fails.
pub async fn serve(port: u16, ct: CancellationToken) -> Result<()> {
    let bind = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Io(format!("failed to bind health server on {bind}: {err}")))?;
    serve_listener(listener, ct).await
}

/// Serve on an already-bound listener until `ct` is cancelled.
///
/// # Errors
///
/// Returns `AppError::Io` if the server fails.
pub async fn serve_listener(listener: TcpListener, ct: CancellationToken) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "starting health server");

    axum::serve(listener, router(addr.port()))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Io(format!("health server error: {err}")))?;

    info!("health server shut down");
    Ok(())
}
