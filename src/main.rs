#![forbid(unsafe_code)]

//! `pushpin-bot`: reaction-driven pinning bot binary.
//!
//! Bootstraps configuration, identifies the bot user, starts the Slack
//! Socket Mode listener and the health endpoint, then waits for a shutdown
//! signal.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use pushpin_bot::config::GlobalConfig;
use pushpin_bot::health;
use pushpin_bot::platform::ChatPlatform;
use pushpin_bot::slack::client::SlackService;
use pushpin_bot::{AppError, AppState, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "pushpin-bot", about = "Reaction-driven Slack pin bot", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the health endpoint port.
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("pushpin-bot bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match &args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    if let Some(port) = args.port {
        config.http_port = port;
    }

    // Load Slack credentials from keyring / env vars.
    config.load_credentials().await?;

    let config = Arc::new(config);
    info!(
        marker = %config.slack.marker_emoji,
        list_command = %config.slack.list_command,
        "configuration loaded"
    );

    // ── Health endpoint ─────────────────────────────────
    let ct = CancellationToken::new();
    let health_ct = ct.clone();
    let port = config.http_port;
    let health_handle = tokio::spawn(async move {
        if let Err(err) = health::serve(port, health_ct).await {
            error!(%err, "health server failed");
        }
    });

    // ── Slack ───────────────────────────────────────────
    let slack = Arc::new(SlackService::new(&config.slack).map_err(|err| {
        error!(%err, "slack service init failed");
        err
    })?);
    let identity = slack.identify().await?;

    let platform: Arc<dyn ChatPlatform> = Arc::clone(&slack) as Arc<dyn ChatPlatform>;
    let state = Arc::new(AppState::new(
        Arc::clone(&config),
        platform,
        Some(Arc::clone(&slack)),
        identity.user_id,
    ));

    let socket_handle = slack.spawn_socket_mode(Arc::clone(&state));
    info!("pushpin-bot ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();
    socket_handle.abort();

    // Let posted notices finish their delete step.
    state.notifier.drain().await;

    let _ = health_handle.await;
    info!("pushpin-bot shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
