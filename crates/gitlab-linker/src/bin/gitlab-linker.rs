//! GitLab linker service binary.
//!
//! Standalone HTTP service receiving GitLab webhooks and linking referenced
//! tracker tickets to merge requests and commits.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gitlab_linker::config::{Config, LogFormat};
use gitlab_linker::{server, GitlabTokens, Linker, TrackerClient};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    init_tracing(&config)?;

    info!("Starting GitLab linker service...");

    let tracker = TrackerClient::new(
        &config.tracker_url,
        &config.tracker_token,
        &config.tracker_link_origin,
        config.tracker_timeout(),
    )
    .context("Failed to create tracker client")?;

    info!(
        tracker_url = %tracker.base_url(),
        link_origin = %config.tracker_link_origin,
        timeout_secs = config.tracker_timeout_secs,
        "Tracker client configured"
    );

    let gitlab_tokens = GitlabTokens::new(config.gitlab_tokens.iter().cloned());
    if gitlab_tokens.is_enabled() {
        info!(count = gitlab_tokens.len(), "GitLab token authorization enabled");
    } else {
        warn!("No GitLab tokens configured - webhook endpoint accepts any caller");
    }

    let state = server::AppState::new(gitlab_tokens, Linker::new(Arc::new(tracker)));
    let app = server::build_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(address = %addr, "GitLab linker listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("GitLab linker stopped");
    Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log level")?;

    match config.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
