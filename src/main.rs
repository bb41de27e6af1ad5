//! Readthrough Cache - admin server
//!
//! Runs a coordinator over the in-memory backend and exposes its statistics
//! and invalidation operations over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use readthrough_cache::api::{create_router, AppState};
use readthrough_cache::{spawn_cleanup_task, CacheCoordinator, Config, MemoryBackend};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the backend and the coordinator over it
/// 4. Start background TTL cleanup task
/// 5. Serve the admin router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "readthrough_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Readthrough Cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, max_value_size={}B, port={}, cleanup_interval={}s, fetch_timeout={:?}",
        config.max_entries,
        config.max_value_size,
        config.server_port,
        config.cleanup_interval,
        config.fetch_timeout
    );
    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN not set, flushing over HTTP is disabled");
    }

    let backend = Arc::new(MemoryBackend::new(config.max_entries));
    let cache = CacheCoordinator::with_config(backend.clone(), config.coordinator());
    info!("Cache coordinator initialized");

    let cleanup_handle = spawn_cleanup_task(backend, config.cleanup_interval);

    let app = create_router(AppState::new(cache, config.admin_token.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the cleanup task.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
