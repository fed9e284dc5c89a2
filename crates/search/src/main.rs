//! MeetPrep Search Service
//!
//! HTTP service answering "which earlier meetings relate to this one?" for
//! the briefing pipeline:
//! - Ranked previous-meeting search
//! - Legacy single-company search
//! - Diagnostics over the stored history

use anyhow::Context;
use meetprep_common::{config::AppConfig, metrics, VERSION};
use meetprep_search::{create_router, create_store, AppState};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration (APP_CONFIG points at an explicit file)
    let config = match std::env::var("APP_CONFIG") {
        Ok(path) => AppConfig::from_file(&path),
        Err(_) => AppConfig::load(),
    }
    .context("failed to load configuration")?;

    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting MeetPrep Search Service v{}", VERSION
    );

    let config = Arc::new(config);

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .with_http_listener(addr)
            .install()
            .context("failed to install Prometheus exporter")?;
        info!("Metrics exporter listening on {}", addr);
    }
    metrics::register_metrics();

    // Initialize candidate store
    info!(backend = %config.store.backend, "Opening candidate store...");
    let store = create_store(&config).await?;

    let state = AppState::new(config.clone(), store)?;
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if config.observability.json_logging {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
