// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, sync::Arc, time::Duration};

use axum_server::tls_rustls::RustlsConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use walletscan_server::{
    api::router,
    config::{AppConfig, LogFormat, TlsConfig, DEFAULT_LOG_FILTER},
    portfolio::{PortfolioError, PortfolioService},
    providers::{StripeClient, StripeError},
    state::AppState,
    storage::{Database, SessionSweeper, StorageError},
};

/// In-flight requests get this long to finish once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("invalid bind address {0}")]
    BindAddress(String),

    #[error("failed to create data directory: {0}")]
    DataDir(std::io::Error),

    #[error("failed to open database: {0}")]
    Database(#[from] StorageError),

    #[error("failed to build indexer clients: {0}")]
    Indexers(#[from] PortfolioError),

    #[error("failed to build payment client: {0}")]
    Payments(#[from] StripeError),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn serve_tls(
    addr: SocketAddr,
    app: axum::Router,
    tls: &TlsConfig,
) -> Result<(), StartupError> {
    // Must happen before any rustls config is built.
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| StartupError::Tls("crypto provider already installed".to_string()))?;

    let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| StartupError::Tls(e.to_string()))?;

    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    info!(%addr, "WalletScan server listening on https (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn serve_plain(addr: SocketAddr, app: axum::Router) -> Result<(), StartupError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "WalletScan server listening on http (docs at /docs)");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn run(config: AppConfig) -> Result<(), StartupError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| StartupError::BindAddress(format!("{}:{}", config.host, config.port)))?;

    std::fs::create_dir_all(&config.data_dir).map_err(StartupError::DataDir)?;
    let db = Arc::new(Database::open(&config.database_path())?);
    info!(path = %config.database_path().display(), "Database opened");

    let portfolio = Arc::new(PortfolioService::from_config(&config.indexers)?);
    let payments = Arc::new(StripeClient::new(&config.stripe)?);

    let shutdown = CancellationToken::new();
    let sweeper = SessionSweeper::new(
        db.clone(),
        config.session_ttl,
        config.session_sweep_interval,
    );
    let sweeper_task = tokio::spawn(sweeper.run(shutdown.clone()));

    let tls = config.tls.clone();
    let app = router(AppState::new(config, db, portfolio, payments));

    let served = match tls {
        Some(tls) => serve_tls(addr, app, &tls).await,
        None => serve_plain(addr, app).await,
    };

    shutdown.cancel();
    if let Err(e) = sweeper_task.await {
        error!(error = %e, "Session sweeper task panicked");
    }
    served
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = AppConfig::from_env();
    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => {
            info!("WalletScan server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "WalletScan server failed");
            ExitCode::FAILURE
        }
    }
}
