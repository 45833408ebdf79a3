//! # Shopdesk Billing Server
//!
//! ## Usage
//! ```bash
//! billing-api                          # platform config file, then env
//! billing-api --config ./billing.toml  # explicit config file
//! RUST_LOG=debug billing-api           # verbose logging
//! ```

use std::path::PathBuf;

use billing_api::config::BillingConfig;
use billing_api::services::notification::NotificationDispatcher;
use billing_api::{router, AppState};
use shopdesk_db::{Database, DbConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Shopdesk billing server...");

    // Load configuration
    let config = BillingConfig::load(config_path_from_args())?;
    info!(
        bind = %config.server.bind_address(),
        db_path = %config.database.path.display(),
        max_commit_attempts = config.sales.max_commit_attempts,
        "Configuration loaded"
    );

    // Connect to database (runs migrations)
    let db = Database::new(
        DbConfig::new(&config.database.path).max_connections(config.database.max_connections),
    )
    .await?;
    info!("Database ready");

    let dispatcher = NotificationDispatcher::from_settings(&config.notifications)?;

    let addr = config.server.bind_address();
    let state = AppState::new(db.clone(), config, dispatcher);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Billing server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopdesk=debug,billing_api=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// `--config <path>` / `-c <path>`.
fn config_path_from_args() -> Option<PathBuf> {
    let args: Vec<String> = std::env::args().collect();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" if i + 1 < args.len() => return Some(PathBuf::from(&args[i + 1])),
            _ => {}
        }
        i += 1;
    }

    None
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
