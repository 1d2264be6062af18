use std::net::SocketAddr;
use anyhow::Context;
use axum::Router;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use medical_forms_api::{create_app, AppConfig};
use medical_forms_data::database::{connect, DatabaseConfig, DatabaseType};
use medical_forms_data::repository::{InMemoryMedicalRecordRepository, MongoMedicalRecordRepository};

/// The main entry point for the MedicalForms API server
///
/// Loads `.env`, sets up tracing, connects the configured document store,
/// then serves until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    // Initialize tracing for structured logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(false)
            .with_timer(fmt::time::uptime())
            .with_writer(std::io::stdout))
        .with(env_filter)
        .init();

    info!("Starting MedicalForms API server");

    let app_config = AppConfig::from_env().context("invalid server configuration")?;
    let db_config = DatabaseConfig::from_env().context("invalid database configuration")?;

    let app = build_app(&app_config, &db_config).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], app_config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Build the router over the repository selected by `DB_TYPE`
async fn build_app(app_config: &AppConfig, db_config: &DatabaseConfig) -> anyhow::Result<Router> {
    match db_config.db_type {
        DatabaseType::MongoDb => {
            let database = connect(db_config)
                .await
                .context("failed to set up the MongoDB client")?;
            info!(
                "Using MongoDB collection {}.{}",
                db_config.database, db_config.collection
            );
            let repository = MongoMedicalRecordRepository::new(database, db_config);
            Ok(create_app(repository, app_config))
        }
        DatabaseType::Memory => {
            info!("Using in-memory store; records are lost on shutdown");
            Ok(create_app(InMemoryMedicalRecordRepository::new(), app_config))
        }
    }
}

/// Resolves when Ctrl+C or SIGTERM (Unix) is received
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down server...");
}
