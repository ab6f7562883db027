//! Stock Performance Backend Service
//!
//! Main entry point for the stock performance backend. This service
//! provides:
//! - Background ingestion of uploaded stock price spreadsheets
//! - Multi-period performance summaries with TTL caching
//! - A token-authenticated HTTP API

use anyhow::Context;
use stock_backend::database::{create_pool, run_migrations};
use stock_backend::{api, AppConfig, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Configuration error")?;

    // Initialize tracing/logging with config
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("stock_backend={},sqlx=warn,tower_http=info", config.log_level).into()
            }),
        )
        .init();

    info!("Stock performance backend starting");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("HTTP port: {}", config.http_port);
    info!("Import disk root: {}", config.import.disk_root);
    info!("Import chunk size: {}", config.import.chunk_size);

    // Database setup
    info!("Connecting to database...");

    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    info!("Running database migrations...");
    run_migrations(&pool, None)
        .await
        .context("Database migration failed")?;

    info!("Database migrations completed successfully");

    // Wire repositories and services, then serve until shutdown
    let state = AppState::new(pool, config.clone());

    api::serve(state, config.http_port)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
