//! Stock performance backend library
//!
//! Spreadsheet-driven stock price ingestion plus performance analytics:
//! uploaded price histories are sanitized, chunked, and ingested in the
//! background, then served as cached multi-period performance summaries.

pub mod api;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod importer;
pub mod models;
pub mod pricing;
pub mod repositories;
pub mod scheduler;
pub mod services;
pub mod storage;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use auth::AuthService;
use clock::{SharedClock, SystemClock};
use database::Database;
use importer::ImportService;
use repositories::*;
use services::PerformanceService;
use sqlx::SqlitePool;
use std::sync::Arc;
use storage::{FileStorage, LocalDiskStorage};

/// Application state containing all repositories and services
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub config: AppConfig,
    pub clock: SharedClock,
    pub companies: Arc<CompanyRepository>,
    pub imports: Arc<StockImportRepository>,
    pub prices: Arc<StockPriceRepository>,
    pub users: Arc<UserRepository>,
    pub tokens: Arc<ApiTokenRepository>,
    pub auth: Arc<AuthService>,
    pub importer: Arc<ImportService>,
    pub performance: Arc<PerformanceService>,
}

impl AppState {
    /// Create a new AppState with the wall clock and the configured local
    /// import disk
    pub fn new(pool: SqlitePool, config: AppConfig) -> Self {
        let storage: Arc<dyn FileStorage> =
            Arc::new(LocalDiskStorage::new(config.import.disk_root.clone()));
        Self::with_parts(pool, config, Arc::new(SystemClock), storage)
    }

    /// Create an AppState with explicit clock and storage (test seam)
    pub fn with_parts(
        pool: SqlitePool,
        config: AppConfig,
        clock: SharedClock,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        let database = Database::new(pool.clone());

        let companies = Arc::new(CompanyRepository::new(pool.clone()));
        let imports = Arc::new(StockImportRepository::new(pool.clone()));
        let prices = Arc::new(StockPriceRepository::new(pool.clone()));
        let users = Arc::new(UserRepository::new(pool.clone()));
        let tokens = Arc::new(ApiTokenRepository::new(pool));

        let auth = Arc::new(AuthService::new(
            users.clone(),
            tokens.clone(),
            clock.clone(),
        ));
        let importer = Arc::new(ImportService::new(
            companies.clone(),
            imports.clone(),
            prices.clone(),
            storage,
            clock.clone(),
            config.import.clone(),
        ));
        let performance = Arc::new(PerformanceService::new(
            prices.clone(),
            config.reporting.cache_ttl(),
        ));

        Self {
            database,
            config,
            clock,
            companies,
            imports,
            prices,
            users,
            tokens,
            auth,
            importer,
            performance,
        }
    }
}
