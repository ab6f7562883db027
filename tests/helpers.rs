//! Shared fixtures for the integration tests
#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use stock_backend::clock::{FixedClock, SharedClock};
use stock_backend::database::run_migrations;
use stock_backend::models::Company;
use stock_backend::pricing::{Price, PRICE_SCALE};
use stock_backend::storage::{FileStorage, LocalDiskStorage};
use stock_backend::{AppConfig, AppState};
use tempfile::TempDir;

/// In-memory SQLite pool with migrations applied
///
/// A single connection keeps the in-memory database alive and shared for
/// the whole test.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    run_migrations(&pool, Some("./migrations")).await.unwrap();

    pool
}

/// Deterministic clock pinned to 2024-05-10 12:00:00 UTC
pub fn fixed_clock() -> SharedClock {
    Arc::new(FixedClock::at(
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
    ))
}

/// Fully wired application state over an in-memory database and a
/// temp-dir import disk; the TempDir must outlive the state
pub async fn test_state(chunk_size: usize) -> (AppState, TempDir) {
    let pool = test_pool().await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = AppConfig::default();
    config.import.chunk_size = chunk_size;
    config.import.disk_root = dir.path().display().to_string();

    let storage: Arc<dyn FileStorage> = Arc::new(LocalDiskStorage::new(dir.path()));
    let state = AppState::with_parts(pool, config, fixed_clock(), storage);

    (state, dir)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub async fn create_company(state: &AppState, name: &str, symbol: &str) -> Company {
    state
        .companies
        .create(name, symbol, state.clock.now().naive_utc())
        .await
        .unwrap()
}

/// Insert one price directly, bypassing the import pipeline
pub async fn seed_price(state: &AppState, company_id: i64, traded_on: NaiveDate, amount: &str) {
    let minor = Price::from_str_amount(amount)
        .unwrap()
        .to_minor(PRICE_SCALE)
        .unwrap();

    sqlx::query(
        r#"
        INSERT INTO stock_prices (company_id, traded_on, price)
        VALUES (?, ?, ?)
        ON CONFLICT (company_id, traded_on) DO UPDATE SET price = excluded.price
        "#,
    )
    .bind(company_id)
    .bind(traded_on)
    .bind(minor)
    .execute(state.database.pool())
    .await
    .unwrap();
}

/// Build a spreadsheet body from (date, price) cells
pub fn csv_bytes(rows: &[(&str, &str)]) -> Vec<u8> {
    let mut body = String::from("Date,Stock Price\n");
    for (traded_on, price) in rows {
        body.push_str(traded_on);
        body.push(',');
        body.push_str(price);
        body.push('\n');
    }
    body.into_bytes()
}
