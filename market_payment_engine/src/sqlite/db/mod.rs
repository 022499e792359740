//! # SQLite Database methods
//!
//! Low-level SQLite interactions. These are plain functions that accept a `&mut SqliteConnection`, so callers can
//! hand them a pooled connection or the inside of a transaction (`&mut tx`) without any other changes.
use std::env;

use log::*;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod card_receipts;
pub mod orders;
pub mod payments;
pub mod receipts;

const SQLITE_DB_URL: &str = "sqlite://data/market_store.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub fn db_url() -> String {
    let result = env::var("MPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("🪛️ MPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🪛️ Using database URL: {result}");
    result
}

pub fn max_connections() -> u32 {
    env::var("MPG_DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| {
            s.parse::<u32>()
                .map_err(|e| warn!("🪛️ {s} is not a valid value for MPG_DB_MAX_CONNECTIONS. {e}. Using the default."))
                .ok()
        })
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
