//! SQLite pool construction and schema bootstrap.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Default maximum connections for file-backed databases.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS devices (
        id          TEXT PRIMARY KEY NOT NULL,
        name        TEXT NOT NULL,
        kind        TEXT NOT NULL,
        api_key     TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sensor_readings (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        device_id     TEXT NOT NULL,
        metric_name   TEXT NOT NULL,
        metric_value  REAL NOT NULL,
        timestamp     TEXT NOT NULL
    )",
];

/// Create a pool and make sure both tables exist.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Like [`create_pool`] with an explicit connection cap.
///
/// In-memory databases live and die with their connection, so `:memory:`
/// and `mode=memory` URLs always get a single connection that is never
/// recycled.
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool_options = if is_in_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    let pool = pool_options.connect_with(options).await?;
    bootstrap_schema(&pool).await?;

    tracing::debug!("Database pool ready ({})", database_url);
    Ok(pool)
}

fn is_in_memory(database_url: &str) -> bool {
    if database_url.contains(":memory:") {
        return true;
    }
    database_url
        .split_once('?')
        .map(|(_, query)| query.split('&').any(|param| param == "mode=memory"))
        .unwrap_or(false)
}

async fn bootstrap_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
