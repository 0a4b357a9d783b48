pub mod models;
pub mod store;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::{DB_BUSY_TIMEOUT_SECS, DB_MAX_CONNECTIONS};
use crate::error::Result;

pub use store::JobStore;

/// Open (creating if needed) the SQLite database and run migrations.
///
/// Connections are checked out per operation; WAL lets readers proceed while a
/// worker holds the write lock.
pub async fn connect(db_path: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(DB_BUSY_TIMEOUT_SECS));

    let pool = SqlitePoolOptions::new()
        .max_connections(DB_MAX_CONNECTIONS)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", db_path);
    Ok(pool)
}

/// On-disk size of the main database file (`page_count * page_size`).
pub async fn database_size(pool: &SqlitePool) -> Result<u64> {
    let (pages,): (i64,) = sqlx::query_as("PRAGMA page_count").fetch_one(pool).await?;
    let (page_size,): (i64,) = sqlx::query_as("PRAGMA page_size").fetch_one(pool).await?;
    Ok((pages.max(0) as u64) * (page_size.max(0) as u64))
}

/// Current time as unix seconds, the unit every timestamp column uses.
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Fresh database in a temp dir; keep the guard alive for the test's duration.
    pub async fn temp_pool() -> (SqlitePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = connect(path.to_str().unwrap()).await.unwrap();
        (pool, dir)
    }
}
