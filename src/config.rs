use std::time::Duration;

use crate::error::{AppError, Result};

pub const ODDS_API_URL: &str = "https://api.the-odds-api.com/v4";

/// Batches at or below this size are processed inline by the submit call.
pub const SYNC_BATCH_LIMIT: usize = 20;

/// Snapshots older than this are treated as cache misses.
pub const SNAPSHOT_FRESHNESS_DAYS: i64 = 7;

/// Upper bound accepted for cache retention (CACHE_RETENTION_DAYS, clear-cache requests).
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Failure-log rows are kept this long regardless of the cache retention.
pub const FAILURE_RETENTION_DAYS: i64 = 7;

/// Rough memory cost of one per-job worker (fetch + decode of a league snapshot).
pub const WORKER_MEMORY_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Unmatched league log keeps only the most recent entries.
pub const UNMATCHED_LOG_CAPACITY: usize = 1000;

/// Cache janitor interval (seconds). Cleanup runs once a day.
pub const CLEANUP_INTERVAL_SECS: u64 = 24 * 3600;

/// Upper bound on pooled SQLite connections.
pub const DB_MAX_CONNECTIONS: u32 = 8;

/// SQLite busy timeout (seconds).
pub const DB_BUSY_TIMEOUT_SECS: u64 = 5;

/// Confidence attached to each fallback tier.
pub mod confidence {
    pub const EXACT: f64 = 0.95;
    pub const REFERENCE: f64 = 0.85;
    pub const WEIGHTED_AVG: f64 = 0.70;
}

/// Match-score thresholds used when pairing a bet with a snapshot event.
pub mod match_thresholds {
    /// Each side (home, away) must reach this on its own.
    pub const TEAM_SIDE_MIN: f64 = 0.75;
    /// Average of both sides must reach this.
    pub const EVENT_MIN: f64 = 0.5;
    /// Fuzzy tournament → alias matching in the league classifier.
    pub const TOURNAMENT_FUZZY_MIN: f64 = 0.7;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_host: String,
    pub api_port: u16,
    /// Ceiling for concurrent per-job workers (MAX_CONCURRENCY)
    pub max_concurrency: usize,
    /// Snapshot rows older than this are removed by cleanup (CACHE_RETENTION_DAYS)
    pub cache_retention_days: i64,
    /// Scheduler poll interval (POLL_INTERVAL_SECS)
    pub poll_interval: Duration,
    /// Deadline for one external snapshot fetch (FETCH_TIMEOUT_SECS)
    pub fetch_timeout: Duration,
    /// The Odds API key (THE_ODDS_API_KEY). The backend is disabled when empty.
    pub odds_api_key: Option<String>,
    pub odds_api_url: String,
    /// JSON file holding user-edited tournament → league overrides (CUSTOM_MAPPINGS_PATH)
    pub custom_mappings_path: String,
    /// JSON file the unmatched league log is persisted to (UNMATCHED_LOG_PATH)
    pub unmatched_log_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "clv_cache.db".to_string()),
            api_host: std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "8765".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            max_concurrency: std::env::var("MAX_CONCURRENCY")
                .unwrap_or_else(|_| "3".to_string())
                .parse::<usize>()
                .map_err(|_| AppError::Config("MAX_CONCURRENCY must be a positive integer".to_string()))?
                .max(1),
            cache_retention_days: std::env::var("CACHE_RETENTION_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<i64>()
                .unwrap_or(30)
                .clamp(0, MAX_RETENTION_DAYS),
            poll_interval: Duration::from_secs(
                std::env::var("POLL_INTERVAL_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse::<u64>()
                    .unwrap_or(30),
            ),
            fetch_timeout: Duration::from_secs(
                std::env::var("FETCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse::<u64>()
                    .unwrap_or(120),
            ),
            odds_api_key: std::env::var("THE_ODDS_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            odds_api_url: std::env::var("ODDS_API_URL").unwrap_or_else(|_| ODDS_API_URL.to_string()),
            custom_mappings_path: std::env::var("CUSTOM_MAPPINGS_PATH")
                .unwrap_or_else(|_| "custom_league_mappings.json".to_string()),
            unmatched_log_path: std::env::var("UNMATCHED_LOG_PATH")
                .unwrap_or_else(|_| "unmapped_leagues.json".to_string()),
        })
    }
}
