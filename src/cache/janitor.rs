use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use super::SnapshotCache;
use crate::config::CLEANUP_INTERVAL_SECS;
use crate::league::UnmatchedLog;

/// Background task: daily cache cleanup plus flushing the unmatched league log.
pub struct CacheJanitor {
    cache: SnapshotCache,
    unmatched: Arc<UnmatchedLog>,
    retention_days: i64,
    interval: Duration,
}

impl CacheJanitor {
    pub fn new(cache: SnapshotCache, unmatched: Arc<UnmatchedLog>, retention_days: i64) -> Self {
        Self {
            cache,
            unmatched,
            retention_days,
            interval: Duration::from_secs(CLEANUP_INTERVAL_SECS),
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.tick().await; // consume immediate first tick

        loop {
            tokio::select! {
                _ = interval.tick() => self.sweep().await,
                _ = shutdown.changed() => break,
            }
        }

        if let Err(e) = self.unmatched.persist().await {
            error!("Failed to persist unmatched league log: {e}");
        }
        info!("Cache janitor stopped");
    }

    async fn sweep(&self) {
        if let Err(e) = self.cache.cleanup(self.retention_days).await {
            error!("Cache cleanup error: {e}");
        }
        if let Err(e) = self.unmatched.persist().await {
            error!("Failed to persist unmatched league log: {e}");
        }
    }
}
