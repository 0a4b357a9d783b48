use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use super::payload::{self, season_label};
use crate::config::{FAILURE_RETENTION_DAYS, SNAPSHOT_FRESHNESS_DAYS};
use crate::db::models::{timestamp, CacheStatsRow, LeagueCacheRow};
use crate::db::now_secs;
use crate::error::Result;
use crate::types::{LeagueSnapshot, SnapshotKey};

type KeyLocks = DashMap<SnapshotKey, Arc<Mutex<()>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub snapshots_removed: u64,
    pub failures_removed: u64,
    pub bytes_freed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub entries: i64,
    pub total_bytes: i64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// Odds snapshots per (sport, league, season, date), gzip-compressed in SQLite.
///
/// A row is served only while it is fresh. Writes replace the row for the
/// key in a single upsert statement, so readers see the old row or the new
/// one and never a mix.
#[derive(Clone)]
pub struct SnapshotCache {
    pool: SqlitePool,
    freshness: ChronoDuration,
    key_locks: Arc<KeyLocks>,
}

/// Held while one worker resolves a key; other workers wanting the same key wait.
pub struct KeyGuard {
    key: SnapshotKey,
    locks: Arc<KeyLocks>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl SnapshotCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_freshness(pool, ChronoDuration::days(SNAPSHOT_FRESHNESS_DAYS))
    }

    pub fn with_freshness(pool: SqlitePool, freshness: ChronoDuration) -> Self {
        Self {
            pool,
            freshness,
            key_locks: Arc::new(DashMap::new()),
        }
    }

    /// Serialize cache-or-fetch for one key across workers.
    pub async fn lock_key(&self, key: &SnapshotKey) -> KeyGuard {
        let lock = self.key_locks.entry(key.clone()).or_default().clone();
        let guard = lock.lock_owned().await;
        KeyGuard {
            key: key.clone(),
            locks: Arc::clone(&self.key_locks),
            guard: Some(guard),
        }
    }

    /// The stored snapshot, if one exists and is still fresh. Stale rows are left in place.
    pub async fn get(&self, key: &SnapshotKey) -> Result<Option<LeagueSnapshot>> {
        let row: Option<LeagueCacheRow> = sqlx::query_as(
            "SELECT fetched_at, payload FROM league_cache
             WHERE sport = ? AND league = ? AND season = ? AND event_date = ?",
        )
        .bind(&key.sport)
        .bind(&key.league)
        .bind(season_label(key.event_date))
        .bind(key.event_date.format("%Y-%m-%d").to_string())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let age = Utc::now() - timestamp(row.fetched_at);
        if age > self.freshness {
            debug!("Cache stale for {} (age {}h)", key, age.num_hours());
            return Ok(None);
        }

        payload::decode(&row.payload).map(Some)
    }

    /// Insert or replace the snapshot for `key`.
    pub async fn put(&self, key: &SnapshotKey, snapshot: &LeagueSnapshot) -> Result<()> {
        let blob = payload::encode(snapshot)?;
        let size = blob.len() as i64;

        sqlx::query(
            "INSERT INTO league_cache (sport, league, season, event_date, fetched_at, payload, size_bytes)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(sport, league, season, event_date) DO UPDATE SET
                fetched_at = excluded.fetched_at,
                payload = excluded.payload,
                size_bytes = excluded.size_bytes",
        )
        .bind(&key.sport)
        .bind(&key.league)
        .bind(season_label(key.event_date))
        .bind(key.event_date.format("%Y-%m-%d").to_string())
        .bind(snapshot.fetched_at.timestamp())
        .bind(blob)
        .bind(size)
        .execute(&self.pool)
        .await?;

        debug!("Cached {} ({} events, {} bytes)", key, snapshot.events.len(), size);
        Ok(())
    }

    /// Drop snapshots older than `retention_days` and failure-log rows older
    /// than the fixed failure retention, then reclaim the file space.
    pub async fn cleanup(&self, retention_days: i64) -> Result<CleanupReport> {
        let before = crate::db::database_size(&self.pool).await?;
        let now = now_secs();

        let mut tx = self.pool.begin().await?;
        let snapshots = sqlx::query("DELETE FROM league_cache WHERE fetched_at < ?")
            .bind(cutoff(now, retention_days))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let failures = sqlx::query("DELETE FROM failure_log WHERE timestamp < ?")
            .bind(cutoff(now, FAILURE_RETENTION_DAYS))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        sqlx::query("VACUUM").execute(&self.pool).await?;
        let after = crate::db::database_size(&self.pool).await?;

        let report = CleanupReport {
            snapshots_removed: snapshots,
            failures_removed: failures,
            bytes_freed: before.saturating_sub(after),
        };
        info!(
            "Cache cleanup: {} snapshots, {} failure entries removed, {:.2} MB freed",
            report.snapshots_removed,
            report.failures_removed,
            report.bytes_freed as f64 / (1024.0 * 1024.0),
        );
        Ok(report)
    }

    pub async fn stats(&self) -> Result<CacheStats> {
        let row: CacheStatsRow = sqlx::query_as(
            "SELECT COUNT(*) AS entries, SUM(size_bytes) AS total_bytes,
                    MIN(fetched_at) AS oldest, MAX(fetched_at) AS newest
             FROM league_cache",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CacheStats {
            entries: row.entries,
            total_bytes: row.total_bytes.unwrap_or(0),
            oldest: row.oldest.map(timestamp),
            newest: row.newest.map(timestamp),
        })
    }
}

/// Unix-seconds cutoff `days` before `now`. Saturates, so huge retentions keep everything.
fn cutoff(now: i64, days: i64) -> i64 {
    now.saturating_sub(days.max(0).saturating_mul(86_400))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use super::*;
    use crate::db::testing::temp_pool;
    use crate::types::{MarketOdds, SnapshotEvent};

    fn key() -> SnapshotKey {
        SnapshotKey {
            sport: "soccer".to_string(),
            league: "england-premier-league".to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
        }
    }

    fn snapshot(fetched_at: DateTime<Utc>, price: f64) -> LeagueSnapshot {
        let mut bookmakers = BTreeMap::new();
        bookmakers.insert("pinnacle".to_string(), price);
        bookmakers.insert("bet365".to_string(), 1.85);
        let mut odds = BTreeMap::new();
        odds.insert("1X2".to_string(), MarketOdds { bookmakers });

        LeagueSnapshot {
            sport: "soccer".to_string(),
            league: "england-premier-league".to_string(),
            season: "2024/2025".to_string(),
            event_date: key().event_date,
            fetched_at,
            source: "test".to_string(),
            events: vec![SnapshotEvent {
                home_team: "Arsenal".to_string(),
                away_team: "Chelsea".to_string(),
                date: "2024-12-01T15:00:00Z".to_string(),
                odds,
            }],
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let (pool, _dir) = temp_pool().await;
        let cache = SnapshotCache::new(pool);
        let original = snapshot(Utc::now(), 1.9);

        cache.put(&key(), &original).await.unwrap();
        let loaded = cache.get(&key()).await.unwrap().unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn second_put_replaces_row() {
        let (pool, _dir) = temp_pool().await;
        let cache = SnapshotCache::new(pool.clone());

        cache.put(&key(), &snapshot(Utc::now(), 1.9)).await.unwrap();
        cache.put(&key(), &snapshot(Utc::now(), 2.1)).await.unwrap();

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM league_cache")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
        let loaded = cache.get(&key()).await.unwrap().unwrap();
        assert_eq!(loaded.events[0].odds["1X2"].bookmakers["pinnacle"], 2.1);
    }

    #[tokio::test]
    async fn stale_rows_miss_but_survive() {
        let (pool, _dir) = temp_pool().await;
        let cache = SnapshotCache::new(pool);

        let old = Utc::now() - ChronoDuration::days(SNAPSHOT_FRESHNESS_DAYS + 1);
        cache.put(&key(), &snapshot(old, 1.9)).await.unwrap();
        assert!(cache.get(&key()).await.unwrap().is_none());
        assert_eq!(cache.stats().await.unwrap().entries, 1);
    }

    #[tokio::test]
    async fn cleanup_removes_old_rows() {
        let (pool, _dir) = temp_pool().await;
        let cache = SnapshotCache::new(pool.clone());

        let mut other = key();
        other.league = "spain-laliga".to_string();
        cache
            .put(&key(), &snapshot(Utc::now() - ChronoDuration::days(40), 1.9))
            .await
            .unwrap();
        cache.put(&other, &snapshot(Utc::now(), 1.9)).await.unwrap();

        sqlx::query("INSERT INTO failure_log (timestamp, job_id, error_type) VALUES (?, NULL, 'fetch_failure')")
            .bind(now_secs() - 8 * 86_400)
            .execute(&pool)
            .await
            .unwrap();

        let report = cache.cleanup(30).await.unwrap();
        assert_eq!(report.snapshots_removed, 1);
        assert_eq!(report.failures_removed, 1);

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entries, 1);
        assert!(stats.total_bytes > 0);
    }

    #[tokio::test]
    async fn huge_retention_keeps_everything() {
        let (pool, _dir) = temp_pool().await;
        let cache = SnapshotCache::new(pool);
        cache
            .put(&key(), &snapshot(Utc::now() - ChronoDuration::days(400), 1.9))
            .await
            .unwrap();

        let report = cache.cleanup(200_000_000_000_000).await.unwrap();
        assert_eq!(report.snapshots_removed, 0);
        assert_eq!(cache.stats().await.unwrap().entries, 1);

        let report = cache.cleanup(i64::MAX).await.unwrap();
        assert_eq!(report.snapshots_removed, 0);
    }

    #[test]
    fn cutoff_saturates() {
        assert_eq!(cutoff(1_000_000, 1), 1_000_000 - 86_400);
        assert_eq!(cutoff(1_000_000, -5), 1_000_000);
        assert_eq!(cutoff(1_000_000, i64::MAX), i64::MIN + 1_000_001);
    }

    #[tokio::test]
    async fn key_lock_is_released() {
        let (pool, _dir) = temp_pool().await;
        let cache = SnapshotCache::new(pool);
        {
            let _guard = cache.lock_key(&key()).await;
            assert_eq!(cache.key_locks.len(), 1);
        }
        assert!(cache.key_locks.is_empty());
        let _again = cache.lock_key(&key()).await;
    }
}
