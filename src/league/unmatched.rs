use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::custom::write_atomic;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedEntry {
    /// `sport|tournament|home|away`, as submitted.
    pub key: String,
    pub timestamp: DateTime<Utc>,
    pub sport: String,
    pub tournament: String,
    pub home_team: String,
    pub away_team: String,
}

/// Bounded, deduplicated log of classification misses.
///
/// Held in memory and flushed to a JSON file by [`UnmatchedLog::persist`].
pub struct UnmatchedLog {
    path: Option<PathBuf>,
    capacity: usize,
    entries: Mutex<VecDeque<UnmatchedEntry>>,
    dirty: AtomicBool,
}

impl UnmatchedLog {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            path: None,
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
            dirty: AtomicBool::new(false),
        })
    }

    /// Restore from `path` if it holds a previously persisted log.
    pub async fn load(path: impl Into<PathBuf>, capacity: usize) -> Arc<Self> {
        let path = path.into();
        let capacity = capacity.max(1);
        let mut entries: VecDeque<UnmatchedEntry> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<UnmatchedEntry>>(&bytes)
                .unwrap_or_else(|e| {
                    warn!("Ignoring malformed unmatched log {}: {}", path.display(), e);
                    Vec::new()
                })
                .into(),
            Err(_) => VecDeque::new(),
        };
        while entries.len() > capacity {
            entries.pop_front();
        }

        Arc::new(Self {
            path: Some(path),
            capacity,
            entries: Mutex::new(entries),
            dirty: AtomicBool::new(false),
        })
    }

    /// Append a miss unless the same key is already logged. Returns true when appended.
    pub fn record(&self, sport: &str, tournament: &str, home_team: &str, away_team: &str) -> bool {
        let key = format!("{sport}|{tournament}|{home_team}|{away_team}");
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.iter().any(|e| e.key == key) {
            return false;
        }

        debug!("Unmatched league: {}", key);
        entries.push_back(UnmatchedEntry {
            key,
            timestamp: Utc::now(),
            sport: sport.to_string(),
            tournament: tournament.to_string(),
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
        });
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        self.dirty.store(true, Ordering::Relaxed);
        true
    }

    pub fn entries(&self) -> Vec<UnmatchedEntry> {
        match self.entries.lock() {
            Ok(guard) => guard.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flush to disk if anything changed since the last flush.
    pub async fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty.swap(false, Ordering::Relaxed) {
            return Ok(());
        }
        let body = serde_json::to_vec_pretty(&self.entries())?;
        if let Err(e) = write_atomic(path, &body).await {
            self.dirty.store(true, Ordering::Relaxed);
            return Err(e);
        }
        Ok(())
    }
}
