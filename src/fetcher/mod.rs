pub mod odds_api;
pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::{LeagueSnapshot, SnapshotKey};

pub use odds_api::OddsApiFetcher;
pub use retry::{classify_reqwest_error, classify_status, BackoffPolicy, RetryDisposition};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned HTTP {0}")]
    Status(StatusCode),

    #[error("malformed provider response: {0}")]
    Decode(String),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("no fetch backend configured")]
    NoBackend,
}

impl FetchError {
    pub fn disposition(&self) -> RetryDisposition {
        match self {
            FetchError::Http(e) => classify_reqwest_error(e),
            FetchError::Status(status) => classify_status(*status),
            FetchError::Timeout(_) => RetryDisposition::Retryable,
            FetchError::Decode(_) | FetchError::NoBackend => RetryDisposition::NonRetryable,
        }
    }
}

/// Source of league snapshots.
///
/// `Ok(None)` means the backend has nothing for this key (unsupported league,
/// no events on the date); `Err` means it tried and failed.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, key: &SnapshotKey) -> Result<Option<LeagueSnapshot>, FetchError>;
}

/// Tries each backend in order and returns the first snapshot produced.
///
/// When no backend produces one, the last error is returned if any backend
/// failed; otherwise `Ok(None)`.
#[derive(Clone, Default)]
pub struct FallbackChain {
    backends: Vec<Arc<dyn SnapshotFetcher>>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, backend: Arc<dyn SnapshotFetcher>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    pub async fn fetch(&self, key: &SnapshotKey) -> Result<Option<LeagueSnapshot>, FetchError> {
        if self.backends.is_empty() {
            return Err(FetchError::NoBackend);
        }

        let mut last_error = None;
        for backend in &self.backends {
            match backend.fetch(key).await {
                Ok(Some(snapshot)) => {
                    info!(
                        backend = backend.name(),
                        %key,
                        events = snapshot.events.len(),
                        "Snapshot fetched"
                    );
                    return Ok(Some(snapshot));
                }
                Ok(None) => debug!(backend = backend.name(), %key, "Backend had no snapshot"),
                Err(e) => {
                    warn!(backend = backend.name(), %key, "Fetch failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use super::*;
    use crate::cache::season_label;
    use crate::types::{MarketOdds, SnapshotEvent};

    /// Canned backend: serves `events` for every key, or fails keys whose
    /// league is in `failing_leagues`. Leagues in `slow_leagues` sleep first.
    pub struct StubFetcher {
        pub events: Vec<SnapshotEvent>,
        pub failing_leagues: Vec<String>,
        pub slow_leagues: Vec<(String, Duration)>,
        pub empty: bool,
        pub calls: AtomicUsize,
    }

    impl StubFetcher {
        pub fn serving(events: Vec<SnapshotEvent>) -> Self {
            Self {
                events,
                failing_leagues: Vec::new(),
                slow_leagues: Vec::new(),
                empty: false,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing_for(mut self, league: &str) -> Self {
            self.failing_leagues.push(league.to_string());
            self
        }

        pub fn slow_for(mut self, league: &str, delay: Duration) -> Self {
            self.slow_leagues.push((league.to_string(), delay));
            self
        }

        pub fn empty() -> Self {
            Self {
                empty: true,
                ..Self::serving(Vec::new())
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SnapshotFetcher for StubFetcher {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch(&self, key: &SnapshotKey) -> Result<Option<LeagueSnapshot>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some((_, delay)) = self.slow_leagues.iter().find(|(l, _)| *l == key.league) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing_leagues.contains(&key.league) {
                return Err(FetchError::Status(StatusCode::SERVICE_UNAVAILABLE));
            }
            if self.empty {
                return Ok(None);
            }
            Ok(Some(LeagueSnapshot {
                sport: key.sport.clone(),
                league: key.league.clone(),
                season: season_label(key.event_date),
                event_date: key.event_date,
                fetched_at: Utc::now(),
                source: "stub".to_string(),
                events: self.events.clone(),
            }))
        }
    }

    pub fn event(home: &str, away: &str, market: &str, prices: &[(&str, f64)]) -> SnapshotEvent {
        let bookmakers: BTreeMap<String, f64> =
            prices.iter().map(|(b, p)| (b.to_string(), *p)).collect();
        SnapshotEvent {
            home_team: home.to_string(),
            away_team: away.to_string(),
            date: "2024-03-10T15:00:00Z".to_string(),
            odds: BTreeMap::from([(market.to_string(), MarketOdds { bookmakers })]),
        }
    }
}
