use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::resources::{recommended_for, MemoryProbe};
use crate::cache::SnapshotCache;
use crate::config::SYNC_BATCH_LIMIT;
use crate::db::JobStore;
use crate::error::{AppError, Result};
use crate::fetcher::{FallbackChain, FetchError};
use crate::league::{LeagueClassifier, UNKNOWN_LEAGUE};
use crate::matcher::normalize;
use crate::reconcile::resolve;
use crate::types::{
    parse_event_date, BatchRequest, BetRequest, BetResultView, FailureKind, JobStatus, LeagueSnapshot,
    MatchResult, SnapshotKey,
};

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub total_bets: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<BetResultView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: Progress,
    pub results: Vec<BetResultView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Snapshot outcome for one group. Storage errors travel separately as `Err`.
enum GroupSnapshot {
    Ready(Option<LeagueSnapshot>),
    Unclassified,
    FetchFailed(FetchError),
}

/// Removes the job from the active set when its worker finishes.
struct ActiveJob {
    set: Arc<DashSet<String>>,
    job_id: String,
}

impl Drop for ActiveJob {
    fn drop(&mut self) {
        self.set.remove(&self.job_id);
    }
}

/// Accepts batches, runs small ones inline and queues the rest for a
/// background loop that processes up to a memory-derived number of jobs at once.
pub struct JobScheduler {
    store: JobStore,
    cache: SnapshotCache,
    classifier: Arc<LeagueClassifier>,
    fetcher: FallbackChain,
    memory: Arc<dyn MemoryProbe>,
    max_concurrency: usize,
    poll_interval: Duration,
    fetch_timeout: Duration,
    worker_limit: AtomicUsize,
    active: Arc<DashSet<String>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl JobScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: JobStore,
        cache: SnapshotCache,
        classifier: Arc<LeagueClassifier>,
        fetcher: FallbackChain,
        memory: Arc<dyn MemoryProbe>,
        max_concurrency: usize,
        poll_interval: Duration,
        fetch_timeout: Duration,
    ) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            store,
            cache,
            classifier,
            fetcher,
            memory,
            max_concurrency,
            poll_interval,
            fetch_timeout,
            worker_limit: AtomicUsize::new(max_concurrency),
            active: Arc::new(DashSet::new()),
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn active_workers(&self) -> usize {
        self.active.len()
    }

    pub fn worker_limit(&self) -> usize {
        self.worker_limit.load(Ordering::Relaxed)
    }

    pub fn recommended_workers(&self) -> usize {
        recommended_for(self.memory.as_ref(), self.max_concurrency)
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Persist a batch as one job. Small batches are processed before returning.
    pub async fn submit(&self, request: BatchRequest) -> Result<SubmitResponse> {
        if request.bets.is_empty() {
            return Err(AppError::Validation("batch contains no bets".to_string()));
        }

        let mut seen = HashSet::with_capacity(request.bets.len());
        for input in &request.bets {
            if input.bet_id.trim().is_empty() {
                return Err(AppError::Validation("bet id must not be empty".to_string()));
            }
            if !seen.insert(input.bet_id.as_str()) {
                return Err(AppError::Validation(format!(
                    "duplicate bet id {:?}",
                    input.bet_id
                )));
            }
        }

        let mut bets = Vec::with_capacity(request.bets.len());
        for input in request.bets {
            let event_date = parse_event_date(&input.event_date).ok_or_else(|| {
                AppError::Validation(format!(
                    "bet {}: unparseable event date {:?}",
                    input.bet_id, input.event_date
                ))
            })?;
            bets.push(BetRequest {
                row_id: 0,
                job_id: String::new(),
                bet_id: input.bet_id,
                sport: input.sport,
                tournament: input.tournament,
                home_team: input.home_team,
                away_team: input.away_team,
                market: input.market,
                event_date,
                bookmaker: input.bookmaker,
            });
        }

        let job_id = uuid::Uuid::new_v4().to_string();
        let total_bets = bets.len() as u32;
        let strategy = request.fallback_strategy;

        if bets.len() > SYNC_BATCH_LIMIT {
            self.store
                .create_job(&job_id, strategy, JobStatus::Queued, bets)
                .await?;
            info!(job_id = %job_id, total_bets, %strategy, "Job queued");
            return Ok(SubmitResponse {
                job_id,
                status: JobStatus::Queued,
                total_bets,
                processed: None,
                failed: None,
                results: None,
                error: None,
            });
        }

        self.store
            .create_job(&job_id, strategy, JobStatus::Processing, bets)
            .await?;
        info!(job_id = %job_id, total_bets, %strategy, "Processing job inline");

        {
            let _guard = self.activate(&job_id);
            self.process_job(&job_id).await;
        }

        let job = self
            .store
            .get_job(&job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job {job_id}")))?;
        let results = self.store.results(&job_id).await?;
        let failed = results.iter().filter(|r| !r.success).count() as u32;

        Ok(SubmitResponse {
            job_id,
            status: job.status,
            total_bets,
            processed: Some(job.processed_bets),
            failed: Some(failed),
            results: Some(results),
            error: job.error,
        })
    }

    pub async fn status(&self, job_id: &str) -> Result<JobStatusView> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job {job_id}")))?;
        let results = self.store.results(job_id).await?;

        Ok(JobStatusView {
            job_id: job.id,
            status: job.status,
            progress: Progress {
                current: job.processed_bets,
                total: job.total_bets,
            },
            results,
            error: job.error,
        })
    }

    // -----------------------------------------------------------------------
    // Background loop
    // -----------------------------------------------------------------------

    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(
            max_concurrency = self.max_concurrency,
            poll_secs = self.poll_interval.as_secs(),
            backends = ?self.fetcher.backend_names(),
            "Job scheduler started"
        );

        if let Err(e) = self.resume_interrupted().await {
            error!("Failed to resume interrupted jobs: {e}");
        }

        loop {
            if let Err(e) = self.poll_once().await {
                error!("Scheduler poll error: {e}");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!(in_flight = self.active_workers(), "Scheduler stopping, waiting for workers");
        self.wait_for_workers().await;
        info!("Job scheduler stopped");
    }

    /// Re-spawn jobs left in `processing`. Only bets without a result are
    /// reprocessed, so the progress count is not inflated.
    pub(crate) async fn resume_interrupted(self: &Arc<Self>) -> Result<usize> {
        let mut resumed = 0;
        for job_id in self.store.processing_job_ids().await? {
            let Some(guard) = self.activate(&job_id) else {
                continue;
            };
            info!(job_id = %job_id, "Resuming interrupted job");
            self.spawn_job(job_id, guard).await;
            resumed += 1;
        }
        Ok(resumed)
    }

    /// One scheduling pass: refresh the worker limit, claim queued jobs into free slots.
    pub(crate) async fn poll_once(self: &Arc<Self>) -> Result<usize> {
        let limit = self.recommended_workers();
        let previous = self.worker_limit.swap(limit, Ordering::Relaxed);
        if previous != limit {
            info!(from = previous, to = limit, "Adjusting worker limit");
        }

        self.handles.lock().await.retain(|h| !h.is_finished());

        let free = limit.saturating_sub(self.active_workers());
        if free == 0 {
            return Ok(0);
        }

        let mut started = 0;
        for job_id in self.store.queued_job_ids(free).await? {
            let Some(guard) = self.activate(&job_id) else {
                continue;
            };
            if !self.store.claim_job(&job_id).await? {
                debug!(job_id = %job_id, "Job already claimed");
                continue;
            }
            info!(job_id = %job_id, "Job claimed");
            self.spawn_job(job_id, guard).await;
            started += 1;
        }
        Ok(started)
    }

    pub(crate) async fn wait_for_workers(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().await);
        for result in futures_util::future::join_all(handles).await {
            if let Err(e) = result {
                error!("Job worker panicked: {e}");
            }
        }
    }

    fn activate(&self, job_id: &str) -> Option<ActiveJob> {
        self.active.insert(job_id.to_string()).then(|| ActiveJob {
            set: Arc::clone(&self.active),
            job_id: job_id.to_string(),
        })
    }

    async fn spawn_job(self: &Arc<Self>, job_id: String, guard: ActiveJob) {
        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let _guard = guard;
            scheduler.process_job(&job_id).await;
        });
        self.handles.lock().await.push(handle);
    }

    // -----------------------------------------------------------------------
    // Per-job processing
    // -----------------------------------------------------------------------

    async fn process_job(&self, job_id: &str) {
        match self.process_groups(job_id).await {
            Ok(processed) => info!(job_id, processed, "Job completed"),
            Err(e) => {
                error!(job_id, "Job failed: {e}");
                let message = e.to_string();
                let kind = if e.is_storage() {
                    FailureKind::StorageFailure
                } else {
                    FailureKind::ProcessingError
                };
                if let Err(e) = self.store.fail_job(job_id, &message).await {
                    error!(job_id, "Failed to mark job failed: {e}");
                }
                if let Err(e) = self.store.log_failure(Some(job_id), kind, &message).await {
                    error!(job_id, "Failed to write failure log: {e}");
                }
            }
        }

        // Misses recorded while grouping reach disk with the job, not at the next janitor sweep.
        if let Err(e) = self.classifier.unmatched_log().persist().await {
            warn!(job_id, "Failed to persist unmatched league log: {e}");
        }
    }

    async fn process_groups(&self, job_id: &str) -> Result<usize> {
        let job = self
            .store
            .get_job(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job {job_id}")))?;
        let bets = self.store.pending_bets(job_id).await?;
        let groups = self.group_bets(bets);
        debug!(job_id, groups = groups.len(), "Bets grouped");

        let mut processed = 0;
        for (key, group) in groups {
            let snapshot = match self.snapshot_for(&key).await? {
                GroupSnapshot::Ready(snapshot) => snapshot,
                GroupSnapshot::Unclassified => {
                    self.store
                        .log_failure(
                            Some(job_id),
                            FailureKind::ClassificationMiss,
                            &format!("{} bets with unknown league on {}", group.len(), key.event_date),
                        )
                        .await?;
                    None
                }
                GroupSnapshot::FetchFailed(e) => {
                    warn!(job_id, %key, "Fetch failed, failing group: {e}");
                    self.store
                        .log_failure(Some(job_id), FailureKind::FetchFailure, &format!("{key}: {e}"))
                        .await?;
                    for bet in &group {
                        self.store.record_result(bet, &MatchResult::failed(0.0)).await?;
                        processed += 1;
                    }
                    continue;
                }
            };

            for bet in &group {
                let result = resolve(bet, snapshot.as_ref(), job.fallback_strategy);
                debug!(
                    job_id,
                    bet_id = %bet.bet_id,
                    fallback = %result.fallback_type,
                    odds = ?result.closing_odds,
                    score = result.match_score,
                    success = result.is_success(),
                    "Bet resolved"
                );
                self.store.record_result(bet, &result).await?;
                processed += 1;
            }
        }

        self.store.complete_job(job_id).await?;
        Ok(processed)
    }

    fn group_bets(&self, bets: Vec<BetRequest>) -> BTreeMap<SnapshotKey, Vec<BetRequest>> {
        let mut groups: BTreeMap<SnapshotKey, Vec<BetRequest>> = BTreeMap::new();
        for bet in bets {
            let (sport, league) = match self.classifier.classify(
                &bet.home_team,
                &bet.away_team,
                &bet.tournament,
                &bet.sport,
            ) {
                Some(c) => (c.sport, c.league),
                None => {
                    warn!(
                        bet_id = %bet.bet_id,
                        home = %bet.home_team,
                        away = %bet.away_team,
                        "League unknown"
                    );
                    (normalize(&bet.sport), UNKNOWN_LEAGUE.to_string())
                }
            };
            let key = SnapshotKey {
                sport,
                league,
                event_date: bet.event_date,
            };
            groups.entry(key).or_default().push(bet);
        }
        groups
    }

    /// Cache first, then a time-bounded fetch whose result is cached before use.
    /// The per-key lock keeps concurrent jobs from fetching the same key twice.
    async fn snapshot_for(&self, key: &SnapshotKey) -> Result<GroupSnapshot> {
        if key.league == UNKNOWN_LEAGUE {
            return Ok(GroupSnapshot::Unclassified);
        }

        let _lock = self.cache.lock_key(key).await;
        if let Some(snapshot) = self.cache.get(key).await? {
            debug!(%key, "Snapshot cache hit");
            return Ok(GroupSnapshot::Ready(Some(snapshot)));
        }

        let fetched = match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(key)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.fetch_timeout)),
        };

        match fetched {
            Ok(Some(snapshot)) => {
                self.cache.put(key, &snapshot).await?;
                Ok(GroupSnapshot::Ready(Some(snapshot)))
            }
            Ok(None) => {
                info!(%key, "No snapshot available");
                Ok(GroupSnapshot::Ready(None))
            }
            Err(e) => Ok(GroupSnapshot::FetchFailed(e)),
        }
    }
}
