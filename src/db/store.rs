use sqlx::SqlitePool;

use super::models::{BetRequestRow, JobRow};
use super::now_secs;
use crate::error::Result;
use crate::types::{BetRequest, BetResultView, FailureKind, FallbackStrategy, Job, JobStatus, MatchResult};

const BET_COLUMNS: &str = "id, job_id, bet_id, sport, tournament, home_team, away_team, market, \
     event_date, bookmaker, result_odds, result_bookmaker, confidence, fallback_type, \
     match_score, bookmaker_count";

/// Jobs, bet requests, per-bet results and the failure log.
///
/// Every multi-row write runs in one transaction. Status changes are
/// conditional updates so a terminal job is never reopened.
#[derive(Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Persist a job with all its bet requests. The returned requests carry their row ids.
    pub async fn create_job(
        &self,
        job_id: &str,
        strategy: FallbackStrategy,
        status: JobStatus,
        bets: Vec<BetRequest>,
    ) -> Result<Vec<BetRequest>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO jobs (id, created_at, status, fallback_strategy, total_bets, processed_bets)
             VALUES (?, ?, ?, ?, ?, 0)",
        )
        .bind(job_id)
        .bind(now_secs())
        .bind(status.as_str())
        .bind(strategy.as_str())
        .bind(bets.len() as i64)
        .execute(&mut *tx)
        .await?;

        let mut stored = Vec::with_capacity(bets.len());
        for mut bet in bets {
            let result = sqlx::query(
                "INSERT INTO bet_requests
                    (job_id, bet_id, sport, tournament, home_team, away_team, market, event_date, bookmaker)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(job_id)
            .bind(&bet.bet_id)
            .bind(&bet.sport)
            .bind(&bet.tournament)
            .bind(&bet.home_team)
            .bind(&bet.away_team)
            .bind(&bet.market)
            .bind(bet.event_date.format("%Y-%m-%d").to_string())
            .bind(&bet.bookmaker)
            .execute(&mut *tx)
            .await?;
            bet.row_id = result.last_insert_rowid();
            bet.job_id = job_id.to_string();
            stored.push(bet);
        }

        tx.commit().await?;
        Ok(stored)
    }

    /// `queued → processing`. False when another worker got there first.
    pub async fn claim_job(&self, job_id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE jobs SET status = 'processing' WHERE id = ? AND status = 'queued'")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Store a bet's result and bump the job's processed count, atomically.
    ///
    /// A bet that already has a result is left untouched and the count is not
    /// bumped again; returns false in that case.
    pub async fn record_result(&self, bet: &BetRequest, result: &MatchResult) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE bet_requests
             SET result_odds = ?, result_bookmaker = ?, confidence = ?, fallback_type = ?,
                 match_score = ?, bookmaker_count = ?
             WHERE id = ? AND fallback_type IS NULL",
        )
        .bind(result.closing_odds)
        .bind(result.bookmaker_used.as_deref())
        .bind(result.confidence)
        .bind(result.fallback_type.as_str())
        .bind(result.match_score)
        .bind(result.bookmaker_count.map(i64::from))
        .bind(bet.row_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE jobs SET processed_bets = processed_bets + 1
             WHERE id = ? AND processed_bets < total_bets",
        )
        .bind(&bet.job_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn complete_job(&self, job_id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'completed', completed_at = ?
             WHERE id = ? AND status NOT IN ('completed', 'failed')",
        )
        .bind(now_secs())
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn fail_job(&self, job_id: &str, error: &str) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'failed', completed_at = ?, error_log = ?
             WHERE id = ? AND status NOT IN ('completed', 'failed')",
        )
        .bind(now_secs())
        .bind(error)
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn log_failure(&self, job_id: Option<&str>, kind: FailureKind, message: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO failure_log (timestamp, job_id, error_type, error_message) VALUES (?, ?, ?, ?)",
        )
        .bind(now_secs())
        .bind(job_id)
        .bind(kind.to_string())
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get_job(&self, job_id: &str) -> Result<Option<Job>> {
        let row: Option<JobRow> = sqlx::query_as(
            "SELECT id, created_at, completed_at, status, fallback_strategy, total_bets,
                    processed_bets, error_log
             FROM jobs WHERE id = ?",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Job::try_from).transpose()
    }

    async fn bet_rows(&self, job_id: &str) -> Result<Vec<BetRequestRow>> {
        let rows = sqlx::query_as(&format!(
            "SELECT {BET_COLUMNS} FROM bet_requests WHERE job_id = ? ORDER BY id"
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Bet requests of a job that have no result yet.
    pub async fn pending_bets(&self, job_id: &str) -> Result<Vec<BetRequest>> {
        self.bet_rows(job_id)
            .await?
            .into_iter()
            .filter(|row| !row.has_result())
            .map(BetRequestRow::into_request)
            .collect()
    }

    /// Results recorded so far, in submission order.
    pub async fn results(&self, job_id: &str) -> Result<Vec<BetResultView>> {
        let mut views = Vec::new();
        for row in self.bet_rows(job_id).await? {
            if let Some(view) = row.result_view()? {
                views.push(view);
            }
        }
        Ok(views)
    }

    /// Oldest queued jobs first.
    pub async fn queued_job_ids(&self, limit: usize) -> Result<Vec<String>> {
        let ids: Vec<(String,)> = sqlx::query_as(
            "SELECT id FROM jobs WHERE status = 'queued' ORDER BY created_at, rowid LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Jobs left in `processing`, e.g. by a process that stopped mid-job.
    pub async fn processing_job_ids(&self) -> Result<Vec<String>> {
        let ids: Vec<(String,)> =
            sqlx::query_as("SELECT id FROM jobs WHERE status = 'processing' ORDER BY created_at, rowid")
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    pub async fn pending_job_count(&self) -> Result<i64> {
        let (n,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE status IN ('queued', 'processing')")
                .fetch_one(&self.pool)
                .await?;
        Ok(n)
    }

    /// Failure-log entries per job created over the last 24 hours.
    pub async fn failure_rate_24h(&self) -> Result<f64> {
        let since = now_secs() - 24 * 3600;
        let (failures,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM failure_log WHERE timestamp > ?")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        let (jobs,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs WHERE created_at > ?")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        if jobs == 0 {
            return Ok(0.0);
        }
        Ok(failures as f64 / jobs as f64)
    }
}
