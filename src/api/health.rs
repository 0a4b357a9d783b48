//! Health snapshot for the /health endpoint, computed on request.

use chrono::Utc;
use serde::Serialize;

use super::routes::ApiState;
use crate::db;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Critical,
}

impl HealthState {
    /// Critical above 50% failures per job, degraded above 10%.
    pub fn from_failure_rate(rate: f64) -> Self {
        if rate > 0.5 {
            HealthState::Critical
        } else if rate > 0.1 {
            HealthState::Degraded
        } else {
            HealthState::Healthy
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub db_size_bytes: u64,
    /// Age of the oldest cached snapshot, whole days.
    pub cache_age_days: Option<i64>,
    pub pending_jobs: i64,
    pub failure_rate: f64,
    pub active_concurrency: usize,
    pub recommended_concurrency: usize,
    pub fetch_backends: Vec<String>,
    pub health_state: HealthState,
}

pub async fn collect(state: &ApiState) -> Result<HealthReport> {
    let db_size_bytes = db::database_size(state.store.pool()).await?;
    let pending_jobs = state.store.pending_job_count().await?;
    let failure_rate = state.store.failure_rate_24h().await?;
    let stats = state.cache.stats().await?;

    Ok(HealthReport {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        db_size_bytes,
        cache_age_days: stats.oldest.map(|t| (Utc::now() - t).num_days()),
        pending_jobs,
        failure_rate,
        active_concurrency: state.scheduler.active_workers(),
        recommended_concurrency: state.scheduler.recommended_workers(),
        fetch_backends: state.fetch_backends.as_ref().clone(),
        health_state: HealthState::from_failure_rate(failure_rate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_thresholds() {
        assert_eq!(HealthState::from_failure_rate(0.0), HealthState::Healthy);
        assert_eq!(HealthState::from_failure_rate(0.1), HealthState::Healthy);
        assert_eq!(HealthState::from_failure_rate(0.11), HealthState::Degraded);
        assert_eq!(HealthState::from_failure_rate(0.5), HealthState::Degraded);
        assert_eq!(HealthState::from_failure_rate(0.75), HealthState::Critical);
    }
}
