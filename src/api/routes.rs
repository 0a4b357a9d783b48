use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::health::{self, HealthReport};
use crate::cache::SnapshotCache;
use crate::config::MAX_RETENTION_DAYS;
use crate::db::JobStore;
use crate::error::AppError;
use crate::league::{LeagueClassifier, UnmatchedEntry};
use crate::scheduler::{JobScheduler, JobStatusView, SubmitResponse};
use crate::types::BatchRequest;

#[derive(Clone)]
pub struct ApiState {
    pub store: JobStore,
    pub cache: SnapshotCache,
    pub scheduler: Arc<JobScheduler>,
    pub classifier: Arc<LeagueClassifier>,
    pub fetch_backends: Arc<Vec<String>>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/api/batch-closing-odds", post(post_batch))
        .route("/api/job-status/:job_id", get(get_job_status))
        .route("/api/clear-cache", delete(clear_cache))
        .route("/api/cache-stats", get(get_cache_stats))
        .route("/api/league-mappings", get(get_league_mappings).post(post_league_mappings))
        .route("/api/unmatched-leagues", get(get_unmatched_leagues))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ClearCacheQuery {
    pub retention_days: Option<i64>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearCacheResponse {
    pub success: bool,
    pub retention_days: i64,
    pub snapshots_removed: u64,
    pub failures_removed: u64,
    pub bytes_freed: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    pub entries: i64,
    pub total_bytes: i64,
    pub total_mb: f64,
    pub db_size_bytes: u64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct MappingsResponse {
    pub mappings: BTreeMap<String, String>,
}

#[derive(Serialize)]
pub struct MappingsUpdateResponse {
    pub success: bool,
    pub updated: usize,
    pub total: usize,
}

#[derive(Serialize)]
pub struct UnmatchedResponse {
    pub count: usize,
    pub entries: Vec<UnmatchedEntry>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Result<Json<HealthReport>, AppError> {
    Ok(Json(health::collect(&state).await?))
}

async fn post_batch(
    State(state): State<ApiState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    Ok(Json(state.scheduler.submit(request).await?))
}

async fn get_job_status(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusView>, AppError> {
    Ok(Json(state.scheduler.status(&job_id).await?))
}

async fn clear_cache(
    State(state): State<ApiState>,
    Query(params): Query<ClearCacheQuery>,
) -> Result<Json<ClearCacheResponse>, AppError> {
    let retention_days = params.retention_days.unwrap_or(0);
    if !(0..=MAX_RETENTION_DAYS).contains(&retention_days) {
        return Err(AppError::Validation(format!(
            "retention_days must be between 0 and {MAX_RETENTION_DAYS}"
        )));
    }

    let report = state.cache.cleanup(retention_days).await?;
    info!(retention_days, "Cache cleared on request");
    Ok(Json(ClearCacheResponse {
        success: true,
        retention_days,
        snapshots_removed: report.snapshots_removed,
        failures_removed: report.failures_removed,
        bytes_freed: report.bytes_freed,
    }))
}

async fn get_cache_stats(State(state): State<ApiState>) -> Result<Json<CacheStatsResponse>, AppError> {
    let stats = state.cache.stats().await?;
    let db_size_bytes = crate::db::database_size(state.store.pool()).await?;

    Ok(Json(CacheStatsResponse {
        entries: stats.entries,
        total_bytes: stats.total_bytes,
        total_mb: (stats.total_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
        db_size_bytes,
        oldest: stats.oldest,
        newest: stats.newest,
    }))
}

async fn get_league_mappings(State(state): State<ApiState>) -> Json<MappingsResponse> {
    Json(MappingsResponse {
        mappings: state.classifier.custom_mappings().snapshot(),
    })
}

async fn post_league_mappings(
    State(state): State<ApiState>,
    Json(updates): Json<HashMap<String, String>>,
) -> Result<Json<MappingsUpdateResponse>, AppError> {
    let mappings = state.classifier.custom_mappings();
    let updated = mappings.update(updates).await?;
    Ok(Json(MappingsUpdateResponse {
        success: true,
        updated,
        total: mappings.len(),
    }))
}

async fn get_unmatched_leagues(State(state): State<ApiState>) -> Json<UnmatchedResponse> {
    let entries = state.classifier.unmatched_log().entries();
    Json(UnmatchedResponse {
        count: entries.len(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::db::testing::temp_pool;
    use crate::fetcher::testing::{event, StubFetcher};
    use crate::fetcher::FallbackChain;
    use crate::league::{CustomMappings, UnmatchedLog};
    use crate::scheduler::FixedMemory;

    async fn app() -> (Router, tempfile::TempDir) {
        let (pool, dir) = temp_pool().await;
        let store = JobStore::new(pool.clone());
        let cache = SnapshotCache::new(pool);
        let classifier = Arc::new(LeagueClassifier::new(
            CustomMappings::ephemeral(),
            UnmatchedLog::new(100),
        ));
        let fetcher = FallbackChain::new().with(Arc::new(StubFetcher::serving(vec![event(
            "Arsenal",
            "Chelsea",
            "1X2",
            &[("pinnacle", 1.95), ("bet365", 1.9)],
        )])));
        let scheduler = Arc::new(JobScheduler::new(
            store.clone(),
            cache.clone(),
            Arc::clone(&classifier),
            fetcher.clone(),
            Arc::new(FixedMemory(None)),
            3,
            Duration::from_secs(30),
            Duration::from_secs(5),
        ));
        let state = ApiState {
            store,
            cache,
            scheduler,
            classifier,
            fetch_backends: Arc::new(fetcher.backend_names()),
        };
        (router(state), dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn batch_round_trip_and_status() {
        let (app, _dir) = app().await;
        let body = json!({
            "bets": [{
                "id": "b1",
                "sport": "Football",
                "tournament": "Premier League",
                "home": "Arsenal",
                "away": "Chelsea",
                "market": "Match Winner",
                "date": "2024-03-10",
                "bookmaker": "Unibet"
            }],
            "fallbackStrategy": "pinnacle"
        });

        let (status, json) = send(&app, post_json("/api/batch-closing-odds", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "completed");
        let result = &json["results"][0];
        assert_eq!(result["betId"], "b1");
        assert_eq!(result["closingOdds"], 1.95);
        assert_eq!(result["fallbackType"], "reference");

        let job_id = json["jobId"].as_str().unwrap();
        let (status, json) = send(&app, get(&format!("/api/job-status/{job_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["progress"]["current"], 1);
        assert_eq!(json["progress"]["total"], 1);
    }

    #[tokio::test]
    async fn error_statuses() {
        let (app, _dir) = app().await;

        let (status, _) = send(&app, get("/api/job-status/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let bad_date = json!({"bets": [{
            "betId": "x", "sport": "Football", "homeTeam": "A", "awayTeam": "B",
            "market": "1X2", "eventDate": "someday", "bookmaker": "bet365"
        }]});
        let (status, _) = send(&app, post_json("/api/batch-closing-odds", bad_date)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = Request::delete("/api/clear-cache?retention_days=-1")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = Request::delete("/api/clear-cache?retention_days=200000000000000")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mappings_cache_and_health() {
        let (app, _dir) = app().await;

        let (status, json) = send(
            &app,
            post_json("/api/league-mappings", json!({"Elite Cup": "norway-eliteserien"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["updated"], 1);

        let (_, json) = send(&app, get("/api/league-mappings")).await;
        assert_eq!(json["mappings"]["elite cup"], "norway-eliteserien");

        let (status, json) = send(&app, get("/api/cache-stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["entries"], 0);

        let request = Request::delete("/api/clear-cache").body(Body::empty()).unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);

        let (_, json) = send(&app, get("/api/unmatched-leagues")).await;
        assert_eq!(json["count"], 0);

        let (status, json) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["healthState"], "healthy");
        assert_eq!(json["pendingJobs"], 0);
        assert_eq!(json["fetchBackends"][0], "stub");
    }
}
