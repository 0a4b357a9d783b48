use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use clv_reconciler::api::{router, ApiState};
use clv_reconciler::cache::{CacheJanitor, SnapshotCache};
use clv_reconciler::config::{Config, UNMATCHED_LOG_CAPACITY};
use clv_reconciler::db::{self, JobStore};
use clv_reconciler::error::{AppError, Result};
use clv_reconciler::fetcher::{FallbackChain, OddsApiFetcher};
use clv_reconciler::league::{CustomMappings, LeagueClassifier, UnmatchedLog};
use clv_reconciler::scheduler::{JobScheduler, ProcMeminfo};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = db::connect(&cfg.db_path).await?;
    let store = JobStore::new(pool.clone());
    let cache = SnapshotCache::new(pool);

    // --- League classification state ---
    let custom = CustomMappings::load(&cfg.custom_mappings_path).await;
    let unmatched = UnmatchedLog::load(&cfg.unmatched_log_path, UNMATCHED_LOG_CAPACITY).await;
    info!(
        "League mappings ready: {} custom, {} unmatched entries",
        custom.len(),
        unmatched.len()
    );
    let classifier = Arc::new(LeagueClassifier::new(custom, Arc::clone(&unmatched)));

    // --- Fetch backends ---
    let mut fetcher = FallbackChain::new();
    match &cfg.odds_api_key {
        Some(key) => {
            let odds_api = OddsApiFetcher::new(&cfg.odds_api_url, key, cfg.fetch_timeout)
                .map_err(|e| AppError::Config(e.to_string()))?;
            fetcher = fetcher.with(Arc::new(odds_api));
            info!("The Odds API backend enabled ({})", cfg.odds_api_url);
        }
        None => warn!("THE_ODDS_API_KEY not set: snapshot fetches will fail until a backend is configured"),
    }
    let fetch_backends = Arc::new(fetcher.backend_names());

    // --- Spawn tasks ---
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Job scheduler (background, every POLL_INTERVAL_SECS)
    let scheduler = Arc::new(JobScheduler::new(
        store.clone(),
        cache.clone(),
        Arc::clone(&classifier),
        fetcher,
        Arc::new(ProcMeminfo::default()),
        cfg.max_concurrency,
        cfg.poll_interval,
        cfg.fetch_timeout,
    ));
    let scheduler_task = {
        let scheduler = Arc::clone(&scheduler);
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { scheduler.run(shutdown).await })
    };

    // Cache janitor (background, daily)
    let janitor = CacheJanitor::new(cache.clone(), Arc::clone(&unmatched), cfg.cache_retention_days);
    let janitor_task = tokio::spawn(async move { janitor.run(shutdown_rx).await });

    // HTTP API server
    let api_state = ApiState {
        store,
        cache,
        scheduler,
        classifier,
        fetch_backends,
    };
    let app = router(api_state);
    let bind_addr = format!("{}:{}", cfg.api_host, cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Shutdown ---
    info!("Shutting down");
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_task.await {
        error!("Scheduler task ended abnormally: {e}");
    }
    if let Err(e) = janitor_task.await {
        error!("Janitor task ended abnormally: {e}");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}
