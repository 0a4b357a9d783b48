use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{BackoffPolicy, FetchError, RetryDisposition, SnapshotFetcher};
use crate::cache::season_label;
use crate::types::{LeagueSnapshot, MarketOdds, SnapshotEvent, SnapshotKey};

const SOURCE: &str = "the_odds_api";

/// Events further than this from the bet's date are dropped.
const DATE_WINDOW_DAYS: i64 = 1;

// Response types

#[derive(Debug, Deserialize)]
struct ApiEvent {
    home_team: String,
    away_team: String,
    commence_time: DateTime<Utc>,
    #[serde(default)]
    bookmakers: Vec<ApiBookmaker>,
}

#[derive(Debug, Deserialize)]
struct ApiBookmaker {
    key: String,
    #[serde(default)]
    markets: Vec<ApiMarket>,
}

#[derive(Debug, Deserialize)]
struct ApiMarket {
    key: String,
    #[serde(default)]
    outcomes: Vec<ApiOutcome>,
}

#[derive(Debug, Deserialize)]
struct ApiOutcome {
    name: String,
    price: f64,
}

/// The Odds API v4 (`/sports/{sport}/odds`), decimal prices for h2h, spreads
/// and totals across the us, uk and eu regions.
pub struct OddsApiFetcher {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    backoff: BackoffPolicy,
}

impl OddsApiFetcher {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            backoff: BackoffPolicy::default(),
        })
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    async fn fetch_events(&self, sport_key: &str) -> Result<Vec<ApiEvent>, FetchError> {
        let url = format!("{}/sports/{}/odds", self.base_url, sport_key);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("regions", "us,uk,eu"),
                ("markets", "h2h,spreads,totals"),
                ("oddsFormat", "decimal"),
                ("dateFormat", "iso"),
            ])
            .send()
            .await?;

        if let Some(remaining) = resp.headers().get("x-requests-remaining") {
            debug!(sport_key, remaining = ?remaining, "Odds API quota");
        }

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SnapshotFetcher for OddsApiFetcher {
    fn name(&self) -> &str {
        SOURCE
    }

    async fn fetch(&self, key: &SnapshotKey) -> Result<Option<LeagueSnapshot>, FetchError> {
        let Some(sport_key) = map_to_odds_api_sport(&key.sport, &key.league) else {
            warn!(%key, "No Odds API mapping for sport/league");
            return Ok(None);
        };

        let mut attempt = 0;
        let events = loop {
            match self.fetch_events(sport_key).await {
                Ok(events) => break events,
                Err(e)
                    if e.disposition() == RetryDisposition::Retryable
                        && attempt < self.backoff.max_retries =>
                {
                    let delay = self.backoff.delay_for_attempt(attempt);
                    warn!(sport_key, attempt, ?delay, "Odds API request failed, retrying: {e}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        let snapshot = build_snapshot(key, events, Utc::now());
        if let Some(s) = &snapshot {
            info!(sport_key, %key, events = s.events.len(), "Odds API snapshot built");
        }
        Ok(snapshot)
    }
}

/// Provider sport key for a (sport, league slug) pair. Unknown soccer leagues
/// fall back to the EPL feed.
pub fn map_to_odds_api_sport(sport: &str, league: &str) -> Option<&'static str> {
    let sport = sport.to_lowercase();
    let league = league.to_lowercase().replace(['-', '_'], " ");

    match sport.as_str() {
        "football" | "soccer" => Some(if league.contains("premier") || league.contains("epl") {
            "soccer_epl"
        } else if league.contains("la liga") || league.contains("laliga") || league.contains("spain") {
            "soccer_spain_la_liga"
        } else if league.contains("bundesliga") || league.contains("germany") {
            "soccer_germany_bundesliga"
        } else if league.contains("serie a") || league.contains("italy") {
            "soccer_italy_serie_a"
        } else if league.contains("ligue 1") || league.contains("france") {
            "soccer_france_ligue_one"
        } else if league.contains("champions") {
            "soccer_uefa_champs_league"
        } else {
            "soccer_epl"
        }),
        "basketball" => Some("basketball_nba"),
        "tennis" => Some(if league.contains("atp") || league.contains("men") {
            "tennis_atp"
        } else {
            "tennis_wta"
        }),
        "american football" | "americanfootball" | "nfl" => Some("americanfootball_nfl"),
        "ice hockey" | "icehockey" | "hockey" => Some("icehockey_nhl"),
        "baseball" => Some("baseball_mlb"),
        _ => None,
    }
}

fn market_label(api_key: &str) -> &str {
    match api_key {
        "h2h" => "1X2",
        "spreads" => "Spread",
        "totals" => "Over/Under 2.5",
        other => other,
    }
}

fn bookmaker_key(api_key: &str) -> String {
    let key = api_key.to_lowercase();
    if key.starts_with("betfair") {
        "betfair".to_string()
    } else {
        key
    }
}

/// Keeps events within a day of the key's date, taking each bookmaker's price
/// for the home-team outcome. `None` when nothing survives.
fn build_snapshot(
    key: &SnapshotKey,
    events: Vec<ApiEvent>,
    fetched_at: DateTime<Utc>,
) -> Option<LeagueSnapshot> {
    let mut kept = Vec::new();

    for event in events {
        let day_delta = (event.commence_time.date_naive() - key.event_date).num_days();
        if day_delta.abs() > DATE_WINDOW_DAYS {
            continue;
        }

        let mut odds: BTreeMap<String, MarketOdds> = BTreeMap::new();
        for bookmaker in &event.bookmakers {
            let bookie = bookmaker_key(&bookmaker.key);
            for market in &bookmaker.markets {
                let home_price = market
                    .outcomes
                    .iter()
                    .find(|o| o.name == event.home_team)
                    .map(|o| o.price);
                if let Some(price) = home_price {
                    odds.entry(market_label(&market.key).to_string())
                        .or_default()
                        .bookmakers
                        .insert(bookie.clone(), price);
                }
            }
        }

        if odds.is_empty() {
            continue;
        }
        kept.push(SnapshotEvent {
            home_team: event.home_team,
            away_team: event.away_team,
            date: event.commence_time.to_rfc3339(),
            odds,
        });
    }

    if kept.is_empty() {
        return None;
    }
    Some(LeagueSnapshot {
        sport: key.sport.clone(),
        league: key.league.clone(),
        season: season_label(key.event_date),
        event_date: key.event_date,
        fetched_at,
        source: SOURCE.to_string(),
        events: kept,
    })
}
