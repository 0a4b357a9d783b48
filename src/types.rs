use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Job lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs never change status again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub fallback_strategy: FallbackStrategy,
    pub total_bets: u32,
    pub processed_bets: u32,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Fallback hierarchy
// ---------------------------------------------------------------------------

/// Which tier of the fallback hierarchy produced a closing price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackType {
    /// The bet's own bookmaker quoted the market.
    Exact,
    /// The reference bookmaker's price stood in.
    Reference,
    /// Weighted mean across every usable bookmaker.
    WeightedAvg,
    Failed,
}

impl FallbackType {
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackType::Exact => "exact",
            FallbackType::Reference => "reference",
            FallbackType::WeightedAvg => "weighted_avg",
            FallbackType::Failed => "failed",
        }
    }
}

impl std::fmt::Display for FallbackType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FallbackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(FallbackType::Exact),
            "reference" | "pinnacle" => Ok(FallbackType::Reference),
            "weighted_avg" => Ok(FallbackType::WeightedAvg),
            "failed" => Ok(FallbackType::Failed),
            other => Err(format!("unknown fallback type '{other}'")),
        }
    }
}

/// How far down the hierarchy a job is allowed to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Only the requested bookmaker's own price.
    Exact,
    /// Requested bookmaker, then the reference bookmaker.
    #[serde(alias = "pinnacle")]
    Reference,
    /// The full hierarchy down to the weighted average.
    #[default]
    WeightedAvg,
}

impl FallbackStrategy {
    pub fn allows(self, tier: FallbackType) -> bool {
        match tier {
            FallbackType::Exact | FallbackType::Failed => true,
            FallbackType::Reference => !matches!(self, FallbackStrategy::Exact),
            FallbackType::WeightedAvg => matches!(self, FallbackStrategy::WeightedAvg),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FallbackStrategy::Exact => "exact",
            FallbackStrategy::Reference => "reference",
            FallbackStrategy::WeightedAvg => "weighted_avg",
        }
    }
}

impl std::fmt::Display for FallbackStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FallbackStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(FallbackStrategy::Exact),
            "reference" | "pinnacle" => Ok(FallbackStrategy::Reference),
            "weighted_avg" => Ok(FallbackStrategy::WeightedAvg),
            other => Err(format!("unknown fallback strategy '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Bets and results
// ---------------------------------------------------------------------------

/// One bet as submitted over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetInput {
    #[serde(rename = "betId", alias = "id")]
    pub bet_id: String,
    pub sport: String,
    #[serde(default)]
    pub tournament: String,
    #[serde(rename = "homeTeam", alias = "home")]
    pub home_team: String,
    #[serde(rename = "awayTeam", alias = "away")]
    pub away_team: String,
    pub market: String,
    #[serde(rename = "eventDate", alias = "date")]
    pub event_date: String,
    pub bookmaker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub bets: Vec<BetInput>,
    #[serde(rename = "fallbackStrategy", default)]
    pub fallback_strategy: FallbackStrategy,
}

/// A persisted bet request. `row_id` is the storage key; `bet_id` is the caller's id.
#[derive(Debug, Clone, PartialEq)]
pub struct BetRequest {
    pub row_id: i64,
    pub job_id: String,
    pub bet_id: String,
    pub sport: String,
    pub tournament: String,
    pub home_team: String,
    pub away_team: String,
    pub market: String,
    pub event_date: NaiveDate,
    pub bookmaker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub closing_odds: Option<f64>,
    pub bookmaker_used: Option<String>,
    pub fallback_type: FallbackType,
    pub confidence: f64,
    pub match_score: f64,
    /// Number of bookmakers that fed a weighted average.
    pub bookmaker_count: Option<u32>,
}

impl MatchResult {
    pub fn failed(match_score: f64) -> Self {
        Self {
            closing_odds: None,
            bookmaker_used: None,
            fallback_type: FallbackType::Failed,
            confidence: 0.0,
            match_score,
            bookmaker_count: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.closing_odds.is_some() && self.fallback_type != FallbackType::Failed
    }
}

/// Result record returned to callers, keyed by their own bet id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetResultView {
    pub bet_id: String,
    pub success: bool,
    pub closing_odds: Option<f64>,
    pub bookmaker_used: Option<String>,
    pub fallback_type: FallbackType,
    pub confidence: f64,
    pub match_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmaker_count: Option<u32>,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Odds for one market of one event: bookmaker key → decimal price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketOdds {
    pub bookmakers: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEvent {
    pub home_team: String,
    pub away_team: String,
    /// Start time as reported by the provider.
    pub date: String,
    /// Market label → prices.
    pub odds: BTreeMap<String, MarketOdds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub sport: String,
    pub league: String,
    pub season: String,
    pub event_date: NaiveDate,
    pub fetched_at: DateTime<Utc>,
    /// Backend that produced the snapshot.
    pub source: String,
    pub events: Vec<SnapshotEvent>,
}

/// Identity of one cached snapshot and of one processing group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotKey {
    pub sport: String,
    pub league: String,
    pub event_date: NaiveDate,
}

impl std::fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.sport, self.league, self.event_date)
    }
}

// ---------------------------------------------------------------------------
// League classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Custom,
    TournamentPattern,
    TournamentAlias,
    TeamLookup,
    FuzzyMatch,
    CountryInference,
}

impl std::fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ClassificationSource::Custom => "custom",
            ClassificationSource::TournamentPattern => "tournament_pattern",
            ClassificationSource::TournamentAlias => "tournament_alias",
            ClassificationSource::TeamLookup => "team_lookup",
            ClassificationSource::FuzzyMatch => "fuzzy_match",
            ClassificationSource::CountryInference => "country_inference",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub league: String,
    /// Sport after keyword inference (differs from the input only for "other").
    pub sport: String,
    pub confidence: f64,
    pub source: ClassificationSource,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ClassificationMiss,
    EventMatchMiss,
    MarketMiss,
    FetchFailure,
    StorageFailure,
    /// Job aborted for a reason other than storage, such as the job row vanishing.
    ProcessingError,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::ClassificationMiss => "classification_miss",
            FailureKind::EventMatchMiss => "event_match_miss",
            FailureKind::MarketMiss => "market_miss",
            FailureKind::FetchFailure => "fetch_failure",
            FailureKind::StorageFailure => "storage_failure",
            FailureKind::ProcessingError => "processing_error",
        };
        write!(f, "{s}")
    }
}

/// Parse the date part of a provider or extension timestamp.
/// Accepts `2024-12-01`, RFC 3339 (`2024-12-01T15:00:00Z`) and naive `2024-12-01T15:00:00`.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%d.%m.%Y") {
        return Some(d);
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_dates_parse_from_common_formats() {
        let want = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        assert_eq!(parse_event_date("2024-12-01"), Some(want));
        assert_eq!(parse_event_date("2024-12-01T15:00:00Z"), Some(want));
        assert_eq!(parse_event_date("2024-12-01T15:00:00.000"), Some(want));
        assert_eq!(parse_event_date("01.12.2024"), Some(want));
        assert_eq!(parse_event_date("yesterday"), None);
    }

    #[test]
    fn strategy_limits_fallback_tiers() {
        assert!(FallbackStrategy::Exact.allows(FallbackType::Exact));
        assert!(!FallbackStrategy::Exact.allows(FallbackType::Reference));
        assert!(FallbackStrategy::Reference.allows(FallbackType::Reference));
        assert!(!FallbackStrategy::Reference.allows(FallbackType::WeightedAvg));
        assert!(FallbackStrategy::WeightedAvg.allows(FallbackType::WeightedAvg));
    }

    #[test]
    fn legacy_pinnacle_strategy_is_accepted() {
        let req: BatchRequest =
            serde_json::from_str(r#"{"bets": [], "fallbackStrategy": "pinnacle"}"#).unwrap();
        assert_eq!(req.fallback_strategy, FallbackStrategy::Reference);

        let req: BatchRequest = serde_json::from_str(r#"{"bets": []}"#).unwrap();
        assert_eq!(req.fallback_strategy, FallbackStrategy::WeightedAvg);
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert_eq!("processing".parse::<JobStatus>(), Ok(JobStatus::Processing));
    }
}
