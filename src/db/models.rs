use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{AppError, Result};
use crate::types::{BetRequest, BetResultView, FallbackType, Job};

/// Row types for the tables in `migrations/0001_init.sql`.

#[derive(Debug, sqlx::FromRow)]
pub struct JobRow {
    pub id: String,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub status: String,
    pub fallback_strategy: String,
    pub total_bets: i64,
    pub processed_bets: i64,
    pub error_log: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct BetRequestRow {
    pub id: i64,
    pub job_id: String,
    pub bet_id: String,
    pub sport: String,
    pub tournament: String,
    pub home_team: String,
    pub away_team: String,
    pub market: String,
    pub event_date: String,
    pub bookmaker: String,
    pub result_odds: Option<f64>,
    pub result_bookmaker: Option<String>,
    pub confidence: Option<f64>,
    pub fallback_type: Option<String>,
    pub match_score: Option<f64>,
    pub bookmaker_count: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct LeagueCacheRow {
    pub fetched_at: i64,
    pub payload: Vec<u8>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CacheStatsRow {
    pub entries: i64,
    pub total_bytes: Option<i64>,
    pub oldest: Option<i64>,
    pub newest: Option<i64>,
}

pub(crate) fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

impl TryFrom<JobRow> for Job {
    type Error = AppError;

    fn try_from(row: JobRow) -> Result<Self> {
        Ok(Job {
            status: row.status.parse().map_err(AppError::Payload)?,
            fallback_strategy: row.fallback_strategy.parse().map_err(AppError::Payload)?,
            created_at: timestamp(row.created_at),
            completed_at: row.completed_at.map(timestamp),
            total_bets: row.total_bets.max(0) as u32,
            processed_bets: row.processed_bets.max(0) as u32,
            error: row.error_log,
            id: row.id,
        })
    }
}

impl BetRequestRow {
    pub fn has_result(&self) -> bool {
        self.fallback_type.is_some()
    }

    pub fn into_request(self) -> Result<BetRequest> {
        let event_date = NaiveDate::parse_from_str(&self.event_date, "%Y-%m-%d").map_err(|e| {
            AppError::Payload(format!("bet {} has bad event date {:?}: {e}", self.id, self.event_date))
        })?;
        Ok(BetRequest {
            row_id: self.id,
            job_id: self.job_id,
            bet_id: self.bet_id,
            sport: self.sport,
            tournament: self.tournament,
            home_team: self.home_team,
            away_team: self.away_team,
            market: self.market,
            event_date,
            bookmaker: self.bookmaker,
        })
    }

    /// The stored result, if this bet has been reconciled.
    pub fn result_view(&self) -> Result<Option<BetResultView>> {
        let Some(fallback) = &self.fallback_type else {
            return Ok(None);
        };
        let fallback_type: FallbackType = fallback.parse().map_err(AppError::Payload)?;
        Ok(Some(BetResultView {
            bet_id: self.bet_id.clone(),
            success: fallback_type != FallbackType::Failed && self.result_odds.is_some(),
            closing_odds: self.result_odds,
            bookmaker_used: self.result_bookmaker.clone(),
            fallback_type,
            confidence: self.confidence.unwrap_or(0.0),
            match_score: self.match_score.unwrap_or(0.0),
            bookmaker_count: self.bookmaker_count.map(|n| n.max(0) as u32),
        }))
    }
}
