use std::collections::BTreeMap;

use tracing::debug;

use crate::config::confidence;
use crate::config::match_thresholds::{EVENT_MIN, TEAM_SIDE_MIN};
use crate::matcher::{find_best_match, normalize_bookmaker, normalize_market, normalize_team};
use crate::types::{
    BetRequest, FallbackStrategy, FallbackType, LeagueSnapshot, MarketOdds, MatchResult, SnapshotEvent,
};

/// Canonical key of the bookmaker whose price stands in when the bet's own is missing.
pub const REFERENCE_BOOKMAKER: &str = "pinnacle";

/// Label reported for reference-tier results.
const REFERENCE_LABEL: &str = "Pinnacle";

const WEIGHTED_AVG_LABEL: &str = "Weighted Average";

/// Prices at or below this are ignored when averaging.
pub const MIN_USABLE_PRICE: f64 = 1.01;

/// Averaging weight per canonical bookmaker. Unlisted bookmakers weigh 1.0.
static BOOKMAKER_WEIGHTS: &[(&str, f64)] = &[
    ("pinnacle", 3.0),
    ("betfair", 2.5),
    ("smarkets", 2.0),
    ("bet365", 1.5),
    ("matchbook", 1.5),
];

pub fn bookmaker_weight(canonical: &str) -> f64 {
    BOOKMAKER_WEIGHTS
        .iter()
        .find(|(name, _)| *name == canonical)
        .map(|(_, w)| *w)
        .unwrap_or(1.0)
}

/// Best event of a snapshot for one bet.
#[derive(Debug, Clone, Copy)]
pub struct EventMatch<'a> {
    pub event: Option<&'a SnapshotEvent>,
    /// Average of the two side scores. For a miss, the best average seen on any event.
    pub score: f64,
}

/// Pick the event whose teams best match the bet's.
///
/// Each side is scored on its own against that event's side; both must reach
/// the per-side threshold and the average must reach the event threshold.
pub fn match_event<'a>(bet: &BetRequest, events: &'a [SnapshotEvent]) -> EventMatch<'a> {
    let home = normalize_team(&bet.home_team);
    let away = normalize_team(&bet.away_team);

    let mut best_seen = 0.0_f64;
    let mut best: Option<(&'a SnapshotEvent, f64)> = None;

    for event in events {
        let home_score = side_score(&home, &event.home_team);
        let away_score = side_score(&away, &event.away_team);
        let average = (home_score + away_score) / 2.0;
        best_seen = best_seen.max(average);

        let qualifies = home_score >= TEAM_SIDE_MIN && away_score >= TEAM_SIDE_MIN;
        if qualifies && best.map_or(true, |(_, s)| average > s) {
            best = Some((event, average));
        }
    }

    match best {
        Some((event, score)) if score >= EVENT_MIN => EventMatch { event: Some(event), score },
        _ => EventMatch { event: None, score: best_seen },
    }
}

fn side_score(bet_side: &str, event_side: &str) -> f64 {
    let candidate = [normalize_team(event_side)];
    find_best_match(bet_side, &candidate, 0.0)
        .map(|m| m.score)
        .unwrap_or(0.0)
}

/// The event's odds for the bet's market: exact label first, then canonical market key.
pub fn find_market<'a>(event: &'a SnapshotEvent, market: &str) -> Option<&'a MarketOdds> {
    if let Some(odds) = event.odds.get(market) {
        return Some(odds);
    }
    let wanted = normalize_market(market);
    event
        .odds
        .iter()
        .find(|(label, _)| normalize_market(label) == wanted)
        .map(|(_, odds)| odds)
}

fn valid_price(price: f64) -> bool {
    price.is_finite() && price > 1.0
}

fn find_bookmaker(bookmakers: &BTreeMap<String, f64>, canonical: &str) -> Option<f64> {
    if let Some(&price) = bookmakers.get(canonical) {
        if valid_price(price) {
            return Some(price);
        }
    }
    bookmakers
        .iter()
        .find(|(name, price)| valid_price(**price) && normalize_bookmaker(name) == canonical)
        .map(|(_, price)| *price)
}

/// Weighted mean of every usable price, rounded to 3 decimals, with the contributor count.
pub fn weighted_average(bookmakers: &BTreeMap<String, f64>) -> Option<(f64, u32)> {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut count = 0u32;

    for (name, &price) in bookmakers {
        if !price.is_finite() || price <= MIN_USABLE_PRICE {
            continue;
        }
        let weight = bookmaker_weight(&normalize_bookmaker(name));
        weighted_sum += price * weight;
        total_weight += weight;
        count += 1;
    }

    if count == 0 || total_weight <= 0.0 {
        return None;
    }
    let average = weighted_sum / total_weight;
    Some(((average * 1000.0).round() / 1000.0, count))
}

/// Resolve a closing price for `bet` from `snapshot`, walking the fallback
/// hierarchy no further than `strategy` allows.
///
/// Never fails: every miss becomes a `Failed` result that still carries the
/// best event match score found.
pub fn resolve(
    bet: &BetRequest,
    snapshot: Option<&LeagueSnapshot>,
    strategy: FallbackStrategy,
) -> MatchResult {
    let Some(snapshot) = snapshot else {
        return MatchResult::failed(0.0);
    };

    let matched = match_event(bet, &snapshot.events);
    let Some(event) = matched.event else {
        debug!(bet_id = %bet.bet_id, score = matched.score, "No event match");
        return MatchResult::failed(matched.score);
    };

    let Some(market) = find_market(event, &bet.market) else {
        debug!(bet_id = %bet.bet_id, market = %bet.market, "Market not quoted");
        return MatchResult::failed(matched.score);
    };

    let requested = normalize_bookmaker(&bet.bookmaker);
    if let Some(price) = find_bookmaker(&market.bookmakers, &requested) {
        return MatchResult {
            closing_odds: Some(price),
            bookmaker_used: Some(bet.bookmaker.clone()),
            fallback_type: FallbackType::Exact,
            confidence: confidence::EXACT,
            match_score: matched.score,
            bookmaker_count: None,
        };
    }

    if strategy.allows(FallbackType::Reference) {
        if let Some(price) = find_bookmaker(&market.bookmakers, REFERENCE_BOOKMAKER) {
            return MatchResult {
                closing_odds: Some(price),
                bookmaker_used: Some(REFERENCE_LABEL.to_string()),
                fallback_type: FallbackType::Reference,
                confidence: confidence::REFERENCE,
                match_score: matched.score,
                bookmaker_count: None,
            };
        }
    }

    if strategy.allows(FallbackType::WeightedAvg) {
        if let Some((price, count)) = weighted_average(&market.bookmakers) {
            return MatchResult {
                closing_odds: Some(price),
                bookmaker_used: Some(WEIGHTED_AVG_LABEL.to_string()),
                fallback_type: FallbackType::WeightedAvg,
                confidence: confidence::WEIGHTED_AVG,
                match_score: matched.score,
                bookmaker_count: Some(count),
            };
        }
    }

    MatchResult::failed(matched.score)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn bet(home: &str, away: &str, market: &str, bookmaker: &str) -> BetRequest {
        BetRequest {
            row_id: 1,
            job_id: "job".to_string(),
            bet_id: "bet-1".to_string(),
            sport: "soccer".to_string(),
            tournament: "Premier League".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            market: market.to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            bookmaker: bookmaker.to_string(),
        }
    }

    fn event(home: &str, away: &str, prices: &[(&str, f64)]) -> SnapshotEvent {
        let bookmakers = prices.iter().map(|(b, p)| (b.to_string(), *p)).collect();
        let mut odds = BTreeMap::new();
        odds.insert("1X2".to_string(), MarketOdds { bookmakers });
        SnapshotEvent {
            home_team: home.to_string(),
            away_team: away.to_string(),
            date: "2024-12-01T15:00:00Z".to_string(),
            odds,
        }
    }

    fn snapshot(events: Vec<SnapshotEvent>) -> LeagueSnapshot {
        LeagueSnapshot {
            sport: "soccer".to_string(),
            league: "england-premier-league".to_string(),
            season: "2024/2025".to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            fetched_at: Utc::now(),
            source: "test".to_string(),
            events,
        }
    }

    #[test]
    fn missing_snapshot_fails() {
        let r = resolve(&bet("Arsenal", "Chelsea", "1X2", "bet365"), None, FallbackStrategy::WeightedAvg);
        assert_eq!(r.fallback_type, FallbackType::Failed);
        assert_eq!(r.confidence, 0.0);
        assert!(r.closing_odds.is_none());
    }

    #[test]
    fn exact_beats_reference() {
        let snap = snapshot(vec![event("Arsenal", "Chelsea", &[("pinnacle", 1.90), ("bet365", 1.85)])]);
        let r = resolve(&bet("Arsenal", "Chelsea", "1X2", "bet365"), Some(&snap), FallbackStrategy::WeightedAvg);
        assert_eq!(r.closing_odds, Some(1.85));
        assert_eq!(r.fallback_type, FallbackType::Exact);
        assert_eq!(r.confidence, 0.95);
        assert_eq!(r.match_score, 1.0);
    }

    #[test]
    fn reference_when_requested_bookmaker_missing() {
        let snap = snapshot(vec![event("Arsenal", "Chelsea", &[("Pinnacle.com", 1.90), ("unibet", 1.80)])]);
        let r = resolve(&bet("Arsenal", "Chelsea", "1X2", "William Hill"), Some(&snap), FallbackStrategy::WeightedAvg);
        assert_eq!(r.closing_odds, Some(1.90));
        assert_eq!(r.fallback_type, FallbackType::Reference);
        assert_eq!(r.confidence, 0.85);
        assert_eq!(r.bookmaker_used.as_deref(), Some("Pinnacle"));
    }

    #[test]
    fn weighted_average_of_usable_prices() {
        let snap = snapshot(vec![event("Arsenal", "Chelsea", &[("pinnacle", 2.00), ("unknownbook", 2.20)])]);
        let (avg, count) = weighted_average(&snap.events[0].odds["1X2"].bookmakers).unwrap();
        assert!((avg - 2.05).abs() < 1e-9);
        assert_eq!(count, 2);

        let snap = snapshot(vec![event("Arsenal", "Chelsea", &[("betfair", 2.00), ("unknownbook", 2.20), ("junk", 1.01)])]);
        let r = resolve(&bet("Arsenal", "Chelsea", "1X2", "bet365"), Some(&snap), FallbackStrategy::WeightedAvg);
        assert_eq!(r.fallback_type, FallbackType::WeightedAvg);
        assert_eq!(r.confidence, 0.70);
        assert_eq!(r.bookmaker_count, Some(2));
        // (2.00 * 2.5 + 2.20 * 1.0) / 3.5 = 2.0571...
        assert!((r.closing_odds.unwrap() - 2.057).abs() < 1e-9);
    }

    #[test]
    fn strategy_caps_the_hierarchy() {
        let snap = snapshot(vec![event("Arsenal", "Chelsea", &[("pinnacle", 1.90), ("unibet", 1.80)])]);
        let b = bet("Arsenal", "Chelsea", "1X2", "bet365");

        let r = resolve(&b, Some(&snap), FallbackStrategy::Exact);
        assert_eq!(r.fallback_type, FallbackType::Failed);
        assert_eq!(r.match_score, 1.0);

        let snap = snapshot(vec![event("Arsenal", "Chelsea", &[("unibet", 1.80)])]);
        let r = resolve(&b, Some(&snap), FallbackStrategy::Reference);
        assert_eq!(r.fallback_type, FallbackType::Failed);
        let r = resolve(&b, Some(&snap), FallbackStrategy::WeightedAvg);
        assert_eq!(r.fallback_type, FallbackType::WeightedAvg);
    }

    #[test]
    fn unmatched_event_keeps_diagnostic_score() {
        let snap = snapshot(vec![event("Liverpool", "Everton", &[("bet365", 1.5)])]);
        let r = resolve(&bet("Arsenal", "Chelsea", "1X2", "bet365"), Some(&snap), FallbackStrategy::WeightedAvg);
        assert_eq!(r.fallback_type, FallbackType::Failed);
        assert!(r.match_score < 0.5);

        // One side perfect, the other far off: average is high but the event does not qualify.
        let snap = snapshot(vec![event("Arsenal", "Tottenham", &[("bet365", 1.5)])]);
        let r = resolve(&bet("Arsenal", "Chelsea", "1X2", "bet365"), Some(&snap), FallbackStrategy::WeightedAvg);
        assert_eq!(r.fallback_type, FallbackType::Failed);
        assert!(r.match_score > 0.5);
    }

    #[test]
    fn missing_market_keeps_match_score() {
        let snap = snapshot(vec![event("Arsenal", "Chelsea", &[("bet365", 1.5)])]);
        let r = resolve(&bet("Arsenal", "Chelsea", "Correct Score", "bet365"), Some(&snap), FallbackStrategy::WeightedAvg);
        assert_eq!(r.fallback_type, FallbackType::Failed);
        assert_eq!(r.match_score, 1.0);
    }

    #[test]
    fn market_and_team_spellings_are_reconciled() {
        let snap = snapshot(vec![
            event("Liverpool", "Everton", &[("bet365", 1.5)]),
            event("Manchester United", "Tottenham Hotspur", &[("Bet 365", 2.4)]),
        ]);
        let r = resolve(&bet("Man Utd", "Spurs", "Match Winner", "bet365"), Some(&snap), FallbackStrategy::WeightedAvg);
        assert_eq!(r.fallback_type, FallbackType::Exact);
        assert_eq!(r.closing_odds, Some(2.4));
    }

    #[test]
    fn no_usable_prices_fails() {
        let snap = snapshot(vec![event("Arsenal", "Chelsea", &[("unibet", 1.01), ("coral", 0.0)])]);
        let r = resolve(&bet("Arsenal", "Chelsea", "1X2", "bet365"), Some(&snap), FallbackStrategy::WeightedAvg);
        assert_eq!(r.fallback_type, FallbackType::Failed);
        assert_eq!(r.confidence, 0.0);
    }
}
