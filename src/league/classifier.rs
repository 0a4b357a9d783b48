use std::sync::Arc;

use tracing::debug;

use super::aliases::{self, COUNTRY_PATTERNS, LEAGUE_ALIASES, SPORT_KEYWORDS};
use super::custom::CustomMappings;
use super::unmatched::UnmatchedLog;
use crate::config::match_thresholds::TOURNAMENT_FUZZY_MIN;
use crate::matcher::{find_best_match, normalize, normalize_team};
use crate::types::{Classification, ClassificationSource};

/// Resolves a bet's (sport, tournament, teams) to a provider league slug.
pub struct LeagueClassifier {
    custom: Arc<CustomMappings>,
    unmatched: Arc<UnmatchedLog>,
}

impl LeagueClassifier {
    pub fn new(custom: Arc<CustomMappings>, unmatched: Arc<UnmatchedLog>) -> Self {
        Self { custom, unmatched }
    }

    pub fn custom_mappings(&self) -> &Arc<CustomMappings> {
        &self.custom
    }

    pub fn unmatched_log(&self) -> &Arc<UnmatchedLog> {
        &self.unmatched
    }

    /// First rule that fires wins. A miss is appended to the unmatched log.
    pub fn classify(
        &self,
        home_team: &str,
        away_team: &str,
        tournament: &str,
        sport: &str,
    ) -> Option<Classification> {
        let tournament_norm = normalize(tournament);
        let resolved_sport = resolve_sport(&normalize(sport), &tournament_norm);

        let hit = |league: String, confidence: f64, source: ClassificationSource| {
            debug!(
                tournament,
                league = %league,
                confidence,
                source = %source,
                "League classified"
            );
            Some(Classification {
                league,
                sport: resolved_sport.clone(),
                confidence,
                source,
            })
        };

        if let Some(league) = self.custom.get(&tournament_norm) {
            return hit(league, 1.0, ClassificationSource::Custom);
        }

        if let Some((league, confidence)) = tennis_tour_league(&resolved_sport, &tournament_norm) {
            return hit(league, confidence, ClassificationSource::TournamentPattern);
        }

        if !tournament_norm.is_empty() {
            let alias_hit = LEAGUE_ALIASES.iter().find(|(alias, _)| {
                tournament_norm.contains(alias) || alias.contains(tournament_norm.as_str())
            });
            if let Some((_, slug)) = alias_hit {
                return hit(slug.to_string(), 0.95, ClassificationSource::TournamentAlias);
            }
        }

        match (team_league(home_team), team_league(away_team)) {
            (Some(home), Some(away)) if home == away => {
                return hit(home.to_string(), 0.95, ClassificationSource::TeamLookup);
            }
            (Some(league), _) | (None, Some(league)) => {
                return hit(league.to_string(), 0.80, ClassificationSource::TeamLookup);
            }
            (None, None) => {}
        }

        let alias_keys: Vec<&str> = LEAGUE_ALIASES.iter().map(|(alias, _)| *alias).collect();
        if let Some(best) = find_best_match(&tournament_norm, &alias_keys, TOURNAMENT_FUZZY_MIN) {
            if let Some(slug) = aliases::league_for_alias(best.candidate) {
                return hit(slug.to_string(), best.score, ClassificationSource::FuzzyMatch);
            }
        }

        if let Some(slug) = country_league(&resolved_sport, &tournament_norm) {
            return hit(slug.to_string(), 0.6, ClassificationSource::CountryInference);
        }

        self.unmatched.record(sport, tournament, home_team, away_team);
        None
    }
}

/// Bets filed under "other" get their sport from tournament keywords.
fn resolve_sport(sport_norm: &str, tournament_norm: &str) -> String {
    if sport_norm == "other" {
        if let Some((_, sport)) = SPORT_KEYWORDS
            .iter()
            .find(|(keyword, _)| tournament_norm.contains(keyword))
        {
            return sport.to_string();
        }
    }
    sport_norm.to_string()
}

fn tennis_tour_league(sport: &str, tournament_norm: &str) -> Option<(String, f64)> {
    if sport != "tennis" {
        return None;
    }
    let tour = if tournament_norm.contains("atp") {
        "atp"
    } else if tournament_norm.contains("wta") {
        "wta"
    } else {
        return None;
    };

    let tier = if tournament_norm.contains("masters") || tournament_norm.contains("1000") {
        Some("masters-1000")
    } else if tournament_norm.contains("500") {
        Some("500")
    } else if tournament_norm.contains("250") {
        Some("250")
    } else {
        None
    };

    Some(match tier {
        Some(tier) => (format!("{tour}-{tier}"), 0.90),
        None => (format!("{tour}-tour"), 0.85),
    })
}

fn team_league(team: &str) -> Option<&'static str> {
    aliases::league_for_team(&normalize(team))
        .or_else(|| aliases::league_for_team(&normalize_team(team)))
}

fn country_league(sport: &str, tournament_norm: &str) -> Option<&'static str> {
    if sport.is_empty() {
        return None;
    }
    COUNTRY_PATTERNS
        .iter()
        .filter(|(pattern, _)| tournament_norm.contains(pattern))
        .find_map(|(_, country)| {
            LEAGUE_ALIASES
                .iter()
                .find(|(alias, slug)| slug.contains(country) && alias.contains(sport))
                .map(|(_, slug)| *slug)
        })
}
