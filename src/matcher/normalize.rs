//! Canonical forms for team, bookmaker and market labels.
//!
//! Betting-site labels and provider labels never agree on spelling. Everything
//! is first folded by [`normalize`] (lowercase ASCII words separated by single
//! spaces), then run through the lookup tables below. Table keys are stored in
//! their already-normalized form.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Short names seen on the betting site → the full name the provider uses.
static TEAM_ABBREVIATIONS: &[(&str, &str)] = &[
    // England
    ("man city", "manchester city"),
    ("man utd", "manchester united"),
    ("man united", "manchester united"),
    ("spurs", "tottenham hotspur"),
    ("tottenham", "tottenham hotspur"),
    ("wolves", "wolverhampton wanderers"),
    ("wolverhampton", "wolverhampton wanderers"),
    ("newcastle utd", "newcastle united"),
    ("newcastle", "newcastle united"),
    ("west ham utd", "west ham united"),
    ("west ham", "west ham united"),
    ("sheffield utd", "sheffield united"),
    ("nottm forest", "nottingham forest"),
    ("nottingham", "nottingham forest"),
    ("brighton", "brighton hove albion"),
    ("leicester", "leicester city"),
    ("leeds", "leeds united"),
    // Spain
    ("atletico", "atletico madrid"),
    ("atleti", "atletico madrid"),
    ("real", "real madrid"),
    ("barca", "barcelona"),
    ("sociedad", "real sociedad"),
    ("betis", "real betis"),
    ("athletic", "athletic bilbao"),
    ("celta", "celta vigo"),
    // Italy
    ("inter", "inter milan"),
    ("internazionale", "inter milan"),
    ("milan", "ac milan"),
    ("juve", "juventus"),
    // Germany
    ("bayern", "bayern munich"),
    ("dortmund", "borussia dortmund"),
    ("bvb", "borussia dortmund"),
    ("gladbach", "borussia monchengladbach"),
    ("bmg", "borussia monchengladbach"),
    ("leverkusen", "bayer leverkusen"),
    ("leipzig", "rb leipzig"),
    ("frankfurt", "eintracht frankfurt"),
    ("koln", "fc koln"),
    ("cologne", "fc koln"),
    ("bremen", "werder bremen"),
    // France
    ("psg", "paris saint germain"),
    ("paris sg", "paris saint germain"),
    ("paris", "paris saint germain"),
    ("om", "olympique marseille"),
    ("marseille", "olympique marseille"),
    ("ol", "olympique lyonnais"),
    ("lyon", "olympique lyonnais"),
    // Elsewhere in Europe
    ("ajax", "ajax amsterdam"),
    ("psv", "psv eindhoven"),
    ("sporting", "sporting lisbon"),
    ("benfica", "sl benfica"),
    ("porto", "fc porto"),
];

static BOOKMAKER_ALIASES: &[(&str, &str)] = &[
    ("bet365", "bet365"),
    ("bet 365", "bet365"),
    ("b365", "bet365"),
    ("betfair", "betfair"),
    ("betfair exchange", "betfair"),
    ("betfair ex", "betfair"),
    ("pinnacle", "pinnacle"),
    ("pinnaclesports", "pinnacle"),
    ("pinnacle sports", "pinnacle"),
    ("pinnacle com", "pinnacle"),
    ("smarkets", "smarkets"),
    ("matchbook", "matchbook"),
    ("matchbook com", "matchbook"),
    ("betdaq", "betdaq"),
    ("william hill", "williamhill"),
    ("williamhill", "williamhill"),
    ("hills", "williamhill"),
    ("paddy power", "paddypower"),
    ("paddypower", "paddypower"),
    ("paddy", "paddypower"),
    ("betfred", "betfred"),
    ("ladbrokes", "ladbrokes"),
    ("coral", "coral"),
    ("unibet", "unibet"),
    ("888sport", "888sport"),
    ("888", "888sport"),
    ("betway", "betway"),
    ("sky bet", "skybet"),
    ("skybet", "skybet"),
    ("betvictor", "betvictor"),
    ("bet victor", "betvictor"),
    ("stan james", "stanjames"),
    ("stanjames", "stanjames"),
    ("sportingbet", "sportingbet"),
    ("sporting bet", "sportingbet"),
    ("10bet", "10bet"),
    ("bwin", "bwin"),
    ("betclic", "betclic"),
    ("marathonbet", "marathonbet"),
    ("marathon", "marathonbet"),
    ("1xbet", "1xbet"),
    ("1x bet", "1xbet"),
];

/// Normalized forms of ".com", ".co.uk", " exchange", " ex".
const BOOKMAKER_SUFFIXES: &[&str] = &[" com", " co uk", " exchange", " ex"];

static MARKET_MAPPINGS: &[(&str, &str)] = &[
    // Match winner
    ("1x2", "match_winner"),
    ("match winner", "match_winner"),
    ("full time result", "match_winner"),
    ("ft result", "match_winner"),
    ("home", "match_winner"),
    ("draw", "match_winner"),
    ("away", "match_winner"),
    ("match result", "match_winner"),
    // Both teams to score
    ("btts", "both_teams_to_score"),
    ("both teams to score", "both_teams_to_score"),
    ("gg", "both_teams_to_score"),
    ("btts yes", "both_teams_to_score"),
    ("btts no", "both_teams_to_score"),
    // Totals
    ("over", "over_under"),
    ("under", "over_under"),
    ("over under", "over_under"),
    ("o u", "over_under"),
    ("totals", "over_under"),
    ("total goals", "over_under"),
    ("over 0 5", "over_under_0_5"),
    ("under 0 5", "over_under_0_5"),
    ("over 1 5", "over_under_1_5"),
    ("under 1 5", "over_under_1_5"),
    ("over 2 5", "over_under_2_5"),
    ("under 2 5", "over_under_2_5"),
    ("over 3 5", "over_under_3_5"),
    ("under 3 5", "over_under_3_5"),
    ("over 4 5", "over_under_4_5"),
    ("under 4 5", "over_under_4_5"),
    // Double chance
    ("double chance", "double_chance"),
    ("dc", "double_chance"),
    ("1x", "double_chance"),
    ("12", "double_chance"),
    ("x2", "double_chance"),
    // Draw no bet
    ("draw no bet", "draw_no_bet"),
    ("dnb", "draw_no_bet"),
    // Handicaps
    ("handicap", "handicap"),
    ("asian handicap", "asian_handicap"),
    ("ah", "asian_handicap"),
    ("european handicap", "european_handicap"),
    ("eh", "european_handicap"),
    // Correct score
    ("correct score", "correct_score"),
    ("cs", "correct_score"),
    ("exact score", "correct_score"),
    // Half time
    ("half time", "half_time"),
    ("ht", "half_time"),
    ("1st half", "half_time"),
    ("first half", "half_time"),
    ("ht ft", "half_time_full_time"),
    ("htft", "half_time_full_time"),
    // Tennis
    ("set betting", "set_betting"),
    ("total sets", "total_sets"),
    ("total games", "total_games"),
    // Basketball and US sports
    ("moneyline", "moneyline"),
    ("ml", "moneyline"),
    ("spread", "spread"),
    ("point spread", "spread"),
];

fn lookup<'a>(table: &'a [(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Lowercase, strip diacritics, turn everything outside `[a-z0-9]` into a
/// separator and collapse separators to single spaces.
pub fn normalize(s: &str) -> String {
    let lowered = s.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut gap = false;
    for c in lowered.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if gap && !out.is_empty() {
                out.push(' ');
            }
            gap = false;
            out.push(c);
        } else {
            gap = true;
        }
    }
    out
}

/// Normalized team name with known abbreviations expanded.
///
/// An exact table hit wins. Otherwise the longest abbreviation found at the
/// start of the name (followed by a space) is expanded and the rest of the
/// name is kept, so `"man utd u21"` becomes `"manchester united u21"`.
pub fn normalize_team(s: &str) -> String {
    let normalized = normalize(s);
    if let Some(full) = lookup(TEAM_ABBREVIATIONS, &normalized) {
        return full.to_string();
    }

    let mut best: Option<(&str, &str)> = None;
    for &(abbrev, full) in TEAM_ABBREVIATIONS {
        if starts_with_words(&normalized, abbrev)
            && best.map_or(true, |(b, _)| abbrev.len() > b.len())
        {
            best = Some((abbrev, full));
        }
    }

    match best {
        // "tottenham hotspur" must not grow into "tottenham hotspur hotspur".
        Some((_, full)) if normalized == full || starts_with_words(&normalized, full) => normalized,
        Some((abbrev, full)) => format!("{}{}", full, &normalized[abbrev.len()..]),
        None => normalized,
    }
}

/// `s` begins with `prefix` followed by a space.
fn starts_with_words(s: &str, prefix: &str) -> bool {
    s.len() > prefix.len() && s.starts_with(prefix) && s.as_bytes()[prefix.len()] == b' '
}

/// Canonical bookmaker key: alias lookup, then one suffix strip and a second lookup.
pub fn normalize_bookmaker(s: &str) -> String {
    let normalized = normalize(s);
    if let Some(canonical) = lookup(BOOKMAKER_ALIASES, &normalized) {
        return canonical.to_string();
    }

    let stripped = BOOKMAKER_SUFFIXES
        .iter()
        .find_map(|suffix| normalized.strip_suffix(suffix))
        .unwrap_or(&normalized);

    lookup(BOOKMAKER_ALIASES, stripped)
        .map(str::to_string)
        .unwrap_or_else(|| stripped.to_string())
}

/// Canonical market key, e.g. `"Over/Under 2.5"` → `"over_under_2_5"`.
pub fn normalize_market(s: &str) -> String {
    let normalized = normalize(s);
    if let Some(canonical) = lookup(MARKET_MAPPINGS, &normalized) {
        return canonical.to_string();
    }

    if let Some(line) = over_under_line(&normalized) {
        return format!("over_under_{line}");
    }

    // Longest mapping key that appears as whole words inside the label.
    let padded = format!(" {normalized} ");
    let contained = MARKET_MAPPINGS
        .iter()
        .filter(|(key, _)| padded.contains(&format!(" {key} ")))
        .fold(None::<(&str, &str)>, |best, &(key, value)| match best {
            Some((b, _)) if b.len() >= key.len() => best,
            _ => Some((key, value)),
        });
    if let Some((_, value)) = contained {
        return value.to_string();
    }

    normalized
}

/// `"over 3 25"` → `Some("3_25")`, `"over under 2 5"` → `Some("2_5")`.
fn over_under_line(normalized: &str) -> Option<String> {
    let mut words = normalized.split(' ').peekable();
    match words.next() {
        Some("over") => {
            words.next_if_eq(&"under");
        }
        Some("under") => {}
        _ => return None,
    }
    let digits: Vec<&str> = words
        .take(2)
        .take_while(|w| !w.is_empty() && w.bytes().all(|b| b.is_ascii_digit()))
        .collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits.join("_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_accents_and_punctuation() {
        assert_eq!(normalize("  Atlético   Madrid!! "), "atletico madrid");
        assert_eq!(normalize("Paris Saint-Germain"), "paris saint germain");
        assert_eq!(normalize("Borussia Mönchengladbach"), "borussia monchengladbach");
        assert_eq!(normalize("1. FC Köln"), "1 fc koln");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("---"), "");
    }

    #[test]
    fn team_abbreviations_expand() {
        assert_eq!(normalize_team("Man Utd"), "manchester united");
        assert_eq!(normalize_team("PSG"), "paris saint germain");
        assert_eq!(normalize_team("Chelsea"), "chelsea");
    }

    #[test]
    fn team_prefix_expansion_prefers_longest_abbreviation() {
        // "west ham" and "west ham utd" are both prefixes; the longer one wins.
        assert_eq!(normalize_team("West Ham Utd U23"), "west ham united u23");
        assert_eq!(normalize_team("Man City Women"), "manchester city women");
        // "real" only expands when followed by a space.
        assert_eq!(normalize_team("Realto"), "realto");
        // Already-canonical names are left alone.
        assert_eq!(normalize_team("Tottenham Hotspur"), "tottenham hotspur");
        assert_eq!(normalize_team("Real Madrid Castilla"), "real madrid castilla");
    }

    #[test]
    fn bookmaker_aliases_and_suffixes() {
        assert_eq!(normalize_bookmaker("Bet 365"), "bet365");
        assert_eq!(normalize_bookmaker("Pinnacle.com"), "pinnacle");
        assert_eq!(normalize_bookmaker("Betfair Exchange"), "betfair");
        assert_eq!(normalize_bookmaker("Smarkets.com"), "smarkets");
        assert_eq!(normalize_bookmaker("NewBook.co.uk"), "newbook");
        assert_eq!(normalize_bookmaker("SomeBook"), "somebook");
    }

    #[test]
    fn markets_map_to_canonical_keys() {
        assert_eq!(normalize_market("1X2"), "match_winner");
        assert_eq!(normalize_market("Over/Under 2.5"), "over_under_2_5");
        assert_eq!(normalize_market("Asian Handicap -1.5"), "asian_handicap");
        assert_eq!(normalize_market("Over 3.25"), "over_under_3_25");
        assert_eq!(normalize_market("Total Goals"), "over_under");
        assert_eq!(normalize_market("Point Spread"), "spread");
        assert_eq!(normalize_market("Player props"), "player props");
    }

    #[test]
    fn over_under_pattern_extracts_line() {
        assert_eq!(over_under_line("over 3 25"), Some("3_25".to_string()));
        assert_eq!(over_under_line("under 7"), Some("7".to_string()));
        assert_eq!(over_under_line("over under 2 5"), Some("2_5".to_string()));
        assert_eq!(over_under_line("over goals"), None);
        assert_eq!(over_under_line("handicap 1 5"), None);
    }
}
