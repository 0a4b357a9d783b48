use super::normalize::normalize;

/// Default acceptance threshold for [`find_best_match`].
pub const DEFAULT_MIN_SCORE: f64 = 0.75;

/// Cap on the bonus granted when one name contains the other.
const CONTAINMENT_BONUS_CAP: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch<'a> {
    pub candidate: &'a str,
    pub index: usize,
    pub score: f64,
}

/// Edit distance over chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// `1 - distance / longer length`, in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    match (len_a, len_b) {
        (0, 0) => 1.0,
        (0, _) | (_, 0) => 0.0,
        _ => 1.0 - levenshtein(a, b) as f64 / len_a.max(len_b) as f64,
    }
}

fn containment_bonus(a: &str, b: &str) -> f64 {
    if !(a.contains(b) || b.contains(a)) {
        return 0.0;
    }
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    let longer = len_a.max(len_b);
    if longer == 0 {
        return 0.0;
    }
    (len_a.min(len_b) as f64 / longer as f64).min(CONTAINMENT_BONUS_CAP)
}

/// Best candidate for `target` scoring at least `min_score`.
///
/// An exact match after normalization short-circuits with score 1.0. Other
/// candidates score `similarity` plus a containment bonus, capped at 1.0. Ties
/// keep the earliest candidate.
pub fn find_best_match<'a, S: AsRef<str>>(
    target: &str,
    candidates: &'a [S],
    min_score: f64,
) -> Option<BestMatch<'a>> {
    if target.is_empty() || candidates.is_empty() {
        return None;
    }

    let target_norm = normalize(target);
    let mut best: Option<BestMatch<'a>> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let candidate = candidate.as_ref();
        let candidate_norm = normalize(candidate);

        if candidate_norm == target_norm {
            return Some(BestMatch { candidate, index, score: 1.0 });
        }

        let score = (similarity(&target_norm, &candidate_norm)
            + containment_bonus(&target_norm, &candidate_norm))
        .min(1.0);

        if best.map_or(true, |b| score > b.score) {
            best = Some(BestMatch { candidate, index, score });
        }
    }

    best.filter(|b| b.score >= min_score)
}

/// Every candidate with plain similarity ≥ `min_score`, best first, at most `max_results`.
pub fn find_all_matches<'a, S: AsRef<str>>(
    target: &str,
    candidates: &'a [S],
    min_score: f64,
    max_results: usize,
) -> Vec<BestMatch<'a>> {
    if target.is_empty() || candidates.is_empty() {
        return Vec::new();
    }

    let target_norm = normalize(target);
    let mut matches: Vec<BestMatch<'a>> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let candidate = candidate.as_ref();
            let score = similarity(&target_norm, &normalize(candidate));
            (score >= min_score).then_some(BestMatch { candidate, index, score })
        })
        .collect();

    // Stable sort keeps submission order among equal scores.
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(max_results);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_edges() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("", "x"), 0.0);
        assert_eq!(similarity("x", ""), 0.0);
        for s in ["arsenal", "a", "manchester united", "ñandú"] {
            assert_eq!(similarity(s, s), 1.0);
        }
        assert!((similarity("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-12);
    }

    #[test]
    fn levenshtein_is_symmetric() {
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        assert_eq!(levenshtein("lawn", "flaw"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn exact_normalized_match_short_circuits() {
        let candidates = ["Chelsea FC", "Arsenal", "ARSENAL!"];
        let m = find_best_match("arsenal", &candidates, 0.75).unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.candidate, "Arsenal");
        assert_eq!(m.score, 1.0);
    }

    #[test]
    fn containment_earns_bonus() {
        let candidates = ["Manchester United"];
        let plain = similarity("manchester", "manchester united");
        let m = find_best_match("Manchester", &candidates, 0.0).unwrap();
        assert!((m.score - (plain + 0.2)).abs() < 1e-12);
    }

    #[test]
    fn no_match_below_threshold() {
        let candidates = ["Liverpool", "Everton"];
        assert!(find_best_match("Real Madrid", &candidates, 0.75).is_none());
        assert!(find_best_match("", &candidates, 0.0).is_none());
        let empty: [&str; 0] = [];
        assert!(find_best_match("Real Madrid", &empty, 0.0).is_none());
    }

    #[test]
    fn ties_keep_first_candidate() {
        let candidates = ["abcx", "abcy"];
        let m = find_best_match("abcz", &candidates, 0.0).unwrap();
        assert_eq!(m.index, 0);
    }

    #[test]
    fn all_matches_sorted_and_truncated() {
        let candidates = ["arsenal", "arsenol", "chelsea", "arsenal u21"];
        let matches = find_all_matches("arsenal", &candidates, 0.5, 2);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].candidate, "arsenal");
        assert_eq!(matches[1].candidate, "arsenol");
        assert!(matches[0].score >= matches[1].score);
    }
}
