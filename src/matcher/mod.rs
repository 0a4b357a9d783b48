pub mod fuzzy;
pub mod normalize;

pub use fuzzy::{find_all_matches, find_best_match, levenshtein, similarity, BestMatch};
pub use normalize::{normalize, normalize_bookmaker, normalize_market, normalize_team};
