pub mod aliases;
pub mod classifier;
pub mod custom;
pub mod unmatched;

pub use classifier::LeagueClassifier;
pub use custom::CustomMappings;
pub use unmatched::{UnmatchedEntry, UnmatchedLog};

/// League slug used to group bets whose league could not be classified.
pub const UNKNOWN_LEAGUE: &str = "unknown";
