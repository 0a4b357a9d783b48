pub mod janitor;
pub mod payload;
pub mod snapshot_cache;

pub use janitor::CacheJanitor;
pub use payload::season_label;
pub use snapshot_cache::{CacheStats, CleanupReport, KeyGuard, SnapshotCache};
