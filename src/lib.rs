/// wishcraft library
///
/// Command registry with fuzzy matching, usage-biased ordering and
/// context scoping.

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod store;

// Re-exports for convenience
pub use config::EngineConfig;
pub use context::{MatchType, PathRule, Scope};
pub use self::core::{Handler, NavigationSink, WishEngine};
pub use error::{Result, WishError};
pub use store::{RestoreMode, Snapshot, SnapshotFile, Wish, WishSpec};
