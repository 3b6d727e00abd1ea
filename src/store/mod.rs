/// Wish models and snapshot storage
///
/// No database here: state is a serde snapshot written out as JSON.

pub mod models;
pub mod snapshot;

pub use models::*;
pub use snapshot::{RestoreMode, Snapshot, SnapshotFile};
