/// Engine snapshots and the JSON file they live in
///
/// A snapshot is a plain copy of engine state. Callbacks can't be serialized,
/// so restoring one either keeps the handlers already registered (merge) or
/// starts over with whatever the records carry (replace).

use crate::core::recency::RecencyIndex;
use crate::error::{Result, WishError};
use crate::store::models::WishRecord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory under the home dir where the CLI keeps its state
const STATE_DIR: &str = ".wishcraft";

const STATE_FILE: &str = "state.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub wishes: Vec<WishRecord>,
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub recency: RecencyIndex,
    #[serde(default)]
    pub context: Vec<String>,
    #[serde(default)]
    pub previous_context: Vec<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Snapshot {
    /// What a disabled engine hands back instead of its state
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }
}

/// How `restore` treats the wishes already registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreMode {
    /// Keep live handlers: a record without a handler borrows the one
    /// registered under its id, and is skipped if there is none
    #[default]
    Merge,
    /// Throw the registry away and install the records as they are
    Replace,
}

/// JSON file holding one snapshot
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `~/.wishcraft/state.json`
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| WishError::Config("could not find home directory".to_string()))?;
        Ok(Self::new(home.join(STATE_DIR).join(STATE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing file is not an error, there's just
    /// nothing saved yet.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no snapshot file yet");
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&raw)?;
        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), wishes = snapshot.wishes.len(), "snapshot saved");
        Ok(())
    }
}
