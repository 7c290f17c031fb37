//! On-disk snapshots of the lookup cache
//!
//! Lets a caller carry UMLS answers across runs so a re-run over the same
//! corpus does not hit the backend at all. The feature extractor never saves
//! or loads snapshots itself; persistence is always an explicit caller action.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{LookupKey, LookupValue};

/// Snapshot format version - increment when key or value layout changes
pub const SNAPSHOT_VERSION: u32 = 2;

/// Serializable copy of every populated cache entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Format version for bincode compatibility
    pub version: u32,

    /// Entries sorted by key
    pub entries: Vec<(LookupKey, LookupValue)>,
}

impl CacheSnapshot {
    /// Load snapshot from disk
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read cache snapshot {}", path.display()))?;
        let snapshot: Self =
            bincode::deserialize(&bytes).context("Failed to decode cache snapshot")?;
        snapshot.check_version()?;

        info!(
            path = %path.display(),
            entries = snapshot.entries.len(),
            "Loaded UMLS cache snapshot"
        );
        Ok(snapshot)
    }

    /// Save snapshot to disk
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = bincode::serialize(self).context("Failed to encode cache snapshot")?;
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write cache snapshot {}", path.display()))?;

        info!(
            path = %path.display(),
            entries = self.entries.len(),
            "Saved UMLS cache snapshot"
        );
        Ok(())
    }

    /// Reject snapshots written with a different key or value layout
    pub fn check_version(&self) -> anyhow::Result<()> {
        if self.version != SNAPSHOT_VERSION {
            anyhow::bail!(
                "Cache snapshot version mismatch: expected {}, got {}",
                SNAPSHOT_VERSION,
                self.version
            );
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
