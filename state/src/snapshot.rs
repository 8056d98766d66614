//! State snapshot functionality
//!
//! Snapshot metadata lives in a sled database named `metadata`; payloads are
//! written to `<dir>/<height>/<format>`.

use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wolochain_core::{Hash, WolochainError, WolochainResult};

use crate::store::{compute_state_root, StateEntry};

/// Payload format written by this version
pub const SNAPSHOT_FORMAT: u32 = 1;

const METADATA_DB: &str = "metadata";

fn snapshot_err(e: impl std::fmt::Display) -> WolochainError {
    WolochainError::SnapshotError(e.to_string())
}

/// A complete state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Height at time of snapshot
    pub height: u64,
    /// State root hash
    pub root: Hash,
    /// All state entries
    pub entries: Vec<StateEntry>,
}

impl StateSnapshot {
    /// Create a new snapshot from entries
    pub fn new(height: u64, entries: Vec<StateEntry>) -> Self {
        let root = compute_state_root(&entries);
        Self {
            height,
            root,
            entries,
        }
    }

    /// Verify snapshot integrity
    pub fn verify(&self) -> bool {
        compute_state_root(&self.entries) == self.root
    }

    pub fn to_bytes(&self) -> WolochainResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> WolochainResult<Self> {
        bincode::deserialize(bytes).map_err(|e| WolochainError::DeserializationError(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Snapshot record kept in the metadata store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub height: u64,
    pub format: u32,
    pub root: Hash,
    pub entries: u64,
    pub created_at: u64,
}

/// Snapshot policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotOptions {
    /// Snapshot every this many heights; 0 disables snapshots
    pub interval: u64,
    /// Snapshots to keep; 0 keeps all
    pub keep_recent: u32,
}

impl SnapshotOptions {
    pub fn new(interval: u64, keep_recent: u32) -> Self {
        Self {
            interval,
            keep_recent,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.interval > 0
    }

    pub fn should_snapshot(&self, height: u64) -> bool {
        self.is_enabled() && height > 0 && height % self.interval == 0
    }
}

/// On-disk snapshot store
pub struct SnapshotStore {
    dir: PathBuf,
    metadata: Db,
}

impl SnapshotStore {
    /// Open (or create) the store rooted at `dir`
    pub fn open(dir: &Path) -> WolochainResult<Self> {
        std::fs::create_dir_all(dir)?;
        let metadata = sled::open(dir.join(METADATA_DB)).map_err(snapshot_err)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            metadata,
        })
    }

    /// `<home>/data/snapshots`
    pub fn dir_in_home(home: &Path) -> PathBuf {
        home.join("data").join("snapshots")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn payload_path(&self, height: u64, format: u32) -> PathBuf {
        self.dir.join(height.to_string()).join(format.to_string())
    }

    /// Write a snapshot of `entries` taken at `height`
    pub fn create(&self, height: u64, entries: Vec<StateEntry>) -> WolochainResult<SnapshotInfo> {
        let snapshot = StateSnapshot::new(height, entries);
        let path = self.payload_path(height, SNAPSHOT_FORMAT);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, snapshot.to_bytes()?)?;

        let info = SnapshotInfo {
            height,
            format: SNAPSHOT_FORMAT,
            root: snapshot.root,
            entries: snapshot.len() as u64,
            created_at: wolochain_core::Timestamp::now().as_secs(),
        };
        self.metadata
            .insert(height.to_be_bytes().to_vec(), bincode::serialize(&info)?)
            .map_err(snapshot_err)?;
        self.metadata.flush().map_err(snapshot_err)?;

        info!("Created snapshot at height {} ({} entries)", height, info.entries);
        Ok(info)
    }

    /// Snapshot records, ascending by height
    pub fn list(&self) -> WolochainResult<Vec<SnapshotInfo>> {
        self.metadata
            .iter()
            .map(|item| {
                let (_, value) = item.map_err(snapshot_err)?;
                bincode::deserialize(&value).map_err(snapshot_err)
            })
            .collect()
    }

    pub fn latest(&self) -> WolochainResult<Option<SnapshotInfo>> {
        Ok(self.list()?.pop())
    }

    /// Load a snapshot payload and check it against its recorded root
    pub fn load(&self, height: u64) -> WolochainResult<StateSnapshot> {
        let info: SnapshotInfo = match self
            .metadata
            .get(height.to_be_bytes())
            .map_err(snapshot_err)?
        {
            Some(bytes) => bincode::deserialize(&bytes).map_err(snapshot_err)?,
            None => return Err(WolochainError::NotFound(format!("snapshot at height {height}"))),
        };
        let bytes = std::fs::read(self.payload_path(height, info.format))?;
        let snapshot = StateSnapshot::from_bytes(&bytes)?;
        if snapshot.root != info.root || !snapshot.verify() {
            return Err(WolochainError::SnapshotError(format!(
                "snapshot at height {height} does not match its recorded root"
            )));
        }
        Ok(snapshot)
    }

    /// Delete all but the `keep_recent` newest snapshots; 0 keeps all
    pub fn prune(&self, keep_recent: u32) -> WolochainResult<usize> {
        if keep_recent == 0 {
            return Ok(0);
        }
        let snapshots = self.list()?;
        let excess = snapshots.len().saturating_sub(keep_recent as usize);
        for info in &snapshots[..excess] {
            self.metadata
                .remove(info.height.to_be_bytes())
                .map_err(snapshot_err)?;
            let dir = self.dir.join(info.height.to_string());
            if dir.exists() {
                std::fs::remove_dir_all(&dir)?;
            }
            debug!("Pruned snapshot at height {}", info.height);
        }
        self.metadata.flush().map_err(snapshot_err)?;
        Ok(excess)
    }
}
