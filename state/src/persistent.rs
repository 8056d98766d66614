//! Versioned persistent state store using sled database
//!
//! Every commit writes the full live key set under a new height
//! (`height_be ++ key` in the `versions` tree) and records the state root of
//! that height in `meta`, next to the block time it was committed for. The
//! `fast` tree mirrors the latest committed values.

use parking_lot::RwLock;
use sled::{Db, Tree};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use wolochain_core::{Hash, StateReader, StateWriter, WolochainError, WolochainResult};

use crate::cache::{merge_overlay, Change, InterBlockCache};
use crate::pruning::PruningOptions;
use crate::store::{compute_state_root, StateEntry};
use crate::trace::{TraceOperation, TraceSink};

const VERSIONS_TREE: &str = "versions";
const FAST_TREE: &str = "fast";
const META_TREE: &str = "meta";
const LATEST_KEY: &[u8] = b"latest";
const ROOT_PREFIX: &[u8] = b"root/";
const TIME_PREFIX: &[u8] = b"time/";

/// Bytes of sled page cache per configured cache unit
pub const CACHE_UNIT_BYTES: u64 = 256;

fn storage_err(e: sled::Error) -> WolochainError {
    WolochainError::StorageError(e.to_string())
}

fn meta_key(prefix: &[u8], height: u64) -> Vec<u8> {
    let mut key = prefix.to_vec();
    key.extend_from_slice(&height.to_be_bytes());
    key
}

fn root_key(height: u64) -> Vec<u8> {
    meta_key(ROOT_PREFIX, height)
}

fn time_key(height: u64) -> Vec<u8> {
    meta_key(TIME_PREFIX, height)
}

fn versioned_key(height: u64, key: &[u8]) -> Vec<u8> {
    let mut full = Vec::with_capacity(8 + key.len());
    full.extend_from_slice(&height.to_be_bytes());
    full.extend_from_slice(key);
    full
}

fn decode_height(bytes: &[u8]) -> WolochainResult<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| WolochainError::StorageError("corrupt height record".into()))?;
    Ok(u64::from_be_bytes(arr))
}

/// Unopened location of the application database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<home>/data/application.db`
    pub fn in_home(home: &Path) -> Self {
        Self::new(home.join("data").join("application.db"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

/// Options for opening a [`VersionedStore`]
#[derive(Clone, Default)]
pub struct StoreOptions {
    pub pruning: PruningOptions,
    /// Cache units; see [`CACHE_UNIT_BYTES`]. 0 keeps sled's default.
    pub cache_size: u64,
    pub disable_fast_node: bool,
    pub inter_block_cache: Option<InterBlockCache>,
    pub trace: Option<TraceSink>,
}

/// Result of a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitInfo {
    pub height: u64,
    pub app_hash: Hash,
}

/// Versioned persistent state store backed by sled database
pub struct VersionedStore {
    db: Db,
    versions: Tree,
    fast: Tree,
    meta: Tree,
    options: StoreOptions,
    latest: u64,
    loaded: u64,
    initial_version: u64,
    working: BTreeMap<Vec<u8>, Change>,
    pending_time: Option<u64>,
}

impl VersionedStore {
    pub fn open(database: &Database, options: StoreOptions) -> WolochainResult<Self> {
        if let Some(parent) = database.path().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut config = sled::Config::new().path(database.path());
        if options.cache_size > 0 {
            config = config.cache_capacity(options.cache_size.saturating_mul(CACHE_UNIT_BYTES));
        }
        let db = config.open().map_err(storage_err)?;

        let versions = db.open_tree(VERSIONS_TREE).map_err(storage_err)?;
        let fast = db.open_tree(FAST_TREE).map_err(storage_err)?;
        let meta = db.open_tree(META_TREE).map_err(storage_err)?;

        let latest = match meta.get(LATEST_KEY).map_err(storage_err)? {
            Some(bytes) => decode_height(&bytes)?,
            None => 0,
        };

        debug!(
            "Opened application store at {} (latest version {})",
            database.path().display(),
            latest
        );

        Ok(Self {
            db,
            versions,
            fast,
            meta,
            options,
            latest,
            loaded: latest,
            initial_version: 1,
            working: BTreeMap::new(),
            pending_time: None,
        })
    }

    /// Height of the latest committed version, 0 when empty
    pub fn latest_version(&self) -> u64 {
        self.latest
    }

    /// Height of the currently loaded version
    pub fn loaded_version(&self) -> u64 {
        self.loaded
    }

    pub fn is_empty(&self) -> bool {
        self.latest == 0
    }

    /// Height assigned to the first commit of an empty store
    pub fn set_initial_version(&mut self, height: u64) {
        self.initial_version = height.max(1);
    }

    pub fn pruning(&self) -> &PruningOptions {
        &self.options.pruning
    }

    pub fn load_latest(&mut self) -> WolochainResult<()> {
        self.working.clear();
        self.loaded = self.latest;
        Ok(())
    }

    /// Load a committed version. Height 0 on an empty store loads the empty
    /// state.
    pub fn load_version(&mut self, height: u64) -> WolochainResult<()> {
        if height == 0 && self.latest == 0 {
            return self.load_latest();
        }
        if self.app_hash(height)?.is_none() {
            return Err(WolochainError::HeightNotFound(height));
        }
        self.working.clear();
        self.loaded = height;
        info!("Loaded state version {}", height);
        Ok(())
    }

    /// State root recorded for a committed height
    pub fn app_hash(&self, height: u64) -> WolochainResult<Option<Hash>> {
        match self.meta.get(root_key(height)).map_err(storage_err)? {
            Some(bytes) => Ok(Hash::from_slice(&bytes)),
            None => Ok(None),
        }
    }

    /// State root of the loaded version
    pub fn last_app_hash(&self) -> WolochainResult<Hash> {
        Ok(self.app_hash(self.loaded)?.unwrap_or(Hash::ZERO))
    }

    /// Block time (unix millis) to record with the next commit
    pub fn set_block_time(&mut self, millis: u64) {
        self.pending_time = Some(millis);
    }

    /// Block time recorded for a committed height
    pub fn block_time(&self, height: u64) -> WolochainResult<Option<u64>> {
        match self.meta.get(time_key(height)).map_err(storage_err)? {
            Some(bytes) => Ok(Some(decode_height(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All committed heights still available, ascending
    pub fn versions(&self) -> WolochainResult<Vec<u64>> {
        self.meta
            .scan_prefix(ROOT_PREFIX)
            .map(|item| {
                let (key, _) = item.map_err(storage_err)?;
                decode_height(&key[ROOT_PREFIX.len()..])
            })
            .collect()
    }

    /// Read-only view of a committed version
    pub fn view_at(&self, height: u64) -> WolochainResult<CommittedView> {
        if height != 0 && self.app_hash(height)?.is_none() {
            return Err(WolochainError::HeightNotFound(height));
        }
        let use_fast = height == self.latest && !self.options.disable_fast_node;
        Ok(CommittedView {
            versions: self.versions.clone(),
            fast: self.fast.clone(),
            height,
            use_fast,
        })
    }

    /// Read-only view of the loaded version
    pub fn committed_view(&self) -> WolochainResult<CommittedView> {
        self.view_at(self.loaded)
    }

    /// Every entry of a committed version
    pub fn export_entries(&self, height: u64) -> WolochainResult<Vec<StateEntry>> {
        Ok(self
            .view_at(height)?
            .iter_prefix(&[])?
            .into_iter()
            .map(|(key, value)| StateEntry::new(key, value))
            .collect())
    }

    /// Discard uncommitted writes
    pub fn discard(&mut self) {
        self.working.clear();
        self.pending_time = None;
    }

    fn committed_get(&self, key: &[u8]) -> WolochainResult<Option<Vec<u8>>> {
        let at_latest = self.loaded == self.latest;
        if at_latest {
            if let Some(cache) = &self.options.inter_block_cache {
                if let Some(cached) = cache.get(key) {
                    return Ok(cached);
                }
            }
        }
        let value = self.view_at(self.loaded)?.get(key)?;
        if at_latest {
            if let Some(cache) = &self.options.inter_block_cache {
                cache.insert(key.to_vec(), value.clone());
            }
        }
        Ok(value)
    }

    fn trace(&self, operation: TraceOperation, key: &[u8], value: &[u8]) {
        if let Some(sink) = &self.options.trace {
            sink.record(operation, key, value, self.loaded);
        }
    }

    /// Persist the working set as the next version
    pub fn commit(&mut self) -> WolochainResult<CommitInfo> {
        if self.loaded != self.latest {
            return Err(WolochainError::HistoricalCommit {
                loaded: self.loaded,
                latest: self.latest,
            });
        }
        let height = if self.latest == 0 {
            self.initial_version
        } else {
            self.latest + 1
        };

        let previous = if self.latest == 0 {
            Vec::new()
        } else {
            self.view_at(self.latest)?.iter_prefix(&[])?
        };
        let live = merge_overlay(previous, &self.working, &[]);
        let entries: Vec<StateEntry> = live
            .into_iter()
            .map(|(key, value)| StateEntry::new(key, value))
            .collect();
        let app_hash = compute_state_root(&entries);

        let mut batch = sled::Batch::default();
        for entry in &entries {
            batch.insert(versioned_key(height, &entry.key), entry.value.as_slice());
        }
        self.versions.apply_batch(batch).map_err(storage_err)?;

        let mut fast_batch = sled::Batch::default();
        for (key, change) in &self.working {
            match change {
                Some(value) => fast_batch.insert(key.as_slice(), value.as_slice()),
                None => fast_batch.remove(key.as_slice()),
            }
        }
        self.fast.apply_batch(fast_batch).map_err(storage_err)?;

        self.meta
            .insert(root_key(height), app_hash.as_bytes().as_slice())
            .map_err(storage_err)?;
        if let Some(millis) = self.pending_time.take() {
            self.meta
                .insert(time_key(height), millis.to_be_bytes().to_vec())
                .map_err(storage_err)?;
        }
        self.meta
            .insert(LATEST_KEY, height.to_be_bytes().to_vec())
            .map_err(storage_err)?;

        if let Some(cache) = &self.options.inter_block_cache {
            cache.apply(&self.working);
        }

        self.latest = height;
        self.loaded = height;
        self.working.clear();

        if let Some(below) = self.options.pruning.prune_below(height) {
            self.prune_versions(below)?;
        }

        self.db.flush().map_err(storage_err)?;

        debug!("Committed version {} with app hash {}", height, app_hash);
        Ok(CommitInfo { height, app_hash })
    }

    /// Delete every stored version below `height`
    pub fn prune_versions(&mut self, height: u64) -> WolochainResult<usize> {
        let mut pruned = 0;
        for version in self.versions()? {
            if version >= height {
                break;
            }
            let mut batch = sled::Batch::default();
            for item in self.versions.scan_prefix(version.to_be_bytes()) {
                let (key, _) = item.map_err(storage_err)?;
                batch.remove(key);
            }
            self.versions.apply_batch(batch).map_err(storage_err)?;
            self.meta.remove(root_key(version)).map_err(storage_err)?;
            self.meta.remove(time_key(version)).map_err(storage_err)?;
            pruned += 1;
        }
        if pruned > 0 {
            debug!("Pruned {} versions below {}", pruned, height);
        }
        Ok(pruned)
    }
}

impl StateReader for VersionedStore {
    fn get(&self, key: &[u8]) -> WolochainResult<Option<Vec<u8>>> {
        let value = match self.working.get(key) {
            Some(change) => change.clone(),
            None => self.committed_get(key)?,
        };
        self.trace(TraceOperation::Read, key, value.as_deref().unwrap_or_default());
        Ok(value)
    }

    fn iter_prefix(&self, prefix: &[u8]) -> WolochainResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let base = self.view_at(self.loaded)?.iter_prefix(prefix)?;
        Ok(merge_overlay(base, &self.working, prefix))
    }
}

impl StateWriter for VersionedStore {
    fn set(&mut self, key: &[u8], value: &[u8]) -> WolochainResult<()> {
        self.trace(TraceOperation::Write, key, value);
        self.working.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> WolochainResult<()> {
        self.trace(TraceOperation::Delete, key, &[]);
        self.working.insert(key.to_vec(), None);
        Ok(())
    }
}

/// Read-only view of one committed version
#[derive(Clone)]
pub struct CommittedView {
    versions: Tree,
    fast: Tree,
    height: u64,
    use_fast: bool,
}

impl CommittedView {
    pub fn height(&self) -> u64 {
        self.height
    }
}

impl StateReader for CommittedView {
    fn get(&self, key: &[u8]) -> WolochainResult<Option<Vec<u8>>> {
        if self.height == 0 {
            return Ok(None);
        }
        let value = if self.use_fast {
            self.fast.get(key)
        } else {
            self.versions.get(versioned_key(self.height, key))
        };
        Ok(value.map_err(storage_err)?.map(|v| v.to_vec()))
    }

    fn iter_prefix(&self, prefix: &[u8]) -> WolochainResult<Vec<(Vec<u8>, Vec<u8>)>> {
        if self.height == 0 {
            return Ok(Vec::new());
        }
        if self.use_fast {
            return self
                .fast
                .scan_prefix(prefix)
                .map(|item| {
                    let (key, value) = item.map_err(storage_err)?;
                    Ok((key.to_vec(), value.to_vec()))
                })
                .collect();
        }
        self.versions
            .scan_prefix(versioned_key(self.height, prefix))
            .map(|item| {
                let (key, value) = item.map_err(storage_err)?;
                Ok((key[8..].to_vec(), value.to_vec()))
            })
            .collect()
    }
}

/// Application store shared between the block driver and query handlers
pub type SharedStore = Arc<RwLock<VersionedStore>>;
