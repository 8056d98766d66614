//! Block store
//!
//! Headers and delivery results of committed blocks, in a sled database at
//! `<home>/data/blockstore.db`, keyed by big-endian height.

use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::{Path, PathBuf};
use tracing::debug;
use wolochain_core::{BlockHeader, Hash, WolochainError, WolochainResult};
use wolochain_crypto::hash_multiple;

use crate::app::TxResult;

fn storage_err(e: sled::Error) -> WolochainError {
    WolochainError::StorageError(e.to_string())
}

/// A committed block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredBlock {
    pub header: BlockHeader,
    pub hash: Hash,
    pub app_hash: Hash,
    /// Base64 transactions in delivery order
    pub txs: Vec<String>,
    pub results: Vec<TxResult>,
}

impl StoredBlock {
    pub fn new(header: BlockHeader, app_hash: Hash, txs: Vec<String>, results: Vec<TxResult>) -> Self {
        let height = header.height.to_be_bytes();
        let time = header.time.as_millis().to_be_bytes();
        let mut parts: Vec<&[u8]> = vec![
            header.chain_id.as_bytes(),
            &height,
            &time,
            app_hash.as_bytes(),
        ];
        parts.extend(txs.iter().map(|tx| tx.as_bytes()));
        let hash = hash_multiple(&parts);

        Self {
            header,
            hash,
            app_hash,
            txs,
            results,
        }
    }

    pub fn height(&self) -> u64 {
        self.header.height.value()
    }
}

pub struct BlockStore {
    db: Db,
}

impl BlockStore {
    pub fn open(path: &Path) -> WolochainResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = sled::open(path).map_err(storage_err)?;
        Ok(Self { db })
    }

    /// `<home>/data/blockstore.db`
    pub fn path_in_home(home: &Path) -> PathBuf {
        home.join("data").join("blockstore.db")
    }

    pub fn save(&self, block: &StoredBlock) -> WolochainResult<()> {
        self.db
            .insert(block.height().to_be_bytes().to_vec(), bincode::serialize(block)?)
            .map_err(storage_err)?;
        self.db.flush().map_err(storage_err)?;
        Ok(())
    }

    fn decode(bytes: &[u8]) -> WolochainResult<StoredBlock> {
        bincode::deserialize(bytes).map_err(|e| WolochainError::DeserializationError(e.to_string()))
    }

    pub fn load(&self, height: u64) -> WolochainResult<Option<StoredBlock>> {
        match self.db.get(height.to_be_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn latest(&self) -> WolochainResult<Option<StoredBlock>> {
        match self.db.last().map_err(storage_err)? {
            Some((_, bytes)) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Lowest stored height, 0 when empty
    pub fn base(&self) -> WolochainResult<u64> {
        match self.db.first().map_err(storage_err)? {
            Some((_, bytes)) => Ok(Self::decode(&bytes)?.height()),
            None => Ok(0),
        }
    }

    /// Highest stored height, 0 when empty
    pub fn height(&self) -> WolochainResult<u64> {
        Ok(self.latest()?.map(|b| b.height()).unwrap_or(0))
    }

    /// Drop every block below `retain_height`
    pub fn prune_below(&self, retain_height: u64) -> WolochainResult<usize> {
        let mut pruned = 0;
        for item in self.db.range(..retain_height.to_be_bytes().to_vec()) {
            let (key, _) = item.map_err(storage_err)?;
            self.db.remove(key).map_err(storage_err)?;
            pruned += 1;
        }
        if pruned > 0 {
            self.db.flush().map_err(storage_err)?;
            debug!("Pruned {} blocks below height {}", pruned, retain_height);
        }
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wolochain_core::{Height, Timestamp};

    fn block(height: u64) -> StoredBlock {
        StoredBlock::new(
            BlockHeader::new("wolochain", Height::new(height), Timestamp::from_millis(height)),
            Hash::ZERO,
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_save_load_latest() {
        let tmp = TempDir::new().unwrap();
        let store = BlockStore::open(&BlockStore::path_in_home(tmp.path())).unwrap();
        assert!(store.latest().unwrap().is_none());
        assert_eq!(store.height().unwrap(), 0);

        for height in 1..=3 {
            store.save(&block(height)).unwrap();
        }
        assert_eq!(store.load(2).unwrap().unwrap(), block(2));
        assert_eq!(store.height().unwrap(), 3);
        assert_eq!(store.base().unwrap(), 1);
        assert!(store.load(7).unwrap().is_none());
        assert_ne!(block(1).hash, block(2).hash);
    }

    #[test]
    fn test_prune_below() {
        let tmp = TempDir::new().unwrap();
        let store = BlockStore::open(&tmp.path().join("blocks.db")).unwrap();
        for height in 1..=5 {
            store.save(&block(height)).unwrap();
        }
        assert_eq!(store.prune_below(0).unwrap(), 0);
        assert_eq!(store.prune_below(4).unwrap(), 3);
        assert_eq!(store.base().unwrap(), 4);
        assert_eq!(store.height().unwrap(), 5);
    }
}
