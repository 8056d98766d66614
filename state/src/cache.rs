//! Cache-wrapped stores
//!
//! [`CacheStore`] buffers writes over a parent reader until they are taken
//! with [`CacheStore::into_changes`]; nothing reaches the parent otherwise.
//! [`InterBlockCache`] keeps committed values across blocks.

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use wolochain_core::{StateReader, StateWriter, WolochainResult};

/// Pending write: `Some(value)` for a set, `None` for a delete
pub type Change = Option<Vec<u8>>;

/// Buffered write set over a parent store
pub struct CacheStore<'a, S: StateReader + ?Sized> {
    parent: &'a S,
    writes: BTreeMap<Vec<u8>, Change>,
}

impl<'a, S: StateReader + ?Sized> CacheStore<'a, S> {
    pub fn new(parent: &'a S) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Take the buffered writes, in key order
    pub fn into_changes(self) -> BTreeMap<Vec<u8>, Change> {
        self.writes
    }
}

/// Apply a buffered write set to a store
pub fn apply_changes<W: StateWriter + ?Sized>(
    store: &mut W,
    changes: BTreeMap<Vec<u8>, Change>,
) -> WolochainResult<()> {
    for (key, change) in changes {
        match change {
            Some(value) => store.set(&key, &value)?,
            None => store.delete(&key)?,
        }
    }
    Ok(())
}

/// Merge committed entries with an overlay of pending changes
pub(crate) fn merge_overlay(
    base: Vec<(Vec<u8>, Vec<u8>)>,
    overlay: &BTreeMap<Vec<u8>, Change>,
    prefix: &[u8],
) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = base.into_iter().collect();
    for (key, change) in overlay
        .range(prefix.to_vec()..)
        .take_while(|(k, _)| k.starts_with(prefix))
    {
        match change {
            Some(value) => {
                merged.insert(key.clone(), value.clone());
            }
            None => {
                merged.remove(key);
            }
        }
    }
    merged.into_iter().collect()
}

impl<'a, S: StateReader + ?Sized> StateReader for CacheStore<'a, S> {
    fn get(&self, key: &[u8]) -> WolochainResult<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(change) => Ok(change.clone()),
            None => self.parent.get(key),
        }
    }

    fn iter_prefix(&self, prefix: &[u8]) -> WolochainResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let base = self.parent.iter_prefix(prefix)?;
        Ok(merge_overlay(base, &self.writes, prefix))
    }
}

impl<'a, S: StateReader + ?Sized> StateWriter for CacheStore<'a, S> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> WolochainResult<()> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> WolochainResult<()> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }
}

/// Committed values shared across blocks. Misses are remembered as `None`
/// so absent keys do not hit disk twice.
#[derive(Clone, Default)]
pub struct InterBlockCache {
    entries: Arc<DashMap<Vec<u8>, Change>>,
}

impl InterBlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<Change> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: Vec<u8>, value: Change) {
        self.entries.insert(key, value);
    }

    /// Fold a committed diff into the cache
    pub fn apply(&self, diff: &BTreeMap<Vec<u8>, Change>) {
        for (key, change) in diff {
            self.entries.insert(key.clone(), change.clone());
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
