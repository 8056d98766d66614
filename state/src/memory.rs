//! In-memory state store for tests and light use

use std::collections::BTreeMap;
use wolochain_core::{StateReader, StateWriter, WolochainResult};

use crate::store::{compute_state_root, StateEntry};

/// In-memory state store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        Self {
            data: data.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn entries(&self) -> Vec<StateEntry> {
        self.data
            .iter()
            .map(|(k, v)| StateEntry::new(k.clone(), v.clone()))
            .collect()
    }

    pub fn root(&self) -> wolochain_core::Hash {
        compute_state_root(&self.entries())
    }
}

impl StateReader for MemoryStore {
    fn get(&self, key: &[u8]) -> WolochainResult<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn iter_prefix(&self, prefix: &[u8]) -> WolochainResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

impl StateWriter for MemoryStore {
    fn set(&mut self, key: &[u8], value: &[u8]) -> WolochainResult<()> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> WolochainResult<()> {
        self.data.remove(key);
        Ok(())
    }
}
