//! State entries, root computation and key helpers

use serde::{Deserialize, Serialize};
use wolochain_core::Hash;
use wolochain_crypto::hashing::{leaf_hash, merkle_root};

/// One key/value pair committed to by the app hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl StateEntry {
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }

    pub fn hash(&self) -> Hash {
        leaf_hash(&[&self.key, &self.value])
    }
}

/// App hash over `entries`, independent of their order. Empty state hashes to zero.
pub fn compute_state_root(entries: &[StateEntry]) -> Hash {
    let mut sorted: Vec<&StateEntry> = entries.iter().collect();
    sorted.sort_unstable_by(|a, b| a.key.cmp(&b.key));
    merkle_root(&sorted.into_iter().map(StateEntry::hash).collect::<Vec<_>>())
}

/// Build a key under a module store: `<store_key>/<key>`
pub fn prefix_key(store_key: &str, key: &[u8]) -> Vec<u8> {
    let mut full = Vec::with_capacity(store_key.len() + 1 + key.len());
    full.extend_from_slice(store_key.as_bytes());
    full.push(b'/');
    full.extend_from_slice(key);
    full
}

/// Strip the `<store_key>/` prefix from a full key
pub fn strip_prefix<'k>(store_key: &str, key: &'k [u8]) -> Option<&'k [u8]> {
    key.strip_prefix(store_key.as_bytes())?.strip_prefix(b"/")
}
