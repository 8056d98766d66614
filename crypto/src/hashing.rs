//! Hashes used by the chain
//!
//! SHA-256 names things users see (addresses, transaction hashes). BLAKE3
//! with domain-separated leaves and inner nodes builds the app hash, so a
//! leaf can never be passed off as an inner node.

use sha2::{Digest, Sha256};
use wolochain_core::Hash;

const LEAF_PREFIX: u8 = 0x00;
const INNER_PREFIX: u8 = 0x01;

pub fn sha256_hash(data: &[u8]) -> Hash {
    let digest: [u8; 32] = Sha256::digest(data).into();
    Hash::from_bytes(digest)
}

fn update_parts(hasher: &mut blake3::Hasher, parts: &[&[u8]]) {
    for part in parts {
        hasher.update(&(part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
}

/// BLAKE3 over length-prefixed parts; `["ab", "c"]` and `["a", "bc"]` differ
pub fn hash_multiple(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    update_parts(&mut hasher, parts);
    Hash::from_bytes(*hasher.finalize().as_bytes())
}

/// Merkle leaf over length-prefixed parts
pub fn leaf_hash(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[LEAF_PREFIX]);
    update_parts(&mut hasher, parts);
    Hash::from_bytes(*hasher.finalize().as_bytes())
}

pub fn inner_hash(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[INNER_PREFIX]);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Hash::from_bytes(*hasher.finalize().as_bytes())
}

/// Root of the merkle tree over `leaves`. The left subtree always holds the
/// largest power of two strictly below the leaf count; no leaf is duplicated.
pub fn merkle_root(leaves: &[Hash]) -> Hash {
    match leaves.len() {
        0 => Hash::ZERO,
        1 => leaves[0],
        n => {
            let split = split_point(n);
            inner_hash(&merkle_root(&leaves[..split]), &merkle_root(&leaves[split..]))
        }
    }
}

fn split_point(n: usize) -> usize {
    let power = n.next_power_of_two();
    if power == n {
        n / 2
    } else {
        power / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: u8) -> Vec<Hash> {
        (0..n).map(|i| leaf_hash(&[&[i]])).collect()
    }

    #[test]
    fn test_split_point() {
        assert_eq!(split_point(2), 1);
        assert_eq!(split_point(3), 2);
        assert_eq!(split_point(4), 2);
        assert_eq!(split_point(5), 4);
        assert_eq!(split_point(8), 4);
    }

    #[test]
    fn test_merkle_root_shape() {
        assert_eq!(merkle_root(&[]), Hash::ZERO);
        let l = leaves(3);
        assert_eq!(merkle_root(&l[..1]), l[0]);
        assert_eq!(
            merkle_root(&l),
            inner_hash(&inner_hash(&l[0], &l[1]), &l[2])
        );
    }

    #[test]
    fn test_odd_leaf_is_not_duplicated() {
        let l = leaves(3);
        let padded = vec![l[0], l[1], l[2], l[2]];
        assert_ne!(merkle_root(&l), merkle_root(&padded));
    }

    #[test]
    fn test_domain_separation() {
        let a = leaf_hash(&[b"k", b"v"]);
        assert_ne!(a, hash_multiple(&[b"k", b"v"]));
        assert_ne!(hash_multiple(&[b"ab", b"c"]), hash_multiple(&[b"a", b"bc"]));
        assert_ne!(inner_hash(&a, &a), leaf_hash(&[a.as_bytes(), a.as_bytes()]));
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hash(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
