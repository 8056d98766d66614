//! Wolochain Cryptography Module
//!
//! - Ed25519 for account and validator signatures
//! - SHA-256 for address derivation
//! - BLAKE3 for state commitments

pub mod keys;
pub mod signing;
pub mod hashing;

pub use keys::*;
pub use signing::*;
pub use hashing::*;
