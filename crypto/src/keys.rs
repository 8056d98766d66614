//! Ed25519 keys and the account addresses derived from them
//!
//! The same key signs transactions and, for genesis validators, serves as
//! the consensus key.

use ed25519_dalek::{SigningKey, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use std::fmt;
use wolochain_core::{Address, PublicKey, WolochainError, WolochainResult};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::hashing::sha256_hash;

#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic key for a 32-byte seed. Tests and recovered keys use this.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Recover a key from the hex secret stored in a keyring file
    pub fn from_secret_hex(secret: &str) -> WolochainResult<Self> {
        let mut bytes = hex::decode(secret.trim()).map_err(|_| WolochainError::InvalidPrivateKey)?;
        let seed = SecretKey::from_slice(&bytes);
        bytes.zeroize();
        Ok(seed?.to_keypair())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_bytes(self.signing_key.verifying_key().to_bytes())
    }

    pub fn address(&self) -> Address {
        address_from_public_key(&self.public_key())
    }

    pub fn secret_bytes(&self) -> SecretKey {
        SecretKey(self.signing_key.to_bytes())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair").field("address", &self.address()).finish_non_exhaustive()
    }
}

/// Account address: the first 20 bytes of SHA-256 over the public key
pub fn address_from_public_key(public_key: &PublicKey) -> Address {
    let digest = sha256_hash(public_key.as_bytes());
    let mut bytes = [0u8; Address::LEN];
    bytes.copy_from_slice(&digest.as_bytes()[..Address::LEN]);
    Address::from_bytes(bytes)
}

/// Decode a public key, rejecting points that are not on the curve
pub fn verifying_key(public_key: &PublicKey) -> WolochainResult<VerifyingKey> {
    VerifyingKey::from_bytes(public_key.as_bytes()).map_err(|_| WolochainError::InvalidPublicKey)
}

/// Secret seed that is wiped when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; SECRET_KEY_LENGTH]);

impl SecretKey {
    fn from_slice(bytes: &[u8]) -> WolochainResult<Self> {
        let seed: [u8; SECRET_KEY_LENGTH] = bytes.try_into().map_err(|_| WolochainError::InvalidPrivateKey)?;
        Ok(Self(seed))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn to_keypair(&self) -> KeyPair {
        KeyPair::from_seed(&self.0)
    }
}
