//! Signatures over transaction and gentx sign bytes

use ed25519_dalek::Signer;
use wolochain_core::{PublicKey, Signature, WolochainError, WolochainResult};

use crate::keys::{verifying_key, KeyPair};

pub fn sign(keypair: &KeyPair, message: &[u8]) -> Signature {
    Signature::from_bytes(keypair.signing_key().sign(message).to_bytes())
}

/// Strict verification: malleable signatures and small-order keys are
/// rejected so every node agrees on validity.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> WolochainResult<()> {
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    verifying_key(public_key)?
        .verify_strict(message, &sig)
        .map_err(|_| WolochainError::InvalidSignature)
}
