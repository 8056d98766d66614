//! Offline transaction helpers behind the `tx` subcommands

use anyhow::{Context as _, Result};
use std::path::Path;
use wolochain_crypto::KeyPair;
use wolochain_node::Tx;

/// Read a JSON transaction from `path`
pub fn read_tx(path: &Path) -> Result<Tx> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read transaction file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not a JSON transaction", path.display()))
}

/// Add the signature of `keypair` to the transaction in `path`
pub fn sign_file(path: &Path, keypair: &KeyPair, chain_id: &str) -> Result<Tx> {
    let mut tx = read_tx(path)?;
    tx.sign(keypair, chain_id)?;
    Ok(tx)
}

/// Wire (base64) form of the transaction in `path`
pub fn encode_file(path: &Path) -> Result<String> {
    Ok(read_tx(path)?.encode()?)
}

/// JSON form of a wire transaction
pub fn decode(encoded: &str) -> Result<Tx> {
    Ok(Tx::decode(encoded)?)
}
