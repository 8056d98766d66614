//! Genesis transactions
//!
//! A gentx declares a validator's self-delegation before the chain starts.
//! It is signed by the validator's key; `collect-gentxs` verifies each one
//! against the genesis document and adds the validator to staking genesis.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use wolochain_core::{Address, Coin, Coins, PublicKey, Signature, WolochainError, WolochainResult};
use wolochain_crypto::{address_from_public_key, sign, verify, KeyPair};

use crate::validator::Validator;

/// Signed part of a gentx
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenTxBody {
    pub chain_id: String,
    pub moniker: String,
    pub delegator_address: Address,
    pub pub_key: PublicKey,
    pub amount: Coin,
}

/// Self-delegation declaration of a genesis validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenTx {
    pub body: GenTxBody,
    pub signature: Signature,
}

fn gentx_err(reason: impl Into<String>) -> WolochainError {
    WolochainError::GenesisError(reason.into())
}

impl GenTx {
    /// Build and sign a gentx for `keypair`
    pub fn new(
        keypair: &KeyPair,
        chain_id: impl Into<String>,
        moniker: impl Into<String>,
        amount: Coin,
    ) -> WolochainResult<Self> {
        let body = GenTxBody {
            chain_id: chain_id.into(),
            moniker: moniker.into(),
            delegator_address: keypair.address(),
            pub_key: keypair.public_key(),
            amount,
        };
        let signature = sign(keypair, &Self::sign_bytes(&body)?);
        Ok(Self { body, signature })
    }

    pub fn sign_bytes(body: &GenTxBody) -> WolochainResult<Vec<u8>> {
        Ok(serde_json::to_vec(body)?)
    }

    /// Check the gentx against the chain it is collected into
    pub fn verify(&self, chain_id: &str, bond_denom: &str, available: &Coins) -> WolochainResult<()> {
        let body = &self.body;
        if address_from_public_key(&body.pub_key) != body.delegator_address {
            return Err(gentx_err(format!(
                "gentx of {} is not signed by its delegator key",
                body.delegator_address
            )));
        }
        verify(&body.pub_key, &Self::sign_bytes(body)?, &self.signature)?;

        if body.chain_id != chain_id {
            return Err(gentx_err(format!(
                "gentx of {} is for chain {}, expected {}",
                body.delegator_address, body.chain_id, chain_id
            )));
        }
        if body.amount.denom != bond_denom {
            return Err(gentx_err(format!(
                "gentx of {} delegates {}, expected bond denom {}",
                body.delegator_address, body.amount.denom, bond_denom
            )));
        }
        if body.amount.amount == 0 {
            return Err(gentx_err("self-delegation amount must be positive"));
        }
        let held = available.amount_of(bond_denom);
        if held < body.amount.amount {
            return Err(gentx_err(format!(
                "account {} has a balance in genesis of {}{} but the gentx delegates {}",
                body.delegator_address, held, bond_denom, body.amount
            )));
        }
        Ok(())
    }

    pub fn to_validator(&self) -> Validator {
        Validator::new(
            self.body.delegator_address,
            self.body.pub_key,
            self.body.moniker.clone(),
            self.body.amount.amount,
        )
    }

    /// File name used in the gentx directory
    pub fn file_name(&self) -> String {
        format!("gentx-{}.json", self.body.delegator_address)
    }

    /// Write the gentx to `path`
    pub fn save(&self, path: &Path) -> WolochainResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> WolochainResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| gentx_err(format!("failed to read gentx {}: {}", path.display(), e)))
    }

    /// Load every `*.json` gentx in `dir`, ordered by file name
    pub fn load_dir(dir: &Path) -> WolochainResult<Vec<Self>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
            .collect();
        paths.sort();
        debug!("Found {} gentx files in {}", paths.len(), dir.display());
        paths.iter().map(|p| Self::load(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn funded(amount: u128) -> Coins {
        Coins::new(vec![Coin::new(amount, "stake")]).unwrap()
    }

    #[test]
    fn test_gentx_verification() {
        let key = KeyPair::generate();
        let gentx = GenTx::new(&key, "wolochain", "node0", Coin::new(1_000_000, "stake")).unwrap();

        gentx.verify("wolochain", "stake", &funded(5_000_000)).unwrap();
        assert!(gentx.verify("other-chain", "stake", &funded(5_000_000)).is_err());
        assert!(gentx.verify("wolochain", "atom", &funded(5_000_000)).is_err());
        assert!(gentx.verify("wolochain", "stake", &funded(10)).is_err());

        let validator = gentx.to_validator();
        assert_eq!(validator.operator_address, key.address());
        assert_eq!(validator.power(), 1);
    }

    #[test]
    fn test_tampered_gentx_is_rejected() {
        let key = KeyPair::generate();
        let mut gentx = GenTx::new(&key, "wolochain", "node0", Coin::new(1_000_000, "stake")).unwrap();
        gentx.body.amount = Coin::new(2_000_000, "stake");
        assert!(matches!(
            gentx.verify("wolochain", "stake", &funded(5_000_000)),
            Err(WolochainError::InvalidSignature)
        ));
    }

    #[test]
    fn test_gentx_files() {
        let tmp = TempDir::new().unwrap();
        let key = KeyPair::generate();
        let gentx = GenTx::new(&key, "wolochain", "node0", Coin::new(1_000_000, "stake")).unwrap();
        gentx.save(&tmp.path().join(gentx.file_name())).unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let loaded = GenTx::load_dir(tmp.path()).unwrap();
        assert_eq!(loaded, vec![gentx]);
    }
}
