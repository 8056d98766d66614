//! Transactions
//!
//! A transaction is JSON on the inside and base64 on the wire. Signatures
//! cover the sign document `(chain_id, body, auth_info)`, so adding a signer
//! after signing invalidates the signatures already present.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use wolochain_core::{
    Address, Any, Coins, DecCoins, Hash, PublicKey, Signature, WolochainError, WolochainResult,
};
use wolochain_crypto::{address_from_public_key, sha256_hash, sign, verify, KeyPair};

/// Gas limit used when a transaction does not declare one
pub const DEFAULT_GAS_LIMIT: u64 = 200_000;

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxBody {
    pub messages: Vec<Any>,
    #[serde(default)]
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    #[serde(default)]
    pub amount: Coins,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
}

impl Default for Fee {
    fn default() -> Self {
        Self {
            amount: Coins::empty(),
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    #[serde(default)]
    pub signer_infos: Vec<SignerInfo>,
    #[serde(default)]
    pub fee: Fee,
}

#[derive(Serialize)]
struct SignDoc<'a> {
    chain_id: &'a str,
    body: &'a TxBody,
    auth_info: &'a AuthInfo,
}

/// Signed transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tx {
    pub body: TxBody,
    #[serde(default)]
    pub auth_info: AuthInfo,
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

impl Tx {
    /// Unsigned transaction carrying `messages`
    pub fn new(messages: Vec<Any>, memo: impl Into<String>, fee: Fee) -> Self {
        Self {
            body: TxBody {
                messages,
                memo: memo.into(),
            },
            auth_info: AuthInfo {
                signer_infos: Vec::new(),
                fee,
            },
            signatures: Vec::new(),
        }
    }

    pub fn sign_bytes(&self, chain_id: &str) -> WolochainResult<Vec<u8>> {
        Ok(serde_json::to_vec(&SignDoc {
            chain_id,
            body: &self.body,
            auth_info: &self.auth_info,
        })?)
    }

    /// Sign with `keypair`, registering it as a signer if needed. Signers
    /// sign in the order they were registered.
    pub fn sign(&mut self, keypair: &KeyPair, chain_id: &str) -> WolochainResult<()> {
        let public_key = keypair.public_key();
        let index = match self
            .auth_info
            .signer_infos
            .iter()
            .position(|s| s.public_key == public_key)
        {
            Some(index) => index,
            None => {
                self.auth_info.signer_infos.push(SignerInfo { public_key });
                self.signatures.clear();
                self.auth_info.signer_infos.len() - 1
            }
        };

        let signature = sign(keypair, &self.sign_bytes(chain_id)?);
        match index.cmp(&self.signatures.len()) {
            std::cmp::Ordering::Less => self.signatures[index] = signature,
            std::cmp::Ordering::Equal => self.signatures.push(signature),
            std::cmp::Ordering::Greater => {
                return Err(WolochainError::InvalidTransaction(format!(
                    "signer {index} must sign after the {} signers before it",
                    self.signatures.len()
                )))
            }
        }
        Ok(())
    }

    pub fn signers(&self) -> Vec<Address> {
        self.auth_info
            .signer_infos
            .iter()
            .map(|s| address_from_public_key(&s.public_key))
            .collect()
    }

    pub fn fee(&self) -> &Fee {
        &self.auth_info.fee
    }

    /// Stateless checks
    pub fn validate_basic(&self) -> WolochainResult<()> {
        if self.body.messages.is_empty() {
            return Err(WolochainError::InvalidTransaction("must contain at least one message".into()));
        }
        if self.auth_info.signer_infos.is_empty() {
            return Err(WolochainError::InvalidTransaction("no signers".into()));
        }
        if self.signatures.len() != self.auth_info.signer_infos.len() {
            return Err(WolochainError::InvalidTransaction(format!(
                "wrong number of signatures; expected {}, got {}",
                self.auth_info.signer_infos.len(),
                self.signatures.len()
            )));
        }
        if self.auth_info.fee.gas_limit == 0 {
            return Err(WolochainError::InvalidTransaction("gas limit must be positive".into()));
        }
        Ok(())
    }

    /// The fee must cover the floor in at least one of its denoms. An empty
    /// or all-zero floor, or a zero required fee, accepts any fee.
    pub fn check_fee(&self, min_gas_prices: &DecCoins) -> WolochainResult<()> {
        if min_gas_prices.is_empty() || min_gas_prices.is_zero() {
            return Ok(());
        }
        let fee = self.fee();
        let required = min_gas_prices.required_fees(fee.gas_limit);
        if !required.is_empty() && !fee.amount.is_any_gte(&required) {
            return Err(WolochainError::InsufficientFee {
                provided: fee.amount.to_string(),
                required: required.to_string(),
            });
        }
        Ok(())
    }

    pub fn verify_signatures(&self, chain_id: &str) -> WolochainResult<()> {
        let bytes = self.sign_bytes(chain_id)?;
        for (info, signature) in self.auth_info.signer_infos.iter().zip(&self.signatures) {
            verify(&info.public_key, &bytes, signature)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> WolochainResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Base64 wire encoding
    pub fn encode(&self) -> WolochainResult<String> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    pub fn decode(encoded: &str) -> WolochainResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| WolochainError::InvalidTransaction(format!("invalid base64: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| WolochainError::InvalidTransaction(format!("invalid transaction: {e}")))
    }

    /// Hash of the wire bytes
    pub fn hash(&self) -> WolochainResult<Hash> {
        Ok(sha256_hash(&self.to_bytes()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wolochain_bank::MSG_SEND_TYPE_URL;

    fn send_msg(from: Address) -> Any {
        Any::new(
            MSG_SEND_TYPE_URL,
            serde_json::json!({
                "from_address": from,
                "to_address": Address([9; 20]),
                "amount": [{"denom": "stake", "amount": "10"}],
            }),
        )
    }

    fn signed_tx(keypair: &KeyPair, fee: Fee) -> Tx {
        let mut tx = Tx::new(vec![send_msg(keypair.address())], "", fee);
        tx.sign(keypair, "wolochain").unwrap();
        tx
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate();
        let tx = signed_tx(&keypair, Fee::default());

        tx.validate_basic().unwrap();
        tx.verify_signatures("wolochain").unwrap();
        assert_eq!(tx.signers(), vec![keypair.address()]);
        assert!(tx.verify_signatures("other-chain").is_err());
    }

    #[test]
    fn test_wire_encoding() {
        let keypair = KeyPair::generate();
        let tx = signed_tx(&keypair, Fee::default());
        let decoded = Tx::decode(&tx.encode().unwrap()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.hash().unwrap(), tx.hash().unwrap());
        assert!(Tx::decode("not base64!").is_err());
    }

    #[test]
    fn test_validate_basic() {
        let keypair = KeyPair::generate();
        let unsigned = Tx::new(vec![send_msg(keypair.address())], "", Fee::default());
        assert!(unsigned.validate_basic().is_err());

        let mut empty = Tx::new(Vec::new(), "", Fee::default());
        empty.sign(&keypair, "wolochain").unwrap();
        assert!(empty.validate_basic().is_err());
    }

    #[test]
    fn test_fee_floor() {
        let keypair = KeyPair::generate();
        let floor: DecCoins = "0.025stake".parse().unwrap();

        let cheap = signed_tx(
            &keypair,
            Fee {
                amount: "4999stake".parse().unwrap(),
                gas_limit: 200_000,
            },
        );
        assert!(matches!(
            cheap.check_fee(&floor),
            Err(WolochainError::InsufficientFee { .. })
        ));

        let enough = signed_tx(
            &keypair,
            Fee {
                amount: "5000stake".parse().unwrap(),
                gas_limit: 200_000,
            },
        );
        enough.check_fee(&floor).unwrap();
        cheap.check_fee(&DecCoins::default()).unwrap();
        cheap.check_fee(&"0stake".parse().unwrap()).unwrap();
    }

    #[test]
    fn test_zero_gas_requires_no_fee() {
        let keypair = KeyPair::generate();
        let floor: DecCoins = "0.025stake".parse().unwrap();
        let tx = signed_tx(
            &keypair,
            Fee {
                amount: "5stake".parse().unwrap(),
                gas_limit: 0,
            },
        );
        tx.check_fee(&floor).unwrap();
    }
}
