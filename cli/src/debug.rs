//! Conversions behind the `debug` subcommands

use anyhow::{anyhow, bail, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use wolochain_core::{Address, PublicKey};
use wolochain_crypto::address_from_public_key;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressInfo {
    pub bytes: Vec<u8>,
    pub hex: String,
    pub base64: String,
}

impl From<Address> for AddressInfo {
    fn from(address: Address) -> Self {
        Self {
            bytes: address.as_bytes().to_vec(),
            hex: address.to_hex(),
            base64: STANDARD.encode(address.as_bytes()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PubKeyInfo {
    pub hex: String,
    pub base64: String,
    pub address: String,
}

/// Hex first, then base64
fn decode_bytes(input: &str) -> Result<Vec<u8>> {
    let input = input.trim();
    if let Ok(bytes) = hex::decode(input.trim_start_matches("0x")) {
        return Ok(bytes);
    }
    STANDARD
        .decode(input)
        .map_err(|_| anyhow!("{input:?} is neither hex nor base64"))
}

/// Every encoding of an address given as hex or base64
pub fn addr(input: &str) -> Result<AddressInfo> {
    let bytes = decode_bytes(input)?;
    let address = Address::from_slice(&bytes)
        .ok_or_else(|| anyhow!("expected {} address bytes, got {}", Address::LEN, bytes.len()))?;
    Ok(address.into())
}

/// Encodings of an ed25519 public key and the account address it controls
pub fn pubkey(input: &str) -> Result<PubKeyInfo> {
    let bytes = decode_bytes(input)?;
    let key = PublicKey::from_slice(&bytes)
        .ok_or_else(|| anyhow!("expected {} public key bytes, got {}", PublicKey::LEN, bytes.len()))?;
    Ok(PubKeyInfo {
        hex: key.to_hex(),
        base64: STANDARD.encode(key.as_bytes()),
        address: address_from_public_key(&key).to_hex(),
    })
}

/// Hex of a byte list such as `[72 101 108 108 111]`
pub fn raw_bytes(input: &str) -> Result<String> {
    let inner = input
        .trim()
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| anyhow!("expected a byte list like [10 21 13]"))?;
    let bytes = inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u8>().map_err(|e| anyhow!("{part}: {e}")))
        .collect::<Result<Vec<_>>>()?;
    if bytes.is_empty() && !inner.trim().is_empty() {
        bail!("no bytes in {input:?}");
    }
    Ok(hex::encode_upper(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wolochain_crypto::KeyPair;

    #[test]
    fn test_addr_accepts_hex_and_base64() {
        let address = Address([7; 20]);
        let from_hex = addr(&address.to_hex()).unwrap();
        assert_eq!(from_hex.bytes, vec![7; 20]);

        let from_b64 = addr(&from_hex.base64).unwrap();
        assert_eq!(from_b64, from_hex);
        assert!(addr("abcd").is_err());
        assert!(addr("not an address").is_err());
    }

    #[test]
    fn test_pubkey_shows_account_address() {
        let key = KeyPair::from_seed(&[3; 32]);
        let info = pubkey(&key.public_key().to_hex()).unwrap();
        assert_eq!(info.address, key.address().to_hex());
        assert_eq!(pubkey(&info.base64).unwrap(), info);
    }

    #[test]
    fn test_raw_bytes() {
        assert_eq!(raw_bytes("[72 101 108 108 111]").unwrap(), "48656C6C6F");
        assert_eq!(raw_bytes("[1, 2]").unwrap(), "0102");
        assert_eq!(raw_bytes("[]").unwrap(), "");
        assert!(raw_bytes("72 101").is_err());
        assert!(raw_bytes("[256]").is_err());
    }
}
