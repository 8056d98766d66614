//! Core types for Wolochain
//!
//! Defines fundamental data structures used across the system.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Fixed-size byte strings that travel as lowercase hex on every wire format
/// (JSON genesis, HTTP API, keyring files).
macro_rules! hex_bytes {
    ($name:ident, $len:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn from_bytes(bytes: [u8; $len]) -> Self {
                $name(bytes)
            }

            pub fn from_slice(bytes: &[u8]) -> Option<Self> {
                if bytes.len() != $len {
                    return None;
                }
                let mut arr = [0u8; $len];
                arr.copy_from_slice(bytes);
                Some($name(arr))
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let bytes = hex::decode(s.trim_start_matches("0x"))?;
                Self::from_slice(&bytes).ok_or(hex::FromHexError::InvalidStringLength)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                $name::from_hex(&s).map_err(de::Error::custom)
            }
        }
    };
}

hex_bytes!(Hash, 32);
hex_bytes!(Address, 20);
hex_bytes!(PublicKey, 32);
hex_bytes!(Signature, 64);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);
}

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex().to_uppercase())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = crate::WolochainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s).map_err(|e| crate::WolochainError::InvalidAddress(format!("{s}: {e}")))
    }
}

/// Block height
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Height(pub u64);

impl Height {
    pub const GENESIS: Height = Height(0);

    pub fn new(value: u64) -> Self {
        Height(value)
    }

    pub fn next(&self) -> Height {
        Height(self.0 + 1)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Big-endian bytes, so that stored heights sort numerically.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Height({})", self.0)
    }
}

/// Timestamp in milliseconds since Unix epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(chrono::Utc::now().timestamp_millis() as u64)
    }

    pub fn from_millis(millis: u64) -> Self {
        Timestamp(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_secs(&self) -> u64 {
        self.0 / 1000
    }

    pub fn to_rfc3339(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.0 as i64)
            .unwrap_or_default()
            .to_rfc3339()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Header of the block currently being executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub chain_id: String,
    pub height: Height,
    pub time: Timestamp,
}

impl BlockHeader {
    pub fn new(chain_id: impl Into<String>, height: Height, time: Timestamp) -> Self {
        Self {
            chain_id: chain_id.into(),
            height,
            time,
        }
    }
}

/// Type-tagged message payload, routed by its type URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Any {
    #[serde(rename = "@type")]
    pub type_url: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Any {
    pub fn new(type_url: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }
}

/// Single key/value attribute of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub index: bool,
}

/// Event emitted while executing a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.into(),
            index: false,
        });
        self
    }
}

/// Result of a successfully handled message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MsgResponse {
    pub events: Vec<Event>,
    #[serde(default)]
    pub log: String,
}

/// Voting power change handed to the consensus engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: PublicKey,
    pub power: u64,
}

/// Validator entry of a genesis document or an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub address: Address,
    pub pub_key: PublicKey,
    pub power: u64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex() {
        let addr = Address([7u8; 20]);
        let parsed = Address::from_hex(&addr.to_hex()).unwrap();
        assert_eq!(addr, parsed);
        assert!(Address::from_hex("abcd").is_err());
    }

    #[test]
    fn test_public_key_serializes_as_hex() {
        let key = PublicKey([1u8; 32]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_height_sorts_as_bytes() {
        let low = Height::new(9).to_be_bytes();
        let high = Height::new(10).to_be_bytes();
        assert!(low < high);
        assert_eq!(Height::new(9).next(), Height::new(10));
    }

    #[test]
    fn test_any_type_tag() {
        let any = Any::new("/wolochain.wolochain.MsgNoop", serde_json::json!({}));
        let json = serde_json::to_value(&any).unwrap();
        assert_eq!(json["@type"], "/wolochain.wolochain.MsgNoop");
    }
}
