//! Error types for Wolochain

use thiserror::Error;

/// Exit code reported when a registered invariant is broken.
pub const EXIT_CODE_INVARIANT_BROKEN: i32 = 2;

/// Main error type for Wolochain
#[derive(Error, Debug)]
pub enum WolochainError {
    // ============ Configuration Errors ============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid pruning options: {0}")]
    InvalidPruning(String),

    #[error("application home not set")]
    HomeNotSet,

    #[error("Invalid value for option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    // ============ Genesis Errors ============
    #[error("Genesis error: {0}")]
    GenesisError(String),

    #[error("Invalid genesis for module {module}: {reason}")]
    InvalidGenesis { module: String, reason: String },

    // ============ State Errors ============
    #[error("Failed to decode stored value under {key}: {reason}")]
    Decode { key: String, reason: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Version {0} does not exist")]
    HeightNotFound(u64),

    #[error("Cannot commit on top of historical version {loaded} (latest is {latest})")]
    HistoricalCommit { loaded: u64, latest: u64 },

    #[error("Snapshot error: {0}")]
    SnapshotError(String),

    // ============ Module Errors ============
    #[error("module {0} does not exist")]
    ModuleNotFound(String),

    #[error("unrecognized {module} message type: {type_url}")]
    UnknownMessage { module: String, type_url: String },

    #[error("unknown query path: {0}")]
    UnknownQuery(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invariant broken: {0}")]
    InvariantBroken(String),

    // ============ Transaction Errors ============
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("insufficient fees; got: {provided} required: {required}")]
    InsufficientFee { provided: String, required: String },

    #[error("Invalid coins: {0}")]
    InvalidCoins(String),

    // ============ Cryptography Errors ============
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // ============ Keyring Errors ============
    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("{0}: key not found")]
    KeyNotFound(String),

    // ============ Serialization Errors ============
    #[error("Serialization failed: {0}")]
    SerializationError(String),

    #[error("Deserialization failed: {0}")]
    DeserializationError(String),

    // ============ Process Errors ============
    #[error("{reason}")]
    ExitCode { code: i32, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WolochainError {
    /// Process exit code for this error: the carried code for structured
    /// exit errors, `1` for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            WolochainError::ExitCode { code, .. } => *code,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for WolochainError {
    fn from(err: std::io::Error) -> Self {
        WolochainError::StorageError(err.to_string())
    }
}

impl From<bincode::Error> for WolochainError {
    fn from(err: bincode::Error) -> Self {
        WolochainError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for WolochainError {
    fn from(err: serde_json::Error) -> Self {
        WolochainError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for WolochainError {
    fn from(err: toml::de::Error) -> Self {
        WolochainError::ConfigError(err.to_string())
    }
}

impl From<toml::ser::Error> for WolochainError {
    fn from(err: toml::ser::Error) -> Self {
        WolochainError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code() {
        let err = WolochainError::ExitCode {
            code: EXIT_CODE_INVARIANT_BROKEN,
            reason: "supply mismatch".into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(WolochainError::HomeNotSet.exit_code(), 1);
    }
}
