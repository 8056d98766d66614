//! Genesis document
//!
//! The JSON file at `<home>/config/genesis.json` declaring the chain id,
//! consensus parameters and the initial state of every module.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use wolochain_core::{GenesisValidator, Timestamp, WolochainError, WolochainResult};

/// Longest chain id accepted in a genesis document
pub const MAX_CHAIN_ID_LEN: usize = 50;

/// Block size limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockParams {
    pub max_bytes: i64,
    pub max_gas: i64,
}

/// Evidence window; also bounds the block retention height
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceParams {
    pub max_age_num_blocks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorParams {
    pub pub_key_types: Vec<String>,
}

/// Consensus parameters carried by the genesis document and exports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub block: BlockParams,
    pub evidence: EvidenceParams,
    pub validator: ValidatorParams,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            block: BlockParams {
                max_bytes: 22_020_096,
                max_gas: -1,
            },
            evidence: EvidenceParams {
                max_age_num_blocks: 100_000,
            },
            validator: ValidatorParams {
                pub_key_types: vec!["ed25519".to_string()],
            },
        }
    }
}

fn default_initial_height() -> u64 {
    1
}

/// Genesis document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisDoc {
    pub genesis_time: String,
    pub chain_id: String,
    #[serde(default = "default_initial_height")]
    pub initial_height: u64,
    #[serde(default)]
    pub consensus_params: ConsensusParams,
    #[serde(default)]
    pub app_hash: String,
    #[serde(default)]
    pub app_state: Value,
    #[serde(default)]
    pub validators: Vec<GenesisValidator>,
}

impl GenesisDoc {
    pub fn new(chain_id: impl Into<String>, app_state: Value) -> Self {
        Self {
            genesis_time: Timestamp::now().to_rfc3339(),
            chain_id: chain_id.into(),
            initial_height: 1,
            consensus_params: ConsensusParams::default(),
            app_hash: String::new(),
            app_state,
            validators: Vec::new(),
        }
    }

    /// `<home>/config/genesis.json`
    pub fn path_in_home(home: &Path) -> PathBuf {
        home.join("config").join("genesis.json")
    }

    pub fn load(path: &Path) -> WolochainResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WolochainError::GenesisError(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            WolochainError::GenesisError(format!("failed to parse {}: {e}", path.display()))
        })
    }

    pub fn save(&self, path: &Path) -> WolochainResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Chain id declared by the genesis document at `path`
    pub fn read_chain_id(path: &Path) -> WolochainResult<String> {
        let doc = Self::load(path)?;
        doc.validate_basic()?;
        Ok(doc.chain_id)
    }

    /// Genesis time as a block timestamp
    pub fn genesis_timestamp(&self) -> WolochainResult<Timestamp> {
        let time = chrono::DateTime::parse_from_rfc3339(&self.genesis_time).map_err(|e| {
            WolochainError::GenesisError(format!("invalid genesis_time {}: {e}", self.genesis_time))
        })?;
        Ok(Timestamp::from_millis(time.timestamp_millis().max(0) as u64))
    }

    /// Checks that need no module knowledge
    pub fn validate_basic(&self) -> WolochainResult<()> {
        if self.chain_id.trim().is_empty() {
            return Err(WolochainError::GenesisError("genesis doc must include non-empty chain_id".into()));
        }
        if self.chain_id.len() > MAX_CHAIN_ID_LEN {
            return Err(WolochainError::GenesisError(format!(
                "chain_id in genesis doc is too long (max: {MAX_CHAIN_ID_LEN})"
            )));
        }
        if self.initial_height == 0 {
            return Err(WolochainError::GenesisError("initial_height cannot be 0".into()));
        }
        if self.consensus_params.block.max_bytes <= 0 {
            return Err(WolochainError::GenesisError("block.max_bytes must be greater than 0".into()));
        }
        for validator in &self.validators {
            if validator.power == 0 {
                return Err(WolochainError::GenesisError(format!(
                    "genesis file cannot contain validators with no voting power: {}",
                    validator.name
                )));
            }
        }
        self.genesis_timestamp()?;
        Ok(())
    }
}
