//! Configuration types for Wolochain
//!
//! `app.toml` and `config.toml` are plain serde structs. [`AppOptions`] is the
//! flat option bag the application assembler reads: `app.toml` flattened to
//! dotted keys, overlaid with the flags the operator supplied explicitly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::WolochainError;
use crate::traits::WolochainResult;

/// Name of the application; the default chain id is derived from it.
pub const APP_NAME: &str = "wolochain";

/// Option keys shared by the command line, `app.toml` and the assembler.
pub mod flags {
    pub const HOME: &str = "home";
    pub const CHAIN_ID: &str = "chain-id";
    pub const KEYRING_BACKEND: &str = "keyring-backend";
    pub const NODE: &str = "node";
    pub const INTER_BLOCK_CACHE: &str = "inter-block-cache";
    pub const UNSAFE_SKIP_UPGRADES: &str = "unsafe-skip-upgrades";
    pub const PRUNING: &str = "pruning";
    pub const PRUNING_KEEP_RECENT: &str = "pruning-keep-recent";
    pub const PRUNING_INTERVAL: &str = "pruning-interval";
    pub const MIN_GAS_PRICES: &str = "minimum-gas-prices";
    pub const HALT_HEIGHT: &str = "halt-height";
    pub const HALT_TIME: &str = "halt-time";
    pub const MIN_RETAIN_BLOCKS: &str = "min-retain-blocks";
    pub const TRACE: &str = "trace";
    pub const TRACE_STORE: &str = "trace-store";
    pub const INDEX_EVENTS: &str = "index-events";
    pub const SNAPSHOT_INTERVAL: &str = "state-sync.snapshot-interval";
    pub const SNAPSHOT_KEEP_RECENT: &str = "state-sync.snapshot-keep-recent";
    pub const IAVL_CACHE_SIZE: &str = "iavl-cache-size";
    pub const IAVL_DISABLE_FAST_NODE: &str = "iavl-disable-fastnode";
    pub const INV_CHECK_PERIOD: &str = "inv-check-period";
}

/// Default chain id: the application name with separators stripped.
pub fn default_chain_id() -> String {
    APP_NAME.replace('-', "")
}

/// Settings of `config/app.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AppConfig {
    /// Gas-price floor a transaction fee must meet, e.g. `0.025stake`
    pub minimum_gas_prices: String,
    /// default | nothing | everything | custom
    pub pruning: String,
    pub pruning_keep_recent: String,
    pub pruning_interval: String,
    pub halt_height: u64,
    /// Unix seconds
    pub halt_time: u64,
    pub min_retain_blocks: u64,
    pub inter_block_cache: bool,
    pub index_events: Vec<String>,
    pub iavl_cache_size: u64,
    pub iavl_disable_fastnode: bool,
    pub inv_check_period: u64,
    pub api: ApiConfig,
    pub state_sync: StateSyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            minimum_gas_prices: String::new(),
            pruning: "default".to_string(),
            pruning_keep_recent: "0".to_string(),
            pruning_interval: "0".to_string(),
            halt_height: 0,
            halt_time: 0,
            min_retain_blocks: 0,
            inter_block_cache: true,
            index_events: vec![],
            iavl_cache_size: 781_250,
            iavl_disable_fastnode: false,
            inv_check_period: 0,
            api: ApiConfig::default(),
            state_sync: StateSyncConfig::default(),
        }
    }
}

/// API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ApiConfig {
    /// Enable HTTP API
    pub enable: bool,

    /// API listen address
    pub address: String,

    /// Enable CORS
    pub enabled_unsafe_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable: true,
            address: "127.0.0.1:1317".to_string(),
            enabled_unsafe_cors: false,
        }
    }
}

/// State-sync snapshot settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StateSyncConfig {
    /// Take a snapshot every this many blocks; 0 disables snapshots
    pub snapshot_interval: u64,
    /// Snapshots to keep; 0 keeps all
    pub snapshot_keep_recent: u32,
}

impl Default for StateSyncConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: 0,
            snapshot_keep_recent: 2,
        }
    }
}

const APP_TEMPLATE_HEADER: &str = "\
# This is a TOML config file.
# For more information, see https://github.com/toml-lang/toml

###############################################################################
###                           Base Configuration                            ###
###############################################################################

# minimum-gas-prices is the gas-price floor every transaction fee must meet,
# e.g. \"0.01stake,0.0001token\". The node refuses to start with an empty floor.
#
# pruning: default (keep 362880 versions, prune every 10 blocks), nothing
# (keep everything), everything (keep 2 versions), custom (set
# pruning-keep-recent and pruning-interval).

";

impl AppConfig {
    /// Configuration written by `init`: the defaults, with the gas-price floor
    /// pre-populated so a fresh node can start without editing the file.
    pub fn init_app_config() -> Self {
        Self {
            minimum_gas_prices: "0stake".to_string(),
            ..Default::default()
        }
    }

    /// Render the commented `app.toml` text for this configuration.
    pub fn render(&self) -> WolochainResult<String> {
        Ok(format!("{APP_TEMPLATE_HEADER}{}", toml::to_string_pretty(self)?))
    }

    pub fn load(path: &Path) -> WolochainResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> WolochainResult<()> {
        std::fs::write(path, self.render()?)?;
        Ok(())
    }
}

/// Settings of `config/config.toml`: node identity and the block loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct NodeConfig {
    /// Human-readable node name
    pub moniker: String,

    /// Delay between committed blocks, in milliseconds
    pub timeout_commit_ms: u64,

    /// Logging level
    pub log_level: String,

    /// plain | json
    pub log_format: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            moniker: "wolochain-node".to_string(),
            timeout_commit_ms: 5000,
            log_level: "info".to_string(),
            log_format: "plain".to_string(),
        }
    }
}

impl NodeConfig {
    pub fn load(path: &Path) -> WolochainResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> WolochainResult<()> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Read-only option bag consumed by the application assembler
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    values: BTreeMap<String, toml::Value>,
}

impl AppOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options from an `app.toml` file, tables flattened to dotted keys.
    pub fn from_app_toml(path: &Path) -> WolochainResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let table: toml::Table = toml::from_str(&content)?;
        let mut options = Self::new();
        options.flatten("", table);
        Ok(options)
    }

    fn flatten(&mut self, prefix: &str, table: toml::Table) {
        for (key, value) in table {
            let key = if prefix.is_empty() {
                key
            } else {
                format!("{prefix}.{key}")
            };
            match value {
                toml::Value::Table(inner) => self.flatten(&key, inner),
                other => {
                    self.values.insert(key, other);
                }
            }
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.values.get(key)
    }

    fn invalid(key: &str, reason: impl Into<String>) -> WolochainError {
        WolochainError::InvalidOption {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn get_string(&self, key: &str) -> WolochainResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(toml::Value::Integer(i)) => Ok(Some(i.to_string())),
            Some(toml::Value::Boolean(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(Self::invalid(key, format!("expected a string, got {other}"))),
        }
    }

    pub fn get_bool(&self, key: &str) -> WolochainResult<bool> {
        match self.get(key) {
            None => Ok(false),
            Some(toml::Value::Boolean(b)) => Ok(*b),
            Some(toml::Value::String(s)) => match s.trim() {
                "" => Ok(false),
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(Self::invalid(key, format!("not a boolean: {other}"))),
            },
            Some(toml::Value::Integer(i)) => Ok(*i != 0),
            Some(other) => Err(Self::invalid(key, format!("expected a boolean, got {other}"))),
        }
    }

    pub fn get_u64(&self, key: &str) -> WolochainResult<u64> {
        match self.get(key) {
            None => Ok(0),
            Some(toml::Value::Integer(i)) => {
                u64::try_from(*i).map_err(|_| Self::invalid(key, format!("negative value {i}")))
            }
            Some(toml::Value::String(s)) if s.trim().is_empty() => Ok(0),
            Some(toml::Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| Self::invalid(key, format!("not an unsigned integer: {s}"))),
            Some(other) => Err(Self::invalid(key, format!("expected an integer, got {other}"))),
        }
    }

    pub fn get_string_list(&self, key: &str) -> WolochainResult<Vec<String>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(toml::Value::String(s)) => Ok(s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()),
            Some(toml::Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    toml::Value::String(s) => Ok(s.clone()),
                    toml::Value::Integer(i) => Ok(i.to_string()),
                    other => Err(Self::invalid(key, format!("unexpected list item {other}"))),
                })
                .collect(),
            Some(other) => Err(Self::invalid(key, format!("expected a list, got {other}"))),
        }
    }

    pub fn get_u64_list(&self, key: &str) -> WolochainResult<Vec<u64>> {
        self.get_string_list(key)?
            .iter()
            .map(|s| {
                s.parse()
                    .map_err(|_| Self::invalid(key, format!("not an unsigned integer: {s}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_app_config_sets_gas_floor() {
        assert!(AppConfig::default().minimum_gas_prices.is_empty());
        assert_eq!(AppConfig::init_app_config().minimum_gas_prices, "0stake");
    }

    #[test]
    fn test_app_toml_flattens_to_option_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("app.toml");
        let mut config = AppConfig::init_app_config();
        config.state_sync.snapshot_interval = 100;
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path).unwrap(), config);

        let options = AppOptions::from_app_toml(&path).unwrap();
        assert_eq!(options.get_u64(flags::SNAPSHOT_INTERVAL).unwrap(), 100);
        assert_eq!(options.get_u64(flags::SNAPSHOT_KEEP_RECENT).unwrap(), 2);
        assert_eq!(
            options.get_string(flags::MIN_GAS_PRICES).unwrap().as_deref(),
            Some("0stake")
        );
        assert!(options.get_bool(flags::INTER_BLOCK_CACHE).unwrap());
    }

    #[test]
    fn test_lenient_casts() {
        let options = AppOptions::new()
            .with(flags::TRACE, "true")
            .with(flags::HALT_HEIGHT, "42")
            .with(flags::UNSAFE_SKIP_UPGRADES, "10, 20")
            .with(flags::PRUNING_INTERVAL, "ten");

        assert!(options.get_bool(flags::TRACE).unwrap());
        assert_eq!(options.get_u64(flags::HALT_HEIGHT).unwrap(), 42);
        assert_eq!(options.get_u64_list(flags::UNSAFE_SKIP_UPGRADES).unwrap(), vec![10, 20]);
        assert!(options.get_u64(flags::PRUNING_INTERVAL).is_err());
        assert_eq!(options.get_u64(flags::MIN_RETAIN_BLOCKS).unwrap(), 0);
    }

    #[test]
    fn test_default_chain_id() {
        assert_eq!(default_chain_id(), "wolochain");
    }
}
