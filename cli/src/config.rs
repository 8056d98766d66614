//! Client settings in `config/client.toml`
//!
//! Values stored here become the defaults of the matching flags on every
//! command; a flag given on the command line still wins.

use anyhow::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use wolochain_core::flags;

use crate::keyring::BACKEND_TEST;
use crate::root::DEFAULT_NODE;

pub const CLIENT_CONFIG_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientConfig {
    /// Empty keeps the application default
    pub chain_id: String,
    pub keyring_backend: String,
    pub node: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_id: String::new(),
            keyring_backend: BACKEND_TEST.to_string(),
            node: DEFAULT_NODE.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn path_in_home(home: &Path) -> PathBuf {
        home.join("config").join(CLIENT_CONFIG_FILE)
    }

    /// Settings of `home`; defaults when the file was never written
    pub fn load(home: &Path) -> Result<Self> {
        let path = Self::path_in_home(home);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn save(&self, home: &Path) -> Result<()> {
        let path = Self::path_in_home(home);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, toml::to_string(self)?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    fn field(&mut self, key: &str) -> Result<&mut String> {
        Ok(match key {
            flags::CHAIN_ID => &mut self.chain_id,
            flags::KEYRING_BACKEND => &mut self.keyring_backend,
            flags::NODE => &mut self.node,
            other => bail!(
                "unknown client config key {other:?}, expected one of {}, {}, {}",
                flags::CHAIN_ID,
                flags::KEYRING_BACKEND,
                flags::NODE
            ),
        })
    }

    pub fn get(&self, key: &str) -> Result<String> {
        let mut copy = self.clone();
        Ok(copy.field(key)?.clone())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        *self.field(key)? = value.into();
        Ok(())
    }

    /// Flag defaults these settings contribute; empty values are left out
    pub fn flag_defaults(&self) -> BTreeMap<&'static str, String> {
        [
            (flags::CHAIN_ID, &self.chain_id),
            (flags::KEYRING_BACKEND, &self.keyring_backend),
            (flags::NODE, &self.node),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key, value.clone()))
        .collect()
    }
}
