//! Store keys, parameters and genesis state

use serde::{Deserialize, Serialize};
use std::fmt;
use wolochain_core::WolochainResult;

/// Module name
pub const MODULE_NAME: &str = "wolochain";

/// Primary module store key
pub const STORE_KEY: &str = MODULE_NAME;

/// Message routing key
pub const ROUTER_KEY: &str = MODULE_NAME;

/// In-memory store key
pub const MEM_STORE_KEY: &str = "mem_wolochain";

/// Key under which the module parameters are stored
pub const PARAMS_KEY: &str = "p_wolochain";

pub fn key_prefix(p: &str) -> Vec<u8> {
    p.as_bytes().to_vec()
}

/// Module parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {}

impl Params {
    pub fn new() -> Self {
        Self {}
    }

    pub fn validate(&self) -> WolochainResult<()> {
        Ok(())
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{}}")
    }
}

/// Genesis section of the module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub params: Params,
}

impl GenesisState {
    pub fn default_genesis() -> Self {
        Self {
            params: Params::default(),
        }
    }

    pub fn validate(&self) -> WolochainResult<()> {
        self.params.validate()
    }
}
