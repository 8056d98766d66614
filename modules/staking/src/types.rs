//! Staking parameters and genesis state

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use wolochain_core::{validate_denom, WolochainError, WolochainResult};

use crate::validator::Validator;

pub const MODULE_NAME: &str = "staking";
pub const STORE_KEY: &str = MODULE_NAME;
pub const PARAMS_KEY: &str = "params";
pub const VALIDATORS_PREFIX: &str = "validators/";

pub const DEFAULT_BOND_DENOM: &str = "stake";
pub const DEFAULT_MAX_VALIDATORS: u32 = 100;

pub(crate) fn invalid(reason: impl Into<String>) -> WolochainError {
    WolochainError::InvalidGenesis {
        module: MODULE_NAME.to_string(),
        reason: reason.into(),
    }
}

/// Module parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub bond_denom: String,
    pub max_validators: u32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            bond_denom: DEFAULT_BOND_DENOM.to_string(),
            max_validators: DEFAULT_MAX_VALIDATORS,
        }
    }
}

impl Params {
    pub fn validate(&self) -> WolochainResult<()> {
        validate_denom(&self.bond_denom).map_err(|e| invalid(e.to_string()))?;
        if self.max_validators == 0 {
            return Err(invalid("max_validators must be positive"));
        }
        Ok(())
    }
}

/// Genesis section of the staking module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub validators: Vec<Validator>,
}

impl GenesisState {
    pub fn validate(&self) -> WolochainResult<()> {
        self.params.validate()?;
        let mut operators = HashSet::new();
        let mut pubkeys = HashSet::new();
        for validator in &self.validators {
            if validator.moniker.trim().is_empty() {
                return Err(invalid(format!(
                    "validator {} has an empty moniker",
                    validator.operator_address
                )));
            }
            if !operators.insert(validator.operator_address) {
                return Err(invalid(format!(
                    "duplicate validator {}",
                    validator.operator_address
                )));
            }
            if !pubkeys.insert(validator.consensus_pubkey) {
                return Err(invalid(format!(
                    "duplicate consensus key {}",
                    validator.consensus_pubkey.to_hex()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wolochain_core::{Address, PublicKey};

    #[test]
    fn test_default_params() {
        let params = Params::default();
        assert_eq!(params.bond_denom, "stake");
        assert_eq!(params.max_validators, 100);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_duplicate_validators_are_invalid() {
        let v = Validator::new(Address([1; 20]), PublicKey([1; 32]), "one", 1);
        let genesis = GenesisState {
            params: Params::default(),
            validators: vec![v.clone(), v],
        };
        assert!(genesis.validate().is_err());
    }
}
