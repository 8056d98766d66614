//! Staking keeper

use wolochain_core::{Address, StateReader, StateWriter, WolochainError, WolochainResult};
use wolochain_state::{prefix_key, ParamStore};

use crate::types::{Params, PARAMS_KEY, STORE_KEY, VALIDATORS_PREFIX};
use crate::validator::Validator;

fn validator_key(address: &Address) -> Vec<u8> {
    prefix_key(STORE_KEY, format!("{VALIDATORS_PREFIX}{}", address.to_hex()).as_bytes())
}

/// State accessor of the staking module
pub struct Keeper {
    params: ParamStore<Params>,
}

impl Keeper {
    pub fn new() -> Self {
        Self {
            params: ParamStore::new(STORE_KEY, PARAMS_KEY),
        }
    }

    pub fn get_params<S: StateReader + ?Sized>(&self, store: &S) -> WolochainResult<Params> {
        self.params.get(store)
    }

    pub fn set_params<S: StateWriter + ?Sized>(&self, store: &mut S, params: &Params) -> WolochainResult<()> {
        self.params.set(store, params)
    }

    pub fn get_validator<S: StateReader + ?Sized>(
        &self,
        store: &S,
        address: &Address,
    ) -> WolochainResult<Option<Validator>> {
        let key = validator_key(address);
        store
            .get(&key)?
            .map(|bytes| {
                serde_json::from_slice(&bytes).map_err(|e| WolochainError::Decode {
                    key: String::from_utf8_lossy(&key).into_owned(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn set_validator<S: StateWriter + ?Sized>(&self, store: &mut S, validator: &Validator) -> WolochainResult<()> {
        let key = validator_key(&validator.operator_address);
        store.set(&key, &serde_json::to_vec(validator)?)
    }

    /// Every stored validator, ordered by operator address
    pub fn all_validators<S: StateReader + ?Sized>(&self, store: &S) -> WolochainResult<Vec<Validator>> {
        let prefix = prefix_key(STORE_KEY, VALIDATORS_PREFIX.as_bytes());
        store
            .iter_prefix(&prefix)?
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_slice(&value).map_err(|e| WolochainError::Decode {
                    key: String::from_utf8_lossy(&key).into_owned(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    /// Jail a validator, removing it from the active set
    pub fn jail<S: StateWriter + ?Sized>(&self, store: &mut S, address: &Address) -> WolochainResult<()> {
        let mut validator = self
            .get_validator(&*store, address)?
            .ok_or_else(|| WolochainError::NotFound(format!("validator {address}")))?;
        validator.jailed = true;
        self.set_validator(store, &validator)
    }
}

impl Default for Keeper {
    fn default() -> Self {
        Self::new()
    }
}
