//! Module keeper

use wolochain_core::{StateReader, StateWriter, WolochainResult};
use wolochain_state::ParamStore;

use crate::types::{Params, PARAMS_KEY, STORE_KEY};

/// State accessor of the wolochain module
pub struct Keeper {
    params: ParamStore<Params>,
}

impl Keeper {
    pub fn new() -> Self {
        Self {
            params: ParamStore::new(STORE_KEY, PARAMS_KEY),
        }
    }

    /// Current parameters; defaults when none were stored
    pub fn get_params<S: StateReader + ?Sized>(&self, store: &S) -> WolochainResult<Params> {
        self.params.get(store)
    }

    pub fn set_params<S: StateWriter + ?Sized>(
        &self,
        store: &mut S,
        params: &Params,
    ) -> WolochainResult<()> {
        self.params.set(store, params)
    }
}

impl Default for Keeper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wolochain_state::MemoryStore;

    #[test]
    fn test_get_params() {
        let keeper = Keeper::new();
        let mut store = MemoryStore::new();
        let params = Params::default();

        keeper.set_params(&mut store, &params).unwrap();
        assert_eq!(keeper.get_params(&store).unwrap(), params);
        assert!(store.has(b"wolochain/p_wolochain").unwrap());
    }

    #[test]
    fn test_get_params_without_write() {
        let keeper = Keeper::new();
        let store = MemoryStore::new();
        assert_eq!(keeper.get_params(&store).unwrap(), Params::default());
    }
}
