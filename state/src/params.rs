//! Typed parameter storage

use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use wolochain_core::{StateReader, StateWriter, WolochainError, WolochainResult};

use crate::store::prefix_key;

/// JSON-encoded parameter set stored under `<store_key>/<params_key>`.
///
/// An absent value reads as `P::default()`; a value that no longer decodes
/// as `P` is reported as a decode error rather than silently replaced.
pub struct ParamStore<P> {
    store_key: &'static str,
    params_key: &'static str,
    _params: PhantomData<fn() -> P>,
}

impl<P> ParamStore<P>
where
    P: Serialize + DeserializeOwned + Default,
{
    pub const fn new(store_key: &'static str, params_key: &'static str) -> Self {
        Self {
            store_key,
            params_key,
            _params: PhantomData,
        }
    }

    pub fn key(&self) -> Vec<u8> {
        prefix_key(self.store_key, self.params_key.as_bytes())
    }

    pub fn get<S: StateReader + ?Sized>(&self, store: &S) -> WolochainResult<P> {
        let key = self.key();
        match store.get(&key)? {
            None => Ok(P::default()),
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| WolochainError::Decode {
                key: String::from_utf8_lossy(&key).into_owned(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn set<S: StateWriter + ?Sized>(&self, store: &mut S, params: &P) -> WolochainResult<()> {
        let bytes = serde_json::to_vec(params)?;
        store.set(&self.key(), &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct FeeParams {
        max_gas: u64,
        denom: String,
    }

    impl Default for FeeParams {
        fn default() -> Self {
            Self {
                max_gas: 100,
                denom: "stake".into(),
            }
        }
    }

    const FEES: ParamStore<FeeParams> = ParamStore::new("fees", "p_fees");

    #[test]
    fn test_absent_params_read_as_default() {
        let store = MemoryStore::new();
        assert_eq!(FEES.get(&store).unwrap(), FeeParams::default());
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = MemoryStore::new();
        let first = FeeParams {
            max_gas: 1,
            denom: "atom".into(),
        };
        let second = FeeParams {
            max_gas: 2,
            denom: "token".into(),
        };

        FEES.set(&mut store, &first).unwrap();
        FEES.set(&mut store, &second).unwrap();
        assert_eq!(FEES.get(&store).unwrap(), second);
        assert!(store.has(b"fees/p_fees").unwrap());
    }

    #[test]
    fn test_corrupt_params_are_a_decode_error() {
        let mut store = MemoryStore::new();
        store.set(&FEES.key(), b"\x00not json").unwrap();

        match FEES.get(&store) {
            Err(WolochainError::Decode { key, .. }) => assert_eq!(key, "fees/p_fees"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
