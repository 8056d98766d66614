//! Bank keeper: balances and supply

use wolochain_core::{Address, Coin, Coins, StateReader, StateWriter, WolochainError, WolochainResult};
use wolochain_state::{prefix_key, strip_prefix, ParamStore};

use crate::types::{Balance, Params, BALANCES_PREFIX, PARAMS_KEY, STORE_KEY, SUPPLY_KEY};

fn balance_key(address: &Address) -> Vec<u8> {
    prefix_key(STORE_KEY, format!("{BALANCES_PREFIX}{}", address.to_hex()).as_bytes())
}

fn decode<T: serde::de::DeserializeOwned>(key: &[u8], bytes: &[u8]) -> WolochainResult<T> {
    serde_json::from_slice(bytes).map_err(|e| WolochainError::Decode {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: e.to_string(),
    })
}

/// State accessor of the bank module
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

    pub fn get_balance<S: StateReader + ?Sized>(&self, store: &S, address: &Address) -> WolochainResult<Coins> {
        let key = balance_key(address);
        match store.get(&key)? {
            Some(bytes) => decode(&key, &bytes),
            None => Ok(Coins::empty()),
        }
    }

    /// Store a balance; an empty balance removes the entry
    pub fn set_balance<S: StateWriter + ?Sized>(
        &self,
        store: &mut S,
        address: &Address,
        coins: &Coins,
    ) -> WolochainResult<()> {
        let key = balance_key(address);
        if coins.is_empty() {
            store.delete(&key)
        } else {
            store.set(&key, &serde_json::to_vec(coins)?)
        }
    }

    /// Every stored balance, ordered by address
    pub fn all_balances<S: StateReader + ?Sized>(&self, store: &S) -> WolochainResult<Vec<Balance>> {
        let prefix = prefix_key(STORE_KEY, BALANCES_PREFIX.as_bytes());
        store
            .iter_prefix(&prefix)?
            .into_iter()
            .map(|(key, value)| {
                let hex = strip_prefix(STORE_KEY, &key)
                    .and_then(|k| k.strip_prefix(BALANCES_PREFIX.as_bytes()))
                    .map(|k| String::from_utf8_lossy(k).into_owned())
                    .unwrap_or_default();
                Ok(Balance {
                    address: hex.parse()?,
                    coins: decode(&key, &value)?,
                })
            })
            .collect()
    }

    pub fn get_supply<S: StateReader + ?Sized>(&self, store: &S) -> WolochainResult<Coins> {
        let key = prefix_key(STORE_KEY, SUPPLY_KEY.as_bytes());
        match store.get(&key)? {
            Some(bytes) => decode(&key, &bytes),
            None => Ok(Coins::empty()),
        }
    }

    pub fn set_supply<S: StateWriter + ?Sized>(&self, store: &mut S, supply: &Coins) -> WolochainResult<()> {
        let key = prefix_key(STORE_KEY, SUPPLY_KEY.as_bytes());
        store.set(&key, &serde_json::to_vec(supply)?)
    }

    /// Move `amount` from one account to another
    pub fn send<S: StateWriter + ?Sized>(
        &self,
        store: &mut S,
        from: &Address,
        to: &Address,
        amount: &Coins,
    ) -> WolochainResult<()> {
        let from_balance = self.get_balance(&*store, from)?;
        let mut remaining = Vec::new();
        for coin in from_balance.iter() {
            let spent = amount.amount_of(&coin.denom);
            remaining.push(Coin::new(coin.amount - spent.min(coin.amount), coin.denom.clone()));
        }
        for coin in amount.iter() {
            if from_balance.amount_of(&coin.denom) < coin.amount {
                return Err(WolochainError::InvalidTransaction(format!(
                    "insufficient funds: {} is smaller than {}",
                    from_balance, amount
                )));
            }
        }
        self.set_balance(store, from, &Coins::new(remaining)?)?;
        let to_balance = self.get_balance(&*store, to)?;
        self.set_balance(store, to, &to_balance.add(amount)?)
    }

    /// Check that the stored supply equals the sum of all balances
    pub fn supply_invariant<S: StateReader + ?Sized>(&self, store: &S) -> WolochainResult<()> {
        let total = self
            .all_balances(store)?
            .iter()
            .try_fold(Coins::empty(), |acc, b| acc.add(&b.coins))?;
        let supply = self.get_supply(store)?;
        if total != supply {
            return Err(WolochainError::InvariantBroken(format!(
                "bank: total supply {} does not match sum of balances {}",
                supply, total
            )));
        }
        Ok(())
    }
}

impl Default for Keeper {
    fn default() -> Self {
        Self::new()
    }
}
