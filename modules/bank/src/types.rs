//! Bank parameters, genesis state and messages

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use wolochain_core::{validate_denom, Address, Coins, WolochainError, WolochainResult};

pub const MODULE_NAME: &str = "bank";
pub const STORE_KEY: &str = MODULE_NAME;
pub const PARAMS_KEY: &str = "params";

pub const BALANCES_PREFIX: &str = "balances/";
pub const SUPPLY_KEY: &str = "supply";

/// Type URL of [`MsgSend`]
pub const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
pub const MSG_TYPE_PREFIX: &str = "/cosmos.bank.v1beta1.";

fn invalid(reason: impl Into<String>) -> WolochainError {
    WolochainError::InvalidGenesis {
        module: MODULE_NAME.to_string(),
        reason: reason.into(),
    }
}

/// Module parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    pub default_send_enabled: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            default_send_enabled: true,
        }
    }
}

/// Balance of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub address: Address,
    pub coins: Coins,
}

/// Genesis section of the bank module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub balances: Vec<Balance>,
    /// Empty means "derive from balances"
    #[serde(default)]
    pub supply: Coins,
}

impl GenesisState {
    pub fn validate(&self) -> WolochainResult<()> {
        let mut seen = HashSet::new();
        for balance in &self.balances {
            if !seen.insert(balance.address) {
                return Err(invalid(format!("duplicate balance for address {}", balance.address)));
            }
            for coin in balance.coins.iter() {
                validate_denom(&coin.denom).map_err(|e| invalid(e.to_string()))?;
            }
        }

        let total = self.sum_balances().map_err(|e| invalid(e.to_string()))?;
        if !self.supply.is_empty() && self.supply != total {
            return Err(invalid(format!(
                "genesis supply is incorrect, expected {}, got {}",
                total, self.supply
            )));
        }
        Ok(())
    }

    pub fn sum_balances(&self) -> WolochainResult<Coins> {
        self.balances
            .iter()
            .try_fold(Coins::empty(), |acc, b| acc.add(&b.coins))
    }

    /// Credit `coins` to `address`, creating the balance entry if needed.
    /// The supply is re-derived when it was set.
    pub fn add_account(&mut self, address: Address, coins: &Coins) -> WolochainResult<()> {
        match self.balances.iter_mut().find(|b| b.address == address) {
            Some(balance) => balance.coins = balance.coins.add(coins)?,
            None => self.balances.push(Balance {
                address,
                coins: coins.clone(),
            }),
        }
        if !self.supply.is_empty() {
            self.supply = self.sum_balances()?;
        }
        Ok(())
    }

    pub fn balance_of(&self, address: &Address) -> Coins {
        self.balances
            .iter()
            .find(|b| &b.address == address)
            .map(|b| b.coins.clone())
            .unwrap_or_default()
    }
}

/// Transfer of coins between two accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    pub from_address: Address,
    pub to_address: Address,
    pub amount: Coins,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    #[test]
    fn test_validate_supply() {
        let mut genesis = GenesisState::default();
        genesis.add_account(addr(1), &"100stake".parse().unwrap()).unwrap();
        genesis.add_account(addr(2), &"50stake,5token".parse().unwrap()).unwrap();
        assert!(genesis.validate().is_ok());

        genesis.supply = "150stake,5token".parse().unwrap();
        assert!(genesis.validate().is_ok());

        genesis.supply = "1stake".parse().unwrap();
        assert!(genesis.validate().is_err());
    }

    #[test]
    fn test_duplicate_addresses_are_invalid() {
        let coins: Coins = "1stake".parse().unwrap();
        let genesis = GenesisState {
            balances: vec![
                Balance { address: addr(1), coins: coins.clone() },
                Balance { address: addr(1), coins },
            ],
            ..Default::default()
        };
        assert!(matches!(
            genesis.validate(),
            Err(WolochainError::InvalidGenesis { .. })
        ));
    }

    #[test]
    fn test_add_account_merges() {
        let mut genesis = GenesisState::default();
        genesis.add_account(addr(1), &"10stake".parse().unwrap()).unwrap();
        genesis.add_account(addr(1), &"5stake".parse().unwrap()).unwrap();
        assert_eq!(genesis.balances.len(), 1);
        assert_eq!(genesis.balance_of(&addr(1)).amount_of("stake"), 15);
    }

    #[test]
    fn test_overflowing_balances_are_invalid() {
        let max: Coins = format!("{}stake", u128::MAX).parse().unwrap();
        let mut genesis = GenesisState::default();
        genesis.add_account(addr(1), &max).unwrap();
        assert!(genesis.add_account(addr(1), &"1stake".parse().unwrap()).is_err());

        genesis.add_account(addr(2), &"1stake".parse().unwrap()).unwrap();
        assert!(matches!(
            genesis.validate(),
            Err(WolochainError::InvalidGenesis { .. })
        ));
    }
}
