//! Validator records and set selection

use serde::{Deserialize, Serialize};
use wolochain_core::{amount_string, Address, GenesisValidator, PublicKey, ValidatorUpdate};

/// Tokens per unit of consensus voting power
pub const POWER_REDUCTION: u128 = 1_000_000;

/// Validator information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub operator_address: Address,
    pub consensus_pubkey: PublicKey,
    pub moniker: String,
    #[serde(with = "amount_string")]
    pub tokens: u128,
    #[serde(default)]
    pub jailed: bool,
}

impl Validator {
    pub fn new(operator_address: Address, consensus_pubkey: PublicKey, moniker: impl Into<String>, tokens: u128) -> Self {
        Self {
            operator_address,
            consensus_pubkey,
            moniker: moniker.into(),
            tokens,
            jailed: false,
        }
    }

    /// Consensus voting power
    pub fn power(&self) -> u64 {
        u64::try_from(self.tokens / POWER_REDUCTION).unwrap_or(u64::MAX)
    }

    pub fn is_bonded_candidate(&self) -> bool {
        !self.jailed && self.power() > 0
    }

    pub fn to_update(&self) -> ValidatorUpdate {
        ValidatorUpdate {
            pub_key: self.consensus_pubkey,
            power: self.power(),
        }
    }

    pub fn to_genesis_validator(&self) -> GenesisValidator {
        GenesisValidator {
            address: self.operator_address,
            pub_key: self.consensus_pubkey,
            power: self.power(),
            name: self.moniker.clone(),
        }
    }
}

/// The active set: unjailed validators with power, highest power first
/// (ties broken by operator address), at most `max_validators` of them.
pub fn select_active(validators: &[Validator], max_validators: u32) -> Vec<&Validator> {
    let mut active: Vec<&Validator> = validators.iter().filter(|v| v.is_bonded_candidate()).collect();
    active.sort_by(|a, b| {
        b.power()
            .cmp(&a.power())
            .then_with(|| a.operator_address.cmp(&b.operator_address))
    });
    active.truncate(max_validators as usize);
    active
}
