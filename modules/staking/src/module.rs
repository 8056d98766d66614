//! Application module wiring

use serde_json::Value;
use tracing::{debug, info};
use wolochain_core::{
    Address, AppModule, AppModuleBasic, Context, GenesisValidator, QueryCommand, ValidatorUpdate,
    WolochainError, WolochainResult,
};

use crate::keeper::Keeper;
use crate::types::{GenesisState, MODULE_NAME};
use crate::validator::select_active;

/// The staking module as registered with the application
#[derive(Default)]
pub struct StakingModule {
    keeper: Keeper,
}

impl StakingModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    pub fn parse_genesis(genesis: &Value) -> WolochainResult<GenesisState> {
        serde_json::from_value(genesis.clone()).map_err(|e| WolochainError::InvalidGenesis {
            module: MODULE_NAME.to_string(),
            reason: e.to_string(),
        })
    }
}

impl AppModuleBasic for StakingModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn default_genesis(&self) -> Value {
        serde_json::to_value(GenesisState::default()).unwrap_or(Value::Null)
    }

    fn validate_genesis(&self, genesis: &Value) -> WolochainResult<()> {
        Self::parse_genesis(genesis)?.validate()
    }

    fn query_commands(&self) -> Vec<QueryCommand> {
        vec![
            QueryCommand {
                name: "validators",
                about: "Query all validators",
                args: &[],
            },
            QueryCommand {
                name: "validator",
                about: "Query a validator by operator address",
                args: &["address"],
            },
            QueryCommand {
                name: "params",
                about: "Show the parameters of the module",
                args: &[],
            },
        ]
    }
}

impl AppModule for StakingModule {
    fn init_genesis(
        &self,
        ctx: &mut Context<'_>,
        genesis: &Value,
    ) -> WolochainResult<Vec<ValidatorUpdate>> {
        let genesis = Self::parse_genesis(genesis)?;
        genesis.validate()?;

        let store = ctx.store_mut();
        self.keeper.set_params(store, &genesis.params)?;
        for validator in &genesis.validators {
            self.keeper.set_validator(store, validator)?;
        }

        let updates: Vec<ValidatorUpdate> = select_active(&genesis.validators, genesis.params.max_validators)
            .into_iter()
            .map(|v| v.to_update())
            .collect();
        debug!(
            "Initialized staking genesis: {} validators, {} active",
            genesis.validators.len(),
            updates.len()
        );
        Ok(updates)
    }

    fn export_genesis(&self, ctx: &Context<'_>) -> WolochainResult<Value> {
        let store = ctx.store();
        let genesis = GenesisState {
            params: self.keeper.get_params(store)?,
            validators: self.keeper.all_validators(store)?,
        };
        Ok(serde_json::to_value(genesis)?)
    }

    fn query(&self, ctx: &Context<'_>, path: &[&str]) -> WolochainResult<Value> {
        let store = ctx.store();
        match path {
            ["validators"] => Ok(serde_json::json!({
                "validators": self.keeper.all_validators(store)?,
            })),
            ["validator", address] => {
                let address: Address = address.parse()?;
                let validator = self
                    .keeper
                    .get_validator(store, &address)?
                    .ok_or_else(|| WolochainError::NotFound(format!("validator {address}")))?;
                Ok(serde_json::json!({ "validator": validator }))
            }
            ["params"] => Ok(serde_json::json!({
                "params": self.keeper.get_params(store)?,
            })),
            _ => Err(WolochainError::UnknownQuery(format!(
                "{}/{}",
                MODULE_NAME,
                path.join("/")
            ))),
        }
    }

    fn prepare_zero_height(
        &self,
        ctx: &mut Context<'_>,
        jail_allowed: &[Address],
    ) -> WolochainResult<()> {
        if jail_allowed.is_empty() {
            return Ok(());
        }
        let store = ctx.store_mut();
        for validator in self.keeper.all_validators(&*store)? {
            if !validator.jailed && !jail_allowed.contains(&validator.operator_address) {
                self.keeper.jail(store, &validator.operator_address)?;
                info!("Jailed validator {} for zero-height export", validator.operator_address);
            }
        }
        Ok(())
    }

    fn validator_set(&self, ctx: &Context<'_>) -> WolochainResult<Vec<GenesisValidator>> {
        let store = ctx.store();
        let params = self.keeper.get_params(store)?;
        let validators = self.keeper.all_validators(store)?;
        Ok(select_active(&validators, params.max_validators)
            .into_iter()
            .map(|v| v.to_genesis_validator())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;
    use wolochain_core::{BlockHeader, Height, PublicKey, Timestamp};
    use wolochain_state::MemoryStore;

    fn genesis_with(validators: Vec<Validator>) -> Value {
        serde_json::to_value(GenesisState {
            params: Default::default(),
            validators,
        })
        .unwrap()
    }

    fn header() -> BlockHeader {
        BlockHeader::new("wolochain", Height::new(1), Timestamp::from_millis(0))
    }

    #[test]
    fn test_init_genesis_returns_updates() {
        let module = StakingModule::new();
        let genesis = genesis_with(vec![
            Validator::new(Address([1; 20]), PublicKey([1; 32]), "one", 2_000_000),
            Validator::new(Address([2; 20]), PublicKey([2; 32]), "dust", 10),
        ]);

        let mut store = MemoryStore::new();
        let mut ctx = Context::new(&mut store, header());
        let updates = module.init_genesis(&mut ctx, &genesis).unwrap();
        assert_eq!(updates, vec![ValidatorUpdate { pub_key: PublicKey([1; 32]), power: 2 }]);

        let set = module.validator_set(&ctx).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].name, "one");
        assert_eq!(module.export_genesis(&ctx).unwrap(), genesis);
    }

    #[test]
    fn test_zero_height_jails_unlisted_validators() {
        let module = StakingModule::new();
        let genesis = genesis_with(vec![
            Validator::new(Address([1; 20]), PublicKey([1; 32]), "one", 2_000_000),
            Validator::new(Address([2; 20]), PublicKey([2; 32]), "two", 3_000_000),
        ]);
        let mut store = MemoryStore::new();
        let mut ctx = Context::new(&mut store, header());
        module.init_genesis(&mut ctx, &genesis).unwrap();

        module.prepare_zero_height(&mut ctx, &[]).unwrap();
        assert_eq!(module.validator_set(&ctx).unwrap().len(), 2);

        module.prepare_zero_height(&mut ctx, &[Address([1; 20])]).unwrap();
        let set = module.validator_set(&ctx).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].address, Address([1; 20]));
    }

    #[test]
    fn test_queries() {
        let module = StakingModule::new();
        let genesis = genesis_with(vec![Validator::new(
            Address([1; 20]),
            PublicKey([1; 32]),
            "one",
            2_000_000,
        )]);
        let mut store = MemoryStore::new();
        let mut ctx = Context::new(&mut store, header());
        module.init_genesis(&mut ctx, &genesis).unwrap();

        let one = Address([1; 20]).to_hex();
        assert_eq!(module.query(&ctx, &["validator", one.as_str()]).unwrap()["validator"]["moniker"], "one");
        assert_eq!(module.query(&ctx, &["validators"]).unwrap()["validators"].as_array().unwrap().len(), 1);
        assert!(matches!(
            module.query(&ctx, &["validator", Address([2; 20]).to_hex().as_str()]),
            Err(WolochainError::NotFound(_))
        ));
    }
}
