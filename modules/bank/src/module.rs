//! Application module wiring

use serde_json::Value;
use tracing::debug;
use wolochain_core::{
    Address, Any, AppModule, AppModuleBasic, Context, Event, MsgResponse, QueryCommand,
    ValidatorUpdate, WolochainError, WolochainResult,
};

use crate::keeper::Keeper;
use crate::types::{GenesisState, MsgSend, MODULE_NAME, MSG_SEND_TYPE_URL, MSG_TYPE_PREFIX};

/// The bank module as registered with the application
#[derive(Default)]
pub struct BankModule {
    keeper: Keeper,
}

impl BankModule {
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

    fn parse_send(msg: &Any) -> WolochainResult<MsgSend> {
        if msg.type_url != MSG_SEND_TYPE_URL {
            return Err(WolochainError::UnknownMessage {
                module: MODULE_NAME.to_string(),
                type_url: msg.type_url.clone(),
            });
        }
        serde_json::from_value(msg.value.clone())
            .map_err(|e| WolochainError::InvalidTransaction(format!("invalid MsgSend: {e}")))
    }
}

impl AppModuleBasic for BankModule {
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
                name: "balances",
                about: "Query the balances of an account",
                args: &["address"],
            },
            QueryCommand {
                name: "total-supply",
                about: "Query the total supply of coins",
                args: &[],
            },
            QueryCommand {
                name: "params",
                about: "Show the parameters of the module",
                args: &[],
            },
        ]
    }
}

impl AppModule for BankModule {
    fn init_genesis(
        &self,
        ctx: &mut Context<'_>,
        genesis: &Value,
    ) -> WolochainResult<Vec<ValidatorUpdate>> {
        let genesis = Self::parse_genesis(genesis)?;
        genesis.validate()?;

        let store = ctx.store_mut();
        self.keeper.set_params(store, &genesis.params)?;
        for balance in &genesis.balances {
            self.keeper.set_balance(store, &balance.address, &balance.coins)?;
        }
        let supply = if genesis.supply.is_empty() {
            genesis.sum_balances()?
        } else {
            genesis.supply.clone()
        };
        self.keeper.set_supply(store, &supply)?;

        debug!(
            "Initialized bank genesis: {} accounts, supply {}",
            genesis.balances.len(),
            supply
        );
        Ok(Vec::new())
    }

    fn export_genesis(&self, ctx: &Context<'_>) -> WolochainResult<Value> {
        let store = ctx.store();
        let genesis = GenesisState {
            params: self.keeper.get_params(store)?,
            balances: self.keeper.all_balances(store)?,
            supply: self.keeper.get_supply(store)?,
        };
        Ok(serde_json::to_value(genesis)?)
    }

    fn msg_type_prefix(&self) -> Option<&'static str> {
        Some(MSG_TYPE_PREFIX)
    }

    fn msg_signers(&self, msg: &Any) -> WolochainResult<Vec<Address>> {
        Ok(vec![Self::parse_send(msg)?.from_address])
    }

    fn handle_msg(&self, ctx: &mut Context<'_>, msg: &Any) -> WolochainResult<MsgResponse> {
        let send = Self::parse_send(msg)?;
        if send.amount.is_empty() {
            return Err(WolochainError::InvalidCoins("send amount must be positive".into()));
        }
        if !self.keeper.get_params(ctx.store())?.default_send_enabled {
            return Err(WolochainError::InvalidTransaction("transfers are currently disabled".into()));
        }
        self.keeper
            .send(ctx.store_mut(), &send.from_address, &send.to_address, &send.amount)?;

        Ok(MsgResponse {
            events: vec![Event::new("transfer")
                .attribute("recipient", send.to_address.to_hex())
                .attribute("sender", send.from_address.to_hex())
                .attribute("amount", send.amount.to_string())],
            log: String::new(),
        })
    }

    fn query(&self, ctx: &Context<'_>, path: &[&str]) -> WolochainResult<Value> {
        let store = ctx.store();
        match path {
            ["balances", address] => {
                let address: Address = address.parse()?;
                Ok(serde_json::json!({
                    "balances": self.keeper.get_balance(store, &address)?,
                }))
            }
            ["total-supply"] => Ok(serde_json::json!({
                "supply": self.keeper.get_supply(store)?,
            })),
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

    fn check_invariants(&self, ctx: &Context<'_>) -> WolochainResult<()> {
        self.keeper.supply_invariant(ctx.store())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wolochain_core::{BlockHeader, Height, Timestamp};
    use wolochain_crypto::KeyPair;
    use wolochain_state::MemoryStore;

    fn header() -> BlockHeader {
        BlockHeader::new("wolochain", Height::new(1), Timestamp::from_millis(0))
    }

    #[test]
    fn test_genesis_derives_supply() {
        let module = BankModule::new();
        let alice = KeyPair::generate().address();
        let genesis = serde_json::json!({
            "balances": [{"address": alice.to_hex(), "coins": [{"denom": "stake", "amount": "1000"}]}],
        });
        module.validate_genesis(&genesis).unwrap();

        let mut store = MemoryStore::new();
        let mut ctx = Context::new(&mut store, header());
        module.init_genesis(&mut ctx, &genesis).unwrap();
        module.check_invariants(&ctx).unwrap();

        let exported = module.export_genesis(&ctx).unwrap();
        assert_eq!(exported["supply"][0]["amount"], "1000");
        assert_eq!(exported["params"]["default_send_enabled"], true);

        let balances = module.query(&ctx, &["balances", alice.to_hex().as_str()]).unwrap();
        assert_eq!(balances["balances"][0]["denom"], "stake");
        assert!(module.query(&ctx, &["balances", "zz"]).is_err());
    }

    #[test]
    fn test_msg_send() {
        let module = BankModule::new();
        let alice = Address([1; 20]);
        let bob = Address([2; 20]);
        let mut store = MemoryStore::new();
        let mut ctx = Context::new(&mut store, header());
        module
            .keeper()
            .set_balance(ctx.store_mut(), &alice, &"100stake".parse().unwrap())
            .unwrap();

        let msg = Any::new(
            MSG_SEND_TYPE_URL,
            serde_json::json!({
                "from_address": alice.to_hex(),
                "to_address": bob.to_hex(),
                "amount": [{"denom": "stake", "amount": "30"}],
            }),
        );
        assert_eq!(module.msg_signers(&msg).unwrap(), vec![alice]);

        let response = module.handle_msg(&mut ctx, &msg).unwrap();
        assert_eq!(response.events[0].kind, "transfer");
        let bob_balance = module.keeper().get_balance(ctx.store(), &bob).unwrap();
        assert_eq!(bob_balance.amount_of("stake"), 30);

        let unknown = Any::new("/cosmos.bank.v1beta1.MsgMultiSend", serde_json::json!({}));
        assert!(matches!(
            module.handle_msg(&mut ctx, &unknown),
            Err(WolochainError::UnknownMessage { .. })
        ));
    }
}
