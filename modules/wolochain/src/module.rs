//! Application module wiring

use serde_json::Value;
use wolochain_core::{
    Any, AppModule, AppModuleBasic, Context, MsgResponse, QueryCommand, ValidatorUpdate,
    WolochainError, WolochainResult,
};

use crate::genesis::{export_genesis, init_genesis};
use crate::keeper::Keeper;
use crate::msg_server::{MsgServer, MSG_TYPE_PREFIX};
use crate::types::{GenesisState, MODULE_NAME};

/// The wolochain module as registered with the application
#[derive(Default)]
pub struct WolochainModule {
    keeper: Keeper,
}

impl WolochainModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    fn parse_genesis(genesis: &Value) -> WolochainResult<GenesisState> {
        serde_json::from_value(genesis.clone()).map_err(|e| WolochainError::InvalidGenesis {
            module: MODULE_NAME.to_string(),
            reason: e.to_string(),
        })
    }
}

impl AppModuleBasic for WolochainModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn default_genesis(&self) -> Value {
        serde_json::to_value(GenesisState::default_genesis()).unwrap_or(Value::Null)
    }

    fn validate_genesis(&self, genesis: &Value) -> WolochainResult<()> {
        Self::parse_genesis(genesis)?.validate()
    }

    fn query_commands(&self) -> Vec<QueryCommand> {
        vec![QueryCommand {
            name: "params",
            about: "Show the parameters of the module",
            args: &[],
        }]
    }
}

impl AppModule for WolochainModule {
    fn init_genesis(
        &self,
        ctx: &mut Context<'_>,
        genesis: &Value,
    ) -> WolochainResult<Vec<ValidatorUpdate>> {
        let genesis = Self::parse_genesis(genesis)?;
        init_genesis(ctx, &self.keeper, &genesis)?;
        Ok(Vec::new())
    }

    fn export_genesis(&self, ctx: &Context<'_>) -> WolochainResult<Value> {
        Ok(serde_json::to_value(export_genesis(ctx, &self.keeper)?)?)
    }

    fn msg_type_prefix(&self) -> Option<&'static str> {
        Some(MSG_TYPE_PREFIX)
    }

    fn handle_msg(&self, ctx: &mut Context<'_>, msg: &Any) -> WolochainResult<MsgResponse> {
        MsgServer::new(&self.keeper).handle(ctx, msg)
    }

    fn query(&self, ctx: &Context<'_>, path: &[&str]) -> WolochainResult<Value> {
        match path {
            ["params"] => Ok(serde_json::json!({
                "params": self.keeper.get_params(ctx.store())?,
            })),
            _ => Err(WolochainError::UnknownQuery(format!(
                "{}/{}",
                MODULE_NAME,
                path.join("/")
            ))),
        }
    }
}
