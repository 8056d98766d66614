//! Module registry
//!
//! The ordered set of application modules. Constructed once and shared by
//! `Arc` between the assembler, the application and the command line.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use wolochain_bank::BankModule;
use wolochain_core::{
    Address, Any, AppModule, Context, GenesisValidator, MsgResponse, QueryCommand, ValidatorUpdate,
    WolochainError, WolochainResult,
};
use wolochain_module::WolochainModule;
use wolochain_staking::StakingModule;

/// Ordered collection of application modules; genesis runs in this order
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn AppModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The modules of a Wolochain node: bank, staking, wolochain
    pub fn standard() -> Self {
        Self::new()
            .with(BankModule::new())
            .with(StakingModule::new())
            .with(WolochainModule::new())
    }

    /// Add a module; a second module with the same name replaces the first
    pub fn with(mut self, module: impl AppModule + 'static) -> Self {
        let module: Arc<dyn AppModule> = Arc::new(module);
        match self.modules.iter().position(|m| m.name() == module.name()) {
            Some(idx) => {
                warn!("Module {} registered twice, keeping the last one", module.name());
                self.modules[idx] = module;
            }
            None => self.modules.push(module),
        }
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&dyn AppModule> {
        self.modules
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.as_ref())
    }

    fn require(&self, name: &str) -> WolochainResult<&dyn AppModule> {
        self.get(name)
            .ok_or_else(|| WolochainError::ModuleNotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn AppModule> {
        self.modules.iter().map(|m| m.as_ref())
    }

    /// Genesis app state with every module's default section
    pub fn default_genesis(&self) -> Value {
        let sections: Map<String, Value> = self
            .iter()
            .map(|m| (m.name().to_string(), m.default_genesis()))
            .collect();
        Value::Object(sections)
    }

    fn section<'v>(app_state: &'v Value, name: &str) -> Option<&'v Value> {
        app_state.as_object().and_then(|sections| sections.get(name))
    }

    /// Validate every module section; a missing section is validated as the
    /// module default.
    pub fn validate_genesis(&self, app_state: &Value) -> WolochainResult<()> {
        let sections = app_state.as_object().ok_or_else(|| {
            WolochainError::GenesisError("app_state must be a JSON object".into())
        })?;
        for module in self.iter() {
            match sections.get(module.name()) {
                Some(section) => module.validate_genesis(section)?,
                None => module.validate_genesis(&module.default_genesis())?,
            }
        }
        for name in sections.keys() {
            if self.get(name).is_none() {
                warn!("Genesis contains a section for unregistered module {}", name);
            }
        }
        Ok(())
    }

    /// Run every module's genesis and collect the initial validator updates.
    /// At most one module may report validator updates.
    pub fn init_genesis(
        &self,
        ctx: &mut Context<'_>,
        app_state: &Value,
    ) -> WolochainResult<Vec<ValidatorUpdate>> {
        let mut updates = Vec::new();
        let mut reported_by: Option<&str> = None;
        for module in self.iter() {
            let default_section;
            let section = match Self::section(app_state, module.name()) {
                Some(section) => section,
                None => {
                    default_section = module.default_genesis();
                    &default_section
                }
            };
            let module_updates = module.init_genesis(ctx, section)?;
            debug!("InitGenesis for module {}", module.name());
            if module_updates.is_empty() {
                continue;
            }
            if let Some(other) = reported_by {
                return Err(WolochainError::GenesisError(format!(
                    "validator InitGenesis updates already set by module {other}, {} cannot set them too",
                    module.name()
                )));
            }
            reported_by = Some(module.name());
            updates = module_updates;
        }
        Ok(updates)
    }

    /// Export genesis sections; an empty selection exports every module
    pub fn export_genesis(&self, ctx: &Context<'_>, modules: &[String]) -> WolochainResult<Value> {
        let selected: Vec<&dyn AppModule> = if modules.is_empty() {
            self.iter().collect()
        } else {
            modules
                .iter()
                .map(|name| self.require(name))
                .collect::<WolochainResult<_>>()?
        };

        let mut sections = Map::new();
        for module in selected {
            sections.insert(module.name().to_string(), module.export_genesis(ctx)?);
        }
        Ok(Value::Object(sections))
    }

    /// Module handling a message type URL
    pub fn route(&self, msg: &Any) -> WolochainResult<&dyn AppModule> {
        self.iter()
            .find(|m| {
                m.msg_type_prefix()
                    .map(|prefix| msg.type_url.starts_with(prefix))
                    .unwrap_or(false)
            })
            .ok_or_else(|| WolochainError::UnknownMessage {
                module: "router".into(),
                type_url: msg.type_url.clone(),
            })
    }

    pub fn handle_msg(&self, ctx: &mut Context<'_>, msg: &Any) -> WolochainResult<MsgResponse> {
        self.route(msg)?.handle_msg(ctx, msg)
    }

    pub fn msg_signers(&self, msg: &Any) -> WolochainResult<Vec<Address>> {
        self.route(msg)?.msg_signers(msg)
    }

    pub fn query(&self, ctx: &Context<'_>, module: &str, path: &[&str]) -> WolochainResult<Value> {
        self.require(module)?.query(ctx, path)
    }

    /// First broken invariant, if any
    pub fn check_invariants(&self, ctx: &Context<'_>) -> WolochainResult<()> {
        for module in self.iter() {
            module.check_invariants(ctx)?;
        }
        Ok(())
    }

    pub fn prepare_zero_height(
        &self,
        ctx: &mut Context<'_>,
        jail_allowed: &[Address],
    ) -> WolochainResult<()> {
        for module in self.iter() {
            module.prepare_zero_height(ctx, jail_allowed)?;
        }
        Ok(())
    }

    pub fn validator_set(&self, ctx: &Context<'_>) -> WolochainResult<Vec<GenesisValidator>> {
        let mut validators = Vec::new();
        for module in self.iter() {
            validators.extend(module.validator_set(ctx)?);
        }
        Ok(validators)
    }

    /// Query commands contributed by each module
    pub fn query_commands(&self) -> Vec<(&'static str, Vec<QueryCommand>)> {
        self.iter()
            .map(|m| (m.name(), m.query_commands()))
            .filter(|(_, commands)| !commands.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wolochain_core::{BlockHeader, Height, Timestamp};
    use wolochain_state::MemoryStore;

    fn header() -> BlockHeader {
        BlockHeader::new("wolochain", Height::new(1), Timestamp::from_millis(0))
    }

    #[test]
    fn test_standard_order() {
        let registry = ModuleRegistry::standard();
        assert_eq!(registry.names(), vec!["bank", "staking", "wolochain"]);
    }

    #[test]
    fn test_default_genesis_validates() {
        let registry = ModuleRegistry::standard();
        let genesis = registry.default_genesis();
        assert!(genesis.get("wolochain").is_some());
        registry.validate_genesis(&genesis).unwrap();
        registry.validate_genesis(&serde_json::json!({})).unwrap();
        assert!(registry.validate_genesis(&serde_json::json!([])).is_err());
    }

    #[test]
    fn test_export_subset_and_unknown_module() {
        let registry = ModuleRegistry::standard();
        let mut store = MemoryStore::new();
        let mut ctx = Context::new(&mut store, header());
        registry
            .init_genesis(&mut ctx, &registry.default_genesis())
            .unwrap();

        let subset = registry
            .export_genesis(&ctx, &["wolochain".to_string()])
            .unwrap();
        let keys: Vec<&String> = subset.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["wolochain"]);

        let all = registry.export_genesis(&ctx, &[]).unwrap();
        assert_eq!(all.as_object().unwrap().len(), 3);

        match registry.export_genesis(&ctx, &["mint".to_string()]) {
            Err(WolochainError::ModuleNotFound(name)) => assert_eq!(name, "mint"),
            other => panic!("expected module-not-found, got {other:?}"),
        }
    }

    #[test]
    fn test_routing() {
        let registry = ModuleRegistry::standard();
        let msg = Any::new("/wolochain.wolochain.MsgAnything", serde_json::json!({}));
        assert_eq!(registry.route(&msg).unwrap().name(), "wolochain");

        let unknown = Any::new("/ibc.core.MsgTransfer", serde_json::json!({}));
        assert!(registry.route(&unknown).is_err());
    }
}
