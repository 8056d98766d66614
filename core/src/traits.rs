//! Core traits defining Wolochain interfaces
//!
//! These traits define the contracts between the state layer, the modules,
//! and the application that drives them.

use crate::types::*;
use serde_json::Value;

/// Result type for Wolochain operations
pub type WolochainResult<T> = Result<T, crate::error::WolochainError>;

/// Read access to a key-value state
pub trait StateReader: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> WolochainResult<Option<Vec<u8>>>;

    /// Check if a key exists
    fn has(&self, key: &[u8]) -> WolochainResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// All entries whose key starts with `prefix`, in key order
    fn iter_prefix(&self, prefix: &[u8]) -> WolochainResult<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// Write access to a key-value state
pub trait StateWriter: StateReader {
    /// Set a value
    fn set(&mut self, key: &[u8], value: &[u8]) -> WolochainResult<()>;

    /// Delete a key
    fn delete(&mut self, key: &[u8]) -> WolochainResult<()>;
}

/// State access for one unit of execution: a store bound to the header of
/// the block it belongs to.
pub struct Context<'a> {
    store: &'a mut dyn StateWriter,
    header: BlockHeader,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a mut dyn StateWriter, header: BlockHeader) -> Self {
        Self { store, header }
    }

    pub fn store(&self) -> &dyn StateWriter {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut dyn StateWriter {
        &mut *self.store
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn chain_id(&self) -> &str {
        &self.header.chain_id
    }

    pub fn height(&self) -> Height {
        self.header.height
    }

    pub fn block_time(&self) -> Timestamp {
        self.header.time
    }
}

/// Query command a module contributes to the `query` command tree.
///
/// The command `<module> <name> <args...>` is served by the module's
/// [`AppModule::query`] with the path `[name, args...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCommand {
    pub name: &'static str,
    pub about: &'static str,
    pub args: &'static [&'static str],
}

/// Module capabilities that need no state: identity, genesis defaults and
/// validation, command-line contributions.
pub trait AppModuleBasic: Send + Sync {
    /// Module name, also the key of its section in the genesis app state
    fn name(&self) -> &'static str;

    /// Genesis section of a freshly initialized chain
    fn default_genesis(&self) -> Value;

    /// Stateless validation of a genesis section
    fn validate_genesis(&self, genesis: &Value) -> WolochainResult<()>;

    /// Query commands contributed to the `query` subcommand
    fn query_commands(&self) -> Vec<QueryCommand> {
        Vec::new()
    }
}

/// Module capabilities that operate on state
pub trait AppModule: AppModuleBasic {
    /// Write the module's genesis section into state
    fn init_genesis(&self, ctx: &mut Context<'_>, genesis: &Value)
        -> WolochainResult<Vec<ValidatorUpdate>>;

    /// Read the module's current state back as a genesis section
    fn export_genesis(&self, ctx: &Context<'_>) -> WolochainResult<Value>;

    /// Type-URL prefix of the messages this module handles
    fn msg_type_prefix(&self) -> Option<&'static str> {
        None
    }

    /// Addresses that must have signed a transaction carrying `msg`
    fn msg_signers(&self, _msg: &Any) -> WolochainResult<Vec<Address>> {
        Ok(Vec::new())
    }

    /// Handle a message whose type URL matches [`Self::msg_type_prefix`]
    fn handle_msg(&self, _ctx: &mut Context<'_>, msg: &Any) -> WolochainResult<MsgResponse> {
        Err(crate::error::WolochainError::UnknownMessage {
            module: self.name().to_string(),
            type_url: msg.type_url.clone(),
        })
    }

    /// Serve a query path such as `["params"]` or `["balances", "<addr>"]`
    fn query(&self, ctx: &Context<'_>, path: &[&str]) -> WolochainResult<Value>;

    /// Check the module's invariants against current state
    fn check_invariants(&self, _ctx: &Context<'_>) -> WolochainResult<()> {
        Ok(())
    }

    /// Reset state for an export that restarts the chain at height zero
    fn prepare_zero_height(
        &self,
        _ctx: &mut Context<'_>,
        _jail_allowed: &[Address],
    ) -> WolochainResult<()> {
        Ok(())
    }

    /// Validators this module contributes to the consensus set
    fn validator_set(&self, _ctx: &Context<'_>) -> WolochainResult<Vec<GenesisValidator>> {
        Ok(Vec::new())
    }
}
