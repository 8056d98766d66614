//! Genesis import and export

use tracing::debug;
use wolochain_core::{Context, WolochainResult};

use crate::keeper::Keeper;
use crate::types::GenesisState;

/// Write the module's genesis state
pub fn init_genesis(ctx: &mut Context<'_>, keeper: &Keeper, genesis: &GenesisState) -> WolochainResult<()> {
    keeper.set_params(ctx.store_mut(), &genesis.params)?;
    debug!("Initialized wolochain genesis with params {}", genesis.params);
    Ok(())
}

/// Read the module's state back as genesis
pub fn export_genesis(ctx: &Context<'_>, keeper: &Keeper) -> WolochainResult<GenesisState> {
    Ok(GenesisState {
        params: keeper.get_params(ctx.store())?,
    })
}
