//! Genesis commands: `init`, `add-genesis-account`, `gentx`,
//! `collect-gentxs`, `validate-genesis` and `migrate`.

use anyhow::{bail, Context as _, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wolochain_bank::BankModule;
use wolochain_core::{Address, AppConfig, Coin, Coins, NodeConfig};
use wolochain_crypto::KeyPair;
use wolochain_node::{GenesisDoc, ModuleRegistry};
use wolochain_staking::{GenTx, StakingModule};

/// Genesis formats `migrate` can produce
pub const MIGRATION_TARGETS: &[&str] = &["v1"];

pub fn config_dir(home: &Path) -> PathBuf {
    home.join("config")
}

pub fn gentx_dir(home: &Path) -> PathBuf {
    config_dir(home).join("gentx")
}

fn section(app_state: &Value, module: &str) -> Value {
    app_state.get(module).cloned().unwrap_or_else(|| json!({}))
}

fn set_section(doc: &mut GenesisDoc, module: &str, value: Value) -> Result<()> {
    match doc.app_state.as_object_mut() {
        Some(sections) => {
            sections.insert(module.to_string(), value);
            Ok(())
        }
        None => bail!("app_state of the genesis document is not a JSON object"),
    }
}

/// Write `config.toml`, `app.toml` and a genesis document holding every
/// module's default genesis.
pub fn init(
    home: &Path,
    registry: &ModuleRegistry,
    moniker: &str,
    chain_id: &str,
    overwrite: bool,
    default_denom: Option<&str>,
) -> Result<GenesisDoc> {
    let genesis_path = GenesisDoc::path_in_home(home);
    if genesis_path.exists() && !overwrite {
        bail!("genesis.json file already exists: {}", genesis_path.display());
    }
    std::fs::create_dir_all(config_dir(home))?;
    std::fs::create_dir_all(home.join("data"))?;

    let node_config = NodeConfig {
        moniker: moniker.to_string(),
        ..Default::default()
    };
    node_config.save(&config_dir(home).join("config.toml"))?;

    let mut app_config = AppConfig::init_app_config();
    let mut app_state = registry.default_genesis();
    if let Some(denom) = default_denom {
        wolochain_core::validate_denom(denom)?;
        app_config.minimum_gas_prices = format!("0{denom}");
        app_state[wolochain_staking::MODULE_NAME]["params"]["bond_denom"] = json!(denom);
    }
    app_config.save(&config_dir(home).join("app.toml"))?;

    let doc = GenesisDoc::new(chain_id, app_state);
    doc.validate_basic()?;
    doc.save(&genesis_path)?;
    info!("Initialized node {} for chain {} in {}", moniker, chain_id, home.display());
    Ok(doc)
}

/// Credit `coins` to a new genesis account
pub fn add_genesis_account(home: &Path, address: Address, coins: &Coins) -> Result<GenesisDoc> {
    if coins.is_empty() {
        bail!("no coins given for genesis account {address}");
    }
    let path = GenesisDoc::path_in_home(home);
    let mut doc = GenesisDoc::load(&path)?;

    let mut bank = BankModule::parse_genesis(&section(&doc.app_state, wolochain_bank::MODULE_NAME))?;
    if !bank.balance_of(&address).is_empty() {
        bail!("cannot add account at existing address {address}");
    }
    bank.add_account(address, coins)?;
    set_section(&mut doc, wolochain_bank::MODULE_NAME, serde_json::to_value(&bank)?)?;

    doc.save(&path)?;
    Ok(doc)
}

/// Sign a self-delegation for `keypair` and write it to the gentx directory
/// (or `output`). The delegator must hold `amount` in genesis.
pub fn gentx(
    home: &Path,
    keypair: &KeyPair,
    chain_id: &str,
    moniker: &str,
    amount: Coin,
    output: Option<&Path>,
) -> Result<PathBuf> {
    let doc = GenesisDoc::load(&GenesisDoc::path_in_home(home))?;
    if doc.chain_id != chain_id {
        bail!(
            "chain id {} does not match the genesis document ({})",
            chain_id,
            doc.chain_id
        );
    }

    let bank = BankModule::parse_genesis(&section(&doc.app_state, wolochain_bank::MODULE_NAME))?;
    let staking = StakingModule::parse_genesis(&section(&doc.app_state, wolochain_staking::MODULE_NAME))?;

    let gentx = GenTx::new(keypair, chain_id, moniker, amount)?;
    gentx
        .verify(chain_id, &staking.params.bond_denom, &bank.balance_of(&keypair.address()))
        .context("failed to validate gentx")?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => gentx_dir(home).join(gentx.file_name()),
    };
    gentx.save(&path)?;
    info!("Genesis transaction written to {}", path.display());
    Ok(path)
}

/// Verify every gentx in `dir` and add its validator to staking genesis
pub fn collect_gentxs(home: &Path, registry: &ModuleRegistry, dir: Option<&Path>) -> Result<GenesisDoc> {
    let path = GenesisDoc::path_in_home(home);
    let mut doc = GenesisDoc::load(&path)?;
    let dir = dir.map(Path::to_path_buf).unwrap_or_else(|| gentx_dir(home));

    let gentxs = GenTx::load_dir(&dir)
        .with_context(|| format!("failed to read gentxs from {}", dir.display()))?;
    if gentxs.is_empty() {
        bail!("no gentx files found in {}", dir.display());
    }

    let bank = BankModule::parse_genesis(&section(&doc.app_state, wolochain_bank::MODULE_NAME))?;
    let mut staking = StakingModule::parse_genesis(&section(&doc.app_state, wolochain_staking::MODULE_NAME))?;
    for gentx in &gentxs {
        let delegator = gentx.body.delegator_address;
        gentx.verify(&doc.chain_id, &staking.params.bond_denom, &bank.balance_of(&delegator))?;
        if staking.validators.iter().any(|v| v.operator_address == delegator) {
            warn!("Validator {} is already in genesis, skipping its gentx", delegator);
            continue;
        }
        staking.validators.push(gentx.to_validator());
    }
    set_section(&mut doc, wolochain_staking::MODULE_NAME, serde_json::to_value(&staking)?)?;
    registry.validate_genesis(&doc.app_state)?;

    doc.save(&path)?;
    info!("Collected {} gentxs into {}", gentxs.len(), path.display());
    Ok(doc)
}

/// Validate the genesis document at `path` against every registered module
pub fn validate_genesis(path: &Path, registry: &ModuleRegistry) -> Result<GenesisDoc> {
    let doc = GenesisDoc::load(path)?;
    doc.validate_basic()?;
    registry
        .validate_genesis(&doc.app_state)
        .with_context(|| format!("error validating genesis file {}", path.display()))?;
    Ok(doc)
}

/// Re-emit the genesis document at `path` in the `target` format, filling
/// missing module sections with their defaults.
pub fn migrate(
    target: &str,
    path: &Path,
    registry: &ModuleRegistry,
    chain_id: Option<&str>,
    genesis_time: Option<&str>,
) -> Result<GenesisDoc> {
    if !MIGRATION_TARGETS.contains(&target) {
        bail!(
            "unknown migration target version {target}, expected one of: {}",
            MIGRATION_TARGETS.join(", ")
        );
    }

    let mut doc = GenesisDoc::load(path)?;
    if doc.app_state.is_null() {
        doc.app_state = json!({});
    }
    let defaults = registry.default_genesis();
    if let (Some(sections), Some(defaults)) = (doc.app_state.as_object_mut(), defaults.as_object()) {
        for (name, default) in defaults {
            sections.entry(name.clone()).or_insert_with(|| default.clone());
        }
    }
    if let Some(chain_id) = chain_id {
        doc.chain_id = chain_id.to_string();
    }
    if let Some(time) = genesis_time {
        doc.genesis_time = time.to_string();
    }

    doc.validate_basic()?;
    registry.validate_genesis(&doc.app_state)?;
    Ok(doc)
}
