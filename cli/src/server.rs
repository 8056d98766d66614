//! Server commands: `start` and `export`
//!
//! Both read `config/app.toml` into an option bag, overlay the flags the
//! operator gave explicitly, and hand the result to the [`AppCreator`].

use anyhow::{bail, Context as _, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wolochain_core::{flags, ApiConfig, AppOptions, NodeConfig};
use wolochain_node::{AppCreator, BlockStore, GenesisDoc, NodeRuntime, WolochainNode, LATEST_HEIGHT};
use wolochain_state::{Database, TraceSink};

pub const API_ENABLE: &str = "api.enable";
pub const API_ADDRESS: &str = "api.address";
pub const API_ENABLED_UNSAFE_CORS: &str = "api.enabled-unsafe-cors";

/// Flags of `start`; unset flags fall back to `app.toml`
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Pruning strategy (default|nothing|everything|custom)
    #[arg(long)]
    pub pruning: Option<String>,

    /// Number of recent heights to keep on disk (custom pruning only)
    #[arg(long = "pruning-keep-recent")]
    pub pruning_keep_recent: Option<u64>,

    /// Height interval at which pruned heights are removed (custom pruning only)
    #[arg(long = "pruning-interval")]
    pub pruning_interval: Option<u64>,

    /// Minimum gas prices to accept for transactions, e.g. 0.01stake
    #[arg(long = "minimum-gas-prices")]
    pub minimum_gas_prices: Option<String>,

    /// Block height at which to gracefully halt the chain
    #[arg(long = "halt-height")]
    pub halt_height: Option<u64>,

    /// Minimum block time (Unix seconds) at which to gracefully halt the chain
    #[arg(long = "halt-time")]
    pub halt_time: Option<u64>,

    /// Minimum block height offset below which blocks are pruned
    #[arg(long = "min-retain-blocks")]
    pub min_retain_blocks: Option<u64>,

    /// Enable the inter-block caching of the application store
    #[arg(long = "inter-block-cache")]
    pub inter_block_cache: Option<bool>,

    /// Heights at which to skip upgrades
    #[arg(long = "unsafe-skip-upgrades", value_delimiter = ',')]
    pub unsafe_skip_upgrades: Vec<u64>,

    /// Provide full error chains in transaction logs
    #[arg(long)]
    pub trace: bool,

    /// File to which state writes are traced
    #[arg(long = "trace-store")]
    pub trace_store: Option<PathBuf>,

    /// State sync snapshot interval
    #[arg(long = "state-sync.snapshot-interval")]
    pub snapshot_interval: Option<u64>,

    /// Number of state sync snapshots to keep
    #[arg(long = "state-sync.snapshot-keep-recent")]
    pub snapshot_keep_recent: Option<u32>,

    /// Disable the fast node index of the application store
    #[arg(long = "iavl-disable-fastnode")]
    pub iavl_disable_fastnode: Option<bool>,

    /// Assert registered invariants every N blocks
    #[arg(long = "inv-check-period")]
    pub inv_check_period: Option<u64>,

    /// Address the HTTP API listens on
    #[arg(long = "api.address")]
    pub api_address: Option<String>,
}

impl StartArgs {
    /// Overlay the flags that were given onto `options`
    pub fn apply(&self, options: &mut AppOptions) {
        let strings = [
            (flags::PRUNING, self.pruning.clone()),
            (flags::PRUNING_KEEP_RECENT, self.pruning_keep_recent.map(|v| v.to_string())),
            (flags::PRUNING_INTERVAL, self.pruning_interval.map(|v| v.to_string())),
            (flags::MIN_GAS_PRICES, self.minimum_gas_prices.clone()),
            (flags::HALT_HEIGHT, self.halt_height.map(|v| v.to_string())),
            (flags::HALT_TIME, self.halt_time.map(|v| v.to_string())),
            (flags::MIN_RETAIN_BLOCKS, self.min_retain_blocks.map(|v| v.to_string())),
            (flags::SNAPSHOT_INTERVAL, self.snapshot_interval.map(|v| v.to_string())),
            (flags::SNAPSHOT_KEEP_RECENT, self.snapshot_keep_recent.map(|v| v.to_string())),
            (flags::INV_CHECK_PERIOD, self.inv_check_period.map(|v| v.to_string())),
            (API_ADDRESS, self.api_address.clone()),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                options.set(key, value);
            }
        }

        let bools = [
            (flags::INTER_BLOCK_CACHE, self.inter_block_cache),
            (flags::IAVL_DISABLE_FAST_NODE, self.iavl_disable_fastnode),
        ];
        for (key, value) in bools {
            if let Some(value) = value {
                options.set(key, value);
            }
        }

        if self.trace {
            options.set(flags::TRACE, true);
        }
        if !self.unsafe_skip_upgrades.is_empty() {
            let heights: Vec<String> = self.unsafe_skip_upgrades.iter().map(u64::to_string).collect();
            options.set(flags::UNSAFE_SKIP_UPGRADES, heights.join(","));
        }
        if let Some(path) = &self.trace_store {
            options.set(flags::TRACE_STORE, path.to_string_lossy().to_string());
        }
    }
}

/// Flags of `export`
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Export state from a particular height (-1 means latest height)
    #[arg(long, default_value_t = LATEST_HEIGHT, allow_negative_numbers = true)]
    pub height: i64,

    /// Export state to start at height zero (perform preprocessing)
    #[arg(long = "for-zero-height")]
    pub for_zero_height: bool,

    /// Comma-separated list of operator addresses of jailed validators to unjail
    #[arg(long = "jail-allowed-addrs", value_delimiter = ',')]
    pub jail_allowed_addrs: Vec<String>,

    /// Comma-separated list of modules to export. If empty, will export all modules
    #[arg(long = "modules-to-export", value_delimiter = ',')]
    pub modules_to_export: Vec<String>,

    /// Exported state is written to the given file instead of STDOUT
    #[arg(long = "output-document")]
    pub output_document: Option<PathBuf>,
}

/// `app.toml` of `home` (when present) plus the home directory itself
pub fn load_app_options(home: &Path) -> Result<AppOptions> {
    let path = home.join("config").join("app.toml");
    let mut options = if path.exists() {
        AppOptions::from_app_toml(&path)
            .with_context(|| format!("failed to read {}", path.display()))?
    } else {
        AppOptions::new()
    };
    options.set(flags::HOME, home.to_string_lossy().to_string());
    Ok(options)
}

fn api_config(options: &AppOptions) -> Result<ApiConfig> {
    let defaults = ApiConfig::default();
    Ok(ApiConfig {
        enable: match options.get(API_ENABLE) {
            Some(_) => options.get_bool(API_ENABLE)?,
            None => defaults.enable,
        },
        address: options.get_string(API_ADDRESS)?.unwrap_or(defaults.address),
        enabled_unsafe_cors: options.get_bool(API_ENABLED_UNSAFE_CORS)?,
    })
}

fn trace_sink(options: &AppOptions) -> Result<Option<TraceSink>> {
    match options.get_string(flags::TRACE_STORE)?.filter(|p| !p.is_empty()) {
        Some(path) => Ok(Some(
            TraceSink::open(Path::new(&path)).with_context(|| format!("failed to open trace store {path}"))?,
        )),
        None => Ok(None),
    }
}

/// Run the node until it halts or is interrupted
pub async fn start(creator: &AppCreator, home: &Path, args: &StartArgs) -> Result<()> {
    let mut options = load_app_options(home)?;
    args.apply(&mut options);

    let min_gas_prices = options.get_string(flags::MIN_GAS_PRICES)?.unwrap_or_default();
    if min_gas_prices.trim().is_empty() {
        bail!("set min gas price in app.toml or flag or env variable: error in app.toml");
    }
    // Bad settings must fail before the trace file is created.
    creator.resolve_settings(&options)?;

    let config_path = home.join("config").join("config.toml");
    let node_config = NodeConfig::load(&config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let api = api_config(&options)?;
    let trace = trace_sink(&options)?;

    let db = Database::in_home(home);
    let app = creator.new_app_with_services(&db, trace, &options)?;
    let genesis = GenesisDoc::load(&GenesisDoc::path_in_home(home))?;
    let blocks = BlockStore::open(&BlockStore::path_in_home(home))?;

    info!("Starting node in {}", home.display());
    let runtime = NodeRuntime::new(node_config, genesis, app, blocks);
    WolochainNode::new(runtime, api).start().await?;
    Ok(())
}

/// Export state as a genesis document. An uninitialized home exports its
/// genesis file unchanged.
pub fn export(creator: &AppCreator, home: &Path, args: &ExportArgs) -> Result<GenesisDoc> {
    let options = load_app_options(home)?;
    let genesis_path = GenesisDoc::path_in_home(home);

    let db = Database::in_home(home);
    if !db.exists() {
        warn!("State is not initialized. Returning genesis file.");
        return Ok(GenesisDoc::load(&genesis_path)?);
    }

    creator.resolve_settings(&options)?;
    let trace = trace_sink(&options)?;
    let exported = creator.app_export(
        &db,
        trace,
        args.height,
        args.for_zero_height,
        &args.jail_allowed_addrs,
        &options,
        &args.modules_to_export,
    )?;

    let mut doc = GenesisDoc::load(&genesis_path)?;
    doc.app_state = exported.app_state;
    doc.validators = exported.validators;
    doc.initial_height = exported.height;
    doc.consensus_params = exported.consensus_params;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;
    use wolochain_node::ModuleRegistry;

    #[test]
    fn test_flags_overlay_app_toml() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("config")).unwrap();
        wolochain_core::AppConfig::init_app_config()
            .save(&tmp.path().join("config").join("app.toml"))
            .unwrap();

        let mut options = load_app_options(tmp.path()).unwrap();
        assert_eq!(options.get_string(flags::MIN_GAS_PRICES).unwrap().unwrap(), "0stake");
        assert_eq!(options.get_u64(flags::SNAPSHOT_KEEP_RECENT).unwrap(), 2);

        let args = StartArgs {
            pruning: Some("nothing".into()),
            halt_height: Some(9),
            unsafe_skip_upgrades: vec![3, 4],
            inter_block_cache: Some(false),
            ..Default::default()
        };
        args.apply(&mut options);
        assert_eq!(options.get_string(flags::PRUNING).unwrap().unwrap(), "nothing");
        assert_eq!(options.get_u64(flags::HALT_HEIGHT).unwrap(), 9);
        assert_eq!(options.get_u64_list(flags::UNSAFE_SKIP_UPGRADES).unwrap(), vec![3, 4]);
        assert!(!options.get_bool(flags::INTER_BLOCK_CACHE).unwrap());

        let api = api_config(&options).unwrap();
        assert!(api.enable);
        assert_eq!(api.address, "127.0.0.1:1317");
    }

    #[tokio::test]
    async fn test_bad_pruning_creates_no_trace_file() {
        let tmp = TempDir::new().unwrap();
        let creator = AppCreator::new(Arc::new(ModuleRegistry::standard()));
        let trace = tmp.path().join("trace.jsonl");
        let args = StartArgs {
            minimum_gas_prices: Some("0stake".into()),
            pruning: Some("sometimes".into()),
            trace_store: Some(trace.clone()),
            ..Default::default()
        };

        let err = start(&creator, tmp.path(), &args).await.unwrap_err();
        assert!(err.to_string().contains("pruning"), "{err}");
        assert!(!trace.exists());
        assert!(!Database::in_home(tmp.path()).exists());
    }

    #[tokio::test]
    async fn test_start_rejects_empty_gas_floor() {
        let tmp = TempDir::new().unwrap();
        let creator = AppCreator::new(Arc::new(ModuleRegistry::standard()));
        let err = start(&creator, tmp.path(), &StartArgs::default()).await.unwrap_err();
        assert!(err.to_string().contains("min gas price"));
        assert!(!Database::in_home(tmp.path()).exists());
    }
}
