//! Application assembler
//!
//! Builds a [`WolochainApp`] from an option bag. Every setting is resolved
//! before anything is opened on disk, so a misconfigured node fails without
//! leaving a partially created store behind.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, info_span};
use wolochain_core::{flags, AppOptions, DecCoins, WolochainError, WolochainResult};
use wolochain_state::{
    Database, InterBlockCache, PruningOptions, SnapshotOptions, SnapshotStore, StoreOptions,
    TraceSink, VersionedStore,
};

use crate::app::{AppSettings, ExportedApp, WolochainApp};
use crate::genesis::GenesisDoc;
use crate::registry::ModuleRegistry;

/// Height argument of [`AppCreator::app_export`] selecting the latest version
pub const LATEST_HEIGHT: i64 = -1;

/// Home directory named by the options, if any
pub fn home_from_options(options: &AppOptions) -> WolochainResult<PathBuf> {
    options
        .get_string(flags::HOME)?
        .filter(|home| !home.trim().is_empty())
        .map(PathBuf::from)
        .ok_or(WolochainError::HomeNotSet)
}

/// Constructs applications for the `start` and `export` commands
#[derive(Clone)]
pub struct AppCreator {
    registry: Arc<ModuleRegistry>,
}

impl AppCreator {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    /// Resolve every application setting from `options`. Reads the genesis
    /// document when no chain id is given; opens nothing else.
    pub fn resolve_settings(&self, options: &AppOptions) -> WolochainResult<AppSettings> {
        let home = home_from_options(options)?;

        let inter_block_cache = options.get_bool(flags::INTER_BLOCK_CACHE)?;
        let skip_upgrade_heights = options
            .get_u64_list(flags::UNSAFE_SKIP_UPGRADES)?
            .into_iter()
            .collect();

        let pruning = PruningOptions::resolve(
            &options.get_string(flags::PRUNING)?.unwrap_or_default(),
            options.get_u64(flags::PRUNING_KEEP_RECENT)?,
            options.get_u64(flags::PRUNING_INTERVAL)?,
        )?;

        let chain_id = match options
            .get_string(flags::CHAIN_ID)?
            .filter(|id| !id.trim().is_empty())
        {
            Some(chain_id) => chain_id,
            None => GenesisDoc::read_chain_id(&GenesisDoc::path_in_home(&home))?,
        };

        let keep_recent = options.get_u64(flags::SNAPSHOT_KEEP_RECENT)?;
        let snapshot = SnapshotOptions::new(
            options.get_u64(flags::SNAPSHOT_INTERVAL)?,
            u32::try_from(keep_recent).map_err(|_| WolochainError::InvalidOption {
                key: flags::SNAPSHOT_KEEP_RECENT.to_string(),
                reason: format!("{keep_recent} is out of range"),
            })?,
        );

        let min_gas_prices: DecCoins = options
            .get_string(flags::MIN_GAS_PRICES)?
            .unwrap_or_default()
            .parse()?;

        Ok(AppSettings {
            home,
            chain_id,
            inter_block_cache,
            skip_upgrade_heights,
            pruning,
            snapshot,
            min_gas_prices,
            halt_height: options.get_u64(flags::HALT_HEIGHT)?,
            halt_time: options.get_u64(flags::HALT_TIME)?,
            min_retain_blocks: options.get_u64(flags::MIN_RETAIN_BLOCKS)?,
            trace: options.get_bool(flags::TRACE)?,
            index_events: options
                .get_string_list(flags::INDEX_EVENTS)?
                .into_iter()
                .collect(),
            iavl_cache_size: options.get_u64(flags::IAVL_CACHE_SIZE)?,
            iavl_disable_fast_node: options.get_bool(flags::IAVL_DISABLE_FAST_NODE)?,
            inv_check_period: options.get_u64(flags::INV_CHECK_PERIOD)?,
        })
    }

    /// Assemble the application without auxiliary services
    pub fn new_app(
        &self,
        db: &Database,
        trace: Option<TraceSink>,
        options: &AppOptions,
    ) -> WolochainResult<WolochainApp> {
        let settings = self.resolve_settings(options)?;
        let _span = info_span!("app", chain_id = %settings.chain_id).entered();

        let snapshots = SnapshotStore::open(&SnapshotStore::dir_in_home(&settings.home))?;

        let store_options = StoreOptions {
            pruning: settings.pruning,
            cache_size: settings.iavl_cache_size,
            disable_fast_node: settings.iavl_disable_fast_node,
            inter_block_cache: settings.inter_block_cache.then(InterBlockCache::new),
            trace,
        };
        let store = VersionedStore::open(db, store_options)?;

        info!(
            "Assembled application at version {} (pruning {}, snapshot interval {})",
            store.latest_version(),
            settings.pruning.strategy,
            settings.snapshot.interval
        );
        WolochainApp::new(self.registry.clone(), store, snapshots, settings)
    }

    /// Assemble the application for a long-running node: [`Self::new_app`]
    /// plus the consensus-info and node query services.
    pub fn new_app_with_services(
        &self,
        db: &Database,
        trace: Option<TraceSink>,
        options: &AppOptions,
    ) -> WolochainResult<WolochainApp> {
        let mut app = self.new_app(db, trace, options)?;
        app.register_consensus_info_service();
        app.register_node_service();
        Ok(app)
    }

    /// Export state at `height` ([`LATEST_HEIGHT`] for the latest version)
    #[allow(clippy::too_many_arguments)]
    pub fn app_export(
        &self,
        db: &Database,
        trace: Option<TraceSink>,
        height: i64,
        for_zero_height: bool,
        jail_allowed: &[String],
        options: &AppOptions,
        modules_to_export: &[String],
    ) -> WolochainResult<ExportedApp> {
        home_from_options(options)?;

        let target = match height {
            LATEST_HEIGHT => None,
            h => Some(u64::try_from(h).map_err(|_| WolochainError::InvalidOption {
                key: "height".to_string(),
                reason: format!("{h} is not a valid height"),
            })?),
        };

        let mut app = self.new_app(db, trace, options)?;
        match target {
            Some(height) => app.load_height(height)?,
            None => app.load_latest()?,
        }
        app.export_app_state_and_validators(for_zero_height, jail_allowed, modules_to_export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, TestChain};

    fn creator() -> AppCreator {
        AppCreator::new(Arc::new(ModuleRegistry::standard()))
    }

    #[test]
    fn test_chain_id_falls_back_to_genesis() {
        let chain = TestChain::new();
        let options = chain.options();

        let settings = creator().resolve_settings(&options).unwrap();
        assert_eq!(settings.chain_id, testutil::CHAIN_ID);

        let explicit = options.with(flags::CHAIN_ID, "override");
        assert_eq!(creator().resolve_settings(&explicit).unwrap().chain_id, "override");
    }

    #[test]
    fn test_missing_genesis_is_fatal() {
        let tmp = tempfile::TempDir::new().unwrap();
        let options = AppOptions::new().with(flags::HOME, tmp.path().to_string_lossy().to_string());
        assert!(matches!(
            creator().resolve_settings(&options),
            Err(WolochainError::GenesisError(_))
        ));
    }

    #[test]
    fn test_bad_pruning_opens_nothing() {
        let chain = TestChain::new();
        let db = Database::in_home(chain.home());
        let options = chain.options().with(flags::PRUNING, "sometimes");

        assert!(matches!(
            creator().new_app_with_services(&db, None, &options),
            Err(WolochainError::InvalidPruning(_))
        ));
        assert!(!db.exists());
        assert!(!SnapshotStore::dir_in_home(chain.home()).exists());

        let custom = chain
            .options()
            .with(flags::PRUNING, "custom")
            .with(flags::PRUNING_INTERVAL, "ten");
        assert!(creator().new_app(&db, None, &custom).is_err());
        assert!(!db.exists());
    }

    #[test]
    fn test_settings_resolution() {
        let chain = TestChain::new();
        let options = chain
            .options()
            .with(flags::PRUNING, "custom")
            .with(flags::PRUNING_KEEP_RECENT, "100")
            .with(flags::PRUNING_INTERVAL, "10")
            .with(flags::UNSAFE_SKIP_UPGRADES, "5,7")
            .with(flags::MIN_GAS_PRICES, "0.025stake")
            .with(flags::SNAPSHOT_INTERVAL, 100i64)
            .with(flags::SNAPSHOT_KEEP_RECENT, 3i64)
            .with(flags::INDEX_EVENTS, "transfer.sender")
            .with(flags::INTER_BLOCK_CACHE, true);

        let settings = creator().resolve_settings(&options).unwrap();
        assert_eq!(settings.pruning, PruningOptions::custom(100, 10));
        assert_eq!(settings.skip_upgrade_heights.len(), 2);
        assert!(!settings.min_gas_prices.is_zero());
        assert_eq!(settings.snapshot, SnapshotOptions::new(100, 3));
        assert!(settings.index_events.contains("transfer.sender"));
        assert!(settings.inter_block_cache);
    }

    #[test]
    fn test_services_registered_only_on_start() {
        let chain = TestChain::new();
        let db = Database::in_home(chain.home());

        let app = creator().new_app(&db, None, &chain.options()).unwrap();
        assert!(!app.services().consensus_info);
        drop(app);

        let app = creator()
            .new_app_with_services(&db, None, &chain.options())
            .unwrap();
        assert!(app.services().consensus_info && app.services().node_info);
        assert!(SnapshotStore::dir_in_home(chain.home()).join("metadata").exists());
    }

    #[test]
    fn test_export_requires_home() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db = Database::in_home(tmp.path());
        let result = creator().app_export(&db, None, LATEST_HEIGHT, false, &[], &AppOptions::new(), &[]);
        assert!(matches!(result, Err(WolochainError::HomeNotSet)));
        assert!(!db.exists());
    }

    #[test]
    fn test_export_latest_and_historical() {
        let chain = TestChain::new();
        let db = Database::in_home(chain.home());
        {
            let mut app = creator().new_app_with_services(&db, None, &chain.options()).unwrap();
            app.init_chain(&chain.genesis).unwrap();
            for height in 1..=3 {
                testutil::empty_block(&mut app, height);
            }
        }

        let options = chain.options();
        let latest = creator()
            .app_export(&db, None, LATEST_HEIGHT, false, &[], &options, &[])
            .unwrap();
        assert_eq!(latest.height, 4);
        assert!(!latest.validators.is_empty());
        let mut modules: Vec<&String> = latest.app_state.as_object().unwrap().keys().collect();
        modules.sort();
        assert_eq!(modules, vec!["bank", "staking", "wolochain"]);

        let subset = creator()
            .app_export(&db, None, 2, false, &[], &options, &["bank".to_string()])
            .unwrap();
        assert_eq!(subset.height, 3);
        assert_eq!(subset.app_state.as_object().unwrap().len(), 1);

        assert!(matches!(
            creator().app_export(&db, None, 9, false, &[], &options, &[]),
            Err(WolochainError::HeightNotFound(9))
        ));
        assert!(creator()
            .app_export(&db, None, -5, false, &[], &options, &[])
            .is_err());
        assert!(matches!(
            creator().app_export(&db, None, LATEST_HEIGHT, false, &[], &options, &["mint".to_string()]),
            Err(WolochainError::ModuleNotFound(_))
        ));
    }
}
