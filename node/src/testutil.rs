//! Test fixtures: a home directory with a genesis document declaring one
//! funded validator.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wolochain_bank::{Balance, GenesisState as BankGenesis};
use wolochain_core::{flags, AppOptions, BlockHeader, Height, Timestamp};
use wolochain_crypto::KeyPair;
use wolochain_staking::{GenesisState as StakingGenesis, Validator};
use wolochain_state::{Database, SnapshotStore, StoreOptions, VersionedStore};

use crate::app::{AppSettings, CommitResponse, WolochainApp};
use crate::genesis::GenesisDoc;
use crate::registry::ModuleRegistry;

pub const CHAIN_ID: &str = "wolochain-test";

/// Self-delegation of the test validator: power 10
pub const VALIDATOR_TOKENS: u128 = 10_000_000;

pub struct TestChain {
    pub dir: TempDir,
    pub validator: KeyPair,
    pub genesis: GenesisDoc,
}

impl TestChain {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let validator = KeyPair::from_seed(&[7u8; 32]);
        let registry = ModuleRegistry::standard();

        let mut app_state = registry.default_genesis();
        let bank = BankGenesis {
            balances: vec![Balance {
                address: validator.address(),
                coins: "1000000000stake".parse().unwrap(),
            }],
            ..Default::default()
        };
        let staking = StakingGenesis {
            params: Default::default(),
            validators: vec![Validator::new(
                validator.address(),
                validator.public_key(),
                "validator-0",
                VALIDATOR_TOKENS,
            )],
        };
        app_state["bank"] = serde_json::to_value(bank).unwrap();
        app_state["staking"] = serde_json::to_value(staking).unwrap();

        let mut genesis = GenesisDoc::new(CHAIN_ID, app_state);
        genesis.genesis_time = "2024-01-01T00:00:00Z".to_string();
        genesis.save(&GenesisDoc::path_in_home(dir.path())).unwrap();

        Self {
            dir,
            validator,
            genesis,
        }
    }

    pub fn home(&self) -> &Path {
        self.dir.path()
    }

    /// Options naming only the home directory
    pub fn options(&self) -> AppOptions {
        AppOptions::new().with(flags::HOME, self.home().to_string_lossy().to_string())
    }

    /// Application over a fresh store in the home directory
    pub fn app(&self, settings: AppSettings) -> WolochainApp {
        let store = VersionedStore::open(
            &Database::in_home(self.home()),
            StoreOptions {
                pruning: settings.pruning,
                ..Default::default()
            },
        )
        .unwrap();
        let snapshots = SnapshotStore::open(&SnapshotStore::dir_in_home(self.home())).unwrap();
        WolochainApp::new(Arc::new(ModuleRegistry::standard()), store, snapshots, settings).unwrap()
    }
}

pub fn header(height: u64) -> BlockHeader {
    BlockHeader::new(CHAIN_ID, Height::new(height), Timestamp::from_millis(1_704_067_200_000 + height * 1000))
}

/// Run an empty block at `height` through the whole lifecycle
pub fn empty_block(app: &mut WolochainApp, height: u64) -> CommitResponse {
    app.begin_block(header(height)).unwrap();
    app.end_block().unwrap();
    app.commit().unwrap()
}
