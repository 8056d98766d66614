//! The Wolochain application
//!
//! Drives the module registry over the versioned store through the block
//! lifecycle: `init_chain`, then `begin_block`, `deliver_tx`*, `end_block`
//! and `commit` per block.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use wolochain_core::{
    Address, BlockHeader, Context, DecCoins, Event, GenesisValidator, Hash, Height, Timestamp,
    ValidatorUpdate, WolochainError, WolochainResult, EXIT_CODE_INVARIANT_BROKEN,
};
use wolochain_state::{
    apply_changes, CacheStore, ParamStore, PruningOptions, SnapshotOptions, SnapshotStore,
    VersionedStore,
};

use crate::genesis::{ConsensusParams, GenesisDoc};
use crate::registry::ModuleRegistry;
use crate::tx::Tx;

const CONSENSUS_PARAMS: ParamStore<ConsensusParams> = ParamStore::new("baseapp", "consensus_params");

/// Result codes reported for delivered transactions
pub mod codes {
    pub const OK: u32 = 0;
    pub const INTERNAL: u32 = 1;
    pub const TX_DECODE: u32 = 2;
    pub const UNAUTHORIZED: u32 = 4;
    pub const UNKNOWN_REQUEST: u32 = 6;
    pub const INVALID_ADDRESS: u32 = 7;
    pub const INVALID_COINS: u32 = 10;
    pub const INSUFFICIENT_FEE: u32 = 13;
    pub const INVALID_REQUEST: u32 = 18;
}

/// Result code for a failed transaction
pub fn error_code(err: &WolochainError) -> u32 {
    match err {
        WolochainError::DeserializationError(_) => codes::TX_DECODE,
        WolochainError::InvalidSignature | WolochainError::InvalidPublicKey => codes::UNAUTHORIZED,
        WolochainError::UnknownMessage { .. } | WolochainError::ModuleNotFound(_) => {
            codes::UNKNOWN_REQUEST
        }
        WolochainError::InvalidAddress(_) => codes::INVALID_ADDRESS,
        WolochainError::InvalidCoins(_) => codes::INVALID_COINS,
        WolochainError::InsufficientFee { .. } => codes::INSUFFICIENT_FEE,
        WolochainError::InvalidTransaction(_) => codes::INVALID_REQUEST,
        _ => codes::INTERNAL,
    }
}

/// Fully resolved application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub home: PathBuf,
    pub chain_id: String,
    pub inter_block_cache: bool,
    pub skip_upgrade_heights: BTreeSet<u64>,
    pub pruning: PruningOptions,
    pub snapshot: SnapshotOptions,
    pub min_gas_prices: DecCoins,
    pub halt_height: u64,
    /// Unix seconds; 0 disables
    pub halt_time: u64,
    pub min_retain_blocks: u64,
    /// Report full error chains in transaction logs
    pub trace: bool,
    /// `type.attribute` keys to index; empty indexes everything
    pub index_events: BTreeSet<String>,
    pub iavl_cache_size: u64,
    pub iavl_disable_fast_node: bool,
    pub inv_check_period: u64,
}

impl AppSettings {
    pub fn new(home: impl Into<PathBuf>, chain_id: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            chain_id: chain_id.into(),
            inter_block_cache: false,
            skip_upgrade_heights: BTreeSet::new(),
            pruning: PruningOptions::default(),
            snapshot: SnapshotOptions::default(),
            min_gas_prices: DecCoins::default(),
            halt_height: 0,
            halt_time: 0,
            min_retain_blocks: 0,
            trace: false,
            index_events: BTreeSet::new(),
            iavl_cache_size: 0,
            iavl_disable_fast_node: false,
            inv_check_period: 0,
        }
    }
}

/// Auxiliary query services registered against the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Services {
    pub consensus_info: bool,
    pub node_info: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitChainResponse {
    pub validators: Vec<ValidatorUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndBlockResponse {
    pub validator_updates: Vec<ValidatorUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitResponse {
    pub height: u64,
    pub app_hash: Hash,
    /// Blocks below this height may be dropped; 0 keeps everything
    pub retain_height: u64,
}

/// Outcome of a delivered transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxResult {
    pub hash: Hash,
    pub code: u32,
    pub log: String,
    pub events: Vec<Event>,
}

impl TxResult {
    pub fn is_ok(&self) -> bool {
        self.code == codes::OK
    }
}

/// Application state and validator set produced by an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedApp {
    pub app_state: Value,
    pub validators: Vec<GenesisValidator>,
    pub height: u64,
    pub consensus_params: ConsensusParams,
}

/// The Wolochain application
pub struct WolochainApp {
    registry: Arc<ModuleRegistry>,
    store: VersionedStore,
    snapshots: SnapshotStore,
    settings: AppSettings,
    services: Services,
    current: Option<BlockHeader>,
    last_block_time: Timestamp,
}

impl WolochainApp {
    pub fn new(
        registry: Arc<ModuleRegistry>,
        store: VersionedStore,
        snapshots: SnapshotStore,
        settings: AppSettings,
    ) -> WolochainResult<Self> {
        let mut app = Self {
            registry,
            store,
            snapshots,
            settings,
            services: Services::default(),
            current: None,
            last_block_time: Timestamp::default(),
        };
        app.restore_block_time()?;
        Ok(app)
    }

    /// Pick up the block time committed with the loaded version
    fn restore_block_time(&mut self) -> WolochainResult<()> {
        self.last_block_time = self
            .store
            .block_time(self.store.loaded_version())?
            .map(Timestamp::from_millis)
            .unwrap_or_default();
        Ok(())
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn chain_id(&self) -> &str {
        &self.settings.chain_id
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn services(&self) -> Services {
        self.services
    }

    pub fn register_consensus_info_service(&mut self) {
        self.services.consensus_info = true;
    }

    pub fn register_node_service(&mut self) {
        self.services.node_info = true;
    }

    /// Height of the loaded state version
    pub fn last_block_height(&self) -> u64 {
        self.store.loaded_version()
    }

    pub fn last_app_hash(&self) -> WolochainResult<Hash> {
        self.store.last_app_hash()
    }

    pub fn last_block_time(&self) -> Timestamp {
        self.last_block_time
    }

    pub fn is_upgrade_skipped(&self, height: u64) -> bool {
        self.settings.skip_upgrade_heights.contains(&height)
    }

    pub fn consensus_params(&self) -> WolochainResult<ConsensusParams> {
        CONSENSUS_PARAMS.get(&self.store.committed_view()?)
    }

    fn query_header(&self, height: u64) -> BlockHeader {
        BlockHeader::new(
            self.settings.chain_id.clone(),
            Height::new(height),
            self.last_block_time,
        )
    }

    /// Run module genesis on an empty store. The writes are persisted by the
    /// first block's commit.
    pub fn init_chain(&mut self, genesis: &GenesisDoc) -> WolochainResult<InitChainResponse> {
        if genesis.chain_id != self.settings.chain_id {
            return Err(WolochainError::GenesisError(format!(
                "invalid chain-id on InitChain; expected: {}, got: {}",
                self.settings.chain_id, genesis.chain_id
            )));
        }
        if !self.store.is_empty() {
            return Err(WolochainError::GenesisError(format!(
                "chain is already initialized at height {}",
                self.store.latest_version()
            )));
        }
        genesis.validate_basic()?;
        self.registry.validate_genesis(&genesis.app_state)?;

        self.store.set_initial_version(genesis.initial_height);
        let header = BlockHeader::new(
            genesis.chain_id.clone(),
            Height::new(genesis.initial_height),
            genesis.genesis_timestamp()?,
        );

        let result = {
            let mut ctx = Context::new(&mut self.store, header);
            CONSENSUS_PARAMS
                .set(ctx.store_mut(), &genesis.consensus_params)
                .and_then(|_| self.registry.init_genesis(&mut ctx, &genesis.app_state))
        };
        let validators = match result {
            Ok(validators) => validators,
            Err(e) => {
                self.store.discard();
                return Err(e);
            }
        };

        if validators.is_empty() {
            self.store.discard();
            return Err(WolochainError::GenesisError(
                "validator set is empty after InitGenesis, please ensure at least one validator \
                 is initialized with a delegation greater than or equal to the power reduction"
                    .into(),
            ));
        }
        if !genesis.validators.is_empty() {
            let declared: Vec<ValidatorUpdate> = genesis
                .validators
                .iter()
                .map(|v| ValidatorUpdate {
                    pub_key: v.pub_key,
                    power: v.power,
                })
                .collect();
            if declared != validators {
                self.store.discard();
                return Err(WolochainError::GenesisError(
                    "genesis validators do not match the validator set returned by InitGenesis".into(),
                ));
            }
        }

        info!(
            "Initialized chain {} at height {} with {} validators",
            genesis.chain_id,
            genesis.initial_height,
            validators.len()
        );
        Ok(InitChainResponse { validators })
    }

    /// True once the configured halt height or time has been reached. The
    /// block that reaches it is still committed; the next one is refused.
    pub fn should_halt(&self, height: u64, time: Timestamp) -> bool {
        (self.settings.halt_height > 0 && height >= self.settings.halt_height)
            || (self.settings.halt_time > 0 && time.as_secs() >= self.settings.halt_time)
    }

    pub fn begin_block(&mut self, header: BlockHeader) -> WolochainResult<()> {
        if let Some(current) = &self.current {
            return Err(WolochainError::Internal(format!(
                "block {} is still open",
                current.height
            )));
        }
        if header.chain_id != self.settings.chain_id {
            return Err(WolochainError::Internal(format!(
                "invalid chain-id on BeginBlock; expected: {}, got: {}",
                self.settings.chain_id, header.chain_id
            )));
        }
        if !self.store.is_empty() && header.height.value() != self.store.loaded_version() + 1 {
            return Err(WolochainError::Internal(format!(
                "invalid height {}; expected {}",
                header.height,
                self.store.loaded_version() + 1
            )));
        }
        let last = self.store.loaded_version();
        if last > 0 && self.should_halt(last, self.last_block_time) {
            return Err(WolochainError::Internal(format!(
                "halt per configuration height {} time {}",
                self.settings.halt_height, self.settings.halt_time
            )));
        }
        if self.is_upgrade_skipped(header.height.value()) {
            info!("Skipping upgrade checks at height {}", header.height);
        }

        debug!("Begin block {}", header.height);
        self.current = Some(header);
        Ok(())
    }

    fn current_header(&self) -> WolochainResult<BlockHeader> {
        self.current
            .clone()
            .ok_or_else(|| WolochainError::Internal("no block in progress".into()))
    }

    /// Stateless admission checks shared by mempool admission and delivery
    pub fn check_tx(&self, tx: &Tx) -> WolochainResult<()> {
        tx.validate_basic()?;
        tx.check_fee(&self.settings.min_gas_prices)?;
        tx.verify_signatures(&self.settings.chain_id)?;

        let signers = tx.signers();
        for msg in &tx.body.messages {
            for required in self.registry.msg_signers(msg)? {
                if !signers.contains(&required) {
                    return Err(WolochainError::InvalidSignature);
                }
            }
        }
        Ok(())
    }

    fn run_tx(&mut self, tx: &Tx, header: BlockHeader) -> WolochainResult<Vec<Event>> {
        self.check_tx(tx)?;

        let (changes, mut events) = {
            let mut cache = CacheStore::new(&self.store);
            let mut ctx = Context::new(&mut cache, header);
            let mut events = Vec::new();
            for msg in &tx.body.messages {
                events.extend(self.registry.handle_msg(&mut ctx, msg)?.events);
            }
            drop(ctx);
            (cache.into_changes(), events)
        };
        apply_changes(&mut self.store, changes)?;

        self.mark_indexed(&mut events);
        Ok(events)
    }

    fn mark_indexed(&self, events: &mut [Event]) {
        let index_all = self.settings.index_events.is_empty();
        for event in events {
            for attribute in &mut event.attributes {
                attribute.index = index_all
                    || self
                        .settings
                        .index_events
                        .contains(&format!("{}.{}", event.kind, attribute.key));
            }
        }
    }

    /// Execute a transaction; its writes are kept only if every message
    /// succeeds.
    pub fn deliver_tx(&mut self, tx: &Tx) -> TxResult {
        let hash = tx.hash().unwrap_or(Hash::ZERO);
        let outcome = self
            .current_header()
            .and_then(|header| self.run_tx(tx, header));

        match outcome {
            Ok(events) => TxResult {
                hash,
                code: codes::OK,
                log: String::new(),
                events,
            },
            Err(e) => {
                debug!("Transaction {} failed: {}", hash, e);
                let log = if self.settings.trace {
                    format!("{e:?}")
                } else {
                    e.to_string()
                };
                TxResult {
                    hash,
                    code: error_code(&e),
                    log,
                    events: Vec::new(),
                }
            }
        }
    }

    /// Run invariants on the configured period; a broken invariant stops
    /// the node with a dedicated exit code.
    pub fn end_block(&mut self) -> WolochainResult<EndBlockResponse> {
        let header = self.current_header()?;
        let period = self.settings.inv_check_period;
        if period > 0 && header.height.value() % period == 0 {
            self.assert_invariants(header)?;
        }
        Ok(EndBlockResponse::default())
    }

    fn assert_invariants(&self, header: BlockHeader) -> WolochainResult<()> {
        let height = header.height;
        let mut cache = CacheStore::new(&self.store);
        let ctx = Context::new(&mut cache, header);
        self.registry.check_invariants(&ctx).map_err(|e| {
            error!("Invariant broken at height {}: {}", height, e);
            WolochainError::ExitCode {
                code: EXIT_CODE_INVARIANT_BROKEN,
                reason: e.to_string(),
            }
        })
    }

    pub fn commit(&mut self) -> WolochainResult<CommitResponse> {
        let header = self.current_header()?;
        self.store.set_block_time(header.time.as_millis());
        let info = self.store.commit()?;
        self.current = None;
        self.last_block_time = header.time;
        if info.height != header.height.value() {
            warn!(
                "Committed version {} for block {}",
                info.height, header.height
            );
        }

        if self.settings.snapshot.should_snapshot(info.height) {
            if let Err(e) = self.take_snapshot(info.height) {
                error!("Failed to create state snapshot at height {}: {}", info.height, e);
            }
        }

        let retain_height = self.block_retention_height(info.height)?;
        info!(
            "Committed block {} (app hash {})",
            info.height, info.app_hash
        );
        Ok(CommitResponse {
            height: info.height,
            app_hash: info.app_hash,
            retain_height,
        })
    }

    fn take_snapshot(&self, height: u64) -> WolochainResult<()> {
        let entries = self.store.export_entries(height)?;
        self.snapshots.create(height, entries)?;
        self.snapshots.prune(self.settings.snapshot.keep_recent)?;
        Ok(())
    }

    /// Lowest height that must be kept: the smallest of the
    /// `min-retain-blocks` window, the evidence window and the snapshot
    /// window. 0 keeps everything.
    pub fn block_retention_height(&self, commit_height: u64) -> WolochainResult<u64> {
        let min_retain = self.settings.min_retain_blocks;
        if min_retain == 0 {
            return Ok(0);
        }
        let mut retain = commit_height.saturating_sub(min_retain);

        let evidence = self.consensus_params()?.evidence.max_age_num_blocks;
        retain = retain.min(commit_height.saturating_sub(evidence));

        let snapshot = self.settings.snapshot;
        if snapshot.interval > 0 && snapshot.keep_recent > 0 {
            let window = snapshot.interval.saturating_mul(u64::from(snapshot.keep_recent));
            retain = retain.min(commit_height.saturating_sub(window));
        }
        Ok(retain)
    }

    pub fn load_latest(&mut self) -> WolochainResult<()> {
        self.store.load_latest()?;
        self.restore_block_time()
    }

    /// Load the state committed at `height`
    pub fn load_height(&mut self, height: u64) -> WolochainResult<()> {
        self.store.load_version(height)?;
        self.restore_block_time()
    }

    /// Serve a module query against committed state, at `height` or the
    /// loaded version.
    pub fn query(&self, height: Option<u64>, module: &str, path: &[&str]) -> WolochainResult<Value> {
        let view = match height {
            Some(height) => self.store.view_at(height)?,
            None => self.store.committed_view()?,
        };
        let header = self.query_header(view.height());
        let mut cache = CacheStore::new(&view);
        let ctx = Context::new(&mut cache, header);
        self.registry.query(&ctx, module, path)
    }

    /// Current consensus validator set
    pub fn validators(&self) -> WolochainResult<Vec<GenesisValidator>> {
        let view = self.store.committed_view()?;
        let header = self.query_header(view.height());
        let mut cache = CacheStore::new(&view);
        let ctx = Context::new(&mut cache, header);
        self.registry.validator_set(&ctx)
    }

    /// Export the loaded state as genesis sections plus the validator set.
    /// Zero-height preparation runs on a scratch copy; stored state is
    /// untouched.
    pub fn export_app_state_and_validators(
        &self,
        for_zero_height: bool,
        jail_allowed: &[String],
        modules_to_export: &[String],
    ) -> WolochainResult<ExportedApp> {
        let jail_allowed = jail_allowed
            .iter()
            .map(|addr| addr.parse::<Address>())
            .collect::<WolochainResult<Vec<_>>>()?;

        let view = self.store.committed_view()?;
        let last_height = view.height();
        let header = self.query_header(last_height + 1);
        let mut cache = CacheStore::new(&view);
        let mut ctx = Context::new(&mut cache, header);

        let height = if for_zero_height {
            self.registry.prepare_zero_height(&mut ctx, &jail_allowed)?;
            0
        } else {
            last_height + 1
        };

        let app_state = self.registry.export_genesis(&ctx, modules_to_export)?;
        let validators = self.registry.validator_set(&ctx)?;
        let consensus_params = CONSENSUS_PARAMS.get(ctx.store())?;
        info!(
            "Exported state of height {} ({} validators)",
            last_height,
            validators.len()
        );

        Ok(ExportedApp {
            app_state,
            validators,
            height,
            consensus_params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, TestChain};
    use crate::tx::Fee;
    use wolochain_bank::MSG_SEND_TYPE_URL;
    use wolochain_core::Any;
    use wolochain_crypto::KeyPair;

    fn send(from: &KeyPair, to: Address, amount: &str, fee: Fee) -> Tx {
        let mut tx = Tx::new(
            vec![Any::new(
                MSG_SEND_TYPE_URL,
                serde_json::json!({
                    "from_address": from.address(),
                    "to_address": to,
                    "amount": [{"denom": "stake", "amount": amount}],
                }),
            )],
            "",
            fee,
        );
        tx.sign(from, testutil::CHAIN_ID).unwrap();
        tx
    }

    fn balance(app: &WolochainApp, address: &Address) -> Value {
        let addr = address.to_hex();
        app.query(None, "bank", &["balances", addr.as_str()]).unwrap()["balances"].clone()
    }

    #[test]
    fn test_init_chain_and_first_block() {
        let chain = TestChain::new();
        let mut app = chain.app(AppSettings::new(chain.home(), testutil::CHAIN_ID));

        let response = app.init_chain(&chain.genesis).unwrap();
        assert_eq!(response.validators.len(), 1);
        assert_eq!(response.validators[0].power, 10);

        let commit = testutil::empty_block(&mut app, 1);
        assert_eq!(commit.height, 1);
        assert_eq!(app.last_block_height(), 1);
        assert_eq!(app.validators().unwrap().len(), 1);
        assert!(app.init_chain(&chain.genesis).is_err());
    }

    #[test]
    fn test_init_chain_without_validators_fails() {
        let chain = TestChain::new();
        let mut app = chain.app(AppSettings::new(chain.home(), testutil::CHAIN_ID));
        let mut genesis = chain.genesis.clone();
        genesis.app_state = app.registry().default_genesis();

        match app.init_chain(&genesis) {
            Err(WolochainError::GenesisError(reason)) => assert!(reason.contains("validator set is empty")),
            other => panic!("expected genesis error, got {other:?}"),
        }
        assert!(app.query(None, "bank", &["total-supply"]).is_ok());
    }

    #[test]
    fn test_init_chain_rejects_other_chain_id() {
        let chain = TestChain::new();
        let mut app = chain.app(AppSettings::new(chain.home(), "other-chain"));
        assert!(app.init_chain(&chain.genesis).is_err());
    }

    #[test]
    fn test_deliver_tx_transfers_and_indexes() {
        let chain = TestChain::new();
        let mut settings = AppSettings::new(chain.home(), testutil::CHAIN_ID);
        settings.index_events.insert("transfer.recipient".into());
        let mut app = chain.app(settings);
        app.init_chain(&chain.genesis).unwrap();
        testutil::empty_block(&mut app, 1);

        let recipient = Address([9; 20]);
        app.begin_block(testutil::header(2)).unwrap();
        let result = app.deliver_tx(&send(&chain.validator, recipient, "1000", Fee::default()));
        assert!(result.is_ok(), "{}", result.log);
        let attributes = &result.events[0].attributes;
        assert!(attributes.iter().find(|a| a.key == "recipient").unwrap().index);
        assert!(!attributes.iter().find(|a| a.key == "sender").unwrap().index);

        let overdraft = app.deliver_tx(&send(&chain.validator, recipient, "999999999999", Fee::default()));
        assert_eq!(overdraft.code, codes::INVALID_REQUEST);

        app.end_block().unwrap();
        app.commit().unwrap();
        assert_eq!(
            balance(&app, &recipient),
            serde_json::json!([{"denom": "stake", "amount": "1000"}])
        );
    }

    #[test]
    fn test_deliver_tx_requires_message_signer() {
        let chain = TestChain::new();
        let mut app = chain.app(AppSettings::new(chain.home(), testutil::CHAIN_ID));
        app.init_chain(&chain.genesis).unwrap();

        let stranger = KeyPair::generate();
        let mut tx = send(&chain.validator, Address([9; 20]), "1", Fee::default());
        tx.auth_info.signer_infos.clear();
        tx.signatures.clear();
        tx.sign(&stranger, testutil::CHAIN_ID).unwrap();

        app.begin_block(testutil::header(1)).unwrap();
        assert_eq!(app.deliver_tx(&tx).code, codes::UNAUTHORIZED);
    }

    #[test]
    fn test_gas_price_floor() {
        let chain = TestChain::new();
        let mut settings = AppSettings::new(chain.home(), testutil::CHAIN_ID);
        settings.min_gas_prices = "0.025stake".parse().unwrap();
        let mut app = chain.app(settings);
        app.init_chain(&chain.genesis).unwrap();
        app.begin_block(testutil::header(1)).unwrap();

        let free = send(&chain.validator, Address([9; 20]), "1", Fee::default());
        assert_eq!(app.deliver_tx(&free).code, codes::INSUFFICIENT_FEE);

        let paid = send(
            &chain.validator,
            Address([9; 20]),
            "1",
            Fee {
                amount: "5000stake".parse().unwrap(),
                gas_limit: 200_000,
            },
        );
        assert!(app.deliver_tx(&paid).is_ok());
    }

    #[test]
    fn test_broken_invariant_exits_with_code() {
        let chain = TestChain::new();
        let mut settings = AppSettings::new(chain.home(), testutil::CHAIN_ID);
        settings.inv_check_period = 1;
        let mut app = chain.app(settings);
        app.init_chain(&chain.genesis).unwrap();
        testutil::empty_block(&mut app, 1);

        app.begin_block(testutil::header(2)).unwrap();
        {
            let header = app.current_header().unwrap();
            let mut ctx = Context::new(&mut app.store, header);
            wolochain_bank::Keeper::new()
                .set_supply(ctx.store_mut(), &"1stake".parse().unwrap())
                .unwrap();
        }
        let err = app.end_block().unwrap_err();
        assert_eq!(err.exit_code(), EXIT_CODE_INVARIANT_BROKEN);
    }

    #[test]
    fn test_halt_height() {
        let chain = TestChain::new();
        let mut settings = AppSettings::new(chain.home(), testutil::CHAIN_ID);
        settings.halt_height = 2;
        let mut app = chain.app(settings);
        app.init_chain(&chain.genesis).unwrap();
        testutil::empty_block(&mut app, 1);

        assert!(!app.should_halt(1, Timestamp::from_millis(0)));
        assert!(app.should_halt(2, Timestamp::from_millis(0)));

        testutil::empty_block(&mut app, 2);
        assert!(app.begin_block(testutil::header(3)).is_err());
    }

    #[test]
    fn test_halt_time_after_restart() {
        let chain = TestChain::new();
        let block_two = testutil::header(2).time;
        let mut settings = AppSettings::new(chain.home(), testutil::CHAIN_ID);
        settings.halt_time = block_two.as_secs();
        {
            let mut app = chain.app(settings.clone());
            app.init_chain(&chain.genesis).unwrap();
            testutil::empty_block(&mut app, 1);
            testutil::empty_block(&mut app, 2);
        }

        let mut app = chain.app(settings);
        assert_eq!(app.last_block_height(), 2);
        assert_eq!(app.last_block_time(), block_two);
        assert!(app.should_halt(2, app.last_block_time()));
        assert!(app.begin_block(testutil::header(3)).is_err());

        app.load_height(1).unwrap();
        assert_eq!(app.last_block_time(), testutil::header(1).time);
    }

    #[test]
    fn test_retention_height() {
        let chain = TestChain::new();
        let mut settings = AppSettings::new(chain.home(), testutil::CHAIN_ID);
        settings.min_retain_blocks = 5;
        settings.snapshot = SnapshotOptions::new(2, 2);
        let mut app = chain.app(settings);
        let mut genesis = chain.genesis.clone();
        genesis.consensus_params.evidence.max_age_num_blocks = 3;
        app.init_chain(&genesis).unwrap();

        for height in 1..=4 {
            testutil::empty_block(&mut app, height);
        }
        assert_eq!(app.block_retention_height(4).unwrap(), 0);
        assert_eq!(app.block_retention_height(20).unwrap(), 15);

        let heights: Vec<u64> = app.snapshots().list().unwrap().iter().map(|s| s.height).collect();
        assert_eq!(heights, vec![2, 4]);
    }

    #[test]
    fn test_export_for_zero_height() {
        let chain = TestChain::new();
        let mut app = chain.app(AppSettings::new(chain.home(), testutil::CHAIN_ID));
        app.init_chain(&chain.genesis).unwrap();
        testutil::empty_block(&mut app, 1);

        let exported = app.export_app_state_and_validators(false, &[], &[]).unwrap();
        assert_eq!(exported.height, 2);
        assert_eq!(exported.validators.len(), 1);
        assert_eq!(exported.app_state.as_object().unwrap().len(), 3);

        let other = Address([3; 20]).to_hex();
        let zero = app
            .export_app_state_and_validators(true, &[other], &["staking".to_string()])
            .unwrap();
        assert_eq!(zero.height, 0);
        assert!(zero.validators.is_empty());
        assert_eq!(app.validators().unwrap().len(), 1);

        assert!(app
            .export_app_state_and_validators(true, &["not-an-address".to_string()], &[])
            .is_err());
    }
}
