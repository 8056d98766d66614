//! Node runtime
//!
//! Stands in for the consensus engine of a single-validator chain: it owns
//! the application, a transaction pool and the block store, and turns the
//! pool into one committed block per call to [`NodeRuntime::produce_block`].

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use tracing::{debug, info};
use wolochain_core::{
    BlockHeader, GenesisValidator, Hash, Height, NodeConfig, Timestamp, WolochainResult,
};

use crate::app::WolochainApp;
use crate::blocks::{BlockStore, StoredBlock};
use crate::genesis::GenesisDoc;
use crate::tx::Tx;

/// Most transactions held in the pool at once
pub const MAX_POOL_SIZE: usize = 5_000;

/// Status of the node as reported by the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStatus {
    pub earliest_height: u64,
    pub height: u64,
    pub time: Timestamp,
    pub app_hash: Hash,
}

/// Node runtime managing the application and its block store
pub struct NodeRuntime {
    config: NodeConfig,
    genesis: GenesisDoc,
    app: RwLock<WolochainApp>,
    blocks: BlockStore,
    pool: Mutex<VecDeque<(String, Tx)>>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig, genesis: GenesisDoc, app: WolochainApp, blocks: BlockStore) -> Self {
        Self {
            config,
            genesis,
            app: RwLock::new(app),
            blocks,
            pool: Mutex::new(VecDeque::new()),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn app(&self) -> &RwLock<WolochainApp> {
        &self.app
    }

    pub fn blocks(&self) -> &BlockStore {
        &self.blocks
    }

    pub fn chain_id(&self) -> String {
        self.app.read().chain_id().to_string()
    }

    pub fn pool_size(&self) -> usize {
        self.pool.lock().len()
    }

    /// Run `init_chain` from the genesis document when the store is empty
    pub fn init_chain_if_needed(&self) -> WolochainResult<bool> {
        let mut app = self.app.write();
        if app.last_block_height() > 0 {
            info!("Resuming chain {} at height {}", app.chain_id(), app.last_block_height());
            return Ok(false);
        }
        let response = app.init_chain(&self.genesis)?;
        info!(
            "Initialized chain {} with {} genesis validators",
            self.genesis.chain_id,
            response.validators.len()
        );
        Ok(true)
    }

    /// Check a wire transaction and add it to the pool
    pub fn submit_tx(&self, encoded: &str) -> WolochainResult<Hash> {
        let tx = Tx::decode(encoded)?;
        self.app.read().check_tx(&tx)?;
        let hash = tx.hash()?;

        let mut pool = self.pool.lock();
        if pool.len() >= MAX_POOL_SIZE {
            return Err(wolochain_core::WolochainError::InvalidTransaction(
                "transaction pool is full".into(),
            ));
        }
        pool.push_back((encoded.trim().to_string(), tx));
        debug!("Transaction {} added to pool ({} pending)", hash, pool.len());
        Ok(hash)
    }

    fn next_height(&self, app: &WolochainApp) -> u64 {
        match app.last_block_height() {
            0 => self.genesis.initial_height,
            h => h + 1,
        }
    }

    /// True when the application refuses to go past its last block
    pub fn halted(&self) -> bool {
        let app = self.app.read();
        let height = app.last_block_height();
        height > 0 && app.should_halt(height, app.last_block_time())
    }

    /// Commit the pooled transactions as the next block
    pub fn produce_block(&self) -> WolochainResult<StoredBlock> {
        let mut app = self.app.write();
        let header = BlockHeader::new(
            app.chain_id().to_string(),
            Height::new(self.next_height(&app)),
            Timestamp::now(),
        );
        app.begin_block(header.clone())?;

        let pending: Vec<(String, Tx)> = self.pool.lock().drain(..).collect();
        let mut txs = Vec::with_capacity(pending.len());
        let mut results = Vec::with_capacity(pending.len());
        for (encoded, tx) in pending {
            results.push(app.deliver_tx(&tx));
            txs.push(encoded);
        }

        app.end_block()?;
        let commit = app.commit()?;
        drop(app);

        let block = StoredBlock::new(header, commit.app_hash, txs, results);
        self.blocks.save(&block)?;
        if commit.retain_height > 0 {
            self.blocks.prune_below(commit.retain_height)?;
        }
        Ok(block)
    }

    pub fn status(&self) -> WolochainResult<NodeStatus> {
        let app = self.app.read();
        Ok(NodeStatus {
            earliest_height: self.blocks.base()?,
            height: app.last_block_height(),
            time: app.last_block_time(),
            app_hash: app.last_app_hash()?,
        })
    }

    pub fn validators(&self) -> WolochainResult<Vec<GenesisValidator>> {
        self.app.read().validators()
    }
}
