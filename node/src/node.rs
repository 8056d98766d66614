//! Wolochain node
//!
//! Drives a [`NodeRuntime`] on the commit timeout and serves the HTTP API
//! next to it until the halt condition is reached or the process is
//! interrupted.

use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use wolochain_core::{ApiConfig, WolochainResult};

use crate::api::start_api_server;
use crate::runtime::NodeRuntime;

pub struct WolochainNode {
    runtime: Arc<NodeRuntime>,
    api: ApiConfig,
}

impl WolochainNode {
    pub fn new(runtime: NodeRuntime, api: ApiConfig) -> Self {
        Self {
            runtime: Arc::new(runtime),
            api,
        }
    }

    pub fn runtime(&self) -> &Arc<NodeRuntime> {
        &self.runtime
    }

    /// Start the node and block until it stops
    pub async fn start(&self) -> WolochainResult<()> {
        info!("Starting Wolochain node...");
        info!("Chain: {}", self.runtime.chain_id());
        info!("Moniker: {}", self.runtime.config().moniker);

        self.runtime.init_chain_if_needed()?;

        let api_handle = if self.api.enable {
            let runtime = self.runtime.clone();
            let address = self.api.address.clone();
            let cors = self.api.enabled_unsafe_cors;
            Some(tokio::spawn(async move {
                if let Err(e) = start_api_server(runtime, &address, cors).await {
                    error!("API server error: {}", e);
                }
            }))
        } else {
            info!("API server disabled");
            None
        };

        let result = self.produce_blocks().await;

        if let Some(handle) = api_handle {
            handle.abort();
        }
        info!("Node stopped");
        result
    }

    async fn produce_blocks(&self) -> WolochainResult<()> {
        let timeout = Duration::from_millis(self.runtime.config().timeout_commit_ms.max(1));
        let mut ticker = tokio::time::interval(timeout);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if self.runtime.halted() {
                info!(
                    "Halt condition reached at height {}, stopping",
                    self.runtime.app().read().last_block_height()
                );
                return Ok(());
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let block = self.runtime.produce_block()?;
                    info!(
                        "Committed block {} with {} txs, app hash {}",
                        block.height(),
                        block.txs.len(),
                        block.app_hash
                    );
                }
                result = signal::ctrl_c() => {
                    match result {
                        Ok(()) => info!("Shutdown signal received, stopping node..."),
                        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
                    }
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockStore;
    use crate::testutil::{self, TestChain};
    use crate::AppSettings;
    use wolochain_core::NodeConfig;

    #[tokio::test]
    async fn test_node_stops_at_halt_height() {
        let chain = TestChain::new();
        let mut settings = AppSettings::new(chain.home(), testutil::CHAIN_ID);
        settings.halt_height = 3;

        let config = NodeConfig {
            timeout_commit_ms: 1,
            ..Default::default()
        };
        let blocks = BlockStore::open(&BlockStore::path_in_home(chain.home())).unwrap();
        let runtime = NodeRuntime::new(config, chain.genesis.clone(), chain.app(settings), blocks);
        let api = ApiConfig {
            enable: false,
            ..Default::default()
        };

        let node = WolochainNode::new(runtime, api);
        tokio::time::timeout(Duration::from_secs(30), node.start())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(node.runtime().status().unwrap().height, 3);
        assert_eq!(node.runtime().blocks().height().unwrap(), 3);
    }
}
