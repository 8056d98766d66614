//! Wolochain node
//!
//! Combines the module registry, the versioned store and the block store
//! into a running single-validator chain:
//! - Application lifecycle and transaction processing
//! - App assembly from an option bag (`start` and `export`)
//! - Block production and the HTTP API

pub mod api;
pub mod app;
pub mod assembler;
pub mod blocks;
pub mod genesis;
pub mod node;
pub mod registry;
pub mod runtime;
pub mod tx;

#[cfg(test)]
mod testutil;

pub use app::{
    codes, error_code, AppSettings, CommitResponse, EndBlockResponse, ExportedApp,
    InitChainResponse, Services, TxResult, WolochainApp,
};
pub use assembler::{home_from_options, AppCreator, LATEST_HEIGHT};
pub use blocks::{BlockStore, StoredBlock};
pub use genesis::{BlockParams, ConsensusParams, EvidenceParams, GenesisDoc, ValidatorParams};
pub use node::WolochainNode;
pub use registry::ModuleRegistry;
pub use runtime::{NodeRuntime, NodeStatus};
pub use tx::{Fee, Tx, DEFAULT_GAS_LIMIT};
