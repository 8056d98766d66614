//! Wolochain command line
//!
//! The `wolochaind` command tree:
//! - Genesis preparation (init, accounts, gentxs, validation, migration)
//! - Key management
//! - Node lifecycle (start, export)
//! - Status, queries and transactions against a running node
//! - Client settings, debugging helpers and shell completion

pub mod client;
pub mod config;
pub mod debug;
pub mod genesis;
pub mod keyring;
pub mod logging;
pub mod root;
pub mod server;
pub mod txs;

pub use client::{ApiClient, ApiError};
pub use config::ClientConfig;
pub use keyring::{KeyInfo, Keyring};
pub use root::{build_command, build_command_with, overwrite_flag_defaults, run_from, Cli, Commands};
pub use server::{ExportArgs, StartArgs};

use wolochain_core::WolochainError;

/// Process exit code for a failed command: the code carried by a structured
/// exit error, 1 for anything else.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<WolochainError>())
        .map(WolochainError::exit_code)
        .unwrap_or(1)
}
