//! Bank module for Wolochain
//!
//! Holds account balances and the total supply:
//! - Genesis balances and supply
//! - Coin transfers (`MsgSend`)
//! - Supply invariant

pub mod types;
pub mod keeper;
pub mod module;

pub use types::*;
pub use keeper::*;
pub use module::*;
