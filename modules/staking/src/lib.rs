//! Staking module for Wolochain
//!
//! Tracks the validator set:
//! - Genesis validators and their voting power
//! - Genesis transactions (gentx) declaring self-delegations
//! - Jailing for zero-height exports

pub mod validator;
pub mod types;
pub mod keeper;
pub mod gentx;
pub mod module;

pub use validator::*;
pub use types::*;
pub use keeper::*;
pub use gentx::*;
pub use module::*;
