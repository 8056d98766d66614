//! The `wolochain` application module
//!
//! Owns the chain's custom parameters. It defines no messages yet: its
//! message server rejects everything routed to it.

pub mod types;
pub mod keeper;
pub mod genesis;
pub mod msg_server;
pub mod module;

pub use types::*;
pub use keeper::*;
pub use genesis::*;
pub use msg_server::*;
pub use module::*;
