//! Wolochain State Management
//!
//! Provides versioned state storage, pruning, snapshots and state root
//! computation. Uses a key-value model where state = { key → value }

pub mod store;
pub mod memory;
pub mod cache;
pub mod params;
pub mod pruning;
pub mod trace;
pub mod persistent;
pub mod snapshot;

pub use store::*;
pub use memory::*;
pub use cache::*;
pub use params::*;
pub use pruning::*;
pub use trace::*;
pub use persistent::*;
pub use snapshot::*;
