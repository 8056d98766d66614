//! Wolochain Core Library
//!
//! Core types, traits, and configuration shared by every Wolochain crate:
//! primitive types, coin arithmetic, the error taxonomy, the store and module
//! capability traits, and the option bag consumed by the application assembler.

pub mod types;
pub mod coins;
pub mod traits;
pub mod error;
pub mod config;

pub use types::*;
pub use coins::*;
pub use traits::*;
pub use error::*;
pub use config::*;
