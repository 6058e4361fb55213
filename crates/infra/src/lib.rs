//! Infrastructure layer: stores, account flow orchestration, configuration.

pub mod accounts;
pub mod config;
pub mod store;

pub use accounts::{AccountService, StoreTimeouts};
pub use config::{ConfigError, Settings};
