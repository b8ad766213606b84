//! RecordChain RPC - contract dispatch and CLI
//!
//! Calls arrive as `(contract, operation, args)`. The [`Gateway`] routes
//! them to a [`Contract`] and runs each as a single atomic invocation on
//! the versioned store, answering with a `{Code, Des}` response.

pub mod config;
pub mod contract;
pub mod contracts;
pub mod gateway;

pub use config::{AppConfig, ConfigError};
pub use contract::Contract;
pub use gateway::Gateway;
