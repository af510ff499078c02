//! # Node Pool
//!
//! Manages the set of node-provider connections the loader draws from.
//! Exactly one provider is active at a time; a health monitor probes it,
//! failures trigger failover to a backup or an exponential reconnection
//! loop, and websocket trouble is repaired without giving up the HTTP
//! side.
//!
//! ## Module Structure
//!
//! ```text
//! node-pool/
//! ├── ports/           # NodeProvider trait, subscription handle, mock
//! ├── application/     # ConnectionManager, health monitor, reconnection
//! ├── errors.rs        # PoolError / ProviderError
//! └── config.rs        # PoolConfig
//! ```

pub mod application;
pub mod config;
pub mod errors;
pub mod ports;

// Re-exports
pub use application::manager::ConnectionManager;
pub use config::PoolConfig;
pub use errors::{PoolError, ProviderError};
pub use ports::provider::{MockProvider, NewHeadsFeed, NewHeadsSubscription, NodeProvider};
