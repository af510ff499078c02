//! # Light Chain
//!
//! A bounded, header-only view of the ingested chain, used to decide
//! when a reorganization happened and from which height to rewind.
//!
//! ## Module Structure
//!
//! ```text
//! light-chain/
//! ├── domain/          # LightChain ordered header list, errors
//! ├── ports/           # ChainReader (remote lookups for the walk)
//! ├── application/     # NetworkAggregate with the backward reorg walk
//! └── config.rs        # ChainConfig
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::aggregate::{NetworkAggregate, ReorgOutcome};
pub use config::ChainConfig;
pub use domain::chain::LightChain;
pub use domain::errors::ChainError;
pub use ports::outbound::{ChainReader, MockChainReader};
