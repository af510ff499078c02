//! # Block Loader
//!
//! The producer side of the pipeline. On every tick the loader asks the
//! active provider for the network height, picks a strategy, and drives
//! it:
//!
//! - **Pull**: two-phase batching. Preload blocks without receipts into
//!   a local buffer (adaptively sized from receipt-load timings), then
//!   hydrate receipts sub-batch by sub-batch and enqueue.
//! - **Subscribe**: catch up the gap in one batched call, then stream
//!   new heads over the provider's websocket subscription.
//!
//! Raw provider payloads are normalized exactly once on their way into
//! the queue; network capability flags decide which optional fields
//! survive.

pub mod application;
pub mod config;
pub mod domain;
pub mod errors;

// Re-exports
pub use application::loader::BlockLoader;
pub use application::pull::PullStrategy;
pub use application::subscribe::SubscribeStrategy;
pub use application::LoadStrategy;
pub use config::{LoaderConfig, StrategyName};
pub use errors::{LoadError, NormalizeError};
