//! # Block Queue
//!
//! The bounded, ordered, in-memory pipeline between the loader (producer)
//! and the executor (consumer).
//!
//! ## Module Structure
//!
//! ```text
//! block-queue/
//! ├── domain/          # BlockQueue FIFO with ordering/size/height invariants
//! ├── ports/           # Service API (inbound) + executor trait (outbound)
//! ├── application/     # QueueService monitor + QueueIterator consumer loop
//! └── config.rs        # QueueConfig
//! ```
//!
//! ## Guarantees
//!
//! - Blocks enter strictly in height order and leave strictly from the head.
//! - The queue never grows past its byte budget (the final enqueue may
//!   carry the total to the budget; the next one fails).
//! - A non-empty queue always yields a batch, even when the head block
//!   alone exceeds the batch byte limit.
//! - The iterator never dispatches a second batch while one is
//!   unacknowledged.

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::iterator::QueueIterator;
pub use application::service::QueueService;
pub use config::QueueConfig;
pub use domain::errors::QueueError;
pub use domain::queue::BlockQueue;
pub use ports::inbound::BlockQueueApi;
pub use ports::outbound::{BlockBatch, Executor, ExecutorError, MockExecutor};
