//! # Queue Ports
//!
//! Inbound: the service API the surrounding framework calls.
//! Outbound: the executor the iterator dispatches batches to.

pub mod inbound;
pub mod outbound;

pub use inbound::BlockQueueApi;
pub use outbound::{BlockBatch, Executor, ExecutorError, MockExecutor};
