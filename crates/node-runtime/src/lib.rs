//! # Node Runtime
//!
//! Wires the ingestion pipeline together: the event bus, the queue
//! service and its iterator, the provider pool, the loader, the network
//! aggregate, and the confirmation handler that keeps the light chain in
//! step with what the executor acknowledges.
//!
//! The crates underneath are transport-agnostic; deployments plug
//! providers implementing [`node_pool::NodeProvider`] and an executor
//! implementing [`block_queue::Executor`] into
//! [`wiring::IngestPipeline::build`].

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod wiring;

pub use container::config::IngestConfig;
pub use wiring::IngestPipeline;
