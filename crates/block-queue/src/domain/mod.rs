//! # Queue Domain
//!
//! The FIFO structure and its error taxonomy. Everything here is
//! synchronous and single-owner; the application layer provides the
//! serialized monitor around it.

pub mod errors;
pub mod queue;

pub use errors::QueueError;
pub use queue::BlockQueue;
