//! # Queue Application Layer
//!
//! `QueueService` is the single serialized monitor around the FIFO;
//! `QueueIterator` is the consumer loop feeding the executor.

pub mod iterator;
pub mod service;

pub use iterator::QueueIterator;
pub use service::QueueService;
