//! # Queue Errors

use shared_types::entities::Hash;
use thiserror::Error;

/// Errors from queue operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The byte budget was already consumed before this enqueue.
    #[error("queue is full: {current_size} of {max_size} bytes used")]
    Full {
        /// Bytes currently queued.
        current_size: u64,
        /// Configured byte budget.
        max_size: u64,
    },

    /// The configured height bound was reached.
    #[error("maximum block height {max} reached")]
    MaxHeightReached {
        /// The configured bound.
        max: u64,
    },

    /// The enqueued block does not extend the queue tip by exactly one.
    #[error("out-of-order enqueue: expected height {expected}, got {got}")]
    OutOfOrder {
        /// Height the queue expected next.
        expected: u64,
        /// Height that was offered.
        got: u64,
    },

    /// A confirmation hash does not match the block at the queue head.
    #[error("hash mismatch at queue head: expected {expected:?}, got {got:?}")]
    HashMismatch {
        /// Hash of the block at the head.
        expected: Hash,
        /// Hash that was offered.
        got: Hash,
    },

    /// More hashes were confirmed than blocks are queued.
    #[error("confirmed hash has no block at the queue head")]
    NotAtHead,
}
