//! # Loader Errors

use block_queue::QueueError;
use node_pool::{PoolError, ProviderError};
use thiserror::Error;

/// Errors from normalization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// The raw payload carried no block number; ordering is impossible
    /// without it.
    #[error("raw {what} is missing its block number")]
    MissingBlockNumber {
        /// What kind of payload was being normalized.
        what: &'static str,
    },
}

/// Errors from driving a load strategy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The queue refused an enqueue.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The provider pool had no usable connection.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A raw payload could not be normalized.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    /// The catch-up gap exceeded the subscribe strategy's bound; the
    /// loader should route to Pull instead.
    #[error("catch-up gap of {gap} blocks exceeds bound {bound}")]
    CatchUpTooLarge {
        /// Blocks missing up to the network height.
        gap: u64,
        /// The configured bound.
        bound: u64,
    },

    /// The new-heads subscription ended on the provider side.
    #[error("new-heads subscription closed")]
    SubscriptionClosed,
}
