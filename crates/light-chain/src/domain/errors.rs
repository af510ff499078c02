//! # Chain Errors

use shared_types::entities::Hash;
use thiserror::Error;

/// Errors from chain operations and the reorg walk.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// A block does not follow the tip height by exactly one.
    #[error("non-contiguous block: expected height {expected}, got {got}")]
    NonContiguous {
        /// Height that would extend the chain.
        expected: u64,
        /// Height that was offered.
        got: u64,
    },

    /// A block's parent hash does not match the tip hash.
    #[error("parent hash mismatch at height {height}: expected {expected:?}, got {got:?}")]
    ParentHashMismatch {
        /// Height of the offending block.
        height: u64,
        /// Hash of the current tip.
        expected: Hash,
        /// Parent hash the block carried.
        got: Hash,
    },

    /// Truncation height lies above the tip.
    #[error("cannot truncate to height {height}: tip is {tip}")]
    TruncateBeyondTip {
        /// Requested height.
        height: u64,
        /// Current tip height.
        tip: u64,
    },

    /// A snapshot did not describe a valid contiguous chain.
    #[error("invalid chain snapshot: {0}")]
    InvalidSnapshot(String),

    /// A remote lookup during the reorg walk failed.
    #[error("remote chain read failed: {0}")]
    Remote(String),

    /// The reorg walk passed genesis without finding a fork point.
    #[error("reorg walk passed genesis without a fork point")]
    NoForkPoint,
}
