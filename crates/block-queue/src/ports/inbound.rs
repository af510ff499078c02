//! # Inbound Port
//!
//! The queue service operations exposed to the surrounding framework:
//! starting ingestion above an indexed height, rewinding after a
//! reorganization, acknowledging processed batches, and hash lookups.

use crate::domain::errors::QueueError;
use async_trait::async_trait;
use shared_types::entities::{Block, Hash};

/// Queue service API - inbound port.
#[async_trait]
pub trait BlockQueueApi: Send + Sync {
    /// Begin ingesting above `indexed_height` (`None` starts at genesis).
    async fn start(&self, indexed_height: Option<u64>);

    /// Drop all queued state and continue above `new_start_height`.
    async fn reorganize_blocks(&self, new_start_height: u64);

    /// Acknowledge that the executor processed the head blocks named by
    /// `hashes`, removing them from the queue.
    ///
    /// # Errors
    /// - `HashMismatch` / `NotAtHead` when the hashes do not name the
    ///   queue head in FIFO order; the queue is left untouched.
    async fn confirm_processed_batch(&self, hashes: &[Hash]) -> Result<Vec<Block>, QueueError>;

    /// Look up blocks by hash: queued blocks first, then the
    /// recently-confirmed lookaside.
    async fn blocks_by_hashes(&self, hashes: &[Hash]) -> Vec<Block>;
}
