//! # Auto-Confirming Executor
//!
//! Stand-in for the external command executor: acknowledges every batch
//! straight back to the queue service. Used by the local simulation
//! runtime and by end-to-end tests; a real deployment hands batches to
//! its own executor, which confirms once indexing finished.

use async_trait::async_trait;
use block_queue::{BlockBatch, BlockQueueApi, Executor, ExecutorError, QueueService};
use std::sync::Arc;
use tracing::debug;

/// Executor that confirms every dispatched batch immediately.
pub struct AutoConfirmExecutor {
    queue: Arc<QueueService>,
}

impl AutoConfirmExecutor {
    /// Create an executor acknowledging against the given queue.
    pub fn new(queue: Arc<QueueService>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl Executor for AutoConfirmExecutor {
    async fn handle_batch(&self, batch: BlockBatch) -> Result<(), ExecutorError> {
        let hashes: Vec<_> = batch.blocks.iter().map(|b| b.hash).collect();
        debug!(
            request_id = %batch.request_id,
            blocks = hashes.len(),
            "auto-confirming batch"
        );
        self.queue
            .confirm_processed_batch(&hashes)
            .await
            .map_err(|e| ExecutorError(e.to_string()))?;
        Ok(())
    }
}
