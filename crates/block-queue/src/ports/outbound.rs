//! # Outbound Port
//!
//! The executor consuming dispatched batches. The executor acknowledges
//! out-of-band by calling `confirm_processed_batch` on the queue service;
//! returning `Ok` from `handle_batch` only means the batch was accepted
//! for processing.

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::entities::Block;
use thiserror::Error;

/// A contiguous, size-bounded slice of FIFO-ordered blocks.
#[derive(Debug, Clone)]
pub struct BlockBatch {
    /// The blocks, ascending by height.
    pub blocks: Vec<Block>,
    /// Correlation id for this dispatch.
    pub request_id: String,
}

/// Error returned by an executor that could not accept a batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("executor rejected batch: {0}")]
pub struct ExecutorError(pub String);

/// Batch executor - outbound port.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Hand a batch to the executor.
    async fn handle_batch(&self, batch: BlockBatch) -> Result<(), ExecutorError>;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// Mock executor recording every dispatched batch.
#[derive(Default)]
pub struct MockExecutor {
    /// Batches received so far.
    pub batches: Mutex<Vec<BlockBatch>>,
    /// Number of upcoming calls that should fail.
    pub fail_next: Mutex<usize>,
}

impl MockExecutor {
    /// Create a mock that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls fail.
    pub fn fail_times(&self, count: usize) {
        *self.fail_next.lock() = count;
    }

    /// Number of batches received.
    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    /// Heights of every block received, in dispatch order.
    pub fn received_heights(&self) -> Vec<u64> {
        self.batches
            .lock()
            .iter()
            .flat_map(|b| b.blocks.iter().map(|block| block.number))
            .collect()
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn handle_batch(&self, batch: BlockBatch) -> Result<(), ExecutorError> {
        {
            let mut fail = self.fail_next.lock();
            if *fail > 0 {
                *fail -= 1;
                return Err(ExecutorError("mock failure".to_string()));
            }
        }
        self.batches.lock().push(batch);
        Ok(())
    }
}
