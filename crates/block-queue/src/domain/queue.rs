//! # Block Queue - Bounded FIFO with Ordering Invariants
//!
//! ## Data Structures
//!
//! - `blocks`: ring-buffered FIFO, O(1) head access
//! - `by_hash`: O(1) lookup from hash to height
//! - height lookup is arithmetic: queued heights are contiguous, so a
//!   height maps to an offset from the head
//!
//! ## Invariants Enforced
//!
//! - Every enqueued block extends the tip by exactly one height.
//! - `current_size` never starts an enqueue at or above the byte budget
//!   (the last accepted block may carry the total past it).
//! - `last_height` never exceeds the configured height bound.
//! - Removal happens only at the head, in confirmation order.

use super::errors::QueueError;
use shared_types::entities::{Block, Hash};
use shared_types::size::{estimate_block_size, estimate_receipt_size};
use std::collections::{HashMap, HashSet, VecDeque};

/// Bounded FIFO of normalized blocks.
///
/// Single-owner: the application layer serializes all access. The queue
/// itself is plain synchronous state.
#[derive(Debug)]
pub struct BlockQueue {
    /// Byte budget.
    max_queue_size: u64,
    /// Upper height bound for enqueue.
    max_block_height: u64,
    /// Queued blocks, head first.
    blocks: VecDeque<Block>,
    /// Hash of every queued block, mapped to its height.
    by_hash: HashMap<Hash, u64>,
    /// Height of the most recently enqueued block.
    last_height: Option<u64>,
    /// Sum of queued block sizes in bytes.
    current_size: u64,
}

impl BlockQueue {
    /// Create an empty queue expecting heights above `last_height`.
    pub fn new(max_queue_size: u64, max_block_height: u64, last_height: Option<u64>) -> Self {
        Self {
            max_queue_size,
            max_block_height,
            blocks: VecDeque::new(),
            by_hash: HashMap::new(),
            last_height,
            current_size: 0,
        }
    }

    /// Number of queued blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Bytes currently queued.
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    /// Height of the most recently enqueued block.
    pub fn last_height(&self) -> Option<u64> {
        self.last_height
    }

    /// Height the next enqueue must carry.
    pub fn expected_height(&self) -> u64 {
        self.last_height.map_or(0, |h| h + 1)
    }

    /// True once the byte budget is consumed.
    pub fn is_full(&self) -> bool {
        self.current_size >= self.max_queue_size
    }

    /// True once the height bound is reached.
    pub fn max_height_reached(&self) -> bool {
        self.last_height
            .is_some_and(|h| h >= self.max_block_height)
    }

    /// Append a block to the tail.
    ///
    /// On success the block's cached raw encodings are stripped, its size
    /// is computed if the provider did not report one, and the indices
    /// and counters are updated.
    ///
    /// # Errors
    /// - `Full` if the byte budget was consumed before this call
    /// - `MaxHeightReached` if the tip sits at the height bound
    /// - `OutOfOrder` if the block does not extend the tip by one
    pub fn enqueue(&mut self, mut block: Block) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(QueueError::Full {
                current_size: self.current_size,
                max_size: self.max_queue_size,
            });
        }

        if self.max_height_reached() {
            return Err(QueueError::MaxHeightReached {
                max: self.max_block_height,
            });
        }

        let expected = self.expected_height();
        if block.number != expected {
            return Err(QueueError::OutOfOrder {
                expected,
                got: block.number,
            });
        }

        block.strip_hex();
        if block.size == 0 {
            if block.size_without_receipts == 0 {
                block.size_without_receipts = estimate_block_size(&block);
            }
            let receipts: u64 = block
                .receipts
                .iter()
                .flatten()
                .map(estimate_receipt_size)
                .sum();
            block.size = block.size_without_receipts + receipts;
        }

        self.current_size += block.size;
        self.last_height = Some(block.number);
        self.by_hash.insert(block.hash, block.number);
        self.blocks.push_back(block);
        Ok(())
    }

    /// The block at the head, if any.
    pub fn first_block(&self) -> Option<&Block> {
        self.blocks.front()
    }

    /// Collect blocks from the head until the next one would push the
    /// total past `max_bytes`.
    ///
    /// A non-empty queue always yields at least the head block, even when
    /// that block alone exceeds `max_bytes`: an oversized block must not
    /// stall the pipeline.
    pub fn batch_up_to_size(&self, max_bytes: u64) -> Vec<Block> {
        let mut batch = Vec::new();
        let mut total = 0u64;
        for block in &self.blocks {
            if !batch.is_empty() && total + block.size > max_bytes {
                break;
            }
            total += block.size;
            batch.push(block.clone());
        }
        batch
    }

    /// Remove confirmed blocks from the head.
    ///
    /// `hashes` must name the head blocks exactly, in FIFO order. The
    /// whole call validates before it mutates: a mismatch anywhere leaves
    /// the queue untouched.
    ///
    /// # Errors
    /// - `NotAtHead` if more hashes arrive than blocks are queued
    /// - `HashMismatch` if a hash disagrees with its head position
    pub fn dequeue(&mut self, hashes: &[Hash]) -> Result<Vec<Block>, QueueError> {
        for (i, hash) in hashes.iter().enumerate() {
            match self.blocks.get(i) {
                None => return Err(QueueError::NotAtHead),
                Some(block) if block.hash != *hash => {
                    return Err(QueueError::HashMismatch {
                        expected: block.hash,
                        got: *hash,
                    });
                }
                Some(_) => {}
            }
        }

        let mut removed = Vec::with_capacity(hashes.len());
        for _ in hashes {
            // Validated above, the head exists.
            if let Some(block) = self.blocks.pop_front() {
                self.current_size -= block.size;
                self.by_hash.remove(&block.hash);
                removed.push(block);
            }
        }
        Ok(removed)
    }

    /// Queued blocks whose hash is in `hashes`, in FIFO order.
    ///
    /// Resolves each hash through the hash index instead of scanning the
    /// FIFO; heights are contiguous, so FIFO order is ascending height.
    pub fn find_blocks(&self, hashes: &HashSet<Hash>) -> Vec<Block> {
        let mut heights: Vec<u64> = hashes
            .iter()
            .filter_map(|hash| self.by_hash.get(hash).copied())
            .collect();
        heights.sort_unstable();
        heights
            .into_iter()
            .filter_map(|height| self.find_by_height(height).cloned())
            .collect()
    }

    /// Queued block at `height`, if present.
    pub fn find_by_height(&self, height: u64) -> Option<&Block> {
        let head = self.blocks.front()?.number;
        if height < head {
            return None;
        }
        self.blocks.get((height - head) as usize)
    }

    /// Drop everything and restart expectations above `last_height`.
    ///
    /// Idempotent: repeating the call with the same height is a no-op.
    pub fn reorganize(&mut self, last_height: Option<u64>) {
        self.blocks.clear();
        self.by_hash.clear();
        self.current_size = 0;
        self.last_height = last_height;
    }

    /// Drop all queued blocks, keeping the height expectation.
    pub fn clear(&mut self) {
        let last = self.last_height;
        self.reorganize(last);
    }
}
