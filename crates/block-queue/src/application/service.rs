//! # Queue Service
//!
//! The serialized monitor around the block queue. Every mutation goes
//! through one async mutex; transient readings (`len`, `current_size`,
//! `last_height`) are mirrored into atomics so the loader can poll them
//! without contending for the lock.
//!
//! Confirmation signalling lives here too: the iterator parks on the
//! batch gate between dispatch and acknowledgement, and
//! `confirm_processed_batch` releases it.

use crate::config::QueueConfig;
use crate::domain::errors::QueueError;
use crate::domain::queue::BlockQueue;
use crate::ports::inbound::BlockQueueApi;
use async_trait::async_trait;
use lru::LruCache;
use shared_bus::{EventPublisher, IngestEvent};
use shared_types::entities::{Block, Hash, LightBlock};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

/// Sentinel for "no blocks ingested yet" in the atomic mirror.
const NO_HEIGHT: i64 = -1;

/// Serialized access to the block queue plus confirmation signalling.
pub struct QueueService {
    /// The queue; one lock, held across every mutation.
    queue: Mutex<BlockQueue>,
    /// Recently confirmed blocks, served to late hash lookups.
    confirmed: parking_lot::Mutex<LruCache<Hash, Block>>,
    /// Event channel.
    bus: Arc<dyn EventPublisher>,
    /// Configuration.
    config: QueueConfig,

    // Transient mirrors, readable without the queue lock.
    len: AtomicUsize,
    current_size: AtomicU64,
    last_height: AtomicI64,

    /// True while a dispatched batch awaits acknowledgement.
    in_flight: AtomicBool,
    /// Wakes the iterator when the in-flight batch resolves.
    gate: Notify,
    /// The height bound announcement fires once.
    height_bound_announced: AtomicBool,
}

impl QueueService {
    /// Create a stopped service; call [`start`](Self::start) before use.
    pub fn new(config: QueueConfig, bus: Arc<dyn EventPublisher>) -> Self {
        let cache_size = NonZeroUsize::new(config.confirmed_cache_size)
            .unwrap_or(NonZeroUsize::new(16).expect("nonzero"));
        Self {
            queue: Mutex::new(BlockQueue::new(
                config.max_queue_size,
                config.max_block_height,
                None,
            )),
            confirmed: parking_lot::Mutex::new(LruCache::new(cache_size)),
            bus,
            config,
            len: AtomicUsize::new(0),
            current_size: AtomicU64::new(0),
            last_height: AtomicI64::new(NO_HEIGHT),
            in_flight: AtomicBool::new(false),
            gate: Notify::new(),
            height_bound_announced: AtomicBool::new(false),
        }
    }

    /// The configuration this service runs with.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn mirror(&self, queue: &BlockQueue) {
        self.len.store(queue.len(), Ordering::Release);
        self.current_size
            .store(queue.current_size(), Ordering::Release);
        self.last_height.store(
            queue.last_height().map_or(NO_HEIGHT, |h| h as i64),
            Ordering::Release,
        );
    }

    // =========================================================================
    // Transient readings (no lock)
    // =========================================================================

    /// Number of queued blocks.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently queued.
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Acquire)
    }

    /// Height of the most recently enqueued block.
    pub fn last_height(&self) -> Option<u64> {
        match self.last_height.load(Ordering::Acquire) {
            NO_HEIGHT => None,
            h => Some(h as u64),
        }
    }

    /// Bytes left before the budget is consumed.
    pub fn headroom(&self) -> u64 {
        self.config.max_queue_size.saturating_sub(self.current_size())
    }

    /// True once the byte budget is consumed.
    pub fn is_full(&self) -> bool {
        self.current_size() >= self.config.max_queue_size
    }

    /// True once the height bound is reached.
    pub fn max_height_reached(&self) -> bool {
        self.last_height()
            .is_some_and(|h| h >= self.config.max_block_height)
    }

    // =========================================================================
    // Producer side
    // =========================================================================

    /// Append a block; see [`BlockQueue::enqueue`] for the policy.
    pub async fn enqueue(&self, block: Block) -> Result<(), QueueError> {
        let mut queue = self.queue.lock().await;
        let result = queue.enqueue(block);
        self.mirror(&queue);
        drop(queue);

        if let Err(QueueError::MaxHeightReached { max }) = &result {
            if !self.height_bound_announced.swap(true, Ordering::AcqRel) {
                self.bus
                    .publish(IngestEvent::MaxHeightReached { height: *max })
                    .await;
            }
        }
        result
    }

    // =========================================================================
    // Consumer side
    // =========================================================================

    /// Collect the next batch without removing it.
    pub async fn batch_up_to_size(&self, max_bytes: u64) -> Vec<Block> {
        self.queue.lock().await.batch_up_to_size(max_bytes)
    }

    /// Park until no dispatched batch is awaiting acknowledgement.
    pub async fn wait_batch_processed(&self) {
        while self.in_flight.load(Ordering::Acquire) {
            let notified = self.gate.notified();
            if !self.in_flight.load(Ordering::Acquire) {
                break;
            }
            notified.await;
        }
    }

    /// Mark a batch as dispatched and unacknowledged.
    pub fn begin_batch(&self) {
        self.in_flight.store(true, Ordering::Release);
    }

    /// Release the gate without removing anything, so the same batch is
    /// retried on the next tick.
    pub fn abandon_batch(&self) {
        self.in_flight.store(false, Ordering::Release);
        self.gate.notify_waiters();
    }
}

#[async_trait]
impl BlockQueueApi for QueueService {
    async fn start(&self, indexed_height: Option<u64>) {
        let mut queue = self.queue.lock().await;
        queue.reorganize(indexed_height);
        self.mirror(&queue);
        drop(queue);

        info!(?indexed_height, "queue service started");
        self.bus
            .publish(IngestEvent::QueueStarted { indexed_height })
            .await;
    }

    async fn reorganize_blocks(&self, new_start_height: u64) {
        let mut queue = self.queue.lock().await;
        queue.reorganize(Some(new_start_height));
        self.mirror(&queue);
        drop(queue);

        // Whatever was in flight will never be confirmed; let the
        // iterator move on to post-reorg batches.
        self.abandon_batch();
        self.height_bound_announced.store(false, Ordering::Release);
        info!(height = new_start_height, "queue reorganized");
    }

    async fn confirm_processed_batch(&self, hashes: &[Hash]) -> Result<Vec<Block>, QueueError> {
        let mut queue = self.queue.lock().await;
        let result = queue.dequeue(hashes);
        self.mirror(&queue);
        let tip = queue.last_height();
        drop(queue);

        match result {
            Ok(blocks) => {
                debug!(count = blocks.len(), "batch confirmed");
                {
                    let mut cache = self.confirmed.lock();
                    for block in &blocks {
                        cache.put(block.hash, block.clone());
                    }
                }
                let light: Vec<LightBlock> = blocks.iter().map(LightBlock::from).collect();
                self.bus
                    .publish(IngestEvent::BatchConfirmed { blocks: light, tip })
                    .await;
                self.abandon_batch();
                Ok(blocks)
            }
            Err(e) => {
                warn!(error = %e, "batch confirmation rejected");
                Err(e)
            }
        }
    }

    async fn blocks_by_hashes(&self, hashes: &[Hash]) -> Vec<Block> {
        let wanted: HashSet<Hash> = hashes.iter().copied().collect();
        let mut found = {
            let queue = self.queue.lock().await;
            queue.find_blocks(&wanted)
        };

        let queued: HashSet<Hash> = found.iter().map(|b| b.hash).collect();
        let mut cache = self.confirmed.lock();
        for hash in hashes {
            if !queued.contains(hash) {
                if let Some(block) = cache.get(hash) {
                    found.push(block.clone());
                }
            }
        }
        found
    }
}
