//! # Pull Strategy - Two-Phase Batching
//!
//! Phase A preloads a run of blocks with transactions but without
//! receipts into a local buffer. Phase B partitions the buffer into
//! receipt sub-batches, hydrates them with bounded retries, and enqueues
//! ascending. The preload count adapts to how receipt loading has been
//! trending: slower rounds shrink the next preload, faster rounds grow
//! it.

use crate::application::{report_provider_failure, LoadStrategy};
use crate::config::{LoaderConfig, StrategyName};
use crate::domain::normalize::{normalize_block, normalize_block_with_receipts};
use crate::domain::partition::partition_by_receipt_budget;
use crate::errors::LoadError;
use async_trait::async_trait;
use block_queue::{QueueError, QueueService};
use node_pool::{ConnectionManager, NodeProvider};
use shared_types::entities::Block;
use shared_types::network::NetworkCapabilities;
use shared_types::raw::RawBlockWithReceipts;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Receipt fetches retry this many times before the round fails.
const RECEIPT_FETCH_ATTEMPTS: u32 = 3;

/// Linear backoff unit between receipt fetch retries.
const RECEIPT_RETRY_STEP: Duration = Duration::from_millis(50);

struct PullState {
    /// Preloaded blocks awaiting receipt hydration.
    buffer: Vec<Block>,
    /// Blocks requested per preload; adapts between rounds.
    base_preload_count: u64,
    /// Receipt-load duration of the round before last.
    prev_receipt_load: Option<Duration>,
    /// Receipt-load duration of the last round.
    last_receipt_load: Option<Duration>,
}

/// The pull strategy.
pub struct PullStrategy {
    queue: Arc<QueueService>,
    pool: Arc<ConnectionManager>,
    caps: NetworkCapabilities,
    config: LoaderConfig,
    state: Mutex<PullState>,
}

/// Next preload count given the trend of receipt-load timings.
///
/// A ratio above 1.2 (receipts got slower) grows the preload by a
/// quarter; below 0.8 shrinks it by a quarter, never under one block.
fn adjusted_preload_count(base: u64, prev: Option<Duration>, last: Option<Duration>) -> u64 {
    let base = base.max(1);
    let (Some(prev), Some(last)) = (prev, last) else {
        return base;
    };
    if prev.is_zero() {
        return base;
    }
    let ratio = last.as_secs_f64() / prev.as_secs_f64();
    if ratio > 1.2 {
        (base as f64 * 1.25).ceil() as u64
    } else if ratio < 0.8 {
        ((base as f64 * 0.75).round() as u64).max(1)
    } else {
        base
    }
}

impl PullStrategy {
    /// Create a pull strategy over the given queue and pool.
    pub fn new(
        queue: Arc<QueueService>,
        pool: Arc<ConnectionManager>,
        caps: NetworkCapabilities,
        config: LoaderConfig,
    ) -> Self {
        let base_preload_count = config.base_preload_count.max(1);
        Self {
            queue,
            pool,
            caps,
            config,
            state: Mutex::new(PullState {
                buffer: Vec::new(),
                base_preload_count,
                prev_receipt_load: None,
                last_receipt_load: None,
            }),
        }
    }

    async fn fetch_receipts_with_retry(
        &self,
        provider: &Arc<dyn NodeProvider>,
        heights: &[u64],
    ) -> Result<Vec<RawBlockWithReceipts>, LoadError> {
        let mut attempt = 1;
        loop {
            match provider.blocks_with_receipts(heights).await {
                Ok(raws) => return Ok(raws),
                Err(e) if attempt < RECEIPT_FETCH_ATTEMPTS => {
                    warn!(attempt, error = %e, "receipt fetch failed, retrying");
                    tokio::time::sleep(RECEIPT_RETRY_STEP * attempt).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(report_provider_failure(
                        &self.pool,
                        provider,
                        "get_many_blocks_with_receipts",
                        e,
                    )
                    .await);
                }
            }
        }
    }
}

#[async_trait]
impl LoadStrategy for PullStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::Pull
    }

    async fn load(&self, network_height: u64) -> Result<(), LoadError> {
        let mut state = self.state.lock().await;

        if self.queue.max_height_reached() {
            return Err(QueueError::MaxHeightReached {
                max: self.queue.config().max_block_height,
            }
            .into());
        }

        // Phase A: preload blocks without receipts.
        if state.buffer.is_empty() {
            let next = self.queue.last_height().map_or(0, |h| h + 1);
            if next > network_height {
                // Caught up; nothing to do this round.
                return Ok(());
            }
            if self.queue.is_full() {
                return Err(QueueError::Full {
                    current_size: self.queue.current_size(),
                    max_size: self.queue.config().max_queue_size,
                }
                .into());
            }

            state.base_preload_count = adjusted_preload_count(
                state.base_preload_count,
                state.prev_receipt_load,
                state.last_receipt_load,
            );
            let to = (next + state.base_preload_count - 1).min(network_height);
            let heights: Vec<u64> = (next..=to).collect();

            let provider = self.pool.active()?;
            let raws = match provider.blocks_by_heights(&heights, true).await {
                Ok(raws) => raws,
                Err(e) => {
                    return Err(report_provider_failure(
                        &self.pool,
                        &provider,
                        "get_many_blocks_by_heights",
                        e,
                    )
                    .await);
                }
            };

            for raw in raws {
                state.buffer.push(normalize_block(raw, &self.caps)?);
            }
            debug!(
                from = next,
                to,
                preloaded = state.buffer.len(),
                "preload round complete"
            );
        }

        // Phase B: hydrate receipts and enqueue, when the queue can take
        // a whole request batch.
        if !state.buffer.is_empty()
            && self.queue.headroom() >= self.config.request_blocks_batch_size
        {
            state.buffer.sort_by_key(|b| b.number);
            let chunks =
                partition_by_receipt_budget(&state.buffer, self.config.request_blocks_batch_size);

            let provider = self.pool.active()?;
            let started = Instant::now();
            for chunk in &chunks {
                let raws = self.fetch_receipts_with_retry(&provider, chunk).await?;
                let mut blocks = raws
                    .into_iter()
                    .map(|raw| normalize_block_with_receipts(raw, &self.caps))
                    .collect::<Result<Vec<_>, _>>()?;
                blocks.sort_by_key(|b| b.number);

                for block in blocks {
                    // Stale heights can show up after a rewind; they are
                    // already ingested and simply skipped.
                    if self.queue.last_height().is_some_and(|h| block.number <= h) {
                        continue;
                    }
                    self.queue.enqueue(block).await?;
                }
            }

            state.prev_receipt_load = state.last_receipt_load.take();
            state.last_receipt_load = Some(started.elapsed());
            state.buffer.clear();
            debug!(
                sub_batches = chunks.len(),
                receipt_load_ms = state.last_receipt_load.map(|d| d.as_millis() as u64),
                "receipt round complete"
            );
        }

        Ok(())
    }

    async fn stop(&self) {
        // Nothing long-running; the buffer stays for the next round.
    }
}
