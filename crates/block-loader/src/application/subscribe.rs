//! # Subscribe Strategy - Catch-Up + Streaming
//!
//! First closes the gap between the queue tip and the network height
//! with one batched receipt call, then opens the provider's new-heads
//! subscription and ingests block by block as notifications arrive.
//! `load` is long-running: it returns only when stopped or when the
//! stream breaks.
//!
//! A gap larger than the configured bound is refused rather than
//! swallowed; the loader's selection rule then routes the catch-up to
//! the pull strategy.

use crate::application::{report_provider_failure, LoadStrategy};
use crate::config::{LoaderConfig, StrategyName};
use crate::domain::normalize::normalize_block_with_receipts;
use crate::errors::LoadError;
use async_trait::async_trait;
use block_queue::QueueService;
use node_pool::ConnectionManager;
use shared_types::network::NetworkCapabilities;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// The subscribe strategy.
pub struct SubscribeStrategy {
    queue: Arc<QueueService>,
    pool: Arc<ConnectionManager>,
    caps: NetworkCapabilities,
    config: LoaderConfig,
    stop_tx: watch::Sender<bool>,
}

impl SubscribeStrategy {
    /// Create a subscribe strategy over the given queue and pool.
    pub fn new(
        queue: Arc<QueueService>,
        pool: Arc<ConnectionManager>,
        caps: NetworkCapabilities,
        config: LoaderConfig,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            queue,
            pool,
            caps,
            config,
            stop_tx,
        }
    }

    /// Ingest the blocks at `heights`, receipts attached, skipping
    /// heights the queue already passed.
    async fn ingest_heights(&self, heights: &[u64]) -> Result<(), LoadError> {
        if heights.is_empty() {
            return Ok(());
        }
        let provider = self.pool.active()?;
        let raws = match provider.blocks_with_receipts(heights).await {
            Ok(raws) => raws,
            Err(e) => {
                return Err(report_provider_failure(
                    &self.pool,
                    &provider,
                    "get_many_blocks_with_receipts",
                    e,
                )
                .await);
            }
        };

        let mut blocks = raws
            .into_iter()
            .map(|raw| normalize_block_with_receipts(raw, &self.caps))
            .collect::<Result<Vec<_>, _>>()?;
        blocks.sort_by_key(|b| b.number);

        for block in blocks {
            if self.queue.last_height().is_some_and(|h| block.number <= h) {
                continue;
            }
            self.queue.enqueue(block).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LoadStrategy for SubscribeStrategy {
    fn name(&self) -> StrategyName {
        StrategyName::Subscribe
    }

    async fn load(&self, network_height: u64) -> Result<(), LoadError> {
        let _ = self.stop_tx.send(false);
        let mut stop = self.stop_tx.subscribe();

        // Catch-up: one batched call for the whole gap.
        let next = self.queue.last_height().map_or(0, |h| h + 1);
        if next <= network_height {
            let gap = network_height - next + 1;
            let bound = self.config.catch_up_bound();
            if gap > bound {
                return Err(LoadError::CatchUpTooLarge { gap, bound });
            }
            let heights: Vec<u64> = (next..=network_height).collect();
            debug!(from = next, to = network_height, "catching up before streaming");
            self.ingest_heights(&heights).await?;
        }

        // Streaming: one subscription, one fetch per notification.
        let provider = self.pool.active()?;
        let mut subscription = match provider.subscribe_new_heads().await {
            Ok(sub) => sub,
            Err(e) => {
                return Err(report_provider_failure(
                    &self.pool,
                    &provider,
                    "subscribe_to_new_blocks",
                    e,
                )
                .await);
            }
        };
        info!(provider = provider.name(), "streaming new heads");

        loop {
            tokio::select! {
                _ = stop.changed() => {
                    if *stop.borrow() {
                        subscription.cancel();
                        info!("subscription stopped");
                        return Ok(());
                    }
                }
                head = subscription.recv() => {
                    let Some(height) = head else {
                        return Err(LoadError::SubscriptionClosed);
                    };
                    if self.queue.last_height().is_some_and(|h| height <= h) {
                        // Stale or duplicate notification.
                        continue;
                    }
                    debug!(height, "new head notified");
                    self.ingest_heights(&[height]).await?;
                }
            }
        }
    }

    async fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}
