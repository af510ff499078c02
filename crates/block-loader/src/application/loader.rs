//! # Block Loader - Tick Loop and Strategy Selection
//!
//! Each tick: read the network height from the active provider, pick a
//! strategy, drive it. A successful tick lets the cadence drift toward
//! its cap (idle monitoring at roughly half the block time); a failed
//! tick stops the strategy and snaps the cadence back so the next
//! attempt comes quickly.

use crate::application::{report_provider_failure, LoadStrategy, PullStrategy, SubscribeStrategy};
use crate::config::{LoaderConfig, StrategyName};
use crate::errors::LoadError;
use block_queue::QueueService;
use node_pool::ConnectionManager;
use shared_types::backoff::Backoff;
use shared_types::network::NetworkCapabilities;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// The producer-side loader.
pub struct BlockLoader {
    queue: Arc<QueueService>,
    pool: Arc<ConnectionManager>,
    pull: Arc<PullStrategy>,
    subscribe: Arc<SubscribeStrategy>,
    config: LoaderConfig,
    running: AtomicBool,
    shutdown: watch::Sender<bool>,
    handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl BlockLoader {
    /// Create a stopped loader with both strategies wired.
    pub fn new(
        queue: Arc<QueueService>,
        pool: Arc<ConnectionManager>,
        caps: NetworkCapabilities,
        config: LoaderConfig,
    ) -> Self {
        let pull = Arc::new(PullStrategy::new(
            queue.clone(),
            pool.clone(),
            caps.clone(),
            config.clone(),
        ));
        let subscribe = Arc::new(SubscribeStrategy::new(
            queue.clone(),
            pool.clone(),
            caps,
            config.clone(),
        ));
        let (shutdown, _) = watch::channel(false);
        Self {
            queue,
            pool,
            pull,
            subscribe,
            config,
            running: AtomicBool::new(false),
            shutdown,
            handle: parking_lot::Mutex::new(None),
        }
    }

    /// True while the tick loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The selection rule: a configured Pull stays Pull; otherwise a gap
    /// above the threshold routes to Pull for catch-up, and Subscribe
    /// serves the steady state.
    pub fn select_strategy(&self, network_height: u64) -> StrategyName {
        if self.config.strategy == StrategyName::Pull {
            return StrategyName::Pull;
        }
        let gap = network_height.saturating_sub(self.queue.last_height().unwrap_or(0));
        if gap > self.config.strategy_threshold {
            StrategyName::Pull
        } else {
            StrategyName::Subscribe
        }
    }

    fn strategy(&self, name: StrategyName) -> Arc<dyn LoadStrategy> {
        match name {
            StrategyName::Pull => self.pull.clone(),
            StrategyName::Subscribe => self.subscribe.clone(),
        }
    }

    /// One tick: height, selection, load. Stops the strategy on error.
    async fn tick(&self) -> Result<(), LoadError> {
        let provider = self.pool.active()?;
        let network_height = match provider.block_height().await {
            Ok(height) => height,
            Err(e) => {
                return Err(
                    report_provider_failure(&self.pool, &provider, "get_block_height", e).await,
                );
            }
        };

        let name = self.select_strategy(network_height);
        debug!(network_height, strategy = ?name, "loader tick");
        let strategy = self.strategy(name);

        let result = strategy.load(network_height).await;
        if result.is_err() {
            strategy.stop().await;
        }
        result
    }

    /// Start the tick loop. Idempotent.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let this = self.clone();
        let mut stop = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            let cap = (this.config.block_time / 2).max(Duration::from_secs(3));
            let mut backoff = Backoff::new(Duration::from_secs(1), 2.0, cap);
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(backoff.delay()) => {}
                    _ = stop.changed() => break,
                }

                match this.tick().await {
                    Ok(()) => {
                        // Quiet round: let the cadence drift toward the
                        // cap.
                        backoff.advance();
                    }
                    Err(e) => {
                        warn!(error = %e, "loader tick failed");
                        backoff.reset();
                    }
                }
            }
            this.running.store(false, Ordering::Release);
        });
        *self.handle.lock() = Some(handle);
        info!("block loader started");
    }

    /// Stop the loop and both strategies. Idempotent.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);
        self.subscribe.stop().await;
        self.pull.stop().await;
        drop(self.handle.lock().take());
        self.running.store(false, Ordering::Release);
        info!("block loader stopped");
    }
}
