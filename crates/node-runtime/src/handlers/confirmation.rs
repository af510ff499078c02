//! # Confirmation Handler
//!
//! Listens for confirmed batches on the bus and keeps the network
//! aggregate's light chain in step with them. A parent-hash mismatch on
//! an expected extension is the reorg signal: the handler runs the
//! backward walk against the active provider and rewinds the queue to
//! the located fork height.

use crate::adapters::chain_reader::PoolChainReader;
use block_queue::{BlockQueueApi, QueueService};
use light_chain::{ChainError, NetworkAggregate};
use node_pool::ConnectionManager;
use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, IngestEvent};
use shared_types::entities::LightBlock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Keeps the light chain in step with confirmed batches.
pub struct ConfirmationHandler {
    aggregate: Arc<NetworkAggregate>,
    queue: Arc<QueueService>,
    pool: Arc<ConnectionManager>,
}

impl ConfirmationHandler {
    /// Create a handler over the given aggregate, queue, and pool.
    pub fn new(
        aggregate: Arc<NetworkAggregate>,
        queue: Arc<QueueService>,
        pool: Arc<ConnectionManager>,
    ) -> Self {
        Self {
            aggregate,
            queue,
            pool,
        }
    }

    /// Subscribe to confirmed batches and process them until the bus
    /// closes.
    pub fn spawn(self, bus: &InMemoryEventBus) -> JoinHandle<()> {
        let mut subscription = bus.subscribe(EventFilter::topics(vec![EventTopic::Batch]));
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                if let IngestEvent::BatchConfirmed { blocks, .. } = event {
                    self.on_confirmed(blocks).await;
                }
            }
        })
    }

    /// Extend the chain with one confirmed batch; walk back on a reorg
    /// signal.
    pub async fn on_confirmed(&self, blocks: Vec<LightBlock>) {
        match self.aggregate.extend(&blocks, None) {
            Ok(()) => {}
            Err(ChainError::ParentHashMismatch { height, .. }) => {
                warn!(height, "confirmed batch does not extend the chain, locating fork");
                let reader = PoolChainReader::new(self.pool.clone());
                match self.aggregate.reorganize(&reader).await {
                    Ok(outcome) => {
                        info!(
                            fork_height = outcome.fork_height,
                            dropped = outcome.dropped.len(),
                            "rewinding queue to fork point"
                        );
                        self.queue.reorganize_blocks(outcome.fork_height).await;
                    }
                    Err(ChainError::NoForkPoint) => {
                        // Fatal: nothing shared with the remote chain.
                        error!("reorg walk found no fork point; pipeline halted");
                    }
                    Err(e) => {
                        // Transient: the next confirmed batch (or loader
                        // tick) triggers another attempt.
                        warn!(error = %e, "reorg walk failed, will retry");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "confirmed batch rejected by the chain");
            }
        }
    }
}
