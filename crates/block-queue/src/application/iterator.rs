//! # Queue Iterator
//!
//! The consumer loop: waits for the previous batch to resolve, peeks a
//! size-bounded batch from the queue head, and hands it to the executor.
//! At most one batch is ever in flight; acknowledgement arrives
//! externally through `confirm_processed_batch`, which releases the gate.

use crate::application::service::QueueService;
use crate::ports::outbound::{BlockBatch, Executor};
use shared_bus::{EventPublisher, IngestEvent};
use shared_types::backoff::Backoff;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Consumer-side iterator over the block queue.
pub struct QueueIterator {
    queue: Arc<QueueService>,
    executor: Arc<dyn Executor>,
    bus: Arc<dyn EventPublisher>,
    /// True while the loop task is running.
    iterating: AtomicBool,
    shutdown: watch::Sender<bool>,
    handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl QueueIterator {
    /// Create a stopped iterator.
    pub fn new(
        queue: Arc<QueueService>,
        executor: Arc<dyn Executor>,
        bus: Arc<dyn EventPublisher>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            queue,
            executor,
            bus,
            iterating: AtomicBool::new(false),
            shutdown,
            handle: parking_lot::Mutex::new(None),
        }
    }

    /// True while the loop task is running.
    pub fn is_iterating(&self) -> bool {
        self.iterating.load(Ordering::Acquire)
    }

    /// Start the consumer loop. Idempotent: a running iterator is left
    /// alone.
    pub fn start(self: &Arc<Self>) {
        if self.iterating.swap(true, Ordering::AcqRel) {
            return;
        }
        let this = self.clone();
        let mut stop = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            this.run(&mut stop).await;
            this.iterating.store(false, Ordering::Release);
        });
        *self.handle.lock() = Some(handle);
        info!("queue iterator started");
    }

    async fn run(&self, stop: &mut watch::Receiver<bool>) {
        let config = self.queue.config();
        let idle_cap = (config.block_time / 2).max(Duration::from_secs(1));
        let mut backoff = Backoff::new(Duration::from_secs(1), 2.0, idle_cap);

        loop {
            // Never dispatch while a batch is unacknowledged.
            tokio::select! {
                _ = self.queue.wait_batch_processed() => {}
                _ = stop.changed() => return,
            }

            let batch = self
                .queue
                .batch_up_to_size(config.iterator_batch_bytes)
                .await;

            if batch.is_empty() {
                tokio::select! {
                    _ = tokio::time::sleep(backoff.delay()) => {}
                    _ = stop.changed() => return,
                }
                backoff.advance();
                continue;
            }

            let request_id = Uuid::new_v4().to_string();
            let from = batch[0].number;
            let to = batch[batch.len() - 1].number;
            debug!(request_id = %request_id, from, to, "dispatching batch");

            self.queue.begin_batch();
            self.bus
                .publish(IngestEvent::BatchDispatched {
                    request_id: request_id.clone(),
                    len: batch.len(),
                    from,
                    to,
                })
                .await;

            let result = self
                .executor
                .handle_batch(BlockBatch {
                    blocks: batch,
                    request_id: request_id.clone(),
                })
                .await;

            match result {
                Ok(()) => {
                    // Dispatch accepted; the gate now waits on
                    // confirmation. Tighten the idle cadence again.
                    backoff.reset();
                }
                Err(e) => {
                    warn!(request_id = %request_id, error = %e, "executor rejected batch, will retry");
                    // Reopen the gate so the same batch is retried.
                    self.queue.abandon_batch();
                    tokio::select! {
                        _ = tokio::time::sleep(backoff.delay()) => {}
                        _ = stop.changed() => return,
                    }
                    backoff.advance();
                }
            }
        }
    }

    /// Stop the loop. Idempotent; an in-flight `handle_batch` call is
    /// left to complete, the loop exits at its next suspension point.
    pub fn stop(&self) {
        if !self.iterating.swap(false, Ordering::AcqRel) {
            return;
        }
        let _ = self.shutdown.send(true);
        self.queue.abandon_batch();
        // Detach rather than abort: the executor owns any in-flight call.
        drop(self.handle.lock().take());
        info!("queue iterator stopped");
    }
}

impl Drop for QueueIterator {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use crate::ports::inbound::BlockQueueApi;
    use crate::ports::outbound::MockExecutor;
    use shared_bus::InMemoryEventBus;
    use shared_types::fixtures;

    async fn wait_until<F: Fn() -> bool>(cond: F) {
        for _ in 0..600 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    fn pipeline() -> (Arc<QueueService>, Arc<MockExecutor>, Arc<QueueIterator>) {
        let bus: Arc<InMemoryEventBus> = Arc::new(InMemoryEventBus::new());
        let queue = Arc::new(QueueService::new(QueueConfig::for_testing(), bus.clone()));
        let executor = Arc::new(MockExecutor::new());
        let iterator = Arc::new(QueueIterator::new(queue.clone(), executor.clone(), bus));
        (queue, executor, iterator)
    }

    #[tokio::test]
    async fn test_dispatches_queued_blocks() {
        let (queue, executor, iterator) = pipeline();
        queue.start(Some(100)).await;
        for n in 101..=103 {
            queue.enqueue(fixtures::block(n, 1000)).await.unwrap();
        }

        iterator.start();
        wait_until(|| executor.batch_count() == 1).await;
        assert_eq!(executor.received_heights(), vec![101, 102, 103]);
        iterator.stop();
    }

    #[tokio::test]
    async fn test_at_most_one_batch_in_flight() {
        let (queue, executor, iterator) = pipeline();
        queue.start(Some(100)).await;
        for n in 101..=103 {
            queue.enqueue(fixtures::block(n, 1000)).await.unwrap();
        }

        iterator.start();
        wait_until(|| executor.batch_count() == 1).await;

        // More blocks arrive, but the first batch is unconfirmed.
        for n in 104..=105 {
            queue.enqueue(fixtures::block(n, 1000)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(executor.batch_count(), 1);

        // Confirming the first batch releases the second.
        let hashes: Vec<_> = (101..=103).map(|n| fixtures::block_hash(n, 0)).collect();
        queue.confirm_processed_batch(&hashes).await.unwrap();
        wait_until(|| executor.batch_count() == 2).await;
        assert_eq!(
            executor.received_heights(),
            vec![101, 102, 103, 104, 105]
        );
        iterator.stop();
    }

    #[tokio::test]
    async fn test_executor_error_retries_same_batch() {
        let (queue, executor, iterator) = pipeline();
        queue.start(Some(100)).await;
        queue.enqueue(fixtures::block(101, 1000)).await.unwrap();

        executor.fail_times(1);
        iterator.start();

        // The failed dispatch is retried with the same head block.
        wait_until(|| executor.batch_count() == 1).await;
        assert_eq!(executor.received_heights(), vec![101]);
        iterator.stop();
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (queue, _executor, iterator) = pipeline();
        queue.start(Some(100)).await;
        iterator.start();
        iterator.start();
        assert!(iterator.is_iterating());
        iterator.stop();
        assert!(!iterator.is_iterating());
        iterator.stop();
    }
}
