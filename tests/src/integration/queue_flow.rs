//! # Queue Flow
//!
//! The queue service exercised the way the surrounding framework drives
//! it: ordered ingest, the oversize-progress guarantee, and head-ordered
//! confirmation.

#[cfg(test)]
mod tests {
    use block_queue::{BlockQueueApi, QueueConfig, QueueError, QueueService};
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, IngestEvent};
    use shared_types::fixtures;
    use std::sync::Arc;

    fn service_with(max_queue_size: u64) -> Arc<QueueService> {
        let config = QueueConfig {
            max_queue_size,
            ..QueueConfig::for_testing()
        };
        Arc::new(QueueService::new(config, Arc::new(InMemoryEventBus::new())))
    }

    #[tokio::test]
    async fn test_ordered_ingest() {
        let queue = service_with(10_000_000);
        queue.start(Some(100)).await;

        for n in 101..=103 {
            queue.enqueue(fixtures::block(n, 1000)).await.unwrap();
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.last_height(), Some(103));
        assert_eq!(queue.current_size(), 3000);

        // A gap is rejected outright.
        let err = queue.enqueue(fixtures::block(105, 1000)).await.unwrap_err();
        assert_eq!(
            err,
            QueueError::OutOfOrder {
                expected: 104,
                got: 105
            }
        );
    }

    #[tokio::test]
    async fn test_oversize_progress() {
        let queue = service_with(10_000_000);
        queue.start(Some(100)).await;
        queue
            .enqueue(fixtures::block(101, 2_000_000))
            .await
            .unwrap();

        // The head block alone exceeds the batch budget and is delivered
        // anyway.
        let batch = queue.batch_up_to_size(1_000_000).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].number, 101);
        assert_eq!(batch[0].size, 2_000_000);
    }

    #[tokio::test]
    async fn test_confirm_order() {
        let queue = service_with(10_000_000);
        queue.start(Some(100)).await;
        for n in 101..=103 {
            queue.enqueue(fixtures::block(n, 1000)).await.unwrap();
        }

        // Confirming the two head blocks removes exactly them.
        let head_hashes = vec![fixtures::block_hash(101, 0), fixtures::block_hash(102, 0)];
        let removed = queue.confirm_processed_batch(&head_hashes).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(queue.len(), 1);

        // A wrong hash leaves the queue untouched.
        let wrong = vec![fixtures::block_hash(999, 0)];
        assert!(queue.confirm_processed_batch(&wrong).await.is_err());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.current_size(), 1000);
    }

    #[tokio::test]
    async fn test_confirmation_event_carries_light_blocks() {
        let bus = Arc::new(InMemoryEventBus::new());
        let queue = Arc::new(QueueService::new(QueueConfig::for_testing(), bus.clone()));
        queue.start(Some(100)).await;
        queue.enqueue(fixtures::block(101, 1000)).await.unwrap();

        let mut sub = bus.subscribe(EventFilter::topics(vec![EventTopic::Batch]));
        queue
            .confirm_processed_batch(&[fixtures::block_hash(101, 0)])
            .await
            .unwrap();

        let event = crate::integration::support::within(sub.recv())
            .await
            .expect("event");
        match event {
            IngestEvent::BatchConfirmed { blocks, tip } => {
                assert_eq!(blocks.len(), 1);
                assert_eq!(blocks[0].number, 101);
                // Tip is the enqueue high-water mark, not the head.
                assert_eq!(tip, Some(101));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stalled_executor_bounds_memory() {
        // Nothing confirms; the queue fills to its budget and enqueues
        // start failing without growing further.
        let queue = service_with(5000);
        queue.start(Some(100)).await;

        let mut n = 101;
        loop {
            match queue.enqueue(fixtures::block(n, 1000)).await {
                Ok(()) => n += 1,
                Err(QueueError::Full { .. }) => break,
                Err(e) => panic!("unexpected {e}"),
            }
        }
        assert!(queue.current_size() >= 5000);
        assert!(queue.current_size() < 7000);
    }
}
