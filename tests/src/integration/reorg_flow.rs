//! # Reorg Flow
//!
//! The backward walk wired the way the runtime runs it: confirmed
//! batches feed the aggregate, a fork block triggers the walk against
//! the provider pool, and both the chain and the queue rewind to the
//! fork point.

#[cfg(test)]
mod tests {
    use block_queue::{BlockQueueApi, QueueConfig, QueueService};
    use light_chain::{ChainConfig, NetworkAggregate};
    use node_pool::{ConnectionManager, MockProvider, PoolConfig};
    use node_runtime::handlers::ConfirmationHandler;
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, IngestEvent};
    use shared_types::fixtures;
    use std::sync::Arc;

    struct ReorgSetup {
        bus: Arc<InMemoryEventBus>,
        queue: Arc<QueueService>,
        aggregate: Arc<NetworkAggregate>,
        provider: Arc<MockProvider>,
        handler: ConfirmationHandler,
    }

    async fn setup() -> ReorgSetup {
        let bus = Arc::new(InMemoryEventBus::new());
        let queue = Arc::new(QueueService::new(QueueConfig::for_testing(), bus.clone()));
        queue.start(Some(99)).await;

        let provider = Arc::new(MockProvider::new("p1", 200));
        let pool = Arc::new(ConnectionManager::new(PoolConfig::for_testing(), bus.clone()));
        pool.register(provider.clone());
        pool.init().await.unwrap();

        let aggregate = Arc::new(NetworkAggregate::new(ChainConfig::for_testing(), bus.clone()));
        let handler = ConfirmationHandler::new(aggregate.clone(), queue.clone(), pool);
        ReorgSetup {
            bus,
            queue,
            aggregate,
            provider,
            handler,
        }
    }

    #[tokio::test]
    async fn test_walk_finds_fork_and_rewinds() {
        let s = setup().await;

        // Local view: canonical blocks 100..=102 confirmed.
        s.handler
            .on_confirmed(vec![
                fixtures::light_block(100, 0, 0),
                fixtures::light_block(101, 0, 0),
                fixtures::light_block(102, 0, 0),
            ])
            .await;
        assert_eq!(s.aggregate.tip().unwrap().number, 102);

        // The network reorganized above 100: remote 101' and 102'
        // replace 101 and 102, remote 100 still matches.
        s.provider.set_fork(1, 100);

        let mut sub = s.bus.subscribe(EventFilter::topics(vec![EventTopic::Chain]));

        // The next confirmed block extends the remote fork, not ours.
        s.handler
            .on_confirmed(vec![fixtures::light_block(103, 1, 100)])
            .await;

        // Fork located at 100: the walk dropped 101 and 102, ascending.
        let event = crate::integration::support::within(sub.recv())
            .await
            .expect("event");
        match event {
            IngestEvent::Reorganized {
                fork_height,
                dropped,
            } => {
                assert_eq!(fork_height, 100);
                let heights: Vec<u64> = dropped.iter().map(|b| b.number).collect();
                assert_eq!(heights, vec![101, 102]);
            }
            other => panic!("unexpected event {other:?}"),
        }

        // Both sides rewound atomically.
        assert_eq!(s.aggregate.tip().unwrap().number, 100);
        assert_eq!(s.queue.last_height(), Some(100));
        s.aggregate.validate().unwrap();

        // Ingestion resumes above the fork on the new branch.
        let forked = fixtures::block_on_fork(101, 1000, 1, 100);
        s.queue.enqueue(forked).await.unwrap();
        assert_eq!(s.queue.last_height(), Some(101));
    }

    #[tokio::test]
    async fn test_queued_blocks_are_discarded_on_rewind() {
        let s = setup().await;

        // Chain sits at 102; the queue holds 100..=105 awaiting
        // dispatch.
        s.handler
            .on_confirmed(vec![
                fixtures::light_block(100, 0, 0),
                fixtures::light_block(101, 0, 0),
                fixtures::light_block(102, 0, 0),
            ])
            .await;
        for n in 100..=105 {
            s.queue.enqueue(fixtures::block(n, 1000)).await.unwrap();
        }

        s.provider.set_fork(1, 101);
        s.handler
            .on_confirmed(vec![fixtures::light_block(103, 1, 101)])
            .await;

        // Fork at 101: queued blocks above it are gone.
        assert_eq!(s.queue.last_height(), Some(101));
        assert_eq!(s.queue.len(), 0);
        assert_eq!(s.queue.current_size(), 0);
    }
}
