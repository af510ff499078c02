//! # Loader Flow
//!
//! Strategy selection and both strategies driven through the real queue
//! service and provider pool.

#[cfg(test)]
mod tests {
    use crate::integration::support::wait_until;
    use block_loader::{BlockLoader, LoaderConfig, StrategyName};
    use block_queue::{BlockQueueApi, QueueConfig, QueueService};
    use node_pool::{ConnectionManager, MockProvider, PoolConfig};
    use shared_bus::InMemoryEventBus;
    use shared_types::network::NetworkCapabilities;
    use std::sync::Arc;
    use std::time::Duration;

    async fn loader_setup(
        provider_height: u64,
        queue_start: u64,
        strategy: StrategyName,
    ) -> (Arc<QueueService>, Arc<MockProvider>, Arc<BlockLoader>) {
        let bus = Arc::new(InMemoryEventBus::new());
        let queue = Arc::new(QueueService::new(QueueConfig::for_testing(), bus.clone()));
        queue.start(Some(queue_start)).await;

        let provider = Arc::new(MockProvider::new("p1", provider_height));
        let pool = Arc::new(ConnectionManager::new(PoolConfig::for_testing(), bus));
        pool.register(provider.clone());
        pool.init().await.unwrap();

        let config = LoaderConfig {
            strategy,
            ..LoaderConfig::for_testing()
        };
        let loader = Arc::new(BlockLoader::new(
            queue.clone(),
            pool,
            NetworkCapabilities::for_testing(),
            config,
        ));
        (queue, provider, loader)
    }

    #[tokio::test]
    async fn test_selection_follows_the_gap() {
        let (_queue, _provider, loader) =
            loader_setup(100, 100, StrategyName::Subscribe).await;

        // d == threshold stays on Subscribe; d > threshold goes Pull.
        assert_eq!(loader.select_strategy(120), StrategyName::Subscribe);
        assert_eq!(loader.select_strategy(121), StrategyName::Pull);
    }

    #[tokio::test]
    async fn test_pull_catch_up_delivers_hydrated_blocks() {
        let (queue, _provider, loader) = loader_setup(108, 100, StrategyName::Pull).await;
        loader.start();

        wait_until(|| queue.last_height() == Some(108)).await;
        let batch = queue.batch_up_to_size(u64::MAX).await;
        assert_eq!(batch.first().unwrap().number, 101);
        assert!(batch.iter().all(|b| b.receipts.is_some()));
        assert!(batch.iter().all(|b| b.hex.is_none()));
        loader.stop().await;
    }

    #[tokio::test]
    async fn test_subscribe_catches_up_then_streams() {
        let (queue, provider, loader) =
            loader_setup(103, 100, StrategyName::Subscribe).await;
        loader.start();

        // Small gap: handled by the subscribe strategy's catch-up.
        wait_until(|| queue.last_height() == Some(103)).await;

        // New heads stream in.
        provider.push_head(104);
        wait_until(|| queue.last_height() == Some(104)).await;
        provider.push_head(105);
        wait_until(|| queue.last_height() == Some(105)).await;

        loader.stop().await;
    }

    #[tokio::test]
    async fn test_large_gap_routes_subscribe_config_to_pull() {
        // Gap of 100 > threshold 20: the loader must not hand this to
        // the subscribe catch-up.
        let (queue, _provider, loader) =
            loader_setup(200, 100, StrategyName::Subscribe).await;
        assert_eq!(loader.select_strategy(200), StrategyName::Pull);

        loader.start();
        wait_until(|| queue.last_height() == Some(200)).await;
        loader.stop().await;
    }

    #[tokio::test]
    async fn test_loader_pauses_when_queue_is_full() {
        let bus = Arc::new(InMemoryEventBus::new());
        let config = QueueConfig {
            max_queue_size: 3000,
            ..QueueConfig::for_testing()
        };
        let queue = Arc::new(QueueService::new(config, bus.clone()));
        queue.start(Some(100)).await;

        let provider = Arc::new(MockProvider::new("p1", 200));
        let pool = Arc::new(ConnectionManager::new(PoolConfig::for_testing(), bus));
        pool.register(provider);
        pool.init().await.unwrap();

        let loader = Arc::new(BlockLoader::new(
            queue.clone(),
            pool,
            NetworkCapabilities::for_testing(),
            LoaderConfig {
                strategy: StrategyName::Pull,
                // Small enough that the tiny queue still has headroom
                // for a receipt round.
                request_blocks_batch_size: 1024,
                ..LoaderConfig::for_testing()
            },
        ));
        loader.start();

        // The queue fills to its budget and stops growing; nothing
        // confirms, so the loader just retries.
        wait_until(|| queue.is_full()).await;
        let size_when_full = queue.current_size();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(queue.current_size(), size_when_full);
        loader.stop().await;
    }
}
