//! # Failover Flow
//!
//! Provider trouble as the monitor and the loader see it: a failing
//! health check switches to a backup, a lone provider goes through the
//! reconnection loop, and the loader keeps ingesting across a failover.

#[cfg(test)]
mod tests {
    use crate::integration::support::wait_until;
    use block_loader::{BlockLoader, LoaderConfig, StrategyName};
    use block_queue::{BlockQueueApi, QueueConfig, QueueService};
    use node_pool::{ConnectionManager, MockProvider, PoolConfig};
    use shared_bus::{InMemoryEventBus, ReconnectKind};
    use shared_types::network::NetworkCapabilities;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_monitor_tick_switches_to_backup() {
        let bus = Arc::new(InMemoryEventBus::new());
        let manager = Arc::new(ConnectionManager::new(PoolConfig::for_testing(), bus));
        let p1 = Arc::new(MockProvider::new("provider1", 100));
        let p2 = Arc::new(MockProvider::new("provider2", 100));
        manager.register(p1.clone());
        manager.register(p2.clone());
        manager.init().await.unwrap();

        // provider1 stops answering its health probe.
        p1.healthy.store(false, Ordering::Release);
        manager.health_tick().await;

        assert_eq!(manager.active_name().as_deref(), Some("provider2"));
        // A clean switch starts no reconnection loop.
        assert!(manager.reconnection_in_progress().is_none());
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_single_provider_goes_through_reconnection() {
        let bus = Arc::new(InMemoryEventBus::new());
        let manager = Arc::new(ConnectionManager::new(PoolConfig::for_testing(), bus));
        let p1 = Arc::new(MockProvider::new("provider1", 100));
        manager.register(p1.clone());
        manager.init().await.unwrap();

        // Health fails and the next two reconnects are refused; the
        // exponential loop keeps trying until the third lands.
        p1.healthy.store(false, Ordering::Release);
        *p1.fail_connects.lock() = 2;
        manager.health_tick().await;
        assert_eq!(
            manager.reconnection_in_progress(),
            Some(ReconnectKind::Full)
        );

        wait_until(|| manager.reconnection_in_progress().is_none()).await;
        assert!(p1.is_connected());
        assert_eq!(manager.active_name().as_deref(), Some("provider1"));
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_loader_survives_failover_mid_ingest() {
        let bus = Arc::new(InMemoryEventBus::new());
        let queue = Arc::new(QueueService::new(QueueConfig::for_testing(), bus.clone()));
        queue.start(Some(100)).await;

        let p1 = Arc::new(MockProvider::new("provider1", 150));
        let p2 = Arc::new(MockProvider::new("provider2", 150));
        let pool = Arc::new(ConnectionManager::new(PoolConfig::for_testing(), bus));
        pool.register(p1.clone());
        pool.register(p2);
        pool.init().await.unwrap();

        let loader = Arc::new(BlockLoader::new(
            queue.clone(),
            pool.clone(),
            NetworkCapabilities::for_testing(),
            LoaderConfig {
                strategy: StrategyName::Pull,
                ..LoaderConfig::for_testing()
            },
        ));
        loader.start();
        wait_until(|| queue.last_height() >= Some(105)).await;

        // provider1 starts erroring on every call; the loader reports
        // the failure, the pool fails over, ingestion continues on
        // provider2.
        *p1.fail_rpcs.lock() = usize::MAX;
        wait_until(|| pool.active_name().as_deref() == Some("provider2")).await;
        wait_until(|| queue.last_height() == Some(150)).await;

        loader.stop().await;
        pool.shutdown().await;
    }
}
