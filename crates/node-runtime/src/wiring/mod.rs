//! # Pipeline Wiring
//!
//! Builds every subsystem around one shared event bus and manages the
//! startup and shutdown order: providers connect first and the loader
//! starts last; shutdown walks the same path backwards.

use crate::adapters::AutoConfirmExecutor;
use crate::container::config::IngestConfig;
use crate::handlers::ConfirmationHandler;
use block_loader::BlockLoader;
use block_queue::{BlockQueueApi, Executor, QueueIterator, QueueService};
use light_chain::NetworkAggregate;
use node_pool::{ConnectionManager, NodeProvider, PoolError};
use shared_bus::InMemoryEventBus;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// The assembled ingestion pipeline.
pub struct IngestPipeline {
    /// The shared event bus.
    pub bus: Arc<InMemoryEventBus>,
    /// Queue service (producer and confirmation side).
    pub queue: Arc<QueueService>,
    /// Consumer-side iterator.
    pub iterator: Arc<QueueIterator>,
    /// Provider pool.
    pub pool: Arc<ConnectionManager>,
    /// Producer-side loader.
    pub loader: Arc<BlockLoader>,
    /// Light chain aggregate.
    pub aggregate: Arc<NetworkAggregate>,
    handler: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl IngestPipeline {
    /// Assemble the pipeline around `providers` and `executor`.
    ///
    /// Nothing runs yet; call [`start`](Self::start).
    pub fn build(
        config: IngestConfig,
        providers: Vec<Arc<dyn NodeProvider>>,
        executor: Arc<dyn Executor>,
    ) -> Arc<Self> {
        Self::build_with(config, providers, |_| executor)
    }

    /// Same, with the auto-confirming executor (local simulation and
    /// tests).
    pub fn build_self_confirming(
        config: IngestConfig,
        providers: Vec<Arc<dyn NodeProvider>>,
    ) -> Arc<Self> {
        Self::build_with(config, providers, |queue| {
            Arc::new(AutoConfirmExecutor::new(queue))
        })
    }

    fn build_with(
        config: IngestConfig,
        providers: Vec<Arc<dyn NodeProvider>>,
        make_executor: impl FnOnce(Arc<QueueService>) -> Arc<dyn Executor>,
    ) -> Arc<Self> {
        let bus = Arc::new(InMemoryEventBus::new());

        let queue = Arc::new(QueueService::new(config.queue.clone(), bus.clone()));
        let executor = make_executor(queue.clone());
        let iterator = Arc::new(QueueIterator::new(queue.clone(), executor, bus.clone()));

        let pool = Arc::new(ConnectionManager::new(config.pool.clone(), bus.clone()));
        for provider in providers {
            pool.register(provider);
        }

        let loader = Arc::new(BlockLoader::new(
            queue.clone(),
            pool.clone(),
            config.network.clone(),
            config.loader.clone(),
        ));
        let aggregate = Arc::new(NetworkAggregate::new(config.chain.clone(), bus.clone()));

        Arc::new(Self {
            bus,
            queue,
            iterator,
            pool,
            loader,
            aggregate,
            handler: parking_lot::Mutex::new(None),
        })
    }

    /// Connect providers and start every loop, ingesting above
    /// `indexed_height`.
    ///
    /// # Errors
    /// - `NoProviderAvailable` when no provider connects (fatal)
    pub async fn start(&self, indexed_height: Option<u64>) -> Result<(), PoolError> {
        self.pool.init().await?;
        self.queue.start(indexed_height).await;

        let handler = ConfirmationHandler::new(
            self.aggregate.clone(),
            self.queue.clone(),
            self.pool.clone(),
        );
        *self.handler.lock() = Some(handler.spawn(&self.bus));

        self.iterator.start();
        self.loader.start();
        info!(?indexed_height, "ingestion pipeline started");
        Ok(())
    }

    /// Stop everything: loader first, then the iterator, then the pool.
    pub async fn shutdown(&self) {
        self.loader.stop().await;
        self.iterator.stop();
        self.pool.shutdown().await;
        if let Some(handle) = self.handler.lock().take() {
            handle.abort();
        }
        info!("ingestion pipeline shut down");
    }
}
