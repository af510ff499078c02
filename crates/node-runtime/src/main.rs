//! # Ingest Node Runtime
//!
//! Entry point wiring the full pipeline against a simulated in-memory
//! provider: the loader pulls and streams blocks, the queue bounds them,
//! the iterator dispatches batches, and the aggregate tracks the chain.
//!
//! Real deployments replace the simulated provider with transport-backed
//! implementations of [`node_pool::NodeProvider`] and plug their own
//! executor into [`node_runtime::IngestPipeline::build`].

use anyhow::Result;
use node_pool::{MockProvider, NodeProvider};
use node_runtime::{IngestConfig, IngestPipeline};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  Ingest Node Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let mut config = IngestConfig::default();
    config.network.block_time = Duration::from_secs(2);
    let config = config.align_block_times();
    let block_time = config.network.block_time;

    // A simulated node: two providers, the primary advancing one block
    // per block time.
    let primary = Arc::new(MockProvider::new("sim-primary", 100));
    let providers: Vec<Arc<dyn NodeProvider>> = vec![
        primary.clone(),
        Arc::new(MockProvider::http_only("sim-backup", 100)),
    ];

    let pipeline = IngestPipeline::build_self_confirming(config, providers);
    pipeline.start(None).await?;

    let ticker = {
        let primary = primary.clone();
        tokio::spawn(async move {
            let mut height = 100u64;
            loop {
                tokio::time::sleep(block_time).await;
                height += 1;
                primary.push_head(height);
            }
        })
    };

    info!("Pipeline is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down gracefully...");

    ticker.abort();
    pipeline.shutdown().await;
    Ok(())
}
