//! # Full Pipeline
//!
//! The whole system over a simulated node: loader to queue to iterator
//! to auto-confirming executor, with the aggregate tracking confirmed
//! blocks and a mid-stream reorganization rewinding everything.

#[cfg(test)]
mod tests {
    use crate::integration::support::wait_until;
    use node_pool::{MockProvider, NodeProvider};
    use node_runtime::{IngestConfig, IngestPipeline};
    use std::sync::Arc;

    fn sim(height: u64) -> (Arc<MockProvider>, Vec<Arc<dyn NodeProvider>>) {
        let primary = Arc::new(MockProvider::new("sim-primary", height));
        let providers: Vec<Arc<dyn NodeProvider>> = vec![primary.clone()];
        (primary, providers)
    }

    #[tokio::test]
    async fn test_end_to_end_ingest() {
        let (provider, providers) = sim(110);
        let pipeline = IngestPipeline::build_self_confirming(IngestConfig::for_testing(), providers);
        pipeline.start(Some(100)).await.unwrap();

        // The pull catch-up ingests 101..=110; every confirmed block
        // lands on the aggregate's chain.
        wait_until(|| pipeline.aggregate.tip().map(|t| t.number) == Some(110)).await;
        pipeline.aggregate.validate().unwrap();

        // Streamed heads flow end to end as well.
        provider.push_head(111);
        wait_until(|| pipeline.aggregate.tip().map(|t| t.number) == Some(111)).await;

        // Confirmed blocks drained from the queue.
        assert_eq!(pipeline.queue.len(), 0);
        pipeline.shutdown().await;
    }

    #[tokio::test]
    async fn test_end_to_end_reorg_rewind_and_resume() {
        let (provider, providers) = sim(105);
        let pipeline = IngestPipeline::build_self_confirming(IngestConfig::for_testing(), providers);
        pipeline.start(Some(100)).await.unwrap();

        wait_until(|| pipeline.aggregate.tip().map(|t| t.number) == Some(105)).await;

        // The network reorganizes: blocks above 103 are replaced and the
        // chain grows one more on the new branch.
        provider.set_fork(1, 103);
        provider.push_head(106);

        // The fork block fails to extend the chain, the walk finds 103,
        // and ingestion resumes on the new branch up to the tip.
        wait_until(|| {
            pipeline
                .aggregate
                .tip()
                .is_some_and(|t| t.number == 106)
        })
        .await;
        pipeline.aggregate.validate().unwrap();

        // The rewound heights were re-ingested from the fork branch.
        let replayed = pipeline.aggregate.block_at(104).unwrap();
        assert_eq!(
            replayed.hash,
            shared_types::fixtures::block_hash(104, 1)
        );
        pipeline.shutdown().await;
    }
}
