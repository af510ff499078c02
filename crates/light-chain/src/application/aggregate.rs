//! # Network Aggregate
//!
//! Owns the light chain and drives the backward reorg walk. Confirmed
//! blocks extend the chain; a parent-hash mismatch on an expected
//! extension is the reorg signal, at which point the caller asks the
//! aggregate to locate the fork point against the remote node.
//!
//! ## The walk
//!
//! Starting at the local tip height and moving toward genesis, compare
//! the remote and local headers at each height. The first height where
//! both hash and parent hash agree is the fork point: the chain is
//! truncated there, every local header above it is reported as dropped,
//! and a `Reorganized` event is published. Passing genesis without a
//! match is fatal.

use crate::config::ChainConfig;
use crate::domain::chain::LightChain;
use crate::domain::errors::ChainError;
use crate::ports::outbound::ChainReader;
use parking_lot::RwLock;
use shared_bus::{EventPublisher, IngestEvent};
use shared_types::entities::{Hash, LightBlock};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a completed reorg walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorgOutcome {
    /// Height of the fork point; chain and queue rewind here.
    pub fork_height: u64,
    /// Local headers discarded by the rewind, ascending.
    pub dropped: Vec<LightBlock>,
}

/// The chain-owning aggregate.
pub struct NetworkAggregate {
    chain: RwLock<LightChain>,
    bus: Arc<dyn EventPublisher>,
    config: ChainConfig,
}

impl NetworkAggregate {
    /// Create an aggregate with an empty chain.
    pub fn new(config: ChainConfig, bus: Arc<dyn EventPublisher>) -> Self {
        Self {
            chain: RwLock::new(LightChain::new(config.max_size)),
            bus,
            config,
        }
    }

    /// The current tip header.
    pub fn tip(&self) -> Option<LightBlock> {
        self.chain.read().tail().cloned()
    }

    /// Number of headers held.
    pub fn len(&self) -> usize {
        self.chain.read().len()
    }

    /// True when no headers are held.
    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    /// Header at `height`, if held.
    pub fn block_at(&self, height: u64) -> Option<LightBlock> {
        self.chain.read().find_block_by_height(height).cloned()
    }

    /// The newest `n` headers, ascending.
    pub fn last_n(&self, n: usize) -> Vec<LightBlock> {
        self.chain.read().last_n_blocks(n)
    }

    /// Extend the chain with confirmed blocks, all or nothing.
    ///
    /// When the chain is empty and `first_parent` is given, the first
    /// block must link to it; this anchors a fresh chain to the height
    /// the downstream consumer had already indexed.
    ///
    /// # Errors
    /// - `NonContiguous` / `ParentHashMismatch` exactly as the chain
    ///   validates; a parent-hash mismatch is the caller's cue to run
    ///   [`reorganize`](Self::reorganize).
    pub fn extend(
        &self,
        blocks: &[LightBlock],
        first_parent: Option<Hash>,
    ) -> Result<(), ChainError> {
        let Some(first) = blocks.first() else {
            return Ok(());
        };

        let mut chain = self.chain.write();
        if chain.is_empty() {
            if let Some(parent) = first_parent {
                if first.parent_hash != parent {
                    return Err(ChainError::ParentHashMismatch {
                        height: first.number,
                        expected: parent,
                        got: first.parent_hash,
                    });
                }
            }
        }
        chain.add_blocks(blocks)
    }

    /// Walk backward against the remote node until local and remote
    /// agree, then truncate the chain there and publish the rewind.
    ///
    /// The caller is responsible for rewinding the queue to
    /// `outcome.fork_height` afterwards.
    ///
    /// # Errors
    /// - `Remote` when a lookup fails; the walk can simply be retried
    /// - `NoForkPoint` when the walk passes genesis (fatal)
    pub async fn reorganize(&self, reader: &dyn ChainReader) -> Result<ReorgOutcome, ChainError> {
        let Some(tip) = self.tip() else {
            // Nothing local to rewind.
            return Ok(ReorgOutcome {
                fork_height: 0,
                dropped: Vec::new(),
            });
        };

        warn!(tip = tip.number, "reorganization suspected, walking back");

        let mut reorg_height = tip.number;
        let mut dropped: Vec<LightBlock> = Vec::new();

        loop {
            let remote = reader.block_at_height(reorg_height).await?;
            let local = self.block_at(reorg_height);

            if let (Some(remote), Some(local)) = (remote.as_ref(), local.as_ref()) {
                if remote.hash == local.hash && remote.parent_hash == local.parent_hash {
                    // Fork point found.
                    {
                        let mut chain = self.chain.write();
                        chain.truncate_to_block(Some(reorg_height))?;
                    }
                    info!(
                        fork_height = reorg_height,
                        dropped = dropped.len(),
                        "reorganization located"
                    );
                    self.bus
                        .publish(IngestEvent::Reorganized {
                            fork_height: reorg_height,
                            dropped: dropped.clone(),
                        })
                        .await;
                    return Ok(ReorgOutcome {
                        fork_height: reorg_height,
                        dropped,
                    });
                }
            }

            if let Some(local) = local {
                dropped.insert(0, local);
            }
            reorg_height = reorg_height.checked_sub(1).ok_or(ChainError::NoForkPoint)?;
        }
    }

    /// Snapshot the chain as a plain ordered list.
    pub fn snapshot(&self) -> Vec<LightBlock> {
        self.chain.read().to_vec()
    }

    /// Replace the chain from a snapshot.
    ///
    /// # Errors
    /// - `InvalidSnapshot` when the list is not a contiguous chain
    pub fn restore(&self, blocks: Vec<LightBlock>) -> Result<(), ChainError> {
        let restored = LightChain::from_vec(blocks, self.config.max_size)?;
        *self.chain.write() = restored;
        Ok(())
    }

    /// Verify the ordering invariant across the held chain.
    pub fn validate(&self) -> Result<(), ChainError> {
        self.chain.read().validate_chain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::MockChainReader;
    use shared_bus::InMemoryEventBus;
    use shared_types::fixtures;

    fn aggregate() -> NetworkAggregate {
        NetworkAggregate::new(ChainConfig::for_testing(), Arc::new(InMemoryEventBus::new()))
    }

    fn canonical(n: u64) -> LightBlock {
        fixtures::light_block(n, 0, 0)
    }

    #[test]
    fn test_extend_and_tip() {
        let aggregate = aggregate();
        aggregate
            .extend(&[canonical(100), canonical(101)], None)
            .unwrap();
        assert_eq!(aggregate.tip().unwrap().number, 101);
        aggregate.validate().unwrap();
    }

    #[test]
    fn test_extend_anchors_first_block_to_parent() {
        let aggregate = aggregate();
        let err = aggregate
            .extend(&[canonical(100)], Some(fixtures::block_hash(42, 0)))
            .unwrap_err();
        assert!(matches!(err, ChainError::ParentHashMismatch { .. }));

        aggregate
            .extend(&[canonical(100)], Some(fixtures::block_hash(99, 0)))
            .unwrap();
        assert_eq!(aggregate.tip().unwrap().number, 100);
    }

    #[test]
    fn test_extend_mismatch_is_reorg_signal() {
        let aggregate = aggregate();
        aggregate
            .extend(&[canonical(100), canonical(101)], None)
            .unwrap();

        // A fork block at 102 whose parent is not our 101.
        let forked = fixtures::light_block(102, 1, 100);
        let err = aggregate.extend(&[forked], None).unwrap_err();
        assert!(matches!(err, ChainError::ParentHashMismatch { height: 102, .. }));
    }

    #[tokio::test]
    async fn test_reorganize_locates_fork_point() {
        let aggregate = aggregate();
        // Local: canonical 100..=102.
        aggregate
            .extend(&[canonical(100), canonical(101), canonical(102)], None)
            .unwrap();

        // Remote: forked above 100.
        let remote = MockChainReader::serving([
            fixtures::light_block(100, 0, 0),
            fixtures::light_block(101, 1, 100),
            fixtures::light_block(102, 1, 100),
        ]);

        let outcome = aggregate.reorganize(&remote).await.unwrap();
        assert_eq!(outcome.fork_height, 100);
        let dropped: Vec<u64> = outcome.dropped.iter().map(|b| b.number).collect();
        assert_eq!(dropped, vec![101, 102]);

        // Chain rewound to the fork point.
        assert_eq!(aggregate.tip().unwrap().number, 100);
        aggregate.validate().unwrap();
    }

    #[tokio::test]
    async fn test_reorganize_without_fork_point_is_fatal() {
        let aggregate = aggregate();
        // Local chain on fork 2 from genesis; remote serves nothing
        // matching.
        aggregate
            .extend(
                &[
                    fixtures::light_block(0, 2, 0),
                    fixtures::light_block(1, 2, 0),
                ],
                None,
            )
            .unwrap();

        let remote = MockChainReader::serving([
            fixtures::light_block(0, 3, 0),
            fixtures::light_block(1, 3, 0),
        ]);

        let err = aggregate.reorganize(&remote).await.unwrap_err();
        assert_eq!(err, ChainError::NoForkPoint);
    }

    #[tokio::test]
    async fn test_reorganize_propagates_remote_errors() {
        let aggregate = aggregate();
        aggregate.extend(&[canonical(100)], None).unwrap();

        let remote = MockChainReader {
            should_fail: true,
            ..Default::default()
        };
        assert!(matches!(
            aggregate.reorganize(&remote).await,
            Err(ChainError::Remote(_))
        ));
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let aggregate = aggregate();
        aggregate
            .extend(&[canonical(100), canonical(101), canonical(102)], None)
            .unwrap();

        let snapshot = aggregate.snapshot();
        let restored = NetworkAggregate::new(
            ChainConfig::for_testing(),
            Arc::new(InMemoryEventBus::new()),
        );
        restored.restore(snapshot).unwrap();
        assert_eq!(restored.tip().unwrap().number, 102);
        assert_eq!(restored.len(), 3);
    }
}
