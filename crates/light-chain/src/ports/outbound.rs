//! # Outbound Ports
//!
//! The remote lookup the reorg walk needs: one header by height from
//! whatever node is currently active.

use crate::domain::errors::ChainError;
use async_trait::async_trait;
use shared_types::entities::LightBlock;

/// Remote header lookup - outbound port.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Fetch the header at `height` from the remote node.
    ///
    /// `None` means the node knows no block at that height.
    async fn block_at_height(&self, height: u64) -> Result<Option<LightBlock>, ChainError>;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// Mock chain reader backed by a fixed set of headers.
#[derive(Default)]
pub struct MockChainReader {
    /// Headers the "remote node" serves, keyed by height.
    pub blocks: std::collections::BTreeMap<u64, LightBlock>,
    /// Should lookups fail?
    pub should_fail: bool,
}

impl MockChainReader {
    /// A reader serving the given headers.
    pub fn serving(blocks: impl IntoIterator<Item = LightBlock>) -> Self {
        Self {
            blocks: blocks.into_iter().map(|b| (b.number, b)).collect(),
            should_fail: false,
        }
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    async fn block_at_height(&self, height: u64) -> Result<Option<LightBlock>, ChainError> {
        if self.should_fail {
            return Err(ChainError::Remote("mock failure".to_string()));
        }
        Ok(self.blocks.get(&height).cloned())
    }
}
