//! # Pool-Backed Chain Reader
//!
//! Implements the light chain's remote-lookup port against whatever
//! provider the pool currently holds active, so the reorg walk always
//! asks a live node.

use async_trait::async_trait;
use light_chain::{ChainError, ChainReader};
use node_pool::ConnectionManager;
use shared_types::entities::LightBlock;
use std::sync::Arc;

/// Remote header lookups through the active provider.
pub struct PoolChainReader {
    pool: Arc<ConnectionManager>,
}

impl PoolChainReader {
    /// Create a reader over the given pool.
    pub fn new(pool: Arc<ConnectionManager>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChainReader for PoolChainReader {
    async fn block_at_height(&self, height: u64) -> Result<Option<LightBlock>, ChainError> {
        let provider = self
            .pool
            .active()
            .map_err(|e| ChainError::Remote(e.to_string()))?;
        let raws = provider
            .blocks_by_heights(&[height], false)
            .await
            .map_err(|e| ChainError::Remote(e.to_string()))?;

        Ok(raws.into_iter().next().and_then(|raw| {
            let number = raw.number?;
            Some(LightBlock {
                number,
                hash: raw.hash.unwrap_or_default(),
                parent_hash: raw.parent_hash.unwrap_or_default(),
                transactions_root: raw.transactions_root,
                receipts_root: raw.receipts_root,
                state_root: raw.state_root,
            })
        }))
    }
}
