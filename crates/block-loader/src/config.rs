//! # Loader Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Swappable loader policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyName {
    /// Batched RPC pulling, two-phase.
    Pull,
    /// Websocket streaming with catch-up.
    Subscribe,
}

/// Configuration for the loader and both strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Baseline strategy; the selection rule may still route large gaps
    /// to Pull.
    pub strategy: StrategyName,

    /// Max estimated receipt bytes per pull sub-batch.
    pub request_blocks_batch_size: u64,

    /// Initial number of blocks preloaded per pull round; adapts at
    /// runtime.
    pub base_preload_count: u64,

    /// Height gap above which the loader routes to Pull.
    pub strategy_threshold: u64,

    /// Expected block interval; drives the tick cadence cap.
    pub block_time: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyName::Subscribe,
            request_blocks_batch_size: 5 * 1024 * 1024,
            base_preload_count: 10,
            strategy_threshold: 20,
            block_time: Duration::from_secs(12),
        }
    }
}

impl LoaderConfig {
    /// Gap above which the subscribe strategy refuses to catch up and
    /// reports the gap back instead of silently swallowing it.
    pub fn catch_up_bound(&self) -> u64 {
        self.strategy_threshold * 4
    }

    /// Create a config for testing (fast cadence, small batches).
    pub fn for_testing() -> Self {
        Self {
            strategy: StrategyName::Pull,
            request_blocks_batch_size: 64 * 1024,
            base_preload_count: 5,
            strategy_threshold: 20,
            block_time: Duration::from_millis(100),
        }
    }
}
