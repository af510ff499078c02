//! # Runtime Configuration
//!
//! One struct aggregating every subsystem's configuration, with sane
//! defaults and a shrunk variant for tests.

use block_loader::LoaderConfig;
use block_queue::QueueConfig;
use light_chain::ChainConfig;
use node_pool::PoolConfig;
use serde::{Deserialize, Serialize};
use shared_types::network::NetworkCapabilities;
use std::time::Duration;

/// Snapshot knobs forwarded to the surrounding aggregate framework.
///
/// The pipeline itself only exposes the chain as an ordered list
/// ([`light_chain::NetworkAggregate::snapshot`]); persistence cadence
/// and pruning are the framework's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Confirmed batches between snapshots.
    pub snapshot_interval: u64,
    /// Snapshots enabled at all?
    pub snapshots_enabled: bool,
    /// May old snapshots be pruned?
    pub allow_pruning: bool,
    /// Minimum snapshots always kept.
    pub snapshot_min_keep: u64,
    /// Age window within which snapshots are kept.
    pub snapshot_keep_window: Duration,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: 100,
            snapshots_enabled: true,
            allow_pruning: true,
            snapshot_min_keep: 3,
            snapshot_keep_window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IngestConfig {
    /// The network being ingested.
    pub network: NetworkCapabilities,
    /// Queue and iterator.
    pub queue: QueueConfig,
    /// Loader and strategies.
    pub loader: LoaderConfig,
    /// Provider pool.
    pub pool: PoolConfig,
    /// Light chain.
    pub chain: ChainConfig,
    /// Aggregate framework pass-through.
    pub snapshots: SnapshotConfig,
}

impl IngestConfig {
    /// Propagate the network block time into the cadence-driven
    /// sub-configs.
    pub fn align_block_times(mut self) -> Self {
        self.queue.block_time = self.network.block_time;
        self.loader.block_time = self.network.block_time;
        self
    }

    /// Create a config for testing (fast cadence, small budgets).
    pub fn for_testing() -> Self {
        Self {
            network: NetworkCapabilities::for_testing(),
            queue: QueueConfig::for_testing(),
            loader: LoaderConfig::for_testing(),
            pool: PoolConfig::for_testing(),
            chain: ChainConfig::for_testing(),
            snapshots: SnapshotConfig::default(),
        }
        .align_block_times()
    }
}
