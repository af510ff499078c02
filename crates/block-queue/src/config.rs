//! # Queue Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the queue and its iterator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Byte budget for queued blocks.
    pub max_queue_size: u64,

    /// Upper height bound for enqueue; ingestion stops there.
    pub max_block_height: u64,

    /// Expected average block size in bytes, used for capacity sizing.
    pub block_size: u64,

    /// Max bytes per batch handed to the executor.
    pub iterator_batch_bytes: u64,

    /// Expected block interval; drives the iterator's idle cadence cap.
    pub block_time: Duration,

    /// Number of recently confirmed blocks kept for hash lookups.
    pub confirmed_cache_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 256 * 1024 * 1024,
            max_block_height: u64::MAX,
            block_size: 1024 * 1024,
            iterator_batch_bytes: 10 * 1024 * 1024,
            block_time: Duration::from_secs(12),
            confirmed_cache_size: 256,
        }
    }
}

impl QueueConfig {
    /// Create a config for testing (small budgets, fast cadence).
    pub fn for_testing() -> Self {
        Self {
            max_queue_size: 10_000_000,
            max_block_height: u64::MAX,
            block_size: 1000,
            iterator_batch_bytes: 1_000_000,
            block_time: Duration::from_millis(100),
            confirmed_cache_size: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueueConfig::default();
        assert_eq!(config.max_queue_size, 256 * 1024 * 1024);
        assert_eq!(config.max_block_height, u64::MAX);
    }

    #[test]
    fn test_testing_config_is_small() {
        let config = QueueConfig::for_testing();
        assert!(config.max_queue_size < QueueConfig::default().max_queue_size);
    }
}
