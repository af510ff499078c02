//! # Chain Configuration

use serde::{Deserialize, Serialize};

/// Configuration for the light chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Maximum headers kept; the oldest is evicted past this.
    pub max_size: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { max_size: 1024 }
    }
}

impl ChainConfig {
    /// Create a config for testing (small chain).
    pub fn for_testing() -> Self {
        Self { max_size: 64 }
    }
}
