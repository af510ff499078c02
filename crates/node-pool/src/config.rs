//! # Pool Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for health monitoring and reconnection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Interval before the first health check.
    pub health_check_interval: Duration,
    /// Growth factor between health checks.
    pub health_check_multiplier: f64,
    /// Longest interval between health checks.
    pub health_check_cap: Duration,
    /// Interval before the first reconnection attempt.
    pub reconnect_interval: Duration,
    /// Growth factor between reconnection attempts.
    pub reconnect_multiplier: f64,
    /// Longest interval between reconnection attempts.
    pub reconnect_cap: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            health_check_interval: Duration::from_secs(30),
            health_check_multiplier: 1.2,
            health_check_cap: Duration::from_secs(120),
            reconnect_interval: Duration::from_secs(1),
            reconnect_multiplier: 2.0,
            reconnect_cap: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    /// Create a config for testing (millisecond cadence).
    pub fn for_testing() -> Self {
        Self {
            health_check_interval: Duration::from_millis(20),
            health_check_multiplier: 1.2,
            health_check_cap: Duration::from_millis(100),
            reconnect_interval: Duration::from_millis(10),
            reconnect_multiplier: 2.0,
            reconnect_cap: Duration::from_millis(50),
        }
    }
}
