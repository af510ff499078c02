//! # Loader Application Layer
//!
//! The strategy seam and the loader that drives it. Both strategies
//! share the provider-failure reporting path: an RPC error is reported
//! to the connection manager (which decides about failover) and then
//! propagated so the loader stops the strategy and retries the tick.

use crate::config::StrategyName;
use crate::errors::LoadError;
use async_trait::async_trait;
use node_pool::{ConnectionManager, NodeProvider, ProviderError};
use std::sync::Arc;

pub mod loader;
pub mod pull;
pub mod subscribe;

pub use loader::BlockLoader;
pub use pull::PullStrategy;
pub use subscribe::SubscribeStrategy;

/// Swappable loader policy - strategy seam.
#[async_trait]
pub trait LoadStrategy: Send + Sync {
    /// Which policy this is.
    fn name(&self) -> StrategyName;

    /// Drive one load against the given network height. The pull
    /// strategy returns after one two-phase round; the subscribe
    /// strategy returns only when stopped or broken.
    async fn load(&self, network_height: u64) -> Result<(), LoadError>;

    /// Stop any long-running work. Idempotent.
    async fn stop(&self);
}

/// Report a provider failure to the pool and convert the error.
///
/// The manager may fail over to a backup or start a reconnection loop;
/// either way the caller propagates the original error and lets the
/// loader retry with a fresh tick.
pub(crate) async fn report_provider_failure(
    pool: &Arc<ConnectionManager>,
    provider: &Arc<dyn NodeProvider>,
    method: &str,
    error: ProviderError,
) -> LoadError {
    let _ = pool
        .report_failure(provider.name(), method, &error.to_string())
        .await;
    LoadError::Provider(error)
}
