//! # Connection Manager
//!
//! Keeps the registered providers, exactly one of them active, and two
//! cooperative loops: a health monitor probing the active provider with
//! a widening interval, and at most one reconnection loop repairing a
//! failed transport.
//!
//! ## Failover policy
//!
//! - HTTP failure: with more than one provider registered, try the
//!   others in registration order; the first that connects becomes
//!   active and the failed one is disconnected. With no usable backup, a
//!   **Full** reconnection loop starts on the failed provider.
//! - Websocket failure: a **WebSocketOnly** reconnection loop starts on
//!   the active provider; HTTP keeps serving meanwhile.
//!
//! Starting a reconnection cancels any reconnection already in progress.

use crate::config::PoolConfig;
use crate::errors::PoolError;
use crate::ports::provider::NodeProvider;
use shared_bus::{EventPublisher, IngestEvent, ReconnectKind};
use shared_types::backoff::Backoff;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct ReconnectionSlot {
    kind: ReconnectKind,
    handle: JoinHandle<()>,
}

/// Pool of node providers with health monitoring and failover.
pub struct ConnectionManager {
    config: PoolConfig,
    bus: Arc<dyn EventPublisher>,
    /// Registered providers, registration order preserved.
    providers: parking_lot::RwLock<Vec<Arc<dyn NodeProvider>>>,
    /// The provider currently serving the pipeline.
    active: parking_lot::RwLock<Option<Arc<dyn NodeProvider>>>,
    monitor: parking_lot::Mutex<Option<JoinHandle<()>>>,
    reconnection: parking_lot::Mutex<Option<ReconnectionSlot>>,
    /// Overlapping-tick guard for the health monitor.
    health_check_running: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl ConnectionManager {
    /// Create a manager with no providers registered.
    pub fn new(config: PoolConfig, bus: Arc<dyn EventPublisher>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            bus,
            providers: parking_lot::RwLock::new(Vec::new()),
            active: parking_lot::RwLock::new(None),
            monitor: parking_lot::Mutex::new(None),
            reconnection: parking_lot::Mutex::new(None),
            health_check_running: AtomicBool::new(false),
            shutdown,
        }
    }

    /// Register a provider. Registration order decides failover order.
    pub fn register(&self, provider: Arc<dyn NodeProvider>) {
        self.providers.write().push(provider);
    }

    /// Names of the registered providers, registration order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .read()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Connect the first provider that accepts and start monitoring.
    ///
    /// # Errors
    /// - `NoProviderAvailable` when nothing connects (fatal at startup)
    pub async fn init(self: &Arc<Self>) -> Result<(), PoolError> {
        let candidates: Vec<Arc<dyn NodeProvider>> = self.providers.read().clone();
        for provider in candidates {
            match provider.connect().await {
                Ok(()) => {
                    info!(provider = provider.name(), "provider connected");
                    self.set_active(provider).await;
                    self.spawn_monitor();
                    return Ok(());
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "provider refused connection");
                }
            }
        }
        Err(PoolError::NoProviderAvailable)
    }

    /// Stop monitoring, cancel reconnection, disconnect everything.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.monitor.lock().take() {
            handle.abort();
        }
        self.cancel_reconnection();
        let providers: Vec<Arc<dyn NodeProvider>> = self.providers.read().clone();
        for provider in providers {
            provider.disconnect().await;
        }
        *self.active.write() = None;
        info!("connection manager shut down");
    }

    /// The active provider.
    ///
    /// # Errors
    /// - `NoProviderAvailable` when the active slot is empty
    pub fn active(&self) -> Result<Arc<dyn NodeProvider>, PoolError> {
        self.active
            .read()
            .clone()
            .ok_or(PoolError::NoProviderAvailable)
    }

    /// Name of the active provider, if any.
    pub fn active_name(&self) -> Option<String> {
        self.active.read().as_ref().map(|p| p.name().to_string())
    }

    async fn set_active(&self, provider: Arc<dyn NodeProvider>) {
        let previous = {
            let mut active = self.active.write();
            active.replace(provider.clone())
        };
        let from = previous.map(|p| p.name().to_string());
        self.bus
            .publish(IngestEvent::ProviderSwitched {
                from,
                to: provider.name().to_string(),
            })
            .await;
    }

    /// Look a provider up by name, optionally connecting it.
    ///
    /// # Errors
    /// - `UnknownProvider` when the name is not registered
    pub async fn get_by_name(
        &self,
        name: &str,
        auto_connect: bool,
    ) -> Result<Arc<dyn NodeProvider>, PoolError> {
        let provider = self
            .providers
            .read()
            .iter()
            .find(|p| p.name() == name)
            .cloned()
            .ok_or_else(|| PoolError::UnknownProvider(name.to_string()))?;
        if auto_connect {
            provider.connect().await?;
        }
        Ok(provider)
    }

    /// Make the named provider active.
    ///
    /// # Errors
    /// - `UnknownProvider` / connection errors from the provider
    pub async fn switch(&self, name: &str) -> Result<(), PoolError> {
        let provider = self.get_by_name(name, false).await?;
        provider.connect().await?;
        let old = self.active.read().clone();
        self.set_active(provider).await;
        if let Some(old) = old {
            if old.name() != name {
                old.disconnect().await;
            }
        }
        Ok(())
    }

    /// Disconnect the named provider without removing it.
    ///
    /// # Errors
    /// - `UnknownProvider` when the name is not registered
    pub async fn disconnect(&self, name: &str) -> Result<(), PoolError> {
        let provider = self.get_by_name(name, false).await?;
        provider.disconnect().await;
        Ok(())
    }

    /// Remove the named provider from the pool.
    ///
    /// Removing the active provider first tries to switch to a backup in
    /// registration order. When no backup connects, monitoring and any
    /// reconnection stop and the active slot is left empty.
    ///
    /// # Errors
    /// - `UnknownProvider` when the name is not registered
    pub async fn remove(self: &Arc<Self>, name: &str) -> Result<(), PoolError> {
        let provider = self.get_by_name(name, false).await?;

        if self.active_name().as_deref() == Some(name) {
            let candidates: Vec<Arc<dyn NodeProvider>> = self
                .providers
                .read()
                .iter()
                .filter(|p| p.name() != name)
                .cloned()
                .collect();

            let mut replaced = false;
            for candidate in candidates {
                if candidate.connect().await.is_ok() {
                    self.set_active(candidate).await;
                    replaced = true;
                    break;
                }
            }

            if !replaced {
                if let Some(handle) = self.monitor.lock().take() {
                    handle.abort();
                }
                self.cancel_reconnection();
                *self.active.write() = None;
                warn!(provider = name, "removed the only usable provider");
            }
        }

        self.providers.write().retain(|p| p.name() != name);
        provider.disconnect().await;
        Ok(())
    }

    /// Report a failed call against a provider.
    ///
    /// Service wrappers call this when an RPC errors; the manager decides
    /// whether to fail over and returns whichever provider is active
    /// afterwards.
    ///
    /// # Errors
    /// - `NoProviderAvailable` when the active slot is empty
    pub async fn report_failure(
        self: &Arc<Self>,
        name: &str,
        method: &str,
        error: &str,
    ) -> Result<Arc<dyn NodeProvider>, PoolError> {
        self.bus
            .publish(IngestEvent::ProviderUnhealthy {
                name: name.to_string(),
                method: method.to_string(),
                error: error.to_string(),
            })
            .await;

        let current = self.active()?;
        if current.name() != name {
            // Stale report against a provider that already lost the
            // active slot.
            return Ok(current);
        }

        self.failover_http(current).await;
        self.active()
    }

    /// HTTP-side failover: backups in registration order, else a Full
    /// reconnection loop on the failed provider.
    async fn failover_http(self: &Arc<Self>, failed: Arc<dyn NodeProvider>) {
        let candidates: Vec<Arc<dyn NodeProvider>> = self
            .providers
            .read()
            .iter()
            .filter(|p| p.name() != failed.name())
            .cloned()
            .collect();

        for candidate in candidates {
            match candidate.connect().await {
                Ok(()) => {
                    info!(
                        from = failed.name(),
                        to = candidate.name(),
                        "failing over to backup provider"
                    );
                    self.cancel_reconnection();
                    self.set_active(candidate).await;
                    failed.disconnect().await;
                    return;
                }
                Err(e) => {
                    warn!(provider = candidate.name(), error = %e, "backup refused connection");
                }
            }
        }

        self.start_reconnection(ReconnectKind::Full, failed);
    }

    /// Kind of the reconnection currently in progress, if any. A loop
    /// that already finished is reaped here.
    pub fn reconnection_in_progress(&self) -> Option<ReconnectKind> {
        let mut slot = self.reconnection.lock();
        match slot.as_ref() {
            Some(current) if current.handle.is_finished() => {
                *slot = None;
                None
            }
            Some(current) => Some(current.kind),
            None => None,
        }
    }

    fn cancel_reconnection(&self) {
        if let Some(slot) = self.reconnection.lock().take() {
            slot.handle.abort();
        }
    }

    fn start_reconnection(self: &Arc<Self>, kind: ReconnectKind, provider: Arc<dyn NodeProvider>) {
        let mut slot = self.reconnection.lock();
        if let Some(previous) = slot.take() {
            previous.handle.abort();
        }

        let this = self.clone();
        let stop = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            this.run_reconnection(kind, provider, stop).await;
        });
        *slot = Some(ReconnectionSlot { kind, handle });
        info!(?kind, "reconnection loop started");
    }

    async fn run_reconnection(
        &self,
        kind: ReconnectKind,
        provider: Arc<dyn NodeProvider>,
        mut stop: watch::Receiver<bool>,
    ) {
        let mut backoff = Backoff::new(
            self.config.reconnect_interval,
            self.config.reconnect_multiplier,
            self.config.reconnect_cap,
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(backoff.delay()) => {}
                _ = stop.changed() => return,
            }

            let restored = match kind {
                ReconnectKind::Full => provider.connect().await.is_ok(),
                ReconnectKind::WebSocketOnly => provider.reconnect_web_socket().await.is_ok(),
            };

            if restored {
                info!(provider = provider.name(), ?kind, "provider reconnected");
                self.bus
                    .publish(IngestEvent::ProviderReconnected {
                        name: provider.name().to_string(),
                        kind,
                    })
                    .await;
                return;
            }

            debug!(
                provider = provider.name(),
                next_attempt = ?backoff.delay(),
                "reconnection attempt failed"
            );
            backoff.advance();
        }
    }

    fn spawn_monitor(self: &Arc<Self>) {
        let mut guard = self.monitor.lock();
        if guard.is_some() {
            return;
        }
        let this = self.clone();
        let mut stop = self.shutdown.subscribe();
        *guard = Some(tokio::spawn(async move {
            let mut backoff = Backoff::new(
                this.config.health_check_interval,
                this.config.health_check_multiplier,
                this.config.health_check_cap,
            );
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(backoff.delay()) => {}
                    _ = stop.changed() => return,
                }
                backoff.advance();
                this.health_tick().await;
            }
        }));
    }

    /// One health probe of the active provider. Skips itself when a
    /// previous probe is still running.
    pub async fn health_tick(self: &Arc<Self>) {
        if self.health_check_running.swap(true, Ordering::AcqRel) {
            return;
        }

        let result = async {
            let Ok(active) = self.active() else {
                return;
            };

            if !active.healthcheck().await {
                warn!(provider = active.name(), "health check failed");
                self.bus
                    .publish(IngestEvent::ProviderUnhealthy {
                        name: active.name().to_string(),
                        method: "healthcheck".to_string(),
                        error: "http probe failed".to_string(),
                    })
                    .await;
                self.failover_http(active).await;
                return;
            }

            if active.has_web_socket_support() && !active.healthcheck_web_socket().await {
                warn!(provider = active.name(), "websocket check failed");
                // The HTTP side still serves; repair only the websocket,
                // unless a repair is already under way.
                if self.reconnection_in_progress() != Some(ReconnectKind::WebSocketOnly) {
                    self.start_reconnection(ReconnectKind::WebSocketOnly, active);
                }
            }
        };
        result.await;

        self.health_check_running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::provider::MockProvider;
    use shared_bus::InMemoryEventBus;
    use std::time::Duration;

    fn manager() -> Arc<ConnectionManager> {
        Arc::new(ConnectionManager::new(
            PoolConfig::for_testing(),
            Arc::new(InMemoryEventBus::new()),
        ))
    }

    async fn wait_until<F: Fn() -> bool>(cond: F) {
        for _ in 0..400 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_init_picks_first_connectable() {
        let manager = manager();
        let p1 = Arc::new(MockProvider::new("p1", 100));
        let p2 = Arc::new(MockProvider::new("p2", 100));
        *p1.fail_connects.lock() = usize::MAX;
        manager.register(p1.clone());
        manager.register(p2.clone());

        manager.init().await.unwrap();
        assert_eq!(manager.active_name().as_deref(), Some("p2"));
        assert!(p2.is_connected());
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_init_with_no_connectable_provider_is_fatal() {
        let manager = manager();
        let p1 = Arc::new(MockProvider::new("p1", 100));
        *p1.fail_connects.lock() = usize::MAX;
        manager.register(p1);

        assert!(matches!(
            manager.init().await,
            Err(PoolError::NoProviderAvailable)
        ));
    }

    #[tokio::test]
    async fn test_report_failure_switches_to_backup() {
        let manager = manager();
        let p1 = Arc::new(MockProvider::new("p1", 100));
        let p2 = Arc::new(MockProvider::new("p2", 100));
        manager.register(p1.clone());
        manager.register(p2.clone());
        manager.init().await.unwrap();
        assert_eq!(manager.active_name().as_deref(), Some("p1"));

        let active = manager
            .report_failure("p1", "eth_blockNumber", "timeout")
            .await
            .unwrap();
        assert_eq!(active.name(), "p2");
        assert!(!p1.is_connected());
        // A clean switch starts no reconnection loop.
        assert!(manager.reconnection_in_progress().is_none());
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_report_failure_single_provider_reconnects() {
        let manager = manager();
        let p1 = Arc::new(MockProvider::new("p1", 100));
        manager.register(p1.clone());
        manager.init().await.unwrap();

        // The next two connection attempts fail, the third succeeds.
        *p1.fail_connects.lock() = 2;
        let active = manager
            .report_failure("p1", "eth_blockNumber", "timeout")
            .await
            .unwrap();
        // No backup: the failed provider stays active while the loop
        // repairs it.
        assert_eq!(active.name(), "p1");
        assert_eq!(
            manager.reconnection_in_progress(),
            Some(ReconnectKind::Full)
        );

        wait_until(|| manager.reconnection_in_progress().is_none()).await;
        assert!(p1.is_connected());
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_stale_report_is_ignored() {
        let manager = manager();
        let p1 = Arc::new(MockProvider::new("p1", 100));
        let p2 = Arc::new(MockProvider::new("p2", 100));
        manager.register(p1);
        manager.register(p2);
        manager.init().await.unwrap();

        let active = manager
            .report_failure("p2", "eth_blockNumber", "timeout")
            .await
            .unwrap();
        assert_eq!(active.name(), "p1");
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_health_tick_ws_failure_repairs_websocket() {
        let manager = manager();
        let p1 = Arc::new(MockProvider::new("p1", 100));
        manager.register(p1.clone());
        manager.init().await.unwrap();

        p1.ws_healthy.store(false, Ordering::Release);
        manager.health_tick().await;
        assert_eq!(
            manager.reconnection_in_progress(),
            Some(ReconnectKind::WebSocketOnly)
        );
        // HTTP side is untouched.
        assert_eq!(manager.active_name().as_deref(), Some("p1"));

        p1.ws_healthy.store(true, Ordering::Release);
        wait_until(|| manager.reconnection_in_progress().is_none()).await;
        assert!(p1.is_web_socket_connected());
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_remove_active_switches_first() {
        let manager = manager();
        let p1 = Arc::new(MockProvider::new("p1", 100));
        let p2 = Arc::new(MockProvider::new("p2", 100));
        manager.register(p1.clone());
        manager.register(p2.clone());
        manager.init().await.unwrap();

        manager.remove("p1").await.unwrap();
        assert_eq!(manager.active_name().as_deref(), Some("p2"));
        assert_eq!(manager.provider_names(), vec!["p2"]);
        assert!(!p1.is_connected());
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_remove_last_provider_empties_active_slot() {
        let manager = manager();
        let p1 = Arc::new(MockProvider::new("p1", 100));
        manager.register(p1);
        manager.init().await.unwrap();

        manager.remove("p1").await.unwrap();
        assert!(manager.active_name().is_none());
        assert!(manager.provider_names().is_empty());
        assert!(matches!(
            manager.active(),
            Err(PoolError::NoProviderAvailable)
        ));
    }

    #[tokio::test]
    async fn test_switch_by_name() {
        let manager = manager();
        let p1 = Arc::new(MockProvider::new("p1", 100));
        let p2 = Arc::new(MockProvider::new("p2", 100));
        manager.register(p1.clone());
        manager.register(p2);
        manager.init().await.unwrap();

        manager.switch("p2").await.unwrap();
        assert_eq!(manager.active_name().as_deref(), Some("p2"));
        assert!(!p1.is_connected());
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let manager = manager();
        assert!(matches!(
            manager.switch("ghost").await,
            Err(PoolError::UnknownProvider(_))
        ));
    }
}
