//! # Provider Port
//!
//! Everything a node provider must expose to the pipeline: connection
//! lifecycle, health probes for both transports, batched block reads,
//! and a cancellable new-heads subscription. Transports themselves (HTTP
//! / websocket plumbing) live behind implementations of this trait.

use crate::errors::ProviderError;
use async_trait::async_trait;
use shared_types::entities::Hash;
use shared_types::raw::{RawBlock, RawBlockWithReceipts};
use tokio::sync::{mpsc, watch};

/// Node provider - outbound port.
#[async_trait]
pub trait NodeProvider: Send + Sync {
    /// Provider identifier (for logging and pool bookkeeping).
    fn name(&self) -> &str;

    /// Establish the connection.
    async fn connect(&self) -> Result<(), ProviderError>;

    /// Tear the connection down.
    async fn disconnect(&self);

    /// Probe the HTTP transport.
    async fn healthcheck(&self) -> bool;

    /// Does this provider carry a websocket transport?
    fn has_web_socket_support(&self) -> bool;

    /// Is the websocket currently connected?
    fn is_web_socket_connected(&self) -> bool;

    /// Probe the websocket transport.
    async fn healthcheck_web_socket(&self) -> bool;

    /// Re-establish only the websocket transport.
    async fn reconnect_web_socket(&self) -> Result<(), ProviderError>;

    /// Current network block height.
    async fn block_height(&self) -> Result<u64, ProviderError>;

    /// Fetch several blocks by height in one call.
    async fn blocks_by_heights(
        &self,
        heights: &[u64],
        full_txs: bool,
    ) -> Result<Vec<RawBlock>, ProviderError>;

    /// Fetch several blocks with their receipts in one call.
    async fn blocks_with_receipts(
        &self,
        heights: &[u64],
    ) -> Result<Vec<RawBlockWithReceipts>, ProviderError>;

    /// Fetch several blocks by hash in one call.
    async fn blocks_by_hashes(
        &self,
        hashes: &[Hash],
        full_txs: bool,
    ) -> Result<Vec<RawBlock>, ProviderError>;

    /// Open a new-heads subscription. The provider pushes each notified
    /// head number into the returned handle until it is cancelled.
    async fn subscribe_new_heads(&self) -> Result<NewHeadsSubscription, ProviderError>;
}

// =============================================================================
// Subscription plumbing
// =============================================================================

/// Provider side of a new-heads subscription.
pub struct NewHeadsFeed {
    tx: mpsc::Sender<u64>,
    cancelled: watch::Receiver<bool>,
}

impl NewHeadsFeed {
    /// Push a head number to the subscriber.
    ///
    /// Returns `false` once the subscription was cancelled or dropped;
    /// the provider task should stop feeding then.
    pub async fn send(&self, height: u64) -> bool {
        if *self.cancelled.borrow() {
            return false;
        }
        self.tx.send(height).await.is_ok()
    }

    /// True once the subscriber cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Wait until the subscriber cancels.
    pub async fn cancelled(&mut self) {
        while !*self.cancelled.borrow() {
            if self.cancelled.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Consumer side of a new-heads subscription. Dropping it cancels the
/// feed.
pub struct NewHeadsSubscription {
    rx: mpsc::Receiver<u64>,
    cancel: watch::Sender<bool>,
}

impl NewHeadsSubscription {
    /// Create a linked feed/subscription pair.
    pub fn channel(capacity: usize) -> (NewHeadsFeed, NewHeadsSubscription) {
        let (tx, rx) = mpsc::channel(capacity);
        let (cancel, cancelled) = watch::channel(false);
        (
            NewHeadsFeed { tx, cancelled },
            NewHeadsSubscription { rx, cancel },
        )
    }

    /// Receive the next head number; `None` once the feed ended.
    pub async fn recv(&mut self) -> Option<u64> {
        self.rx.recv().await
    }

    /// Cancel the subscription. Idempotent.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }
}

impl Drop for NewHeadsSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// Mock provider with a scriptable chain and failure modes.
pub struct MockProvider {
    name: String,
    /// Simulated chain height.
    pub height: std::sync::atomic::AtomicU64,
    /// Fork tag served for blocks above `fork_height`.
    fork: parking_lot::Mutex<(u8, u64)>,
    /// Transactions per served block.
    pub tx_count: u64,
    connected: std::sync::atomic::AtomicBool,
    /// Number of upcoming `connect` calls that should fail.
    pub fail_connects: parking_lot::Mutex<usize>,
    /// HTTP health probe result.
    pub healthy: std::sync::atomic::AtomicBool,
    /// Websocket capability flag.
    pub ws_support: bool,
    ws_connected: std::sync::atomic::AtomicBool,
    /// Websocket health probe result.
    pub ws_healthy: std::sync::atomic::AtomicBool,
    /// Number of upcoming RPC calls that should fail.
    pub fail_rpcs: parking_lot::Mutex<usize>,
    /// Number of upcoming receipt calls that should fail (on top of
    /// `fail_rpcs`), for scripting retry paths.
    pub fail_receipt_calls: parking_lot::Mutex<usize>,
    heads: tokio::sync::broadcast::Sender<u64>,
}

impl MockProvider {
    /// A healthy provider named `name` sitting at `height`.
    pub fn new(name: &str, height: u64) -> Self {
        let (heads, _) = tokio::sync::broadcast::channel(64);
        Self {
            name: name.to_string(),
            height: std::sync::atomic::AtomicU64::new(height),
            fork: parking_lot::Mutex::new((0, 0)),
            tx_count: 2,
            connected: std::sync::atomic::AtomicBool::new(false),
            fail_connects: parking_lot::Mutex::new(0),
            healthy: std::sync::atomic::AtomicBool::new(true),
            ws_support: true,
            ws_connected: std::sync::atomic::AtomicBool::new(false),
            ws_healthy: std::sync::atomic::AtomicBool::new(true),
            fail_rpcs: parking_lot::Mutex::new(0),
            fail_receipt_calls: parking_lot::Mutex::new(0),
            heads,
        }
    }

    /// Same, without websocket support.
    pub fn http_only(name: &str, height: u64) -> Self {
        Self {
            ws_support: false,
            ..Self::new(name, height)
        }
    }

    /// Advance the simulated chain and notify subscribers.
    pub fn push_head(&self, height: u64) {
        self.height
            .store(height, std::sync::atomic::Ordering::Release);
        let _ = self.heads.send(height);
    }

    /// Serve fork `fork` for every block above `fork_height`.
    pub fn set_fork(&self, fork: u8, fork_height: u64) {
        *self.fork.lock() = (fork, fork_height);
    }

    /// True while `connect` has succeeded and `disconnect` has not run.
    pub fn is_connected(&self) -> bool {
        self.connected.load(std::sync::atomic::Ordering::Acquire)
    }

    fn take_rpc_failure(&self, method: &str) -> Result<(), ProviderError> {
        let mut fail = self.fail_rpcs.lock();
        if *fail > 0 {
            *fail -= 1;
            return Err(ProviderError::Rpc {
                method: method.to_string(),
                message: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NodeProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<(), ProviderError> {
        {
            let mut fail = self.fail_connects.lock();
            if *fail > 0 {
                *fail -= 1;
                return Err(ProviderError::Connection("mock refusal".to_string()));
            }
        }
        self.connected
            .store(true, std::sync::atomic::Ordering::Release);
        if self.ws_support {
            self.ws_connected
                .store(true, std::sync::atomic::Ordering::Release);
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected
            .store(false, std::sync::atomic::Ordering::Release);
        self.ws_connected
            .store(false, std::sync::atomic::Ordering::Release);
    }

    async fn healthcheck(&self) -> bool {
        self.healthy.load(std::sync::atomic::Ordering::Acquire)
    }

    fn has_web_socket_support(&self) -> bool {
        self.ws_support
    }

    fn is_web_socket_connected(&self) -> bool {
        self.ws_connected.load(std::sync::atomic::Ordering::Acquire)
    }

    async fn healthcheck_web_socket(&self) -> bool {
        self.ws_healthy.load(std::sync::atomic::Ordering::Acquire)
    }

    async fn reconnect_web_socket(&self) -> Result<(), ProviderError> {
        if !self.ws_support {
            return Err(ProviderError::WebSocketUnsupported);
        }
        if !self.ws_healthy.load(std::sync::atomic::Ordering::Acquire) {
            return Err(ProviderError::Connection("websocket down".to_string()));
        }
        self.ws_connected
            .store(true, std::sync::atomic::Ordering::Release);
        Ok(())
    }

    async fn block_height(&self) -> Result<u64, ProviderError> {
        self.take_rpc_failure("eth_blockNumber")?;
        Ok(self.height.load(std::sync::atomic::Ordering::Acquire))
    }

    async fn blocks_by_heights(
        &self,
        heights: &[u64],
        _full_txs: bool,
    ) -> Result<Vec<RawBlock>, ProviderError> {
        self.take_rpc_failure("eth_getBlockByNumber")?;
        let tip = self.height.load(std::sync::atomic::Ordering::Acquire);
        let (fork, fork_height) = *self.fork.lock();
        Ok(heights
            .iter()
            .filter(|h| **h <= tip)
            .map(|h| shared_types::fixtures::raw_block_on_fork(*h, self.tx_count, fork, fork_height))
            .collect())
    }

    async fn blocks_with_receipts(
        &self,
        heights: &[u64],
    ) -> Result<Vec<RawBlockWithReceipts>, ProviderError> {
        {
            let mut fail = self.fail_receipt_calls.lock();
            if *fail > 0 {
                *fail -= 1;
                return Err(ProviderError::Rpc {
                    method: "eth_getBlockReceipts".to_string(),
                    message: "mock receipt failure".to_string(),
                });
            }
        }
        self.take_rpc_failure("eth_getBlockReceipts")?;
        let tip = self.height.load(std::sync::atomic::Ordering::Acquire);
        let (fork, fork_height) = *self.fork.lock();
        Ok(heights
            .iter()
            .filter(|h| **h <= tip)
            .map(|h| {
                shared_types::fixtures::raw_block_with_receipts_on_fork(
                    *h,
                    self.tx_count,
                    fork,
                    fork_height,
                )
            })
            .collect())
    }

    async fn blocks_by_hashes(
        &self,
        hashes: &[Hash],
        _full_txs: bool,
    ) -> Result<Vec<RawBlock>, ProviderError> {
        self.take_rpc_failure("eth_getBlockByHash")?;
        // The mock chain is height-addressed; hashes encode the height in
        // their leading bytes (see fixtures::block_hash).
        let (fork, fork_height) = *self.fork.lock();
        Ok(hashes
            .iter()
            .map(|hash| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&hash.as_bytes()[..8]);
                let number = u64::from_be_bytes(bytes);
                shared_types::fixtures::raw_block_on_fork(number, self.tx_count, fork, fork_height)
            })
            .collect())
    }

    async fn subscribe_new_heads(&self) -> Result<NewHeadsSubscription, ProviderError> {
        if !self.ws_support {
            return Err(ProviderError::WebSocketUnsupported);
        }
        let (feed, subscription) = NewHeadsSubscription::channel(64);
        let mut heads = self.heads.subscribe();
        tokio::spawn(async move {
            let mut feed = feed;
            loop {
                tokio::select! {
                    _ = feed.cancelled() => return,
                    head = heads.recv() => match head {
                        Ok(height) => {
                            if !feed.send(height).await {
                                return;
                            }
                        }
                        Err(_) => return,
                    },
                }
            }
        });
        Ok(subscription)
    }
}
