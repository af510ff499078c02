//! # Pool Errors

use thiserror::Error;

/// Errors from a single provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Could not establish or keep the connection.
    #[error("connection failed: {0}")]
    Connection(String),

    /// An RPC call failed.
    #[error("rpc {method} failed: {message}")]
    Rpc {
        /// The method that failed.
        method: String,
        /// Error description.
        message: String,
    },

    /// The provider has no websocket transport.
    #[error("provider has no websocket support")]
    WebSocketUnsupported,

    /// The new-heads subscription ended.
    #[error("subscription closed")]
    SubscriptionClosed,
}

/// Errors from the connection manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No registered provider could be connected. Fatal at startup.
    #[error("no provider available")]
    NoProviderAvailable,

    /// The named provider is not registered.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The underlying provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
