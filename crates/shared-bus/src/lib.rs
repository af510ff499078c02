//! # Shared Bus - Ingestion Event Channel
//!
//! The delivery channel between the pipeline and its surroundings. The
//! queue service, connection manager, and network aggregate publish here;
//! runtime handlers and external observers subscribe.
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ queue service│                    │ confirmation │
//! │ / aggregate  │    publish()       │   handler    │
//! │ / node pool  │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! The bus is in-memory (`tokio::sync::broadcast`); subscribers that lag
//! behind the channel capacity lose the oldest events and are told so.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod events;

// Re-export main types
pub use bus::{EventPublisher, EventStream, InMemoryEventBus, Subscription, SubscriptionError};
pub use events::{EventFilter, EventTopic, IngestEvent, ReconnectKind};

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(DEFAULT_CHANNEL_CAPACITY, 1000);
    }
}
