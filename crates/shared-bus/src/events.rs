//! # Ingestion Events
//!
//! Everything the pipeline tells the outside world flows through this
//! enum: queue lifecycle, batch dispatch and confirmation, chain
//! reorganizations, and provider pool changes.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Hash, LightBlock};

/// Which transport a reconnection loop restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconnectKind {
    /// Only the websocket channel was re-established.
    WebSocketOnly,
    /// The provider was fully reconnected.
    Full,
}

/// All events that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IngestEvent {
    // =========================================================================
    // QUEUE LIFECYCLE
    // =========================================================================
    /// The queue service started ingesting above an indexed height.
    QueueStarted {
        /// Height already indexed downstream; ingestion resumes above it.
        indexed_height: Option<u64>,
    },

    /// The queue refused an enqueue because the configured height bound
    /// was reached. Terminal for the loader until reconfigured.
    MaxHeightReached {
        /// The bound that was hit.
        height: u64,
    },

    // =========================================================================
    // BATCH FLOW
    // =========================================================================
    /// The iterator handed a batch to the executor.
    BatchDispatched {
        /// Correlation id of the dispatch.
        request_id: String,
        /// Number of blocks in the batch.
        len: usize,
        /// Height of the first block.
        from: u64,
        /// Height of the last block.
        to: u64,
    },

    /// The executor confirmed a batch; the blocks left the queue.
    BatchConfirmed {
        /// Header projections of the confirmed blocks, ascending.
        blocks: Vec<LightBlock>,
        /// Queue tip after removal.
        tip: Option<u64>,
    },

    // =========================================================================
    // CHAIN VIEW
    // =========================================================================
    /// A reorganization was located and both chain and queue rewound.
    Reorganized {
        /// Height of the fork point; state above it was discarded.
        fork_height: u64,
        /// Local blocks discarded by the rewind, ascending.
        dropped: Vec<LightBlock>,
    },

    // =========================================================================
    // PROVIDER POOL
    // =========================================================================
    /// The active provider changed.
    ProviderSwitched {
        /// Previously active provider, if any.
        from: Option<String>,
        /// Newly active provider.
        to: String,
    },

    /// A reconnection loop restored a provider.
    ProviderReconnected {
        /// The provider that came back.
        name: String,
        /// Which transport was restored.
        kind: ReconnectKind,
    },

    /// A provider failed a call or a health check.
    ProviderUnhealthy {
        /// The failing provider.
        name: String,
        /// The method or probe that failed.
        method: String,
        /// Error description.
        error: String,
    },
}

impl IngestEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::QueueStarted { .. } | Self::MaxHeightReached { .. } => EventTopic::Queue,
            Self::BatchDispatched { .. } | Self::BatchConfirmed { .. } => EventTopic::Batch,
            Self::Reorganized { .. } => EventTopic::Chain,
            Self::ProviderSwitched { .. }
            | Self::ProviderReconnected { .. }
            | Self::ProviderUnhealthy { .. } => EventTopic::Providers,
        }
    }

    /// Hashes referenced by this event, for observers that index by hash.
    #[must_use]
    pub fn hashes(&self) -> Vec<Hash> {
        match self {
            Self::BatchConfirmed { blocks, .. } | Self::Reorganized {
                dropped: blocks, ..
            } => blocks.iter().map(|b| b.hash).collect(),
            _ => Vec::new(),
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Queue lifecycle events.
    Queue,
    /// Batch dispatch and confirmation.
    Batch,
    /// Chain view and reorganizations.
    Chain,
    /// Provider pool changes.
    Providers,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &IngestEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_mapping() {
        let event = IngestEvent::Reorganized {
            fork_height: 100,
            dropped: vec![],
        };
        assert_eq!(event.topic(), EventTopic::Chain);

        let event = IngestEvent::ProviderSwitched {
            from: None,
            to: "primary".to_string(),
        };
        assert_eq!(event.topic(), EventTopic::Providers);
    }

    #[test]
    fn test_filter_all_matches_everything() {
        let filter = EventFilter::all();
        assert!(filter.matches(&IngestEvent::QueueStarted {
            indexed_height: None
        }));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Batch]);
        assert!(filter.matches(&IngestEvent::BatchConfirmed {
            blocks: vec![],
            tip: Some(10),
        }));
        assert!(!filter.matches(&IngestEvent::QueueStarted {
            indexed_height: None
        }));
    }

    #[test]
    fn test_confirmed_event_exposes_hashes() {
        let block = LightBlock {
            number: 1,
            hash: Hash::repeat_byte(7),
            parent_hash: Hash::zero(),
            transactions_root: None,
            receipts_root: None,
            state_root: None,
        };
        let event = IngestEvent::BatchConfirmed {
            blocks: vec![block],
            tip: Some(1),
        };
        assert_eq!(event.hashes(), vec![Hash::repeat_byte(7)]);
    }
}
