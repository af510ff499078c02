//! # Event Bus
//!
//! Both sides of the ingestion event channel. The bus is a thin shell
//! over a `tokio::sync::broadcast` channel: publishers fan events out
//! to every live subscription, subscriptions filter by topic on their
//! side of the channel.
//!
//! Falling behind is survivable, not fatal: a subscription that lags
//! past the channel capacity loses the oldest events, keeps a count of
//! what it missed, and carries on. Handlers that must not miss anything
//! (the confirmation handler) are sized and scheduled so they never lag
//! in practice; observers that do lag can read the damage from
//! [`Subscription::dropped_events`].

use crate::events::{EventFilter, IngestEvent};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{debug, warn};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event bus was closed.
    #[error("event bus closed")]
    Closed,
}

/// Trait for publishing events to the bus.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event.
    ///
    /// # Returns
    ///
    /// The number of live subscriptions the event reached.
    async fn publish(&self, event: IngestEvent) -> usize;

    /// Total events published so far.
    fn events_published(&self) -> u64;
}

/// In-memory event bus for the single-process pipeline.
///
/// A distributed deployment would put a different implementation behind
/// [`EventPublisher`]; everything in this workspace talks to the trait.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<IngestEvent>,
    published: AtomicU64,
}

impl InMemoryEventBus {
    /// A bus with the default per-subscriber buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// A bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    /// Open a subscription delivering events that match `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        Subscription {
            rx: self.sender.subscribe(),
            filter,
            dropped: 0,
        }
    }

    /// Open a subscription as a [`Stream`].
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        self.subscribe(filter).into_stream()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: IngestEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                // No subscriptions yet; normal during startup.
                debug!(topic = ?event.topic(), "event published with no subscribers");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

/// A filtered subscription to the bus.
pub struct Subscription {
    rx: broadcast::Receiver<IngestEvent>,
    filter: EventFilter,
    /// Events lost to lag since the subscription opened.
    dropped: u64,
}

impl Subscription {
    /// Receive the next matching event.
    ///
    /// Lag is absorbed here: missed events are counted and skipped, and
    /// the subscription keeps delivering from the oldest retained event.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - the next matching event
    /// - `None` - the bus was dropped
    pub async fn recv(&mut self) -> Option<IngestEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    self.dropped += missed;
                    warn!(missed, total_dropped = self.dropped, "subscription fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive the next matching event without blocking.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(event))` - an event was ready and matched
    /// - `Ok(None)` - nothing ready
    /// - `Err(SubscriptionError::Closed)` - the bus was dropped
    pub fn try_recv(&mut self) -> Result<Option<IngestEvent>, SubscriptionError> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.filter.matches(&event) => return Ok(Some(event)),
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    self.dropped += missed;
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
            }
        }
    }

    /// The filter this subscription was opened with.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Events lost to lag since the subscription opened.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped
    }

    /// Turn the subscription into a [`Stream`] of matching events.
    #[must_use]
    pub fn into_stream(self) -> EventStream {
        EventStream {
            inner: BroadcastStream::new(self.rx),
            filter: self.filter,
        }
    }
}

/// Stream of matching events, for use with stream combinators.
///
/// Backed by [`BroadcastStream`], so the task is woken by the channel
/// when an event arrives rather than polling in a loop. Lagged spans are
/// logged and skipped, matching [`Subscription::recv`].
pub struct EventStream {
    inner: BroadcastStream<IngestEvent>,
    filter: EventFilter,
}

impl EventStream {
    /// The filter this stream was opened with.
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = IngestEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if self.filter.matches(&event) {
                        return Poll::Ready(Some(event));
                    }
                }
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(missed)))) => {
                    debug!(missed, "event stream fell behind");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
