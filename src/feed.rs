//! # Event Feed
//!
//! The in-process hand-off point between the transport (GraphQL
//! subscription, websocket, test fixture, all external) and the evaluation
//! observer. The feed is a broadcast-based publish-subscribe channel
//! carrying encoded event payloads, so several observers can follow the
//! same evaluation without coordinating.
//!
//! ## Design notes
//!
//! - The feed carries [`EventMessage`]s, not decoded events: the wire
//!   contract is "one JSON string per event", and decoding belongs to the
//!   consumer so that a malformed payload is *its* non-fatal problem.
//! - Backpressure is bounded by the channel capacity. A subscriber that
//!   falls behind observes [`FeedError::Lagged`] once, after which its
//!   receiver is resubscribed at the tail of the feed. Whether a gap is
//!   survivable is the consumer's call (the evaluation observer treats it
//!   as fatal, since a reduction over a stream with holes is unsound).
//! - Per-stream text ordering is preserved because the channel delivers
//!   messages in publish order.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::trace;

/// One message on the feed: the encoded event payload plus the instant the
/// transport handed it over.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    /// Encoded [`crate::event::EvaluationEvent`], decoded by the consumer.
    pub json: String,
    pub received_at: DateTime<Utc>,
}

impl EventMessage {
    pub fn new(json: impl Into<String>) -> Self {
        Self {
            json: json.into(),
            received_at: Utc::now(),
        }
    }
}

/// Broadcast feed of evaluation event payloads.
///
/// Cheap to subscribe to; every subscriber sees every message published
/// after its subscription. The feed keeps an internal receiver so that
/// publishing before the first real subscriber is not an error.
pub struct EventFeed {
    sender: broadcast::Sender<EventMessage>,
    capacity: usize,
    _internal_receiver: broadcast::Receiver<EventMessage>,
}

impl EventFeed {
    /// Creates a feed buffering at most `capacity` undelivered messages per
    /// subscriber before lag kicks in.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = broadcast::channel(capacity);
        Self {
            sender,
            capacity,
            _internal_receiver: receiver,
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe())
    }

    /// Publishes a message to all subscribers.
    pub async fn publish(&self, message: EventMessage) -> FeedResult<()> {
        self.sync_publish(message)
    }

    /// Publishes without awaiting, for synchronous transport callbacks.
    pub fn sync_publish(&self, message: EventMessage) -> FeedResult<()> {
        trace!(payload = %message.json, "publishing evaluation event");
        self.sender
            .send(message)
            .map(|_| ())
            .map_err(|e| FeedError::SendFailed {
                message: e.to_string(),
            })
    }

    /// Number of messages currently queued in the channel.
    pub fn queue_size(&self) -> usize {
        self.sender.len()
    }

    /// Number of live subscribers, not counting the internal receiver.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count().saturating_sub(1)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Receiving half of a feed subscription.
pub struct EventReceiver {
    receiver: broadcast::Receiver<EventMessage>,
}

impl EventReceiver {
    fn new(receiver: broadcast::Receiver<EventMessage>) -> Self {
        Self { receiver }
    }

    /// Receives the next message in publish order.
    ///
    /// On lag the receiver is resubscribed at the tail of the feed and
    /// [`FeedError::Lagged`] reports how many messages were lost; the next
    /// call yields messages published after the lag was observed.
    /// [`FeedError::Closed`] means the feed was dropped and no further
    /// messages will arrive.
    pub async fn recv(&mut self) -> FeedResult<EventMessage> {
        match self.receiver.recv().await {
            Ok(message) => Ok(message),
            Err(broadcast::error::RecvError::Lagged(count)) => {
                self.receiver = self.receiver.resubscribe();
                Err(FeedError::Lagged { count })
            }
            Err(broadcast::error::RecvError::Closed) => Err(FeedError::Closed),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("feed send failed: {message}")]
    SendFailed { message: String },

    #[error("feed lagged, {count} messages dropped")]
    Lagged { count: u64 },

    #[error("feed closed")]
    Closed,
}

pub type FeedResult<T> = Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let feed = EventFeed::new(16);
        assert!(feed.publish(EventMessage::new("{}")).await.is_ok());
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_basic_publish_subscribe() {
        let feed = EventFeed::new(16);
        let mut rx = feed.subscribe();

        feed.publish(EventMessage::new(r#"{"type":"text","stream":"s","text":"a"}"#))
            .await
            .unwrap();

        let message = rx.recv().await.unwrap();
        assert_eq!(message.json, r#"{"type":"text","stream":"s","text":"a"}"#);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_see_every_message() {
        let feed = EventFeed::new(16);
        let mut rx1 = feed.subscribe();
        let mut rx2 = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        feed.publish(EventMessage::new("a")).await.unwrap();
        feed.publish(EventMessage::new("b")).await.unwrap();

        for rx in [&mut rx1, &mut rx2] {
            assert_eq!(rx.recv().await.unwrap().json, "a");
            assert_eq!(rx.recv().await.unwrap().json, "b");
        }
    }

    #[tokio::test]
    async fn test_lag_is_reported_once_then_resumes() {
        let feed = EventFeed::new(2);
        let mut rx = feed.subscribe();

        for i in 0..5 {
            feed.publish(EventMessage::new(format!("m{i}"))).await.unwrap();
        }

        match rx.recv().await {
            Err(FeedError::Lagged { count }) => assert!(count > 0),
            other => panic!("expected lag, got {other:?}"),
        }
        // after resubscribe the receiver is live again
        feed.publish(EventMessage::new("fresh")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().json, "fresh");
    }

    #[tokio::test]
    async fn test_closed_when_feed_dropped() {
        let feed = EventFeed::new(4);
        let mut rx = feed.subscribe();
        drop(feed);
        assert_eq!(rx.recv().await, Err(FeedError::Closed));
    }
}
