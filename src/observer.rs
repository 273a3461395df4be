//! # Evaluation Observer
//!
//! The single writer of one evaluation session. An observer task subscribes
//! to the event feed, decodes payloads, drives the reducer, and publishes
//! throttled snapshots on a watch channel. Because every `apply_event` call
//! happens on this one task, the reducer needs no locking no matter how the
//! host distributes the rest of its work.
//!
//! ## Snapshot emission
//!
//! Emission is throttled to [`crate::config::ObserverConfig::throttle`]: the
//! first event after a quiet period is reflected immediately, a burst is
//! coalesced, and a trailing flush guarantees the last event always becomes
//! visible. Throttling affects *when* a consumer observes a snapshot, never
//! the contents of the accumulated state.
//!
//! ## Ending a session
//!
//! A session ends in one of three ways, each published as a terminal
//! update:
//! - the feed closes → [`ObserverUpdate::Closed`] with the final state;
//! - the consumer unsubscribes → [`ObserverUpdate::Closed`]; events not yet
//!   delivered are never applied, and a second unsubscribe is a no-op;
//! - the session fails (duplicate key, feed lag) →
//!   [`ObserverUpdate::Failed`], after which rendering of this live view
//!   should stop with a visible error state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_stream::wrappers::WatchStream;
use tokio_stream::Stream;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ObserverConfig;
use crate::event::EvaluationEvent;
use crate::feed::{EventReceiver, FeedError};
use crate::reducer::{EvaluationReducer, EvaluationState, ReducerError};

/// Why an evaluation session aborted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("evaluation protocol violation: {0}")]
    Reducer(#[from] ReducerError),

    #[error("event feed failure: {0}")]
    Feed(#[from] FeedError),
}

/// One value on the observer's watch channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverUpdate {
    /// Latest accumulated snapshot.
    Snapshot(EvaluationState),
    /// The session ended normally; carries the final state.
    Closed(EvaluationState),
    /// The session aborted.
    Failed(SessionError),
}

impl ObserverUpdate {
    pub fn state(&self) -> Option<&EvaluationState> {
        match self {
            Self::Snapshot(state) | Self::Closed(state) => Some(state),
            Self::Failed(_) => None,
        }
    }

    /// Whether this is the last update the session will publish.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed(_) | Self::Failed(_))
    }
}

/// # EvaluationObserver
///
/// Handle to a running observer task. Dropping the handle unsubscribes, so
/// a session never outlives its consumer.
pub struct EvaluationObserver {
    id: Uuid,
    updates: watch::Receiver<ObserverUpdate>,
    cancel: Arc<Notify>,
    unsubscribed: AtomicBool,
    task: JoinHandle<()>,
}

impl EvaluationObserver {
    /// Spawns the observer task over a feed subscription.
    pub fn spawn(receiver: EventReceiver, config: ObserverConfig) -> Self {
        let id = Uuid::new_v4();
        let (sender, updates) =
            watch::channel(ObserverUpdate::Snapshot(EvaluationState::default()));
        let cancel = Arc::new(Notify::new());
        let task = tokio::spawn(run_session(id, receiver, config, sender, cancel.clone()));
        debug!(observer_id = %id, "evaluation observer started");
        Self {
            id,
            updates,
            cancel,
            unsubscribed: AtomicBool::new(false),
            task,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// A receiver over the update sequence. Holds the latest value; await
    /// `changed()` for the next one. Terminal updates stay readable after
    /// the session ends.
    pub fn updates(&self) -> watch::Receiver<ObserverUpdate> {
        self.updates.clone()
    }

    /// The update sequence as a `Stream` (latest-value semantics).
    pub fn update_stream(&self) -> impl Stream<Item = ObserverUpdate> {
        WatchStream::new(self.updates.clone())
    }

    /// Stops consumption. Safe to call at any time and idempotent; state
    /// already applied is retained and published in the terminal
    /// [`ObserverUpdate::Closed`], while buffered-but-undelivered events
    /// are never applied.
    pub fn unsubscribe(&self) {
        if !self.unsubscribed.swap(true, Ordering::SeqCst) {
            self.cancel.notify_one();
        }
    }

    /// Whether the observer task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for EvaluationObserver {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

enum Outcome {
    Ended,
    Unsubscribed,
    Failed(SessionError),
}

async fn run_session(
    id: Uuid,
    mut receiver: EventReceiver,
    config: ObserverConfig,
    updates: watch::Sender<ObserverUpdate>,
    cancel: Arc<Notify>,
) {
    let mut reducer = EvaluationReducer::initial();
    let mut last_emit: Option<Instant> = None;
    let mut dirty = false;

    let outcome = loop {
        let flush_deadline = match last_emit {
            Some(at) if dirty => Some(at + config.throttle),
            _ => None,
        };

        tokio::select! {
            // cancellation first: an unsubscribed observer must not apply
            // events that are merely buffered
            biased;

            _ = cancel.notified() => break Outcome::Unsubscribed,

            _ = flush_after(flush_deadline), if flush_deadline.is_some() => {
                updates.send_replace(ObserverUpdate::Snapshot(reducer.snapshot()));
                last_emit = Some(Instant::now());
                dirty = false;
            }

            received = receiver.recv() => match received {
                Ok(message) => {
                    let event = match EvaluationEvent::decode(&message.json) {
                        Some(event) => event,
                        // malformed payloads are dropped at the event level
                        None => continue,
                    };
                    match reducer.apply_event(&event) {
                        Ok(()) => {
                            dirty = true;
                            let now = Instant::now();
                            let due = last_emit
                                .map_or(true, |at| now.duration_since(at) >= config.throttle);
                            if due {
                                updates.send_replace(ObserverUpdate::Snapshot(reducer.snapshot()));
                                last_emit = Some(now);
                                dirty = false;
                            }
                        }
                        Err(error) => break Outcome::Failed(SessionError::Reducer(error)),
                    }
                }
                Err(FeedError::Closed) => break Outcome::Ended,
                Err(error) => break Outcome::Failed(SessionError::Feed(error)),
            },
        }
    };

    reducer.close();
    match outcome {
        Outcome::Ended => {
            debug!(observer_id = %id, "event feed ended");
            updates.send_replace(ObserverUpdate::Closed(reducer.snapshot()));
        }
        Outcome::Unsubscribed => {
            debug!(observer_id = %id, "observer unsubscribed");
            updates.send_replace(ObserverUpdate::Closed(reducer.snapshot()));
        }
        Outcome::Failed(error) => {
            warn!(observer_id = %id, %error, "evaluation session failed");
            updates.send_replace(ObserverUpdate::Failed(error));
        }
    }
}

async fn flush_after(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
