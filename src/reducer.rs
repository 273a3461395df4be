//! # Evaluation State Reducer
//!
//! Single-writer accumulator turning a sequence of evaluation events into a
//! queryable snapshot: a key→value map and per-stream text buffers. The
//! reducer performs no synchronization of its own: only one execution
//! context may call [`EvaluationReducer::apply_event`], and multi-threaded
//! hosts must serialize externally (the evaluation observer task is that
//! serialization point).
//!
//! ## Lifecycle
//!
//! Two states only: *open* (accepting events) and *closed* (the owning
//! subscription ended). Applying an event to a closed reducer is a
//! programmer error surfaced as [`ReducerError::Closed`]; there is no
//! retry or recovery here; any retry policy belongs to the transport.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::event::EvaluationEvent;
use crate::value::EvaluationValue;

/// Append-only text buffer for one output stream.
///
/// Internally a chunk list joined on demand, so that appending n chunks
/// stays linear; observably it behaves as plain string concatenation in
/// arrival order, with no deduplication and no length cap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamBuffer {
    chunks: Vec<String>,
}

impl StreamBuffer {
    fn push(&mut self, text: impl Into<String>) {
        self.chunks.push(text.into());
    }

    /// The buffered text, in arrival order.
    pub fn contents(&self) -> String {
        self.chunks.concat()
    }

    /// Total buffered length in bytes, without joining.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(String::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accumulated, read-only evaluation state.
///
/// Obtained from [`EvaluationReducer::snapshot`]; an instance is
/// independent of the reducer that produced it, so consumers holding an
/// earlier snapshot are unaffected by later events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationState {
    /// Key→value bindings. Set-once: a key is never rebound.
    pub values: HashMap<String, EvaluationValue>,
    /// Stream name→buffer. Buffer content order is event arrival order.
    pub text_streams: HashMap<String, StreamBuffer>,
}

impl EvaluationState {
    pub fn value(&self, key: &str) -> Option<&EvaluationValue> {
        self.values.get(key)
    }

    /// Joined contents of the named stream, empty if the stream has not
    /// produced any text yet.
    pub fn stream_contents(&self, stream: &str) -> String {
        self.text_streams
            .get(stream)
            .map(StreamBuffer::contents)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Closed,
}

/// # EvaluationReducer
///
/// Owns the mutable [`EvaluationState`] for one evaluation session.
///
/// ```rust
/// use liveval::event::EvaluationEvent;
/// use liveval::reducer::EvaluationReducer;
/// use liveval::value::EvaluationValue;
///
/// let mut reducer = EvaluationReducer::initial();
/// reducer
///     .apply_event(&EvaluationEvent::value("my_score", EvaluationValue::score(2.4)))
///     .unwrap();
/// let snapshot = reducer.snapshot();
/// assert_eq!(snapshot.value("my_score"), Some(&EvaluationValue::score(2.4)));
/// ```
#[derive(Debug)]
pub struct EvaluationReducer {
    state: EvaluationState,
    phase: Phase,
}

impl EvaluationReducer {
    /// An open reducer over empty maps.
    pub fn initial() -> Self {
        Self {
            state: EvaluationState::default(),
            phase: Phase::Open,
        }
    }

    /// Applies one event.
    ///
    /// A `value` event for an already-bound key fails with
    /// [`ReducerError::DuplicateKey`] and leaves the state untouched; more
    /// than one value per key is a protocol violation, reported rather than
    /// silently resolved. Unknown event kinds are ignored so newer protocol
    /// versions do not break older consumers.
    pub fn apply_event(&mut self, event: &EvaluationEvent) -> ReducerResult<()> {
        if self.phase == Phase::Closed {
            return Err(ReducerError::Closed);
        }
        match event {
            EvaluationEvent::Value { key, value } => {
                if self.state.values.contains_key(key) {
                    return Err(ReducerError::DuplicateKey { key: key.clone() });
                }
                trace!(key = %key, kind = value.kind(), "applying value event");
                self.state.values.insert(key.clone(), value.clone());
            }
            EvaluationEvent::Text { stream, text } => {
                trace!(stream = %stream, bytes = text.len(), "applying text event");
                self.state
                    .text_streams
                    .entry(stream.clone())
                    .or_default()
                    .push(text.clone());
            }
            EvaluationEvent::Unknown => {}
        }
        Ok(())
    }

    /// An independent read-only copy of the accumulated state.
    pub fn snapshot(&self) -> EvaluationState {
        self.state.clone()
    }

    /// Read access without copying, for the single owner.
    pub fn state(&self) -> &EvaluationState {
        &self.state
    }

    /// Ends the session. Idempotent: closing an already-closed reducer is a
    /// no-op. State applied so far is retained and still snapshottable.
    pub fn close(&mut self) {
        self.phase = Phase::Closed;
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }
}

impl Default for EvaluationReducer {
    fn default() -> Self {
        Self::initial()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReducerError {
    /// A second `value` event arrived for `key`. Fatal to the session.
    #[error("value already defined for key: {key}")]
    DuplicateKey { key: String },

    /// `apply_event` was called after `close`. Programmer error.
    #[error("reducer is closed")]
    Closed,
}

pub type ReducerResult<T> = Result<T, ReducerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Status;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn score_event(key: &str, score: f64) -> EvaluationEvent {
        EvaluationEvent::value(key, EvaluationValue::score(score))
    }

    #[test]
    fn test_initial_is_empty_and_open() {
        let reducer = EvaluationReducer::initial();
        assert!(!reducer.is_closed());
        assert_eq!(reducer.snapshot(), EvaluationState::default());
    }

    #[test]
    fn test_duplicate_key_fails_without_mutation() {
        let mut reducer = EvaluationReducer::initial();
        reducer.apply_event(&score_event("k", 1.0)).unwrap();
        let before = reducer.snapshot();

        let err = reducer.apply_event(&score_event("k", 2.0)).unwrap_err();
        assert_eq!(
            err,
            ReducerError::DuplicateKey {
                key: "k".to_string()
            }
        );
        assert_eq!(reducer.snapshot(), before);
        assert_eq!(
            reducer.state().value("k"),
            Some(&EvaluationValue::score(1.0))
        );
    }

    #[test]
    fn test_text_events_concatenate_in_arrival_order() {
        let mut reducer = EvaluationReducer::initial();
        for chunk in ["a", "b", "b", "c"] {
            reducer
                .apply_event(&EvaluationEvent::text("stdout", chunk))
                .unwrap();
        }
        assert_eq!(reducer.state().stream_contents("stdout"), "abbc");
        assert_eq!(reducer.state().stream_contents("stderr"), "");
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let mut reducer = EvaluationReducer::initial();
        reducer.apply_event(&EvaluationEvent::Unknown).unwrap();
        assert_eq!(reducer.snapshot(), EvaluationState::default());
    }

    #[test]
    fn test_snapshot_is_independent_of_later_events() {
        let mut reducer = EvaluationReducer::initial();
        reducer
            .apply_event(&EvaluationEvent::text("stdout", "first"))
            .unwrap();
        let snapshot = reducer.snapshot();

        reducer
            .apply_event(&EvaluationEvent::text("stdout", " second"))
            .unwrap();
        reducer
            .apply_event(&EvaluationEvent::value(
                "st",
                EvaluationValue::status(Status::Success),
            ))
            .unwrap();

        assert_eq!(snapshot.stream_contents("stdout"), "first");
        assert_eq!(snapshot.value("st"), None);
        assert_eq!(reducer.state().stream_contents("stdout"), "first second");
    }

    #[test]
    fn test_close_is_idempotent_and_rejects_events() {
        let mut reducer = EvaluationReducer::initial();
        reducer.apply_event(&score_event("k", 1.0)).unwrap();

        reducer.close();
        reducer.close();
        assert!(reducer.is_closed());

        let err = reducer.apply_event(&score_event("other", 2.0)).unwrap_err();
        assert_eq!(err, ReducerError::Closed);
        // applied state survives closure
        assert_eq!(
            reducer.state().value("k"),
            Some(&EvaluationValue::score(1.0))
        );
    }

    proptest! {
        /// Value events on distinct keys commute: either application order
        /// produces the same values map.
        #[test]
        fn prop_value_events_commute_across_keys(
            key_a in "[a-z]{1,8}",
            key_b in "[a-z]{1,8}",
            score_a in -100.0f64..100.0,
            score_b in -100.0f64..100.0,
        ) {
            prop_assume!(key_a != key_b);
            let (ea, eb) = (score_event(&key_a, score_a), score_event(&key_b, score_b));

            let mut forward = EvaluationReducer::initial();
            forward.apply_event(&ea).unwrap();
            forward.apply_event(&eb).unwrap();

            let mut reverse = EvaluationReducer::initial();
            reverse.apply_event(&eb).unwrap();
            reverse.apply_event(&ea).unwrap();

            prop_assert_eq!(forward.snapshot().values, reverse.snapshot().values);
        }

        /// The buffer of a stream equals the concatenation of its text
        /// events in arrival order.
        #[test]
        fn prop_text_buffer_equals_concatenation(chunks in proptest::collection::vec(".{0,16}", 0..12)) {
            let mut reducer = EvaluationReducer::initial();
            for chunk in &chunks {
                reducer.apply_event(&EvaluationEvent::text("out", chunk.clone())).unwrap();
            }
            prop_assert_eq!(reducer.state().stream_contents("out"), chunks.concat());
        }
    }
}
