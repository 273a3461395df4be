//! # Evaluation Events
//!
//! Atomic units of progress information delivered during live scoring: a
//! value becoming known under a key, or text appended to a named stream.
//! Events reach this crate as encoded JSON payloads (see
//! [`crate::feed::EventMessage`]) and are decoded here.
//!
//! ## Forward compatibility
//!
//! The event vocabulary evolves with the evaluation protocol. A payload with
//! a well-formed envelope but an unrecognized `type` decodes to
//! [`EvaluationEvent::Unknown`], which the reducer ignores; a payload that
//! does not decode at all is skipped (and logged) by the caller. Neither
//! case aborts a session.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::value::EvaluationValue;

/// A single evaluation event, tagged on the wire by its `type` field:
///
/// ```json
/// {"type": "value", "key": "my_score", "value": {"type": "score", "score": 2.4}}
/// {"type": "text", "stream": "stdout", "text": "Begin evaluation...\n"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvaluationEvent {
    /// Declares the value bound to `key`. At most one per key per session.
    Value {
        key: String,
        value: EvaluationValue,
    },
    /// Appends `text` to the named stream's buffer.
    Text { stream: String, text: String },
    /// An event kind introduced by a newer protocol version.
    #[serde(other)]
    Unknown,
}

impl EvaluationEvent {
    pub fn value(key: impl Into<String>, value: EvaluationValue) -> Self {
        Self::Value {
            key: key.into(),
            value,
        }
    }

    pub fn text(stream: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            stream: stream.into(),
            text: text.into(),
        }
    }

    /// Decodes a wire payload.
    ///
    /// Malformed payloads yield `None` after a warning; they are dropped at
    /// the event level so that one bad message cannot take down a session.
    pub fn decode(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(event) => Some(event),
            Err(error) => {
                warn!(%error, payload = json, "skipping malformed evaluation event");
                None
            }
        }
    }

    /// Encodes this event as a wire payload.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
