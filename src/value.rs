//! Typed scoring values delivered by evaluation events and referenced by the
//! presentation schema. The set is closed: adding a variant is a
//! compile-checked decision everywhere values are matched, in particular in
//! the cell formatter.

use serde::{Deserialize, Serialize};

use crate::l10n::Localized;

/// Outcome classification of an evaluation step.
///
/// The `Display` form is the snake_case wire string (`"partial"` etc.),
/// which is also what the status column renders.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    Done,
    Success,
    Fail,
    Partial,
    Skip,
}

/// # EvaluationValue
///
/// A single typed datum produced during live scoring, tagged on the wire by
/// its `type` field:
///
/// ```json
/// {"type": "score", "score": 2.4}
/// {"type": "status", "status": "success"}
/// ```
///
/// Scores are unconstrained in sign; fractions are expected in `[0, 1]` and
/// time usage non-negative, but neither is enforced here: the reducer
/// stores what the evaluation reports and the formatter renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvaluationValue {
    Status { status: Status },
    Score { score: f64 },
    Fraction { fraction: f64 },
    TimeUsage { time_usage_seconds: f64 },
    MemoryUsage { memory_usage_bytes: u64 },
    Message { message: Localized<String> },
}

impl EvaluationValue {
    pub fn status(status: Status) -> Self {
        Self::Status { status }
    }

    pub fn score(score: f64) -> Self {
        Self::Score { score }
    }

    pub fn fraction(fraction: f64) -> Self {
        Self::Fraction { fraction }
    }

    pub fn time_usage(seconds: f64) -> Self {
        Self::TimeUsage {
            time_usage_seconds: seconds,
        }
    }

    pub fn memory_usage(bytes: u64) -> Self {
        Self::MemoryUsage {
            memory_usage_bytes: bytes,
        }
    }

    pub fn message(message: Localized<String>) -> Self {
        Self::Message { message }
    }

    /// Wire tag of this value, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Score { .. } => "score",
            Self::Fraction { .. } => "fraction",
            Self::TimeUsage { .. } => "time_usage",
            Self::MemoryUsage { .. } => "memory_usage",
            Self::Message { .. } => "message",
        }
    }
}
