//! # liveval: Live Evaluation Presentation Core
//!
//! liveval turns a live, unordered-across-keys stream of scoring events into
//! a queryable snapshot, and maps a declarative, task-authored report schema
//! onto that snapshot to produce renderable cell values. It is the core of a
//! contest-evaluation UI: transports, component trees and styling are
//! external collaborators consuming the interfaces exposed here.
//!
//! ## Architecture
//!
//! ### 1. Value and Event Model
//! Closed, serde-tagged sum types for scoring values ([`value`]) and
//! evaluation events ([`event`]). Unknown event kinds decode to an explicit
//! variant and are ignored, so the protocol can evolve without breaking
//! older consumers.
//!
//! ### 2. Event Feed
//! An in-process broadcast channel of encoded event payloads ([`feed`]),
//! standing in for the live subscription transport. One message per event;
//! the payload is a JSON string decoded by the consumer.
//!
//! ### 3. State Reduction
//! A single-writer reducer ([`reducer`]) accumulating set-once key→value
//! bindings and per-stream text buffers, with independent snapshots and an
//! open/closed lifecycle.
//!
//! ### 4. Presentation
//! Constant-or-reference expressions ([`expr`]) resolved against snapshots,
//! a data-only report schema ([`section`]) loaded from task metadata, and a
//! per-column-kind formatter ([`render`]) producing display values plus row
//! classification labels.
//!
//! ### 5. Observation
//! The observer task ([`observer`]) wires it together: it decodes feed
//! messages, drives the reducer, and publishes throttled snapshots (with a
//! trailing flush) on a watch channel until the session ends, fails, or is
//! unsubscribed.
//!
//! ## Data flow
//!
//! ```text
//! transport → EventFeed → EvaluationObserver → EvaluationReducer
//!                                   │
//!                                   ▼ (throttled snapshots)
//!                     ObserverUpdate(EvaluationState)
//!                                   │
//!     TaskMetadata(Sections) ───────┤
//!                                   ▼
//!                     render_sections → RenderedSection
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod expr;
pub mod feed;
pub mod l10n;
pub mod observer;
pub mod reducer;
pub mod render;
pub mod section;
pub mod value;

// Re-exports
pub use config::{ObserverConfig, RenderConfig};
pub use error::{Error, InternalResult};
pub use event::EvaluationEvent;
pub use expr::ValueExpression;
pub use feed::{EventFeed, EventMessage, EventReceiver};
pub use l10n::{localize, Localized};
pub use observer::{EvaluationObserver, ObserverUpdate};
pub use reducer::{EvaluationReducer, EvaluationState};
pub use render::{render_section, render_sections, DisplayValue, RenderedSection};
pub use section::{Section, TaskMetadata};
pub use value::{EvaluationValue, Status};
