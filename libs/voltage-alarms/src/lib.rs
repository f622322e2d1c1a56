//! Voltage Alarms - Alarm Aggregation Engine
//!
//! Folds a stream of paired start/completion events into de-duplicated alarms
//! keyed by a logical link, and tracks each alarm through its publication
//! lifecycle:
//! - Event ingestion creating, updating and closing alarms
//! - Lazy refresh of publish-eligible state right before a snapshot
//! - Short-view export for an external notifier
//! - Backpropagation merge of subscriber acknowledgments and terminal purge
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Events    │────▶│   Strategy   │────▶│  AlarmCache  │
//! │  (batches)  │     │ (toss_event) │     │ (LinkKey→Alarm)
//! └─────────────┘     └──────────────┘     └──────────────┘
//!                                            │        ▲
//!                               refresh+export│        │merge / purge
//!                                            ▼        │
//!                                     ┌──────────────────┐
//!                                     │ Notifier (extern)│
//!                                     └──────────────────┘
//! ```
//!
//! The core performs no I/O. [`SharedAlarmCache`] wraps any cache in a single
//! lock so that every public operation is one critical section.

mod alarm;
mod cache;
mod error;
mod merge;
mod shared;
mod strategy;
pub mod types;

// Re-export public API
pub use alarm::{Alarm, AlarmState, ShortView};
pub use cache::{AlarmCache, MemoryAlarmCache};
pub use error::{AlarmError, Result};
pub use merge::{merge_sent_alarms, MergeReport};
pub use shared::SharedAlarmCache;
pub use strategy::{BatchSummary, EventProcessStrategy, SimpleEventStrategy, TossOutcome};
pub use types::{Event, EventId, LinkKey};
