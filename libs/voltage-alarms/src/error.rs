//! Alarm Engine Error Types

use crate::types::{EventId, LinkKey};
use thiserror::Error;

/// Result type for alarm engine operations
pub type Result<T> = std::result::Result<T, AlarmError>;

/// Alarm engine errors
#[derive(Debug, Error)]
pub enum AlarmError {
    /// An alarm is already registered under this link key
    #[error("Duplicate alarm key: {0}")]
    DuplicateKey(LinkKey),

    /// A completion event arrived without an open alarm for its link key.
    ///
    /// This is an upstream contract breach and must halt ingestion.
    #[error("Completion event {event_id} has no open alarm for key {key}")]
    OrphanCompletion { event_id: EventId, key: LinkKey },

    /// Batch ingestion stopped at the event at `index`
    #[error("Event batch aborted at position {index}")]
    BatchAborted {
        index: usize,
        #[source]
        source: Box<AlarmError>,
    },

    /// Textual link key could not be parsed
    #[error("Invalid link key: {0}")]
    InvalidLinkKey(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AlarmError {
    /// Whether this error signals a broken ingestion invariant
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            AlarmError::OrphanCompletion { .. } => true,
            AlarmError::BatchAborted { source, .. } => source.is_invariant_violation(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for AlarmError {
    fn from(err: serde_json::Error) -> Self {
        AlarmError::Serialization(err.to_string())
    }
}
