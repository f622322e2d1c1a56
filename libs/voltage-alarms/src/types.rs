//! Input type definitions
//!
//! - LinkKey: composite identifier grouping events into one incident
//! - Event: start or completion of a condition under a link key

use crate::error::AlarmError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Event identifier, unique within one event stream
pub type EventId = i64;

// ============================================================================
// Link Key
// ============================================================================

/// Logical link shared by all events of one incident
///
/// Textual form is `"dim1:dim2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkKey {
    pub dim1: i64,
    pub dim2: i64,
}

impl LinkKey {
    pub const fn new(dim1: i64, dim2: i64) -> Self {
        Self { dim1, dim2 }
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.dim1, self.dim2)
    }
}

impl FromStr for LinkKey {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (d1, d2) = s
            .split_once(':')
            .ok_or_else(|| AlarmError::InvalidLinkKey(s.to_string()))?;
        let dim1 = d1
            .trim()
            .parse()
            .map_err(|_| AlarmError::InvalidLinkKey(s.to_string()))?;
        let dim2 = d2
            .trim()
            .parse()
            .map_err(|_| AlarmError::InvalidLinkKey(s.to_string()))?;
        Ok(Self { dim1, dim2 })
    }
}

// ============================================================================
// Event
// ============================================================================

/// Start or completion signal for a condition
///
/// Identity is the `id` alone: two events sharing an id are the same event
/// whatever their other fields say.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub linked_to: LinkKey,
    #[serde(default)]
    pub completed: bool,
}

impl Event {
    /// Event opening a condition
    pub fn start(id: EventId, linked_to: LinkKey) -> Self {
        Self {
            id,
            linked_to,
            completed: false,
        }
    }

    /// Event closing a previously started condition
    pub fn completion(id: EventId, linked_to: LinkKey) -> Self {
        Self {
            id,
            linked_to,
            completed: true,
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.completed { "end" } else { "start" };
        write!(f, "#{} {} @{}", self.id, kind, self.linked_to)
    }
}
