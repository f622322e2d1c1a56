//! Alarm entity and publication lifecycle
//!
//! An alarm aggregates every active event under one link key. Its state only
//! moves through two external drivers:
//! - refresh before a snapshot (`New → AlarmPending`, empty → `FinishPending`)
//! - merge of subscriber acknowledgments (`*Pending → *Sent`, closure → `Completed`)

use crate::types::{Event, EventId, LinkKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, trace};
use uuid::Uuid;

/// Publication lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmState {
    /// Created by ingestion, never exported
    New,
    /// Waiting for the subscriber to publish the alarm
    AlarmPending,
    /// Subscriber confirmed the alarm
    AlarmSent,
    /// All events closed, waiting for the subscriber to publish the closure
    FinishPending,
    /// Subscriber confirmed the closure
    FinishedSent,
    /// Terminal, eligible for purge
    Completed,
}

impl AlarmState {
    /// States awaiting delivery to the subscriber
    pub fn is_unnotified(self) -> bool {
        matches!(self, AlarmState::AlarmPending | AlarmState::FinishPending)
    }

    pub fn is_terminal(self) -> bool {
        self == AlarmState::Completed
    }

    /// Position in the lifecycle, `New` = 0 through `Completed` = 5
    pub fn rank(self) -> u8 {
        match self {
            AlarmState::New => 0,
            AlarmState::AlarmPending => 1,
            AlarmState::AlarmSent => 2,
            AlarmState::FinishPending => 3,
            AlarmState::FinishedSent => 4,
            AlarmState::Completed => 5,
        }
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Aggregate of active and historical events under one link key
///
/// `Clone` is the deep copy used at the export boundary: the copy owns its
/// own event set and history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alarm {
    id: Uuid,
    state: AlarmState,
    key: LinkKey,
    events: HashSet<Event>,
    history: Vec<EventId>,
}

impl Alarm {
    /// Open a new alarm from its first event
    pub fn from_event(evt: Event) -> Self {
        let key = evt.linked_to;
        let history = vec![evt.id];
        let mut events = HashSet::with_capacity(1);
        events.insert(evt);
        Self {
            id: Uuid::new_v4(),
            state: AlarmState::New,
            key,
            events,
            history,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn key(&self) -> LinkKey {
        self.key
    }

    /// Ids of every event ever folded into this alarm, in arrival order
    pub fn history(&self) -> &[EventId] {
        &self.history
    }

    /// Number of currently active events
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn contains_event(&self, id: EventId) -> bool {
        self.events.iter().any(|e| e.id == id)
    }

    /// Active events, unordered
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Insert into the active set; the id is appended to history either way
    pub fn add_event(&mut self, evt: Event) -> bool {
        self.history.push(evt.id);
        self.events.insert(evt)
    }

    /// Remove from the active set; history is untouched
    pub fn remove_event(&mut self, evt: &Event) -> bool {
        self.events.remove(evt)
    }

    pub fn short_view(&self) -> ShortView {
        ShortView {
            id: self.id,
            state: self.state,
            key: self.key,
        }
    }

    /// Recompute publish-eligible state ahead of an export.
    ///
    /// `New` becomes `AlarmPending`; an empty alarm then goes to
    /// `FinishPending`, overriding the first step. Closure-side states
    /// (`FinishPending`, `FinishedSent`, `Completed`) are never rewritten, so
    /// a confirmed closure stays `Completed` until `purge_completed_alarms`
    /// removes it. Returns whether the state changed.
    pub(crate) fn refresh_for_view(&mut self) -> bool {
        let before = self.state;
        if self.state == AlarmState::New {
            self.state = AlarmState::AlarmPending;
        }
        if self.events.is_empty()
            && matches!(self.state, AlarmState::AlarmPending | AlarmState::AlarmSent)
        {
            self.state = AlarmState::FinishPending;
        }
        if before != self.state {
            trace!("Alarm {} refreshed {} -> {}", self.key, before, self.state);
        }
        before != self.state
    }

    /// Apply a subscriber-reported state.
    ///
    /// Reports ranked below the local state are stale and ignored. A closure
    /// is only confirmed while the alarm has no active events; an alarm that
    /// picked up events after its closure was exported stays `FinishPending`.
    /// Returns whether the state changed.
    pub(crate) fn acknowledge(&mut self, reported: AlarmState) -> bool {
        if reported.rank() < self.state.rank() {
            return false;
        }
        match (self.state, reported) {
            (AlarmState::AlarmPending, AlarmState::AlarmSent) => {
                self.state = AlarmState::AlarmSent;
                true
            },
            (
                AlarmState::FinishPending | AlarmState::FinishedSent,
                AlarmState::FinishedSent | AlarmState::Completed,
            ) => {
                if !self.events.is_empty() {
                    debug!(
                        "Alarm {} closure held back, {} events active again",
                        self.key,
                        self.events.len()
                    );
                    return false;
                }
                if self.state == AlarmState::FinishPending {
                    self.state = AlarmState::FinishedSent;
                    trace!("Alarm {} closure confirmed", self.key);
                }
                self.state = AlarmState::Completed;
                true
            },
            _ => false,
        }
    }
}

impl PartialEq for Alarm {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.state == other.state && self.key == other.key
    }
}

impl Eq for Alarm {}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id:{}, s:{}, k:{}, actev:{}, histev:{}",
            self.id,
            self.state,
            self.key,
            self.events.len(),
            self.history.len()
        )
    }
}

/// Projection of an alarm crossing the subscriber boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortView {
    pub id: Uuid,
    pub state: AlarmState,
    pub key: LinkKey,
}

impl ShortView {
    /// Same view carrying a different reported state
    pub fn with_state(self, state: AlarmState) -> Self {
        Self { state, ..self }
    }
}
