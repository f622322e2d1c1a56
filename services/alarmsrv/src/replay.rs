//! Replay input loading
//!
//! Event batches file: a JSON array of batches, each an array of events
//! addressed by textual link key:
//!
//! ```json
//! [
//!   [{"id": 1, "link": "1:1"}, {"id": 2, "link": "1:1"}],
//!   [{"id": 1, "link": "1:1", "completed": true}]
//! ]
//! ```
//!
//! Initial alarms file: a JSON array of alarms as serialized by the engine.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use voltage_alarms::{Alarm, Event, EventId, LinkKey};

#[derive(Debug, Deserialize)]
struct ReplayEvent {
    id: EventId,
    link: String,
    #[serde(default)]
    completed: bool,
}

impl ReplayEvent {
    fn into_event(self) -> Result<Event> {
        let linked_to: LinkKey = self
            .link
            .parse()
            .with_context(|| format!("event {} has bad link", self.id))?;
        Ok(Event {
            id: self.id,
            linked_to,
            completed: self.completed,
        })
    }
}

/// Parse event batches from JSON text
pub fn parse_event_batches(json: &str) -> Result<Vec<Vec<Event>>> {
    let raw: Vec<Vec<ReplayEvent>> =
        serde_json::from_str(json).context("Failed to parse event batches")?;
    raw.into_iter()
        .map(|batch| batch.into_iter().map(ReplayEvent::into_event).collect())
        .collect()
}

/// Load event batches from a JSON file
pub fn load_event_batches(path: &Path) -> Result<Vec<Vec<Event>>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read events file {}", path.display()))?;
    let batches = parse_event_batches(&json)?;
    info!(
        "Loaded {} event batches ({} events) from {}",
        batches.len(),
        batches.iter().map(Vec::len).sum::<usize>(),
        path.display()
    );
    Ok(batches)
}

/// Load persisted alarms from a JSON file
pub fn load_initial_alarms(path: &Path) -> Result<Vec<Alarm>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read alarms file {}", path.display()))?;
    let alarms: Vec<Alarm> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse alarms file {}", path.display()))?;
    Ok(alarms)
}
