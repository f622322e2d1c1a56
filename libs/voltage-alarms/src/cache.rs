//! Alarm cache - alarms keyed by link identity
//!
//! `AlarmCache` is the capability the ingestion strategy and the merge
//! protocol work against. Implementations:
//! - `MemoryAlarmCache`: in-memory store used by the service
//! - test doubles wrapping it to observe calls

use crate::alarm::{Alarm, ShortView};
use crate::error::{AlarmError, Result};
use crate::types::LinkKey;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

/// Addressable store of alarms, at most one per link key
pub trait AlarmCache {
    /// Read without side effect
    fn try_get(&self, key: &LinkKey) -> Option<&Alarm>;

    /// Mutable access for ingestion and merge
    fn try_get_mut(&mut self, key: &LinkKey) -> Option<&mut Alarm>;

    /// Insert under `key`; fails with `DuplicateKey` and leaves the cache
    /// unchanged if the key is taken
    fn add(&mut self, key: LinkKey, alarm: Alarm) -> Result<()>;

    /// Remove if present
    fn remove(&mut self, key: &LinkKey) -> bool;

    /// Number of alarms held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply the pre-export state refresh to every alarm. Idempotent.
    fn refresh_for_external_viewer(&mut self);

    /// Refresh, then deep copies of every alarm awaiting delivery
    fn get_unnotified_alarms(&mut self) -> Vec<Alarm>;

    /// Refresh, then short views of every alarm awaiting delivery
    fn get_unnotified_alarms_short_view(&mut self) -> Vec<ShortView>;

    /// Drop every `Completed` alarm, returning how many were removed
    fn purge_completed_alarms(&mut self) -> usize;
}

/// In-memory alarm cache
#[derive(Debug, Default)]
pub struct MemoryAlarmCache {
    alarms: FxHashMap<LinkKey, Alarm>,
}

impl MemoryAlarmCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache from previously persisted alarms
    ///
    /// Each alarm is keyed by its own link key; two alarms sharing a key
    /// reject the whole collection.
    pub fn from_alarms<I>(alarms: I) -> Result<Self>
    where
        I: IntoIterator<Item = Alarm>,
    {
        let mut cache = Self::new();
        for alarm in alarms {
            cache.add(alarm.key(), alarm)?;
        }
        if !cache.alarms.is_empty() {
            info!("Alarm cache restored with {} alarms", cache.alarms.len());
        }
        Ok(cache)
    }

    /// Deep copies of every alarm, sorted by key
    pub fn all_alarms(&self) -> Vec<Alarm> {
        let mut alarms: Vec<Alarm> = self.alarms.values().cloned().collect();
        alarms.sort_by_key(Alarm::key);
        alarms
    }

    /// Unnotified alarms in key order, borrowed
    fn unnotified(&self) -> Vec<&Alarm> {
        let mut pending: Vec<&Alarm> = self
            .alarms
            .values()
            .filter(|a| a.state().is_unnotified())
            .collect();
        pending.sort_by_key(|a| a.key());
        pending
    }
}

impl AlarmCache for MemoryAlarmCache {
    fn try_get(&self, key: &LinkKey) -> Option<&Alarm> {
        self.alarms.get(key)
    }

    fn try_get_mut(&mut self, key: &LinkKey) -> Option<&mut Alarm> {
        self.alarms.get_mut(key)
    }

    fn add(&mut self, key: LinkKey, alarm: Alarm) -> Result<()> {
        use std::collections::hash_map::Entry;

        match self.alarms.entry(key) {
            Entry::Occupied(_) => Err(AlarmError::DuplicateKey(key)),
            Entry::Vacant(slot) => {
                slot.insert(alarm);
                Ok(())
            },
        }
    }

    fn remove(&mut self, key: &LinkKey) -> bool {
        self.alarms.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.alarms.len()
    }

    fn refresh_for_external_viewer(&mut self) {
        let changed = self
            .alarms
            .values_mut()
            .map(Alarm::refresh_for_view)
            .filter(|changed| *changed)
            .count();
        if changed > 0 {
            debug!("Refreshed {} alarm states", changed);
        }
    }

    fn get_unnotified_alarms(&mut self) -> Vec<Alarm> {
        self.refresh_for_external_viewer();
        self.unnotified().into_iter().cloned().collect()
    }

    fn get_unnotified_alarms_short_view(&mut self) -> Vec<ShortView> {
        self.refresh_for_external_viewer();
        self.unnotified()
            .into_iter()
            .map(Alarm::short_view)
            .collect()
    }

    fn purge_completed_alarms(&mut self) -> usize {
        let before = self.alarms.len();
        self.alarms.retain(|_, alarm| !alarm.state().is_terminal());
        let purged = before - self.alarms.len();
        if purged > 0 {
            info!("Purged {} completed alarms", purged);
        }
        purged
    }
}
