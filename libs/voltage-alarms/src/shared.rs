//! Shared alarm cache handle
//!
//! Wraps a cache in one `parking_lot::Mutex`. Every method is a single
//! critical section and never suspends or performs I/O while holding the
//! lock; callers get deep copies they can hold without blocking ingestion.

use crate::alarm::{Alarm, ShortView};
use crate::cache::{AlarmCache, MemoryAlarmCache};
use crate::error::Result;
use crate::merge::{merge_sent_alarms, MergeReport};
use crate::strategy::{BatchSummary, EventProcessStrategy};
use crate::types::{Event, LinkKey};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable, lock-guarded cache handle
pub struct SharedAlarmCache<C: AlarmCache = MemoryAlarmCache> {
    inner: Arc<Mutex<C>>,
}

impl<C: AlarmCache> Clone for SharedAlarmCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: AlarmCache> SharedAlarmCache<C> {
    pub fn new(cache: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Fold one batch of events
    pub fn process_event_batch<S>(&self, strategy: &S, events: &[Event]) -> Result<BatchSummary>
    where
        S: EventProcessStrategy,
    {
        let mut cache = self.inner.lock();
        strategy.process_event_batch(events, &mut *cache)
    }

    /// Refresh and export short views of alarms awaiting delivery
    pub fn snapshot_short_view(&self) -> Vec<ShortView> {
        self.inner.lock().get_unnotified_alarms_short_view()
    }

    /// Refresh and export full copies of alarms awaiting delivery
    pub fn snapshot(&self) -> Vec<Alarm> {
        self.inner.lock().get_unnotified_alarms()
    }

    /// Reconcile subscriber acknowledgments
    pub fn merge_sent_alarms(&self, views: &[ShortView]) -> MergeReport {
        let mut cache = self.inner.lock();
        merge_sent_alarms(views, &mut *cache)
    }

    pub fn purge_completed_alarms(&self) -> usize {
        self.inner.lock().purge_completed_alarms()
    }

    /// Deep copy of the alarm under `key`
    pub fn get(&self, key: &LinkKey) -> Option<Alarm> {
        self.inner.lock().try_get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Run `f` with exclusive access to the cache
    pub fn with_cache<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut *self.inner.lock())
    }
}
