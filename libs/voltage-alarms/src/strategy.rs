//! Event ingestion strategy
//!
//! Folds events into the cache. Classification is on
//! `(event.completed, alarm exists for event.linked_to)`:
//!
//! | completed | alarm exists | action                          |
//! |-----------|--------------|---------------------------------|
//! | true      | true         | remove event from active set    |
//! | true      | false        | `OrphanCompletion` (fatal)      |
//! | false     | true         | add event to active set         |
//! | false     | false        | create alarm under event's key  |

use crate::alarm::Alarm;
use crate::cache::AlarmCache;
use crate::error::{AlarmError, Result};
use crate::types::Event;
use tracing::{debug, error, info};

/// What a single tossed event did to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TossOutcome {
    /// New alarm opened
    Created,
    /// Folded into an existing alarm; `inserted` is false for a repeated id
    Added { inserted: bool },
    /// Closed on an existing alarm; `removed` is false if it was not active
    Removed { removed: bool },
}

/// Counters for one processed batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub events: usize,
    pub created: usize,
    pub added: usize,
    pub removed: usize,
    /// Start events whose id was already active
    pub duplicates: usize,
    /// Completions whose id was not active
    pub stale_completions: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: TossOutcome) {
        self.events += 1;
        match outcome {
            TossOutcome::Created => self.created += 1,
            TossOutcome::Added { inserted: true } => self.added += 1,
            TossOutcome::Added { inserted: false } => self.duplicates += 1,
            TossOutcome::Removed { removed: true } => self.removed += 1,
            TossOutcome::Removed { removed: false } => self.stale_completions += 1,
        }
    }
}

/// Policy folding raw events into alarms
pub trait EventProcessStrategy {
    /// Fold one event into the cache
    fn toss_event<C>(&self, evt: &Event, cache: &mut C) -> Result<TossOutcome>
    where
        C: AlarmCache + ?Sized;

    /// Fold a batch strictly in order, one event at a time.
    ///
    /// Stops at the first failing event; earlier events stay applied.
    fn process_event_batch<C>(&self, events: &[Event], cache: &mut C) -> Result<BatchSummary>
    where
        C: AlarmCache + ?Sized,
    {
        let mut summary = BatchSummary::default();
        for (index, evt) in events.iter().enumerate() {
            let outcome = self
                .toss_event(evt, cache)
                .map_err(|source| AlarmError::BatchAborted {
                    index,
                    source: Box::new(source),
                })?;
            summary.record(outcome);
        }
        info!(
            "Processed {} events: {} created, {} added, {} removed",
            summary.events, summary.created, summary.added, summary.removed
        );
        Ok(summary)
    }
}

/// Direct table-driven strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleEventStrategy;

impl EventProcessStrategy for SimpleEventStrategy {
    fn toss_event<C>(&self, evt: &Event, cache: &mut C) -> Result<TossOutcome>
    where
        C: AlarmCache + ?Sized,
    {
        let key = evt.linked_to;
        match cache.try_get_mut(&key) {
            Some(alarm) if evt.completed => {
                let removed = alarm.remove_event(evt);
                debug!("Event {} closed (active: {})", evt, alarm.event_count());
                Ok(TossOutcome::Removed { removed })
            },
            None if evt.completed => {
                error!("Completion event {} has no open alarm", evt);
                Err(AlarmError::OrphanCompletion {
                    event_id: evt.id,
                    key,
                })
            },
            Some(alarm) => {
                let inserted = alarm.add_event(evt.clone());
                debug!("Event {} folded (active: {})", evt, alarm.event_count());
                Ok(TossOutcome::Added { inserted })
            },
            None => {
                cache.add(key, Alarm::from_event(evt.clone()))?;
                debug!("Event {} opened alarm {}", evt, key);
                Ok(TossOutcome::Created)
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::alarm::AlarmState;
    use crate::cache::MemoryAlarmCache;
    use crate::types::LinkKey;
    use tracing_test::traced_test;

    const K: LinkKey = LinkKey::new(1, 1);

    #[test]
    fn test_start_creates_then_adds() {
        let mut cache = MemoryAlarmCache::new();
        let sut = SimpleEventStrategy;

        assert_eq!(
            sut.toss_event(&Event::start(1, K), &mut cache).unwrap(),
            TossOutcome::Created
        );
        assert_eq!(
            sut.toss_event(&Event::start(2, K), &mut cache).unwrap(),
            TossOutcome::Added { inserted: true }
        );
        assert_eq!(
            sut.toss_event(&Event::start(2, K), &mut cache).unwrap(),
            TossOutcome::Added { inserted: false }
        );
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.try_get(&K).unwrap().event_count(), 2);
    }

    #[test]
    fn test_completion_removes() {
        let mut cache = MemoryAlarmCache::new();
        let sut = SimpleEventStrategy;
        sut.toss_event(&Event::start(1, K), &mut cache).unwrap();

        assert_eq!(
            sut.toss_event(&Event::completion(1, K), &mut cache).unwrap(),
            TossOutcome::Removed { removed: true }
        );
        assert_eq!(
            sut.toss_event(&Event::completion(1, K), &mut cache).unwrap(),
            TossOutcome::Removed { removed: false }
        );
        // Alarm stays until closure is confirmed and purged
        assert_eq!(cache.try_get(&K).unwrap().event_count(), 0);
    }

    #[test]
    fn test_orphan_completion_is_fatal() {
        let mut cache = MemoryAlarmCache::new();
        let err = SimpleEventStrategy
            .toss_event(&Event::completion(1, K), &mut cache)
            .unwrap_err();
        assert!(matches!(
            err,
            AlarmError::OrphanCompletion { event_id: 1, key } if key == K
        ));
        assert!(cache.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_orphan_completion_is_logged() {
        let mut cache = MemoryAlarmCache::new();
        let _ = SimpleEventStrategy.toss_event(&Event::completion(3, K), &mut cache);
        assert!(logs_contain("has no open alarm"));
    }

    #[test]
    fn test_batch_in_order() {
        let mut cache = MemoryAlarmCache::new();
        let batch = vec![
            Event::start(1, K),
            Event::start(2, K),
            Event::completion(1, K),
        ];
        let summary = SimpleEventStrategy
            .process_event_batch(&batch, &mut cache)
            .unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                events: 3,
                created: 1,
                added: 1,
                removed: 1,
                ..Default::default()
            }
        );
        let alarm = cache.try_get(&K).unwrap();
        assert_eq!(alarm.event_count(), 1);
        assert!(alarm.contains_event(2));
        assert_eq!(alarm.history(), &[1, 2]);
        assert_eq!(alarm.state(), AlarmState::New);
    }

    #[test]
    fn test_batch_aborts_at_orphan() {
        let mut cache = MemoryAlarmCache::new();
        let other = LinkKey::new(9, 9);
        let batch = vec![
            Event::start(1, K),
            Event::completion(5, other),
            Event::start(2, K),
        ];
        let err = SimpleEventStrategy
            .process_event_batch(&batch, &mut cache)
            .unwrap_err();

        assert!(matches!(err, AlarmError::BatchAborted { index: 1, .. }));
        assert!(err.is_invariant_violation());
        // Event before the failure applied, event after it not
        let alarm = cache.try_get(&K).unwrap();
        assert!(alarm.contains_event(1));
        assert!(!alarm.contains_event(2));
    }
}
