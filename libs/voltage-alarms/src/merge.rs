//! Backpropagation merge of subscriber acknowledgments
//!
//! Local state always wins unless a view carries a strictly more advanced
//! state for the same alarm:
//! - `AlarmSent` advances `AlarmPending → AlarmSent`
//! - `FinishedSent` advances `FinishPending → FinishedSent → Completed`,
//!   unless the alarm picked up new events after its closure was exported
//!
//! A view is matched by link key and must carry the id of the alarm
//! currently cached under that key; views for replaced or purged alarms are
//! ignored.

use crate::alarm::ShortView;
use crate::cache::AlarmCache;
use tracing::{debug, warn};

/// Outcome counters for one merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Views that advanced an alarm
    pub advanced: usize,
    /// Views that did not advance local state
    pub unchanged: usize,
    /// Views with no matching alarm (unknown key or different id)
    pub unknown: usize,
}

/// Reconcile acknowledged views into the cache
pub fn merge_sent_alarms<C>(views: &[ShortView], cache: &mut C) -> MergeReport
where
    C: AlarmCache + ?Sized,
{
    let mut report = MergeReport::default();

    for view in views {
        let Some(alarm) = cache.try_get_mut(&view.key) else {
            warn!("Merge view for unknown key {} ignored", view.key);
            report.unknown += 1;
            continue;
        };

        if alarm.id() != view.id {
            warn!(
                "Merge view {} does not match alarm {} under key {}",
                view.id,
                alarm.id(),
                view.key
            );
            report.unknown += 1;
            continue;
        }

        let before = alarm.state();
        if alarm.acknowledge(view.state) {
            debug!(
                "Alarm {} merged {} -> {} (reported {})",
                view.key,
                before,
                alarm.state(),
                view.state
            );
            report.advanced += 1;
        } else {
            report.unchanged += 1;
        }
    }

    report
}
