//! Alarm service - wires ingestion, notification and reconciliation
//!
//! Ingestion and the notify cycle share one locked cache. A cycle takes the
//! snapshot under the lock, releases it for delivery, then takes it again
//! for the merge and purge.

use crate::config::CycleConfig;
use crate::notifier::Notifier;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use voltage_alarms::{
    BatchSummary, Event, MergeReport, SharedAlarmCache, SimpleEventStrategy,
};

/// Channel depth for pending event batches
const BATCH_CHANNEL_CAPACITY: usize = 64;

/// Result of one notify / merge / purge cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub exported: usize,
    pub merge: MergeReport,
    pub purged: usize,
}

/// Alarm service
pub struct AlarmService {
    cache: SharedAlarmCache,
    strategy: SimpleEventStrategy,
    notifier: Arc<dyn Notifier>,
    cycle: CycleConfig,
}

impl AlarmService {
    pub fn new(cache: SharedAlarmCache, notifier: Arc<dyn Notifier>, cycle: CycleConfig) -> Self {
        Self {
            cache,
            strategy: SimpleEventStrategy,
            notifier,
            cycle,
        }
    }

    /// Handle to the underlying cache
    pub fn cache(&self) -> &SharedAlarmCache {
        &self.cache
    }

    /// Fold one batch into the cache
    pub fn ingest(&self, batch: &[Event]) -> voltage_alarms::Result<BatchSummary> {
        self.cache.process_event_batch(&self.strategy, batch)
    }

    /// Export, deliver, merge acknowledgments and optionally purge
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let views = self.cache.snapshot_short_view();
        let exported = views.len();
        if exported == 0 {
            return Ok(CycleReport::default());
        }

        let acks = self
            .notifier
            .deliver(views)
            .await
            .context("Alarm delivery failed")?;

        let merge = self.cache.merge_sent_alarms(&acks);
        let purged = if self.cycle.purge_after_merge {
            self.cache.purge_completed_alarms()
        } else {
            0
        };

        debug!(
            "Cycle: {} exported, {} advanced, {} unchanged, {} unknown, {} purged",
            exported, merge.advanced, merge.unchanged, merge.unknown, purged
        );
        Ok(CycleReport {
            exported,
            merge,
            purged,
        })
    }

    /// Ingest `batches` in order while cycles run on the configured interval.
    ///
    /// Returns after every batch is ingested and a final cycle has run. An
    /// ingestion invariant violation stops the service with an error; a failed
    /// delivery is logged and the alarms are re-exported on the next tick.
    pub async fn run(&self, batches: Vec<Vec<Event>>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<Vec<Event>>(BATCH_CHANNEL_CAPACITY);
        let producer = tokio::spawn(async move {
            for batch in batches {
                if tx.send(batch).await.is_err() {
                    break;
                }
            }
        });

        let mut ticker = interval(self.cycle.notify_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe_batch = rx.recv() => {
                    let Some(batch) = maybe_batch else { break };
                    if let Err(e) = self.ingest(&batch) {
                        let err = anyhow::Error::new(e).context("Event ingestion invariant violated");
                        error!("Ingestion halted: {:#}", err);
                        producer.abort();
                        return Err(err);
                    }
                },
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        warn!("Notify cycle failed, retrying next tick: {:#}", e);
                    }
                },
            }
        }

        let _ = producer.await;
        match self.run_cycle().await {
            Ok(report) => info!(
                "Replay finished: {} alarms cached, last cycle exported {} and purged {}",
                self.cache.len(),
                report.exported,
                report.purged
            ),
            Err(e) => warn!(
                "Replay finished: {} alarms cached, final cycle failed: {:#}",
                self.cache.len(),
                e
            ),
        }
        Ok(())
    }
}
