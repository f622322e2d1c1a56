//! Notifier - delivery of short views to the external subscriber
//!
//! The engine never talks to the subscriber itself. A notifier receives the
//! exported views and returns the acknowledgments to merge back.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;
use voltage_alarms::{AlarmState, ShortView};

/// Delivery collaborator
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `views` and return the subscriber's acknowledgments
    async fn deliver(&self, views: Vec<ShortView>) -> Result<Vec<ShortView>>;
}

/// Notifier that logs each view and confirms it immediately
#[derive(Debug, Default)]
pub struct AutoAckNotifier {
    delivered: AtomicUsize,
}

impl AutoAckNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total views delivered so far
    pub fn delivered(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }
}

/// Subscriber confirmation for a delivered view
pub fn confirm(view: ShortView) -> ShortView {
    match view.state {
        AlarmState::AlarmPending => view.with_state(AlarmState::AlarmSent),
        AlarmState::FinishPending => view.with_state(AlarmState::FinishedSent),
        _ => view,
    }
}

#[async_trait]
impl Notifier for AutoAckNotifier {
    async fn deliver(&self, views: Vec<ShortView>) -> Result<Vec<ShortView>> {
        for view in &views {
            info!("Notify alarm {} key {} state {}", view.id, view.key, view.state);
        }
        self.delivered.fetch_add(views.len(), Ordering::Relaxed);
        Ok(views.into_iter().map(confirm).collect())
    }
}
