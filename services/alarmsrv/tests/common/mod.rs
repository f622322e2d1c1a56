//! Common test utilities and helpers

#![allow(dead_code)]

use alarmsrv::{config::CycleConfig, AlarmService, Notifier};
use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use voltage_alarms::{MemoryAlarmCache, SharedAlarmCache, ShortView};

/// Fast cycle configuration for tests
pub fn test_cycle() -> CycleConfig {
    CycleConfig {
        notify_interval_ms: 5,
        purge_after_merge: true,
    }
}

/// Build a service over an empty cache
pub fn create_test_service(notifier: Arc<dyn Notifier>) -> AlarmService {
    AlarmService::new(
        SharedAlarmCache::new(MemoryAlarmCache::new()),
        notifier,
        test_cycle(),
    )
}

/// Notifier that records deliveries and echoes views back unchanged
#[derive(Default)]
pub struct SilentNotifier {
    pub deliveries: Mutex<Vec<Vec<ShortView>>>,
}

#[async_trait]
impl Notifier for SilentNotifier {
    async fn deliver(&self, views: Vec<ShortView>) -> Result<Vec<ShortView>> {
        self.deliveries.lock().push(views.clone());
        Ok(views)
    }
}

/// Notifier whose transport is always down
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn deliver(&self, _views: Vec<ShortView>) -> Result<Vec<ShortView>> {
        bail!("subscriber unreachable")
    }
}
