//! Alarm Service Library
//!
//! Runs the alarm aggregation engine from `voltage-alarms`: restores
//! persisted alarms, replays event batches, and drives the periodic
//! notify / merge / purge cycle against a notifier.

pub mod config;
pub mod logging;
pub mod notifier;
pub mod replay;
pub mod service;

pub use config::AlarmSrvConfig;
pub use notifier::{AutoAckNotifier, Notifier};
pub use service::{AlarmService, CycleReport};
