//! Service integration tests

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use alarmsrv::{replay, AutoAckNotifier};
use std::io::Write;
use std::sync::Arc;
use voltage_alarms::{
    AlarmState, Event, EventProcessStrategy, LinkKey, MemoryAlarmCache, SimpleEventStrategy,
};

mod common;
use common::{create_test_service, FailingNotifier, SilentNotifier};

const K11: LinkKey = LinkKey::new(1, 1);
const K12: LinkKey = LinkKey::new(1, 2);

fn demo_batches() -> Vec<Vec<Event>> {
    replay::parse_event_batches(
        r#"[
            [{"id": 1, "link": "1:1"}, {"id": 2, "link": "1:1"}, {"id": 1, "link": "1:1"}],
            [{"id": 3, "link": "1:1"}, {"id": 2, "link": "1:1", "completed": true},
             {"id": 1, "link": "1:1", "completed": true}],
            [{"id": 5, "link": "1:2"}, {"id": 3, "link": "1:1", "completed": true},
             {"id": 9, "link": "1:2"}]
        ]"#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_replay_closes_and_purges_finished_links() {
    let notifier = Arc::new(AutoAckNotifier::new());
    let service = create_test_service(notifier.clone());

    service.run(demo_batches()).await.unwrap();

    let cache = service.cache();
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&K11).is_none());

    let open = cache.get(&K12).unwrap();
    assert_eq!(open.state(), AlarmState::AlarmSent);
    assert_eq!(open.event_count(), 2);
    assert_eq!(open.history(), &[5, 9]);
    assert!(notifier.delivered() >= 2);
}

#[tokio::test]
async fn test_orphan_completion_stops_service() {
    let service = create_test_service(Arc::new(AutoAckNotifier::new()));
    let batches = vec![vec![Event::start(1, K11)], vec![Event::completion(7, K12)]];

    let err = service.run(batches).await.unwrap_err();
    let chain = format!("{:#}", err);
    assert!(chain.contains("invariant violated"));
    assert!(chain.contains("no open alarm"));
    assert!(service.cache().get(&K11).is_some());
}

#[tokio::test]
async fn test_echoed_views_leave_state_pending() {
    let notifier = Arc::new(SilentNotifier::default());
    let service = create_test_service(notifier.clone());
    service.ingest(&[Event::start(1, K11)]).unwrap();

    let report = service.run_cycle().await.unwrap();
    assert_eq!(report.exported, 1);
    assert_eq!(report.merge.unchanged, 1);

    // Still unnotified, so exported again
    let report = service.run_cycle().await.unwrap();
    assert_eq!(report.exported, 1);
    assert_eq!(notifier.deliveries.lock().len(), 2);
    assert_eq!(
        service.cache().get(&K11).unwrap().state(),
        AlarmState::AlarmPending
    );
}

#[tokio::test]
async fn test_delivery_failure_keeps_local_state() {
    let service = create_test_service(Arc::new(FailingNotifier));
    service.ingest(&[Event::start(1, K11)]).unwrap();

    let err = service.run_cycle().await.unwrap_err();
    assert!(format!("{:#}", err).contains("subscriber unreachable"));
    assert_eq!(
        service.cache().get(&K11).unwrap().state(),
        AlarmState::AlarmPending
    );
}

#[tokio::test]
async fn test_run_survives_delivery_failures() {
    let service = create_test_service(Arc::new(FailingNotifier));
    let batches = vec![
        vec![Event::start(1, K11)],
        vec![Event::start(2, K12), Event::start(3, K11)],
    ];

    service.run(batches).await.unwrap();

    let cache = service.cache();
    assert_eq!(cache.len(), 2);
    let k11 = cache.get(&K11).unwrap();
    assert_eq!(k11.event_count(), 2);
    assert_eq!(k11.state(), AlarmState::AlarmPending);
    assert_eq!(cache.get(&K12).unwrap().state(), AlarmState::AlarmPending);
}

#[test]
fn test_initial_alarms_round_trip_through_file() {
    let mut source = MemoryAlarmCache::new();
    SimpleEventStrategy
        .process_event_batch(&[Event::start(1, K11), Event::start(2, K12)], &mut source)
        .unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "{}",
        serde_json::to_string(&source.all_alarms()).unwrap()
    )
    .unwrap();

    let alarms = replay::load_initial_alarms(file.path()).unwrap();
    let restored = MemoryAlarmCache::from_alarms(alarms).unwrap();
    assert_eq!(restored.all_alarms(), source.all_alarms());
}

#[test]
fn test_duplicate_initial_alarms_rejected() {
    let mut first = MemoryAlarmCache::new();
    SimpleEventStrategy
        .process_event_batch(&[Event::start(1, K11)], &mut first)
        .unwrap();
    let mut second = MemoryAlarmCache::new();
    SimpleEventStrategy
        .process_event_batch(&[Event::start(2, K11)], &mut second)
        .unwrap();

    let mut alarms = first.all_alarms();
    alarms.extend(second.all_alarms());
    assert!(MemoryAlarmCache::from_alarms(alarms).is_err());
}
