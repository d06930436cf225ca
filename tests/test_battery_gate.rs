mod helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use time::macros::datetime;
use time::Duration;

use helpers::mocks::MockHistoryStore;
use lockwatch::models::BatteryAlertRecord;
use lockwatch::services::{BatteryAlertGate, Decision, GateError, GatePolicy};

fn policy() -> GatePolicy {
    GatePolicy {
        threshold: 20,
        cooldown: Duration::hours(24),
        min_drop: 5,
    }
}

fn gate_over(store: Arc<MockHistoryStore>) -> BatteryAlertGate {
    BatteryAlertGate::new(store, policy()).expect("valid policy")
}

#[tokio::test]
async fn test_above_threshold_suppresses_without_touching_history() {
    let store = Arc::new(MockHistoryStore::new());
    let gate = gate_over(store.clone());
    let now = datetime!(2025-01-15 10:00:00 UTC);

    let decision = gate.observe("dev-1", 45, now).await.unwrap();

    assert_eq!(decision, Decision::Suppress);
    assert!(store.record().is_none());
    assert_eq!(store.cas_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_first_observation_emits_and_creates_record() {
    let store = Arc::new(MockHistoryStore::new());
    let gate = gate_over(store.clone());
    let now = datetime!(2025-01-15 10:00:00 UTC);

    let decision = gate.observe("dev-1", 15, now).await.unwrap();

    assert_eq!(decision, Decision::Emit);
    let record = store.record().expect("record created");
    assert_eq!(record.device_id, "dev-1");
    assert_eq!(record.last_alert_at, now);
    assert_eq!(record.battery_level_at_alert, 15);
    assert_eq!(record.alert_count, 1);
}

#[tokio::test]
async fn test_flat_readings_inside_cooldown_stay_suppressed() {
    let t0 = datetime!(2025-01-15 10:00:00 UTC);
    let store = Arc::new(MockHistoryStore::with_record(
        BatteryAlertRecord::first_alert("dev-1", 15, t0),
    ));
    let gate = gate_over(store.clone());

    for hours in [1, 6, 12, 23] {
        let decision = gate
            .observe("dev-1", 15, t0 + Duration::hours(hours))
            .await
            .unwrap();
        assert_eq!(decision, Decision::Suppress, "at +{}h", hours);
    }

    // suppressed observations never touch the record
    let record = store.record().unwrap();
    assert_eq!(record.alert_count, 1);
    assert_eq!(record.battery_level_at_alert, 15);
    assert_eq!(record.last_alert_at, t0);
}

#[tokio::test]
async fn test_cooldown_boundary_is_inclusive() {
    // elapsed == cooldown must emit - the classic off-by-one lives here
    let t0 = datetime!(2025-01-15 10:00:00 UTC);
    let store = Arc::new(MockHistoryStore::with_record(
        BatteryAlertRecord::first_alert("dev-1", 15, t0),
    ));
    let gate = gate_over(store.clone());

    let decision = gate
        .observe("dev-1", 15, t0 + Duration::hours(24))
        .await
        .unwrap();

    assert_eq!(decision, Decision::Emit);
    assert_eq!(store.record().unwrap().alert_count, 2);
}

#[tokio::test]
async fn test_min_drop_realert_then_identical_level_suppresses() {
    // monotonic re-alert: after re-firing at the lower level, the same
    // level immediately after has drop 0 and must suppress
    let t0 = datetime!(2025-01-15 10:00:00 UTC);
    let store = Arc::new(MockHistoryStore::with_record(
        BatteryAlertRecord::first_alert("dev-1", 15, t0),
    ));
    let gate = gate_over(store.clone());

    let t1 = t0 + Duration::hours(2);
    assert_eq!(gate.observe("dev-1", 9, t1).await.unwrap(), Decision::Emit);

    let record = store.record().unwrap();
    assert_eq!(record.battery_level_at_alert, 9);
    assert_eq!(record.last_alert_at, t1);
    assert_eq!(record.alert_count, 2);

    let t2 = t1 + Duration::minutes(5);
    assert_eq!(
        gate.observe("dev-1", 9, t2).await.unwrap(),
        Decision::Suppress
    );
    assert_eq!(store.record().unwrap().alert_count, 2);
}

#[tokio::test]
async fn test_scenario_chain_threshold20_cooldown24h_mindrop5() {
    let store = Arc::new(MockHistoryStore::new());
    let gate = gate_over(store.clone());
    let t0 = datetime!(2025-01-15 10:00:00 UTC);

    // no prior record, level 15 -> emit
    assert_eq!(gate.observe("dev-1", 15, t0).await.unwrap(), Decision::Emit);
    let record = store.record().unwrap();
    assert_eq!(record.last_alert_at, t0);
    assert_eq!(record.battery_level_at_alert, 15);
    assert_eq!(record.alert_count, 1);

    // 1 hour later, still 15 -> suppress (inside cooldown, drop 0)
    assert_eq!(
        gate.observe("dev-1", 15, t0 + Duration::hours(1))
            .await
            .unwrap(),
        Decision::Suppress
    );

    // 2 hours later, 9 -> emit (drop 6 >= 5)
    let t_realert = t0 + Duration::hours(2);
    assert_eq!(
        gate.observe("dev-1", 9, t_realert).await.unwrap(),
        Decision::Emit
    );
    let record = store.record().unwrap();
    assert_eq!(record.last_alert_at, t_realert);
    assert_eq!(record.battery_level_at_alert, 9);
    assert_eq!(record.alert_count, 2);

    // 25 hours after the last emit, unchanged level -> emit (cooldown elapsed)
    assert_eq!(
        gate.observe("dev-1", 9, t_realert + Duration::hours(25))
            .await
            .unwrap(),
        Decision::Emit
    );
    assert_eq!(store.record().unwrap().alert_count, 3);
}

#[tokio::test]
async fn test_out_of_range_level_is_rejected_before_store_access() {
    let store = Arc::new(MockHistoryStore::new());
    let gate = gate_over(store.clone());
    let now = datetime!(2025-01-15 10:00:00 UTC);

    for level in [-1, 101, 250] {
        let err = gate.observe("dev-1", level, now).await.unwrap_err();
        assert!(matches!(err, GateError::InvalidInput(_)), "level {}", level);
    }

    assert_eq!(store.get_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.cas_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_outage_fails_closed() {
    let store = Arc::new(MockHistoryStore::new());
    store.set_unavailable(true);
    let gate = gate_over(store.clone());
    let now = datetime!(2025-01-15 10:00:00 UTC);

    let err = gate.observe("dev-1", 15, now).await.unwrap_err();

    assert!(matches!(err, GateError::StoreUnavailable(_)));
    store.set_unavailable(false);
    assert!(store.record().is_none());
}

#[tokio::test]
async fn test_lost_race_reevaluates_against_winning_record() {
    // two concurrent observations with identical inputs: the loser must
    // see the winner's record and suppress, not double-increment
    let store = Arc::new(MockHistoryStore::new());
    let t0 = datetime!(2025-01-15 10:00:00 UTC);
    store.force_conflicts(1);
    store.set_conflict_winner(BatteryAlertRecord::first_alert("dev-1", 15, t0));
    let gate = gate_over(store.clone());

    let decision = gate
        .observe("dev-1", 15, t0 + Duration::seconds(1))
        .await
        .unwrap();

    assert_eq!(decision, Decision::Suppress);
    let record = store.record().unwrap();
    assert_eq!(record.alert_count, 1);
    assert_eq!(record.battery_level_at_alert, 15);
    // the retry decided from the fresh read, no second write was attempted
    assert_eq!(store.cas_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_second_conflict_surfaces_error() {
    let store = Arc::new(MockHistoryStore::new());
    store.force_conflicts(2);
    let gate = gate_over(store.clone());
    let now = datetime!(2025-01-15 10:00:00 UTC);

    let err = gate.observe("dev-1", 15, now).await.unwrap_err();

    assert!(matches!(err, GateError::ConcurrentConflict(_)));
    assert_eq!(store.cas_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalid_policy_is_rejected_at_construction() {
    let store = Arc::new(MockHistoryStore::new());

    let result = BatteryAlertGate::new(
        store,
        GatePolicy {
            threshold: 150,
            cooldown: Duration::hours(24),
            min_drop: 5,
        },
    );

    assert!(matches!(result, Err(GateError::InvalidInput(_))));
}
