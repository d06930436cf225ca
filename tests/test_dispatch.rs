mod helpers;

use std::sync::Arc;

use helpers::mocks::MockPushSender;
use helpers::test_db::setup_test_db;
use lockwatch::models::{DeliveryLogStatus, DeviceEvent, NotificationStatus};
use lockwatch::services::{DeliveryOutcome, NotificationService};

fn unlock_event() -> DeviceEvent {
    DeviceEvent::DeviceUnlocked {
        device_id: "dev-1".to_string(),
        device_name: "Front Door".to_string(),
        owner_user_id: "user-1".to_string(),
        actor_name: "Alice".to_string(),
        method: "app".to_string(),
    }
}

#[tokio::test]
async fn test_dispatch_delivers_and_logs() {
    let db = setup_test_db().await;
    db.upsert_push_token("user-1", "token-abc").await.unwrap();

    let sender = Arc::new(MockPushSender::succeeding("msg-001"));
    let service = NotificationService::new(db.clone(), Some(sender.clone()));

    let (notification, outcome) = service.dispatch(&unlock_event()).await.unwrap();

    assert_eq!(
        outcome,
        DeliveryOutcome::Delivered {
            provider_message_id: "msg-001".to_string()
        }
    );

    let stored = db
        .get_notification_by_id(&notification.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, NotificationStatus::Sent);
    assert_eq!(stored.provider_message_id, Some("msg-001".to_string()));
    assert!(stored.sent_at.is_some());
    assert_eq!(stored.title, "Device Unlocked");

    let attempts = db.list_delivery_attempts(&notification.id).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].status, DeliveryLogStatus::Success);
    assert_eq!(attempts[0].provider_response, Some("msg-001".to_string()));

    // the push went to the registered token
    let sent = sender.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "token-abc");
}

#[tokio::test]
async fn test_dispatch_failure_is_reported_not_raised() {
    let db = setup_test_db().await;
    db.upsert_push_token("user-1", "token-abc").await.unwrap();

    let sender = Arc::new(MockPushSender::failing("invalid registration token"));
    let service = NotificationService::new(db.clone(), Some(sender));

    let (notification, outcome) = service.dispatch(&unlock_event()).await.unwrap();

    match &outcome {
        DeliveryOutcome::Failed { error } => {
            assert!(error.contains("invalid registration token"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }

    let stored = db
        .get_notification_by_id(&notification.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, NotificationStatus::Failed);
    assert!(stored.sent_at.is_none());
    assert!(stored.provider_message_id.is_none());

    let attempts = db.list_delivery_attempts(&notification.id).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].status, DeliveryLogStatus::Failed);
    assert!(attempts[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("invalid registration token"));
}

#[tokio::test]
async fn test_dispatch_without_token_persists_and_skips() {
    let db = setup_test_db().await;

    let sender = Arc::new(MockPushSender::succeeding("msg-001"));
    let service = NotificationService::new(db.clone(), Some(sender.clone()));

    let (notification, outcome) = service.dispatch(&unlock_event()).await.unwrap();

    assert_eq!(
        outcome,
        DeliveryOutcome::Skipped {
            reason: "no push token registered".to_string()
        }
    );

    // the row is still there for the in-app list
    let stored = db
        .get_notification_by_id(&notification.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, NotificationStatus::Skipped);

    assert_eq!(sender.sent_count(), 0);
    assert!(db
        .list_delivery_attempts(&notification.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_dispatch_with_push_disabled_persists_and_skips() {
    let db = setup_test_db().await;
    db.upsert_push_token("user-1", "token-abc").await.unwrap();

    let service = NotificationService::new(db.clone(), None);

    let (notification, outcome) = service.dispatch(&unlock_event()).await.unwrap();

    assert_eq!(
        outcome,
        DeliveryOutcome::Skipped {
            reason: "push delivery disabled".to_string()
        }
    );

    let stored = db
        .get_notification_by_id(&notification.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, NotificationStatus::Skipped);
}
