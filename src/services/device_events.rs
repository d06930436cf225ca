use time::OffsetDateTime;

use crate::{
    api::middleware::error::ApiResult,
    models::{DeviceEvent, Notification},
    services::battery_gate::{BatteryAlertGate, Decision},
    services::notification_service::{DeliveryOutcome, NotificationService},
};

/// Result of handling one device event
#[derive(Debug, Clone)]
pub struct EventOutcome {
    pub decision: Decision,
    pub notification: Option<Notification>,
    pub delivery: Option<DeliveryOutcome>,
}

impl EventOutcome {
    fn suppressed() -> Self {
        Self {
            decision: Decision::Suppress,
            notification: None,
            delivery: None,
        }
    }

    fn emitted(notification: Notification, delivery: DeliveryOutcome) -> Self {
        Self {
            decision: Decision::Emit,
            notification: Some(notification),
            delivery: Some(delivery),
        }
    }
}

/// Entry point for device events reported by the lock backend.
///
/// Battery reports pass through the alert gate first; every other event
/// kind dispatches a notification unconditionally.
#[derive(Clone)]
pub struct DeviceEventService {
    gate: BatteryAlertGate,
    notifications: NotificationService,
}

impl DeviceEventService {
    pub fn new(gate: BatteryAlertGate, notifications: NotificationService) -> Self {
        Self { gate, notifications }
    }

    pub async fn handle(&self, event: DeviceEvent) -> ApiResult<EventOutcome> {
        if let DeviceEvent::BatteryReport {
            device_id,
            battery_level,
            ..
        } = &event
        {
            let decision = self
                .gate
                .observe(device_id, *battery_level, OffsetDateTime::now_utc())
                .await?;

            if decision == Decision::Suppress {
                // a suppressed observation is a healthy no-op
                tracing::debug!(
                    "Battery alert suppressed for device {} at {}%",
                    device_id,
                    battery_level
                );
                return Ok(EventOutcome::suppressed());
            }

            // Emit was decided and the tracker already updated; a failed
            // push below must not roll that back.
            let (notification, delivery) = self.notifications.dispatch(&event).await?;
            return Ok(EventOutcome::emitted(notification, delivery));
        }

        let (notification, delivery) = self.notifications.dispatch(&event).await?;
        Ok(EventOutcome::emitted(notification, delivery))
    }
}
