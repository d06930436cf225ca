use std::sync::Arc;

use crate::{
    api::middleware::error::ApiResult,
    database::Database,
    models::{DeliveryAttempt, DeviceEvent, Notification},
    services::fcm::PushSender,
    services::messages::PushMessage,
};

/// What happened to the provider push for one notification.
///
/// Delivery failure is reported, never raised: a failed push must not abort
/// the operation that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { provider_message_id: String },
    Failed { error: String },
    Skipped { reason: String },
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered { .. } => "delivered",
            DeliveryOutcome::Failed { .. } => "failed",
            DeliveryOutcome::Skipped { .. } => "skipped",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            DeliveryOutcome::Delivered { .. } => None,
            DeliveryOutcome::Failed { error } => Some(error),
            DeliveryOutcome::Skipped { reason } => Some(reason),
        }
    }
}

/// Creates notification rows and pushes them through the provider.
///
/// `sender` is `None` when push delivery is disabled; rows are still
/// persisted so the in-app notification list stays complete.
#[derive(Clone)]
pub struct NotificationService {
    db: Database,
    sender: Option<Arc<dyn PushSender>>,
}

impl NotificationService {
    pub fn new(db: Database, sender: Option<Arc<dyn PushSender>>) -> Self {
        Self { db, sender }
    }

    /// Persist and deliver a notification for a device event.
    ///
    /// The returned pair separates the stored record from the delivery
    /// outcome; callers decide what a failed push means for them.
    pub async fn dispatch(
        &self,
        event: &DeviceEvent,
    ) -> ApiResult<(Notification, DeliveryOutcome)> {
        let message = PushMessage::for_event(event);
        let mut notification = Notification::new(
            event.recipient().to_string(),
            event.notification_type(),
            message.title.clone(),
            message.body.clone(),
            message.data.clone(),
            event.device_id().map(String::from),
            event.gateway_id().map(String::from),
            event.ekey_id().map(String::from),
        );

        self.db.create_notification(&notification).await?;
        tracing::info!(
            "Notification created: id={}, type={}, user={}",
            notification.id,
            notification.notification_type,
            notification.user_id
        );

        let Some(sender) = &self.sender else {
            notification.mark_skipped();
            self.db.update_notification_delivery(&notification).await?;
            tracing::debug!(
                "Push delivery disabled - notification {} stored only",
                notification.id
            );
            return Ok((
                notification,
                DeliveryOutcome::Skipped {
                    reason: "push delivery disabled".to_string(),
                },
            ));
        };

        let Some(token) = self.db.get_push_token(event.recipient()).await? else {
            notification.mark_skipped();
            self.db.update_notification_delivery(&notification).await?;
            tracing::debug!(
                "User {} has no push token - notification {} stored only",
                notification.user_id,
                notification.id
            );
            return Ok((
                notification,
                DeliveryOutcome::Skipped {
                    reason: "no push token registered".to_string(),
                },
            ));
        };

        match sender.send(&token, &message).await {
            Ok(provider_response) => {
                notification.mark_sent(provider_response.clone());
                self.db.update_notification_delivery(&notification).await?;
                self.db
                    .create_delivery_attempt(&DeliveryAttempt::success(
                        &notification.id,
                        provider_response.clone(),
                    ))
                    .await?;
                tracing::info!("Notification {} delivered", notification.id);
                Ok((
                    notification,
                    DeliveryOutcome::Delivered {
                        provider_message_id: provider_response,
                    },
                ))
            }
            Err(e) => {
                let error = e.to_string();
                notification.mark_failed();
                self.db.update_notification_delivery(&notification).await?;
                self.db
                    .create_delivery_attempt(&DeliveryAttempt::failed(
                        &notification.id,
                        error.clone(),
                    ))
                    .await?;
                tracing::warn!("Notification {} failed to deliver: {}", notification.id, error);
                Ok((notification, DeliveryOutcome::Failed { error }))
            }
        }
    }
}
