use sqlx::Row;
use std::collections::BTreeMap;

use crate::{
    api::middleware::error::ApiResult,
    database::Database,
    models::{
        now_rfc3339, DeliveryAttempt, Notification, NotificationStats, NotificationStatus,
        NotificationType,
    },
};

impl Database {
    pub async fn create_notification(&self, notification: &Notification) -> ApiResult<()> {
        let data_json = serde_json::to_string(&notification.data).unwrap_or_default();

        sqlx::query(
            "INSERT INTO notifications (id, user_id, notification_type, priority, title, body, data,
                                        device_id, gateway_id, ekey_id, status, provider_message_id,
                                        sent_at, read_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(notification.notification_type.as_str())
        .bind(notification.priority.as_str())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&data_json)
        .bind(&notification.device_id)
        .bind(&notification.gateway_id)
        .bind(&notification.ekey_id)
        .bind(notification.status.as_str())
        .bind(&notification.provider_message_id)
        .bind(&notification.sent_at)
        .bind(&notification.read_at)
        .bind(&notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_notification_by_id(&self, id: &str) -> ApiResult<Option<Notification>> {
        let row = sqlx::query(
            "SELECT id, user_id, notification_type, priority, title, body, data,
                    device_id, gateway_id, ekey_id, status, provider_message_id,
                    sent_at, read_at, created_at
             FROM notifications
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(map_notification_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> ApiResult<Vec<Notification>> {
        let rows = if unread_only {
            sqlx::query(
                "SELECT id, user_id, notification_type, priority, title, body, data,
                        device_id, gateway_id, ekey_id, status, provider_message_id,
                        sent_at, read_at, created_at
                 FROM notifications
                 WHERE user_id = ? AND read_at IS NULL
                 ORDER BY created_at DESC
                 LIMIT ? OFFSET ?",
            )
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT id, user_id, notification_type, priority, title, body, data,
                        device_id, gateway_id, ekey_id, status, provider_message_id,
                        sent_at, read_at, created_at
                 FROM notifications
                 WHERE user_id = ?
                 ORDER BY created_at DESC
                 LIMIT ? OFFSET ?",
            )
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        };

        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(map_notification_row(&row)?);
        }

        Ok(notifications)
    }

    /// Persist status, provider message ID and sent timestamp after a
    /// delivery attempt (or a skip)
    pub async fn update_notification_delivery(
        &self,
        notification: &Notification,
    ) -> ApiResult<()> {
        sqlx::query(
            "UPDATE notifications
             SET status = ?, provider_message_id = ?, sent_at = ?
             WHERE id = ?",
        )
        .bind(notification.status.as_str())
        .bind(&notification.provider_message_id)
        .bind(&notification.sent_at)
        .bind(&notification.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_notification_as_read(&self, id: &str) -> ApiResult<()> {
        let now = now_rfc3339();

        sqlx::query(
            "UPDATE notifications
             SET status = 'read', read_at = ?
             WHERE id = ?",
        )
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_all_notifications_as_read(&self, user_id: &str) -> ApiResult<i64> {
        let now = now_rfc3339();

        let result = sqlx::query(
            "UPDATE notifications
             SET status = 'read', read_at = ?
             WHERE user_id = ? AND read_at IS NULL",
        )
        .bind(&now)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() as i64)
    }

    pub async fn get_unread_count(&self, user_id: &str) -> ApiResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count
             FROM notifications
             WHERE user_id = ? AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("count")?)
    }

    pub async fn get_notification_stats(&self, user_id: &str) -> ApiResult<NotificationStats> {
        let totals = sqlx::query(
            "SELECT COUNT(*) as total,
                    COUNT(CASE WHEN read_at IS NULL THEN 1 END) as unread
             FROM notifications
             WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = totals.try_get("total")?;
        let unread: i64 = totals.try_get("unread")?;

        let type_rows = sqlx::query(
            "SELECT notification_type, COUNT(*) as count
             FROM notifications
             WHERE user_id = ?
             GROUP BY notification_type",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_type = BTreeMap::new();
        for row in type_rows {
            let notification_type: String = row.try_get("notification_type")?;
            let count: i64 = row.try_get("count")?;
            by_type.insert(notification_type, count);
        }

        let priority_rows = sqlx::query(
            "SELECT priority, COUNT(*) as count
             FROM notifications
             WHERE user_id = ?
             GROUP BY priority",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_priority = BTreeMap::new();
        for row in priority_rows {
            let priority: String = row.try_get("priority")?;
            let count: i64 = row.try_get("count")?;
            by_priority.insert(priority, count);
        }

        Ok(NotificationStats {
            total,
            unread,
            by_type,
            by_priority,
        })
    }

    pub async fn create_delivery_attempt(&self, attempt: &DeliveryAttempt) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO notification_delivery_log (id, notification_id, attempt_number,
                                                    provider_response, status, error_message, attempted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&attempt.id)
        .bind(&attempt.notification_id)
        .bind(attempt.attempt_number)
        .bind(&attempt.provider_response)
        .bind(attempt.status.as_str())
        .bind(&attempt.error_message)
        .bind(&attempt.attempted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_delivery_attempts(
        &self,
        notification_id: &str,
    ) -> ApiResult<Vec<DeliveryAttempt>> {
        let rows = sqlx::query(
            "SELECT id, notification_id, attempt_number, provider_response, status,
                    error_message, attempted_at
             FROM notification_delivery_log
             WHERE notification_id = ?
             ORDER BY attempted_at ASC",
        )
        .bind(notification_id)
        .fetch_all(&self.pool)
        .await?;

        let mut attempts = Vec::new();
        for row in rows {
            let status_str: String = row.try_get("status")?;
            attempts.push(DeliveryAttempt {
                id: row.try_get("id")?,
                notification_id: row.try_get("notification_id")?,
                attempt_number: row.try_get("attempt_number")?,
                provider_response: row.try_get("provider_response").ok(),
                status: status_str.into(),
                error_message: row.try_get("error_message").ok(),
                attempted_at: row.try_get("attempted_at")?,
            });
        }

        Ok(attempts)
    }
}

fn map_notification_row(row: &sqlx::any::AnyRow) -> ApiResult<Notification> {
    let notification_type_str: String = row.try_get("notification_type")?;
    let priority_str: String = row.try_get("priority")?;
    let status_str: String = row.try_get("status")?;
    let data_json: Option<String> = row.try_get("data").ok();
    let data: BTreeMap<String, String> = data_json
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default();

    Ok(Notification {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        notification_type: NotificationType::from(notification_type_str),
        priority: priority_str.into(),
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        data,
        device_id: row.try_get("device_id").ok(),
        gateway_id: row.try_get("gateway_id").ok(),
        ekey_id: row.try_get("ekey_id").ok(),
        status: NotificationStatus::from(status_str),
        provider_message_id: row.try_get("provider_message_id").ok(),
        sent_at: row.try_get("sent_at").ok(),
        read_at: row.try_get("read_at").ok(),
        created_at: row.try_get("created_at")?,
    })
}
