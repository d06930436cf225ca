use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Kind of domain event a notification was created for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    LowBattery,
    DeviceUnlock,
    DeviceLock,
    EkeyShared,
    EkeyRevoked,
    GatewayOffline,
    GatewayOnline,
    SecurityAlert,
    NewDeviceLogin,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::LowBattery => "low_battery",
            NotificationType::DeviceUnlock => "device_unlock",
            NotificationType::DeviceLock => "device_lock",
            NotificationType::EkeyShared => "ekey_shared",
            NotificationType::EkeyRevoked => "ekey_revoked",
            NotificationType::GatewayOffline => "gateway_offline",
            NotificationType::GatewayOnline => "gateway_online",
            NotificationType::SecurityAlert => "security_alert",
            NotificationType::NewDeviceLogin => "new_device_login",
        }
    }

    /// Low battery is the only high-priority type
    pub fn priority(&self) -> NotificationPriority {
        match self {
            NotificationType::LowBattery => NotificationPriority::High,
            _ => NotificationPriority::Normal,
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for NotificationType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "low_battery" => NotificationType::LowBattery,
            "device_unlock" => NotificationType::DeviceUnlock,
            "device_lock" => NotificationType::DeviceLock,
            "ekey_shared" => NotificationType::EkeyShared,
            "ekey_revoked" => NotificationType::EkeyRevoked,
            "gateway_offline" => NotificationType::GatewayOffline,
            "gateway_online" => NotificationType::GatewayOnline,
            "security_alert" => NotificationType::SecurityAlert,
            _ => NotificationType::NewDeviceLogin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    High,
    Normal,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::High => "high",
            NotificationPriority::Normal => "normal",
        }
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for NotificationPriority {
    fn from(s: String) -> Self {
        match s.as_str() {
            "high" => NotificationPriority::High,
            _ => NotificationPriority::Normal,
        }
    }
}

/// Delivery lifecycle of a notification row.
///
/// `pending` only exists between row creation and the provider call;
/// `skipped` means processing finished without a provider call (no token
/// registered, or push delivery disabled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
    Skipped,
    Read,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "pending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
            NotificationStatus::Skipped => "skipped",
            NotificationStatus::Read => "read",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for NotificationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "sent" => NotificationStatus::Sent,
            "failed" => NotificationStatus::Failed,
            "skipped" => NotificationStatus::Skipped,
            "read" => NotificationStatus::Read,
            _ => NotificationStatus::Pending,
        }
    }
}

/// Notification entity persisted per user and pushed via FCM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub priority: NotificationPriority,
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ekey_id: Option<String>,
    pub status: NotificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
    pub created_at: String, // ISO 8601 timestamp
}

impl Notification {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        notification_type: NotificationType,
        title: String,
        body: String,
        data: BTreeMap<String, String>,
        device_id: Option<String>,
        gateway_id: Option<String>,
        ekey_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            notification_type,
            priority: notification_type.priority(),
            title,
            body,
            data,
            device_id,
            gateway_id,
            ekey_id,
            status: NotificationStatus::Pending,
            provider_message_id: None,
            sent_at: None,
            read_at: None,
            created_at: now_rfc3339(),
        }
    }

    /// Record a confirmed provider delivery
    pub fn mark_sent(&mut self, provider_message_id: String) {
        self.status = NotificationStatus::Sent;
        self.provider_message_id = Some(provider_message_id);
        self.sent_at = Some(now_rfc3339());
    }

    /// Record a provider delivery failure
    pub fn mark_failed(&mut self) {
        self.status = NotificationStatus::Failed;
    }

    /// Record that no provider call was made
    pub fn mark_skipped(&mut self) {
        self.status = NotificationStatus::Skipped;
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// Per-user notification statistics
#[derive(Debug, Clone, Serialize)]
pub struct NotificationStats {
    pub total: i64,
    pub unread: i64,
    pub by_type: BTreeMap<String, i64>,
    pub by_priority: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryLogStatus {
    Success,
    Failed,
}

impl DeliveryLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryLogStatus::Success => "success",
            DeliveryLogStatus::Failed => "failed",
        }
    }
}

impl From<String> for DeliveryLogStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "success" => DeliveryLogStatus::Success,
            _ => DeliveryLogStatus::Failed,
        }
    }
}

/// One provider send attempt for a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    pub id: String,
    pub notification_id: String,
    pub attempt_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_response: Option<String>,
    pub status: DeliveryLogStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub attempted_at: String,
}

impl DeliveryAttempt {
    pub fn success(notification_id: &str, provider_response: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            notification_id: notification_id.to_string(),
            attempt_number: 1,
            provider_response: Some(provider_response),
            status: DeliveryLogStatus::Success,
            error_message: None,
            attempted_at: now_rfc3339(),
        }
    }

    pub fn failed(notification_id: &str, error_message: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            notification_id: notification_id.to_string(),
            attempt_number: 1,
            provider_response: None,
            status: DeliveryLogStatus::Failed,
            error_message: Some(error_message),
            attempted_at: now_rfc3339(),
        }
    }
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap()
}
