use serde::{Deserialize, Serialize};

use crate::models::NotificationType;

/// Domain event reported by the surrounding lock backend.
///
/// The backend owns devices, gateways and users; each event carries the
/// context this service needs (IDs plus display names) so no foreign tables
/// are consulted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeviceEvent {
    BatteryReport {
        device_id: String,
        device_name: String,
        owner_user_id: String,
        battery_level: i64,
    },
    DeviceUnlocked {
        device_id: String,
        device_name: String,
        owner_user_id: String,
        actor_name: String,
        method: String,
    },
    DeviceLocked {
        device_id: String,
        device_name: String,
        owner_user_id: String,
    },
    EkeyShared {
        device_id: String,
        device_name: String,
        ekey_id: String,
        issuer_name: String,
        recipient_user_id: String,
    },
    EkeyRevoked {
        device_id: String,
        device_name: String,
        recipient_user_id: String,
    },
    GatewayOffline {
        gateway_id: String,
        gateway_name: String,
        owner_user_id: String,
        affected_devices: i64,
    },
    GatewayOnline {
        gateway_id: String,
        gateway_name: String,
        owner_user_id: String,
    },
    SecurityAlert {
        device_id: String,
        device_name: String,
        owner_user_id: String,
        attempt_count: i64,
        attempt_type: String,
    },
    NewDeviceLogin {
        user_id: String,
        device_info: String,
        location: String,
        #[serde(default)]
        ip_address: Option<String>,
    },
}

impl DeviceEvent {
    pub fn notification_type(&self) -> NotificationType {
        match self {
            DeviceEvent::BatteryReport { .. } => NotificationType::LowBattery,
            DeviceEvent::DeviceUnlocked { .. } => NotificationType::DeviceUnlock,
            DeviceEvent::DeviceLocked { .. } => NotificationType::DeviceLock,
            DeviceEvent::EkeyShared { .. } => NotificationType::EkeyShared,
            DeviceEvent::EkeyRevoked { .. } => NotificationType::EkeyRevoked,
            DeviceEvent::GatewayOffline { .. } => NotificationType::GatewayOffline,
            DeviceEvent::GatewayOnline { .. } => NotificationType::GatewayOnline,
            DeviceEvent::SecurityAlert { .. } => NotificationType::SecurityAlert,
            DeviceEvent::NewDeviceLogin { .. } => NotificationType::NewDeviceLogin,
        }
    }

    /// User the resulting notification belongs to
    pub fn recipient(&self) -> &str {
        match self {
            DeviceEvent::BatteryReport { owner_user_id, .. }
            | DeviceEvent::DeviceUnlocked { owner_user_id, .. }
            | DeviceEvent::DeviceLocked { owner_user_id, .. }
            | DeviceEvent::GatewayOffline { owner_user_id, .. }
            | DeviceEvent::GatewayOnline { owner_user_id, .. }
            | DeviceEvent::SecurityAlert { owner_user_id, .. } => owner_user_id,
            DeviceEvent::EkeyShared {
                recipient_user_id, ..
            }
            | DeviceEvent::EkeyRevoked {
                recipient_user_id, ..
            } => recipient_user_id,
            DeviceEvent::NewDeviceLogin { user_id, .. } => user_id,
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        match self {
            DeviceEvent::BatteryReport { device_id, .. }
            | DeviceEvent::DeviceUnlocked { device_id, .. }
            | DeviceEvent::DeviceLocked { device_id, .. }
            | DeviceEvent::EkeyShared { device_id, .. }
            | DeviceEvent::EkeyRevoked { device_id, .. }
            | DeviceEvent::SecurityAlert { device_id, .. } => Some(device_id),
            _ => None,
        }
    }

    pub fn gateway_id(&self) -> Option<&str> {
        match self {
            DeviceEvent::GatewayOffline { gateway_id, .. }
            | DeviceEvent::GatewayOnline { gateway_id, .. } => Some(gateway_id),
            _ => None,
        }
    }

    pub fn ekey_id(&self) -> Option<&str> {
        match self {
            DeviceEvent::EkeyShared { ekey_id, .. } => Some(ekey_id),
            _ => None,
        }
    }
}
