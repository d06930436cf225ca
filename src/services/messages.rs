use std::collections::BTreeMap;

use crate::models::{DeviceEvent, NotificationPriority};

/// Payload handed to the push provider for one notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
    pub priority: NotificationPriority,
}

impl PushMessage {
    /// Build the provider payload for a device event.
    ///
    /// Data values are strings throughout; the provider rejects anything
    /// else in the data block.
    pub fn for_event(event: &DeviceEvent) -> Self {
        let mut data = BTreeMap::new();
        data.insert(
            "notification_type".to_string(),
            event.notification_type().as_str().to_string(),
        );

        let (title, body) = match event {
            DeviceEvent::BatteryReport {
                device_id,
                device_name,
                battery_level,
                ..
            } => {
                data.insert("device_id".to_string(), device_id.clone());
                data.insert("device_name".to_string(), device_name.clone());
                data.insert("battery_level".to_string(), battery_level.to_string());
                (
                    "Low Battery Alert".to_string(),
                    format!(
                        "{} battery is at {}%. Please replace soon.",
                        device_name, battery_level
                    ),
                )
            }
            DeviceEvent::DeviceUnlocked {
                device_id,
                device_name,
                actor_name,
                method,
                ..
            } => {
                data.insert("device_id".to_string(), device_id.clone());
                data.insert("actor_name".to_string(), actor_name.clone());
                data.insert("method".to_string(), method.clone());
                (
                    "Device Unlocked".to_string(),
                    format!("{} was unlocked by {} via {}", device_name, actor_name, method),
                )
            }
            DeviceEvent::DeviceLocked {
                device_id,
                device_name,
                ..
            } => {
                data.insert("device_id".to_string(), device_id.clone());
                data.insert("device_name".to_string(), device_name.clone());
                (
                    "Device Locked".to_string(),
                    format!("{} has been locked", device_name),
                )
            }
            DeviceEvent::EkeyShared {
                device_id,
                device_name,
                ekey_id,
                issuer_name,
                ..
            } => {
                data.insert("device_id".to_string(), device_id.clone());
                data.insert("ekey_id".to_string(), ekey_id.clone());
                data.insert("issuer_name".to_string(), issuer_name.clone());
                data.insert("device_name".to_string(), device_name.clone());
                (
                    "Access Shared".to_string(),
                    format!("{} shared access to {} with you", issuer_name, device_name),
                )
            }
            DeviceEvent::EkeyRevoked {
                device_id,
                device_name,
                ..
            } => {
                data.insert("device_id".to_string(), device_id.clone());
                data.insert("device_name".to_string(), device_name.clone());
                (
                    "Access Revoked".to_string(),
                    format!("Your access to {} has been revoked", device_name),
                )
            }
            DeviceEvent::GatewayOffline {
                gateway_id,
                gateway_name,
                affected_devices,
                ..
            } => {
                data.insert("gateway_id".to_string(), gateway_id.clone());
                data.insert("gateway_name".to_string(), gateway_name.clone());
                data.insert(
                    "affected_devices".to_string(),
                    affected_devices.to_string(),
                );
                (
                    "Gateway Offline".to_string(),
                    format!(
                        "{} is offline. {} devices affected.",
                        gateway_name, affected_devices
                    ),
                )
            }
            DeviceEvent::GatewayOnline {
                gateway_id,
                gateway_name,
                ..
            } => {
                data.insert("gateway_id".to_string(), gateway_id.clone());
                data.insert("gateway_name".to_string(), gateway_name.clone());
                (
                    "Gateway Online".to_string(),
                    format!("{} is back online", gateway_name),
                )
            }
            DeviceEvent::SecurityAlert {
                device_id,
                device_name,
                attempt_count,
                attempt_type,
                ..
            } => {
                data.insert("device_id".to_string(), device_id.clone());
                data.insert("device_name".to_string(), device_name.clone());
                data.insert("attempt_count".to_string(), attempt_count.to_string());
                data.insert("attempt_type".to_string(), attempt_type.clone());
                (
                    "Security Alert".to_string(),
                    format!(
                        "Unauthorized access attempts detected on {} ({}x)",
                        device_name, attempt_count
                    ),
                )
            }
            DeviceEvent::NewDeviceLogin {
                device_info,
                location,
                ip_address,
                ..
            } => {
                data.insert("device_info".to_string(), device_info.clone());
                data.insert("location".to_string(), location.clone());
                if let Some(ip) = ip_address {
                    data.insert("ip_address".to_string(), ip.clone());
                }
                (
                    "New Device Login".to_string(),
                    format!("Login detected from {} at {}", device_info, location),
                )
            }
        };

        Self {
            title,
            body,
            data,
            priority: event.notification_type().priority(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_battery_message_is_high_priority() {
        let event = DeviceEvent::BatteryReport {
            device_id: "dev-1".to_string(),
            device_name: "Front Door".to_string(),
            owner_user_id: "user-1".to_string(),
            battery_level: 15,
        };

        let message = PushMessage::for_event(&event);

        assert_eq!(message.title, "Low Battery Alert");
        assert_eq!(
            message.body,
            "Front Door battery is at 15%. Please replace soon."
        );
        assert_eq!(message.priority, NotificationPriority::High);
        assert_eq!(message.data.get("battery_level").unwrap(), "15");
        assert_eq!(message.data.get("device_id").unwrap(), "dev-1");
        assert_eq!(
            message.data.get("notification_type").unwrap(),
            "low_battery"
        );
    }

    #[test]
    fn test_unlock_message_names_actor_and_method() {
        let event = DeviceEvent::DeviceUnlocked {
            device_id: "dev-1".to_string(),
            device_name: "Front Door".to_string(),
            owner_user_id: "user-1".to_string(),
            actor_name: "Alice".to_string(),
            method: "fingerprint".to_string(),
        };

        let message = PushMessage::for_event(&event);

        assert_eq!(message.title, "Device Unlocked");
        assert_eq!(message.body, "Front Door was unlocked by Alice via fingerprint");
        assert_eq!(message.priority, NotificationPriority::Normal);
    }

    #[test]
    fn test_gateway_offline_reports_affected_device_count() {
        let event = DeviceEvent::GatewayOffline {
            gateway_id: "gw-1".to_string(),
            gateway_name: "Home Hub".to_string(),
            owner_user_id: "user-1".to_string(),
            affected_devices: 3,
        };

        let message = PushMessage::for_event(&event);

        assert_eq!(message.title, "Gateway Offline");
        assert_eq!(message.body, "Home Hub is offline. 3 devices affected.");
        assert_eq!(message.data.get("affected_devices").unwrap(), "3");
    }

    #[test]
    fn test_login_message_includes_ip_only_when_present() {
        let without_ip = PushMessage::for_event(&DeviceEvent::NewDeviceLogin {
            user_id: "user-1".to_string(),
            device_info: "Pixel 8".to_string(),
            location: "Berlin, DE".to_string(),
            ip_address: None,
        });
        assert!(!without_ip.data.contains_key("ip_address"));
        assert_eq!(without_ip.body, "Login detected from Pixel 8 at Berlin, DE");

        let with_ip = PushMessage::for_event(&DeviceEvent::NewDeviceLogin {
            user_id: "user-1".to_string(),
            device_info: "Pixel 8".to_string(),
            location: "Berlin, DE".to_string(),
            ip_address: Some("203.0.113.7".to_string()),
        });
        assert_eq!(with_ip.data.get("ip_address").unwrap(), "203.0.113.7");
    }

    #[test]
    fn test_every_message_carries_its_notification_type() {
        let events = [
            DeviceEvent::DeviceLocked {
                device_id: "dev-1".to_string(),
                device_name: "Front Door".to_string(),
                owner_user_id: "user-1".to_string(),
            },
            DeviceEvent::EkeyShared {
                device_id: "dev-1".to_string(),
                device_name: "Front Door".to_string(),
                ekey_id: "ekey-1".to_string(),
                issuer_name: "Alice".to_string(),
                recipient_user_id: "user-2".to_string(),
            },
            DeviceEvent::EkeyRevoked {
                device_id: "dev-1".to_string(),
                device_name: "Front Door".to_string(),
                recipient_user_id: "user-2".to_string(),
            },
            DeviceEvent::GatewayOnline {
                gateway_id: "gw-1".to_string(),
                gateway_name: "Home Hub".to_string(),
                owner_user_id: "user-1".to_string(),
            },
            DeviceEvent::SecurityAlert {
                device_id: "dev-1".to_string(),
                device_name: "Front Door".to_string(),
                owner_user_id: "user-1".to_string(),
                attempt_count: 4,
                attempt_type: "passcode".to_string(),
            },
        ];

        for event in &events {
            let message = PushMessage::for_event(event);
            assert_eq!(
                message.data.get("notification_type").unwrap(),
                event.notification_type().as_str()
            );
        }
    }
}
