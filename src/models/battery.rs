use time::OffsetDateTime;

/// Battery alert history for a single device.
///
/// At most one record exists per device. `battery_level_at_alert` is always
/// the level that triggered `last_alert_at`; a suppressed observation never
/// touches the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatteryAlertRecord {
    pub device_id: String,
    pub last_alert_at: OffsetDateTime,
    pub battery_level_at_alert: i64,
    pub alert_count: i64,
}

impl BatteryAlertRecord {
    /// Record for a device's first emitted alert
    pub fn first_alert(device_id: impl Into<String>, level: i64, now: OffsetDateTime) -> Self {
        Self {
            device_id: device_id.into(),
            last_alert_at: now,
            battery_level_at_alert: level,
            alert_count: 1,
        }
    }

    /// Successor record after another alert was emitted for this device
    pub fn realerted(&self, level: i64, now: OffsetDateTime) -> Self {
        Self {
            device_id: self.device_id.clone(),
            last_alert_at: now,
            battery_level_at_alert: level,
            alert_count: self.alert_count + 1,
        }
    }
}
