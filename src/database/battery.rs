use async_trait::async_trait;
use sqlx::Row;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::{
    database::Database,
    models::{now_rfc3339, BatteryAlertRecord},
    services::battery_gate::{AlertHistoryStore, CasOutcome, StoreError},
};

fn unavailable(err: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn format_ts(ts: OffsetDateTime) -> Result<String, StoreError> {
    ts.format(&Rfc3339).map_err(unavailable)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message();
            message.contains("UNIQUE") || message.contains("unique") || message.contains("duplicate")
        }
        _ => false,
    }
}

#[async_trait]
impl AlertHistoryStore for Database {
    async fn get(&self, device_id: &str) -> Result<Option<BatteryAlertRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT device_id, last_alert_at, battery_level_at_alert, alert_count
             FROM battery_alert_trackers
             WHERE device_id = ?",
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        match row {
            Some(row) => {
                let last_alert_at_str: String = row.try_get("last_alert_at").map_err(unavailable)?;
                let last_alert_at =
                    OffsetDateTime::parse(&last_alert_at_str, &Rfc3339).map_err(unavailable)?;

                Ok(Some(BatteryAlertRecord {
                    device_id: row.try_get("device_id").map_err(unavailable)?,
                    last_alert_at,
                    battery_level_at_alert: row
                        .try_get("battery_level_at_alert")
                        .map_err(unavailable)?,
                    alert_count: row.try_get("alert_count").map_err(unavailable)?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Insert-if-absent rides on the `device_id` primary key; the
    /// present-expected path guards the update on every field of the
    /// previously read record, so a racing writer makes `rows_affected`
    /// come back zero.
    async fn compare_and_set(
        &self,
        expected: Option<&BatteryAlertRecord>,
        new: &BatteryAlertRecord,
    ) -> Result<CasOutcome, StoreError> {
        let now = now_rfc3339();
        let new_alert_at = format_ts(new.last_alert_at)?;

        match expected {
            None => {
                let result = sqlx::query(
                    "INSERT INTO battery_alert_trackers
                        (device_id, last_alert_at, battery_level_at_alert, alert_count, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&new.device_id)
                .bind(&new_alert_at)
                .bind(new.battery_level_at_alert)
                .bind(new.alert_count)
                .bind(&now)
                .bind(&now)
                .execute(&self.pool)
                .await;

                match result {
                    Ok(_) => Ok(CasOutcome::Applied),
                    Err(e) if is_unique_violation(&e) => Ok(CasOutcome::Conflict),
                    Err(e) => Err(unavailable(e)),
                }
            }
            Some(prev) => {
                let prev_alert_at = format_ts(prev.last_alert_at)?;

                let result = sqlx::query(
                    "UPDATE battery_alert_trackers
                     SET last_alert_at = ?, battery_level_at_alert = ?, alert_count = ?, updated_at = ?
                     WHERE device_id = ? AND last_alert_at = ? AND battery_level_at_alert = ? AND alert_count = ?",
                )
                .bind(&new_alert_at)
                .bind(new.battery_level_at_alert)
                .bind(new.alert_count)
                .bind(&now)
                .bind(&prev.device_id)
                .bind(&prev_alert_at)
                .bind(prev.battery_level_at_alert)
                .bind(prev.alert_count)
                .execute(&self.pool)
                .await
                .map_err(unavailable)?;

                if result.rows_affected() == 0 {
                    Ok(CasOutcome::Conflict)
                } else {
                    Ok(CasOutcome::Applied)
                }
            }
        }
    }
}
