use std::env;
use time::Duration;

use crate::services::battery_gate::GatePolicy;
use crate::services::fcm::DEFAULT_FCM_SEND_URL;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub service_token: String,
    /// Absent means push delivery is disabled; rows are still persisted
    pub fcm_server_key: Option<String>,
    pub fcm_send_url: String,
    pub battery_alert_threshold: i64,
    pub battery_alert_cooldown_hours: i64,
    pub battery_alert_min_drop: i64,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://lockwatch.db?mode=rwc".to_string());

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let service_token =
            env::var("SERVICE_TOKEN").map_err(|_| ConfigError::MissingServiceToken)?;

        let fcm_server_key = env::var("FCM_SERVER_KEY").ok();

        let fcm_send_url =
            env::var("FCM_SEND_URL").unwrap_or_else(|_| DEFAULT_FCM_SEND_URL.to_string());

        let battery_alert_threshold = env::var("BATTERY_ALERT_THRESHOLD")
            .unwrap_or_else(|_| "20".to_string())
            .parse()
            .unwrap_or(20);

        let battery_alert_cooldown_hours = env::var("BATTERY_ALERT_COOLDOWN_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);

        let battery_alert_min_drop = env::var("BATTERY_ALERT_MIN_DROP")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let debug = env::var("DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Config {
            database_url,
            server_host,
            server_port,
            service_token,
            fcm_server_key,
            fcm_send_url,
            battery_alert_threshold,
            battery_alert_cooldown_hours,
            battery_alert_min_drop,
            debug,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Gate knobs as one explicit value; validated where the gate is built
    pub fn gate_policy(&self) -> GatePolicy {
        GatePolicy {
            threshold: self.battery_alert_threshold,
            cooldown: Duration::hours(self.battery_alert_cooldown_hours),
            min_drop: self.battery_alert_min_drop,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SERVICE_TOKEN environment variable not set")]
    MissingServiceToken,

    #[error("Invalid port number")]
    InvalidPort,
}
