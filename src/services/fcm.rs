use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::services::messages::PushMessage;

pub const DEFAULT_FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push provider returned HTTP {status}: {detail}")]
    Provider { status: u16, detail: String },
    #[error("push request failed: {0}")]
    Transport(String),
}

/// Sink that delivers a built message to one device token.
///
/// Returns the provider's response body on success, used as the provider
/// message ID in the delivery log.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<String, PushError>;
}

/// FCM client over the provider's HTTP send endpoint
pub struct FcmClient {
    http_client: Client,
    server_key: String,
    send_url: String,
}

impl FcmClient {
    pub fn new(server_key: String, send_url: String) -> Self {
        // 30-second timeout, same as outbound webhook delivery elsewhere
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http_client,
            server_key,
            send_url,
        }
    }
}

#[async_trait]
impl PushSender for FcmClient {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<String, PushError> {
        let payload = serde_json::json!({
            "to": token,
            "priority": message.priority.as_str(),
            "notification": {
                "title": message.title,
                "body": message.body,
                "sound": "default",
            },
            "data": message.data,
        });

        match self
            .http_client
            .post(&self.send_url)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                let status_code = status.as_u16();
                let body = response.text().await.unwrap_or_default();

                if status.is_success() {
                    info!("FCM send returned status {}", status_code);
                    Ok(body)
                } else {
                    let detail = if body.len() > 500 {
                        body[..500].to_string()
                    } else {
                        body
                    };
                    warn!("FCM send failed with HTTP {}: {}", status_code, detail);
                    Err(PushError::Provider {
                        status: status_code,
                        detail,
                    })
                }
            }
            Err(e) => {
                // Network error (timeout, connection refused, DNS failure, etc.)
                let error_msg = if e.is_timeout() {
                    format!("Connection timeout after 30 seconds: {}", e)
                } else if e.is_connect() {
                    format!("Connection failed: {}", e)
                } else {
                    format!("Network error: {}", e)
                };

                warn!("FCM send failed: {}", error_msg);
                Err(PushError::Transport(error_msg))
            }
        }
    }
}
