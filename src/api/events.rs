use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::{
    api::middleware::{ApiError, ApiResult, AppState},
    models::DeviceEvent,
    services::{Decision, DeliveryOutcome, EventOutcome},
};

#[derive(Debug, Serialize)]
pub struct DeliveryReport {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&DeliveryOutcome> for DeliveryReport {
    fn from(outcome: &DeliveryOutcome) -> Self {
        Self {
            outcome: outcome.as_str(),
            detail: outcome.detail().map(String::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryReport>,
}

impl From<EventOutcome> for EventResponse {
    fn from(outcome: EventOutcome) -> Self {
        Self {
            decision: match outcome.decision {
                Decision::Emit => "emitted",
                Decision::Suppress => "suppressed",
            },
            notification_id: outcome.notification.map(|n| n.id),
            delivery: outcome.delivery.as_ref().map(DeliveryReport::from),
        }
    }
}

/// Ingest a device event from the lock backend
pub async fn ingest_event(
    State(state): State<AppState>,
    Json(event): Json<DeviceEvent>,
) -> ApiResult<impl IntoResponse> {
    if event.recipient().is_empty() {
        return Err(ApiError::BadRequest(
            "Event recipient user ID must not be empty".to_string(),
        ));
    }

    let outcome = state.events.handle(event).await?;

    Ok(Json(EventResponse::from(outcome)))
}
