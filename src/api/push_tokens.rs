use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, ApiResult, AppState};
use crate::api::notifications::SuccessResponse;

#[derive(Debug, Deserialize)]
pub struct RegisterPushTokenRequest {
    pub token: String,
}

/// Register or replace a user's FCM device token.
///
/// Called by the mobile client after login.
pub async fn register_push_token(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<RegisterPushTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.token.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Push token must not be empty".to_string(),
        ));
    }

    state.db.upsert_push_token(&user_id, &request.token).await?;

    tracing::info!("Push token registered for user {}", user_id);

    Ok(Json(SuccessResponse {
        message: "Push token registered".to_string(),
    }))
}

/// Remove a user's push token (logout or app uninstall).
///
/// Idempotent: removing an absent token is not an error.
pub async fn remove_push_token(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let removed = state.db.delete_push_token(&user_id).await?;

    if removed {
        tracing::info!("Push token removed for user {}", user_id);
    }

    Ok(Json(SuccessResponse {
        message: "Push token removed".to_string(),
    }))
}
