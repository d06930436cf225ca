use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    api::middleware::error::ApiError,
    database::Database,
    services::{DeviceEventService, NotificationService},
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub service_token: String,
    pub debug: bool,
    pub events: DeviceEventService,
    pub notifications: NotificationService,
}

/// Validate the shared service token from the Authorization header.
///
/// End-user authentication (JWT) lives in the surrounding backend; this
/// service only talks to trusted peers.
pub async fn require_service_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = if let Some(auth_value) = auth_header {
        if let Some(token) = auth_value.strip_prefix("Bearer ") {
            token
        } else {
            return Err(ApiError::Unauthorized);
        }
    } else {
        return Err(ApiError::Unauthorized);
    };

    if token != state.service_token {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
