use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::api::middleware::{require_service_token, AppState};
use crate::api::{events, notifications, push_tokens};

pub fn build_router(state: AppState) -> Router {
    // All routes except the health probe require the service token
    let protected = Router::new()
        .route("/v1/events", post(events::ingest_event))
        .route(
            "/v1/users/:user_id/push-token",
            put(push_tokens::register_push_token),
        )
        .route(
            "/v1/users/:user_id/push-token",
            delete(push_tokens::remove_push_token),
        )
        .route(
            "/v1/users/:user_id/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/v1/users/:user_id/notifications/unread-count",
            get(notifications::get_unread_count),
        )
        .route(
            "/v1/users/:user_id/notifications/stats",
            get(notifications::get_notification_stats),
        )
        .route(
            "/v1/users/:user_id/notifications/read-all",
            put(notifications::mark_all_notifications_as_read),
        )
        .route(
            "/v1/users/:user_id/notifications/:id/read",
            put(notifications::mark_notification_as_read),
        )
        .route(
            "/v1/test-notification",
            post(notifications::send_test_notification),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_service_token,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
