use lockwatch::api::build_router;
use lockwatch::api::middleware::AppState;
use lockwatch::config::Config;
use lockwatch::database::Database;
use lockwatch::services::{
    BatteryAlertGate, DeviceEventService, FcmClient, NotificationService, PushSender,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lockwatch=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Initialize database connection
    sqlx::any::install_default_drivers();
    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connection established");

    // Run migrations
    db.run_migrations().await?;
    tracing::info!("Database migrations applied");

    // Wire up push delivery
    let sender: Option<Arc<dyn PushSender>> = match &config.fcm_server_key {
        Some(key) => Some(Arc::new(FcmClient::new(
            key.clone(),
            config.fcm_send_url.clone(),
        ))),
        None => {
            tracing::warn!("FCM_SERVER_KEY not set - push delivery disabled");
            None
        }
    };

    let notifications = NotificationService::new(db.clone(), sender);
    let gate = BatteryAlertGate::new(Arc::new(db.clone()), config.gate_policy())?;
    let events = DeviceEventService::new(gate, notifications.clone());

    let state = AppState {
        db,
        service_token: config.service_token.clone(),
        debug: config.debug,
        events,
        notifications,
    };

    // Build router
    let app = build_router(state);

    // Start server
    let addr = config.server_address();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
