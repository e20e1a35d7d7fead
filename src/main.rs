// SPDX-License-Identifier: MIT

//! GRINDZONE API Server
//!
//! Gym membership backend: bookings with conflict and capacity checks,
//! activity streaks, achievements, and XP/leveling.

use grindzone_api::{
    config::Config,
    db::FirestoreDb,
    services::{AssistantService, BookingService, GoogleIdentityVerifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting GRINDZONE API");

    // Initialize Firestore database. A connectivity failure here is fatal:
    // the process must not serve traffic without its store.
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    let identity_verifier =
        Arc::new(GoogleIdentityVerifier::new(&config).expect("Failed to initialize verifier"));

    let booking_service = BookingService::new(db.clone());
    let assistant_service =
        AssistantService::new(config.gemini_api_key.clone(), config.tts_api_key.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        booking_service,
        identity_verifier,
        assistant_service,
    });

    // Build router
    let app = grindzone_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("grindzone_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
