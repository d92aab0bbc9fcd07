//! Slot Booking Service - Main Application Entry Point
//!
//! A REST API for reserving fixed-length time slots on a single shared timeline.
//! Every booking gets a QR receipt and a downloadable PDF ticket; two bookings never
//! share a slot start.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, or an in-memory store when `DATABASE_URL` is unset
//! - **Receipts**: QR codes (PNG) served from the media root, PDF tickets rendered on demand
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration and slot settings from environment variables
//! 2. Open the booking store (and run migrations for PostgreSQL)
//! 3. Build HTTP router
//! 4. Start server on configured port; SIGHUP reloads the slot settings

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    config::{Config, SettingsHandle, SlotSettings},
    handlers::AppState,
    services::receipt_service::QrReceiptRenderer,
    store::{BookingStore, memory::MemoryBookingStore, postgres::PgBookingStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let slot_settings = SlotSettings::from_env()?;
    tracing::info!(
        duration_minutes = slot_settings.duration_minutes,
        window_start_hour = slot_settings.window_start_hour,
        window_end_hour = slot_settings.window_end_hour,
        overlap_policy = ?slot_settings.overlap_policy,
        "Configuration loaded"
    );

    let store = open_store(&config).await?;
    let settings = SettingsHandle::new(slot_settings);
    spawn_settings_reloader(settings.clone());

    let state = AppState {
        store,
        renderer: Arc::new(QrReceiptRenderer::new(&config.media_root)),
        settings,
        media_url: config.media_url.clone(),
    };
    let app = handlers::router(state, &config.media_root);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise an in-memory store.
async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn BookingStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, bookings are kept in memory only");
        return Ok(Arc::new(MemoryBookingStore::new()));
    };

    let pool = db::create_pool(database_url).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    Ok(Arc::new(PgBookingStore::new(pool)))
}

/// Reload slot settings from the environment on SIGHUP.
#[cfg(unix)]
fn spawn_settings_reloader(settings: SettingsHandle) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(err) => {
            tracing::warn!(error = %err, "cannot listen for SIGHUP, settings reload disabled");
            return;
        }
    };

    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            match settings.reload_from_env() {
                Ok(new) => tracing::info!(?new, "slot settings reloaded"),
                Err(err) => tracing::error!(error = %err, "slot settings reload failed, keeping previous"),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_settings_reloader(_settings: SettingsHandle) {}
