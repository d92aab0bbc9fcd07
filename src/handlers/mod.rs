//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Takes a snapshot of the slot settings and calls into `services`
//! 3. Returns HTTP response (JSON, status code)

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{config::SettingsHandle, services::receipt_service::ReceiptRenderer, store::BookingStore};

/// Booking endpoints
pub mod bookings;
/// Service health endpoint
pub mod health;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookingStore>,
    pub renderer: Arc<dyn ReceiptRenderer>,
    pub settings: SettingsHandle,
    /// Public prefix prepended to receipt references
    pub media_url: String,
}

/// Build the HTTP router.
///
/// Receipts written under `media_root` are served at `/media`.
pub fn router(state: AppState, media_root: impl Into<PathBuf>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/v1/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/api/v1/bookings/{id}", get(bookings::get_booking))
        .route("/api/v1/bookings/{id}/ticket", get(bookings::get_ticket))
        .nest_service("/media", ServeDir::new(media_root.into()))
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
