//! Booking HTTP handlers.
//!
//! This module implements the booking API endpoints:
//! - POST /api/v1/bookings - Reserve a slot
//! - GET /api/v1/bookings - List all bookings
//! - GET /api/v1/bookings/:id - Get a booking
//! - GET /api/v1/bookings/:id/ticket - Download the PDF ticket

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    handlers::AppState,
    models::booking::{
        BookingListResponse, BookingResponse, CreateBookingRequest, CreateBookingResponse,
    },
    services::booking_service,
};

/// Reserve a slot.
///
/// # Endpoint
///
/// `POST /api/v1/bookings`
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Sara Khalil",
///   "civil_id": "012345678901",
///   "start_time": "2025-01-01 09:00"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the booking with its derived `end_time`
/// - **Error (400)**: malformed input or a booking rule violation
/// - **Error (409)**: the slot is taken
/// - **Error (500)**: storage error
///
/// ```json
/// {
///   "message": "Booking created successfully",
///   "booking": {
///     "id": "550e8400-e29b-41d4-a716-446655440000",
///     "name": "Sara Khalil",
///     "civil_id": "012345678901",
///     "start_time": "2025-01-01 09:00",
///     "end_time": "2025-01-01 10:00",
///     "receipt_url": "/media/qr_codes/qr_550e8400-e29b-41d4-a716-446655440000.png"
///   }
/// }
/// ```
pub async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected booking body");
        AppError::malformed("body", "Invalid JSON input.")
    })?;

    // One settings snapshot for the whole request
    let settings = state.settings.snapshot();

    let booking = booking_service::create_booking(
        state.store.as_ref(),
        state.renderer.as_ref(),
        &settings,
        request,
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            message: "Booking created successfully".to_string(),
            booking: BookingResponse::new(booking, &settings, &state.media_url),
        }),
    ))
}

/// List all bookings.
///
/// # Ordering
///
/// By start time, so two reads without an intervening write are identical.
pub async fn list_bookings(
    State(state): State<AppState>,
) -> Result<Json<BookingListResponse>, AppError> {
    let settings = state.settings.snapshot();
    let bookings = booking_service::list_bookings(state.store.as_ref()).await?;

    Ok(Json(BookingListResponse {
        bookings: bookings
            .into_iter()
            .map(|b| BookingResponse::new(b, &settings, &state.media_url))
            .collect(),
    }))
}

/// Get a booking by ID.
///
/// # Response
///
/// - **Success (200 OK)**: booking details
/// - **Error (404)**: unknown booking
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let settings = state.settings.snapshot();
    let booking = booking_service::get_booking(state.store.as_ref(), booking_id).await?;

    Ok(Json(BookingResponse::new(booking, &settings, &state.media_url)))
}

/// Download the PDF ticket of a booking.
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let settings = state.settings.snapshot();
    let pdf = booking_service::booking_ticket(
        state.store.as_ref(),
        state.renderer.as_ref(),
        &settings,
        booking_id,
    )
    .await?;

    let disposition = format!("inline; filename=\"ticket_{booking_id}.pdf\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::Request,
    };
    use chrono::{Duration, Timelike};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{
        config::{SettingsHandle, SlotSettings},
        handlers::{AppState, router},
        services::booking_service::tests::FakeRenderer,
        store::memory::MemoryBookingStore,
    };

    use super::*;

    fn app_with(settings: SettingsHandle) -> Router {
        let state = AppState {
            store: Arc::new(MemoryBookingStore::new()),
            renderer: Arc::new(FakeRenderer::default()),
            settings,
            media_url: "/media/".to_string(),
        };
        router(state, std::env::temp_dir())
    }

    /// Settings whose window covers the whole day, so a start of "tomorrow" is always valid.
    fn open_settings() -> SettingsHandle {
        SettingsHandle::new(SlotSettings {
            window_start_hour: 0,
            window_end_hour: 23,
            ..SlotSettings::default()
        })
    }

    fn tomorrow_at_noon() -> String {
        let t = (Utc::now() + Duration::days(1))
            .with_hour(12)
            .and_then(|t| t.with_minute(0))
            .unwrap();
        t.format("%Y-%m-%d %H:%M").to_string()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(body: String) -> Request<Body> {
        Request::post("/api/v1/bookings")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn creates_booking_and_lists_it() {
        let app = app_with(open_settings());
        let start = tomorrow_at_noon();

        let (status, body) = send(
            &app,
            post_json(json!({"name": "Sara", "civil_id": "012345678901", "start_time": start}).to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Booking created successfully");
        assert_eq!(body["booking"]["start_time"], start.as_str());
        assert_eq!(body["booking"]["civil_id"], "012345678901");
        assert!(body["booking"]["end_time"].as_str().unwrap().ends_with("13:00"));
        let id = body["booking"]["id"].as_str().unwrap().to_string();
        assert_eq!(
            body["booking"]["receipt_url"],
            format!("/media/qr_codes/qr_{id}.png").as_str()
        );

        let (status, first) = send(&app, get("/api/v1/bookings")).await;
        let (_, second) = send(&app, get("/api/v1/bookings")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["bookings"].as_array().unwrap().len(), 1);
        assert_eq!(first, second);

        let (status, single) = send(&app, get(&format!("/api/v1/bookings/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(single, first["bookings"][0]);
    }

    #[tokio::test]
    async fn conflicting_booking_returns_409() {
        let app = app_with(open_settings());
        let body = json!({"name": "Sara", "civil_id": "012345678901", "start_time": tomorrow_at_noon()})
            .to_string();

        let (first, _) = send(&app, post_json(body.clone())).await;
        let (second, error) = send(&app, post_json(body)).await;

        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(error["error"]["code"], "slot_conflict");
    }

    #[tokio::test]
    async fn non_json_body_is_malformed_input() {
        let app = app_with(open_settings());

        let (status, body) = send(&app, post_json("not json".to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "malformed_input");
        assert_eq!(body["error"]["field"], "body");
    }

    #[tokio::test]
    async fn validation_errors_are_reported_verbatim() {
        let app = app_with(open_settings());

        let (status, body) = send(
            &app,
            post_json(json!({"name": "Sara", "civil_id": "123", "start_time": tomorrow_at_noon()}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_civil_id_format");
        assert_eq!(body["error"]["message"], "Civil ID must be exactly 12 digits.");

        let (status, body) = send(
            &app,
            post_json(json!({"name": "Sara", "civil_id": "012345678901", "start_time": "2000-01-01 10:00"}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "past_time_slot");

        let (status, body) = send(
            &app,
            post_json(json!({"name": "Sara", "civil_id": "012345678901"}).to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["field"], "start_time");
    }

    #[tokio::test]
    async fn listing_uses_current_duration() {
        let settings = open_settings();
        let app = app_with(settings.clone());
        send(
            &app,
            post_json(json!({"name": "Sara", "civil_id": "012345678901", "start_time": tomorrow_at_noon()}).to_string()),
        )
        .await;

        settings
            .replace(SlotSettings { duration_minutes: 30, ..settings.snapshot() })
            .unwrap();
        let (_, body) = send(&app, get("/api/v1/bookings")).await;

        assert!(body["bookings"][0]["end_time"].as_str().unwrap().ends_with("12:30"));
    }

    #[tokio::test]
    async fn unknown_booking_is_404() {
        let app = app_with(open_settings());

        let (status, body) = send(&app, get(&format!("/api/v1/bookings/{}", Uuid::new_v4()))).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "booking_not_found");
    }

    #[tokio::test]
    async fn ticket_is_served_as_pdf() {
        let app = app_with(open_settings());
        let (_, body) = send(
            &app,
            post_json(json!({"name": "Sara", "civil_id": "012345678901", "start_time": tomorrow_at_noon()}).to_string()),
        )
        .await;
        let id = body["booking"]["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(get(&format!("/api/v1/bookings/{id}/ticket")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    }

    #[tokio::test]
    async fn health_reports_connected_store() {
        let app = app_with(open_settings());

        let (status, body) = send(&app, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
