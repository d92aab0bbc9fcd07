//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{services::receipt_service::ReceiptError, store::StoreError};

/// Domain rule violations on an otherwise well-formed booking request.
///
/// All of these are user-correctable and reported verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The slot has already finished, or started more than one slot ago.
    #[error("Booking can only be made for future time slots.")]
    PastTimeSlot,

    /// The slot starts outside the daily booking window.
    #[error("Bookings can only be made within the daily booking window.")]
    OutsideBookingWindow,

    /// The civil ID is not exactly 12 digits.
    #[error("Civil ID must be exactly 12 digits.")]
    InvalidCivilIdFormat,
}

impl ValidationError {
    /// Stable machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::PastTimeSlot => "past_time_slot",
            ValidationError::OutsideBookingWindow => "outside_booking_window",
            ValidationError::InvalidCivilIdFormat => "invalid_civil_id_format",
        }
    }
}

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Input Errors**: Missing or unparsable fields
/// - **Validation Errors**: Booking rules violated
/// - **Conflicts**: The requested slot is taken
/// - **Storage Errors**: The booking store failed
/// - **Receipt Errors**: Rendering a ticket failed
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A field is missing or cannot be parsed (or the body is not JSON).
    ///
    /// Returns HTTP 400 Bad Request with the offending field.
    #[error("{message}")]
    MalformedInput {
        field: &'static str,
        message: String,
    },

    /// A booking rule rejected the request.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another booking already occupies the requested slot.
    ///
    /// Returns HTTP 409 Conflict, so clients can suggest another time.
    #[error("A booking already exists for the selected time slot.")]
    Conflict,

    /// Requested booking does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Booking not found")]
    BookingNotFound,

    /// The booking store failed.
    ///
    /// Returns HTTP 500; details are logged, never sent to the client.
    #[error("Storage error: {0}")]
    Storage(StoreError),

    /// A requested ticket could not be rendered.
    ///
    /// Returns HTTP 500.
    #[error("Receipt generation failed: {0}")]
    ReceiptGeneration(#[from] ReceiptError),
}

impl AppError {
    pub fn malformed(field: &'static str, message: impl Into<String>) -> Self {
        AppError::MalformedInput {
            field,
            message: message.into(),
        }
    }
}

/// A taken slot detected by the store's uniqueness guarantee is a conflict like any other;
/// a missing row is a missing booking.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SlotTaken => AppError::Conflict,
            StoreError::NotFound => AppError::BookingNotFound,
            other => AppError::Storage(other),
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Malformed input additionally carries `"field"` inside `error`.
///
/// # Status Code Mapping
///
/// - `MalformedInput` → 400 Bad Request
/// - `Validation` → 400 Bad Request
/// - `Conflict` → 409 Conflict
/// - `BookingNotFound` → 404 Not Found
/// - `Storage` / `ReceiptGeneration` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            AppError::MalformedInput { field, message } => json!({
                "error": {
                    "code": "malformed_input",
                    "field": field,
                    "message": message
                }
            }),
            AppError::Validation(err) => error_body(err.code(), self.to_string()),
            AppError::Conflict => error_body("slot_conflict", self.to_string()),
            AppError::BookingNotFound => error_body("booking_not_found", self.to_string()),
            AppError::Storage(err) => {
                tracing::error!(error = %err, "booking store failure");
                error_body("internal_error", "An internal error occurred".to_string())
            }
            AppError::ReceiptGeneration(err) => {
                tracing::error!(error = %err, "ticket rendering failed");
                error_body(
                    "receipt_generation_failed",
                    "The ticket could not be generated".to_string(),
                )
            }
        };

        (self.status(), Json(body)).into_response()
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedInput { .. } | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::BookingNotFound => StatusCode::NOT_FOUND,
            AppError::Storage(_) | AppError::ReceiptGeneration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn error_body(code: &str, message: String) -> serde_json::Value {
    json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}
