//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! The slot rules live here as plain functions over a settings snapshot,
//! so they can be exercised without a server or a database.

pub mod booking_service;
pub mod conflict_detector;
pub mod receipt_service;
pub mod slot_validator;
