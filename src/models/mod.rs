//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response shapes built around them.

/// Booking model
pub mod booking;
