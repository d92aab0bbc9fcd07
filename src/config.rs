//! Application configuration management.
//!
//! Two groups of settings are loaded from environment variables with `envy`:
//!
//! - [`Config`]: process-level settings read once at startup (port, storage, media paths).
//! - [`SlotSettings`]: the booking rules (slot duration, daily window, timezone, overlap policy).
//!   These live behind a [`SettingsHandle`] so they can be reloaded while the server runs,
//!   and every request works on its own snapshot.

use std::{
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};

use chrono::{Duration, FixedOffset, Offset, Utc};
use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (optional): PostgreSQL connection string. Without it bookings are kept in memory.
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `MEDIA_ROOT` (optional): directory receipts are written to, defaults to `media`
/// - `MEDIA_URL` (optional): public URL prefix for receipts, defaults to `/media/`
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_media_root")]
    pub media_root: String,

    #[serde(default = "default_media_url")]
    pub media_url: String,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_media_root() -> String {
    "media".to_string()
}

fn default_media_url() -> String {
    "/media/".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable value cannot be parsed into its expected type.
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        envy::from_env::<Config>()
    }
}

/// How an existing booking is judged to collide with a candidate slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// An existing booking conflicts only if its start falls inside `[start, start + duration)`
    /// of the candidate. This is the historical behaviour and the default.
    ///
    /// A candidate that starts before an existing booking but ends inside it is NOT caught.
    #[default]
    StartWithin,

    /// Full half-open interval intersection in both directions.
    Intersect,
}

/// Errors raised when slot settings are out of range.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BOOKING_DURATION must be a positive number of minutes")]
    NonPositiveDuration,

    #[error("booking window hours must be within 0..=23 (got {0})")]
    HourOutOfRange(u32),

    #[error("booking window start ({start}) must be before its end ({end})")]
    EmptyWindow { start: u32, end: u32 },

    #[error("BOOKING_UTC_OFFSET_MINUTES must be within one day (got {0})")]
    OffsetOutOfRange(i32),

    #[error("failed to read booking settings: {0}")]
    Env(#[from] envy::Error),

    #[error("failed to read settings file: {0}")]
    File(#[from] dotenvy::Error),
}

/// Booking rules consumed by the slot validator and the conflict detector.
///
/// # Environment Variables
///
/// All prefixed with `BOOKING_`:
///
/// - `BOOKING_DURATION`: slot length in minutes (default 60)
/// - `BOOKING_WINDOW_START_HOUR`: first bookable hour, inclusive (default 9)
/// - `BOOKING_WINDOW_END_HOUR`: end of the bookable window, exclusive (default 16)
/// - `BOOKING_UTC_OFFSET_MINUTES`: timezone in which wall-clock times are read (default 0, UTC)
/// - `BOOKING_OVERLAP_POLICY`: `start_within` (default) or `intersect`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SlotSettings {
    #[serde(rename = "duration", default = "default_duration")]
    pub duration_minutes: u32,

    #[serde(default = "default_window_start")]
    pub window_start_hour: u32,

    #[serde(default = "default_window_end")]
    pub window_end_hour: u32,

    #[serde(default)]
    pub utc_offset_minutes: i32,

    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
}

fn default_duration() -> u32 {
    60
}

fn default_window_start() -> u32 {
    9
}

fn default_window_end() -> u32 {
    16
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            duration_minutes: default_duration(),
            window_start_hour: default_window_start(),
            window_end_hour: default_window_end(),
            utc_offset_minutes: 0,
            overlap_policy: OverlapPolicy::default(),
        }
    }
}

impl SlotSettings {
    /// Read `BOOKING_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the resulting settings are invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let settings = envy::prefixed("BOOKING_").from_env::<SlotSettings>()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check ranges that the type system does not capture.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_minutes == 0 {
            return Err(ConfigError::NonPositiveDuration);
        }
        for hour in [self.window_start_hour, self.window_end_hour] {
            if hour > 23 {
                return Err(ConfigError::HourOutOfRange(hour));
            }
        }
        if self.window_start_hour >= self.window_end_hour {
            return Err(ConfigError::EmptyWindow {
                start: self.window_start_hour,
                end: self.window_end_hour,
            });
        }
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::OffsetOutOfRange(self.utc_offset_minutes));
        }
        Ok(())
    }

    /// Length of one slot.
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Timezone in which booking wall-clock times are entered, validated and displayed.
    ///
    /// Falls back to UTC for an offset that `validate` would have rejected.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

/// Shared, reloadable slot settings.
///
/// Cloning the handle shares the same underlying settings.
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    inner: Arc<RwLock<SlotSettings>>,
}

impl SettingsHandle {
    pub fn new(settings: SlotSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the current settings. Call once per request and pass the copy down.
    pub fn snapshot(&self) -> SlotSettings {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the live settings after validating them.
    pub fn replace(&self, settings: SlotSettings) -> Result<(), ConfigError> {
        settings.validate()?;
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = settings;
        Ok(())
    }

    /// Re-read `BOOKING_*` from the environment and swap them in.
    ///
    /// Values in `.env` override variables already set, so edits to the file
    /// made after startup take effect.
    pub fn reload_from_env(&self) -> Result<SlotSettings, ConfigError> {
        dotenvy::dotenv_override().ok();
        self.apply_env()
    }

    /// Like `reload_from_env`, reading an explicit settings file.
    pub fn reload_from_file(&self, path: impl AsRef<Path>) -> Result<SlotSettings, ConfigError> {
        dotenvy::from_path_override(path.as_ref())?;
        self.apply_env()
    }

    fn apply_env(&self) -> Result<SlotSettings, ConfigError> {
        let settings = SlotSettings::from_env()?;
        self.replace(settings)?;
        Ok(settings)
    }
}
