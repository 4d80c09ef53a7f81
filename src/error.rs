//! Unified error types for the EnvNode firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! startup sequence's error handling uniform.  All variants are `Copy` so
//! they can ride inside [`AppEvent`](crate::app::events::AppEvent)s and
//! across the radio event queue without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The sensor peripheral could not be bound or read.
    Sensor(SensorError),
    /// The radio stack reported a non-zero status.
    Radio(RadioError),
    /// The advertisement payload could not be built.
    Advertising(AdvertisingError),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Advertising(e) => write!(f, "advertising: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// No peripheral with the requested name is present (fatal at bind time).
    NotFound,
    /// The fetch step of a sample failed with a driver code.
    FetchFailed(i32),
    /// The driver has no value for the requested channel.
    ChannelUnavailable,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "peripheral not found"),
            Self::FetchFailed(code) => write!(f, "sample fetch failed (err {code})"),
            Self::ChannelUnavailable => write!(f, "channel unavailable"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

/// Numeric status returned by the radio stack.  Zero is never wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioError(pub i32);

impl RadioError {
    /// Presence update could not be delivered: no peer linked.
    pub const NOT_CONNECTED: Self = Self(-128);

    pub const fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "err {}", self.0)
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Advertising errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingError {
    /// Encoded AD structures exceed the 31-byte legacy payload.
    PayloadTooLong,
}

impl fmt::Display for AdvertisingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLong => write!(f, "payload exceeds 31 bytes"),
        }
    }
}

impl From<AdvertisingError> for Error {
    fn from(e: AdvertisingError) -> Self {
        Self::Advertising(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
