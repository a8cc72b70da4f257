//! # Error Types
//!
//! Custom error types for UMB Station using `thiserror`.

use std::time::Duration;

use thiserror::Error;

use crate::umb::protocol::Address;

/// Main error type for UMB Station
#[derive(Debug, Error)]
pub enum UmbError {
    /// Serial device could not be opened within the retry budget
    #[error("Failed to access {path} after {attempts} attempt(s)")]
    Connection { path: String, attempts: u32 },

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// The line stayed idle without any response byte
    #[error("No response received within {0:?}")]
    NoResponse(Duration),

    /// UMB frame errors
    #[error("UMB frame error: {0}")]
    Frame(#[from] FrameError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Telemetry serialization errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Frame construction and validation errors
///
/// Every variant aborts the current request; none is retried by the codec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("payload of {len} bytes exceeds maximum {max}")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("frame too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },

    #[error("checksum mismatch: calculated 0x{calculated:04X}, received 0x{received:04X}")]
    Checksum { calculated: u16, received: u16 },

    #[error("length field {length} does not point at ETX")]
    Length { length: u8 },

    #[error("no start-of-frame character (found 0x{0:02X})")]
    StartMarker(u8),

    #[error("no end-of-frame character (found 0x{0:02X})")]
    EndMarker(u8),

    #[error("wrong protocol version 0x{0:02X}")]
    ProtocolVersion(u8),

    #[error("wrong destination address: expected {expected}, found {found}")]
    DestinationAddress { expected: Address, found: Address },

    #[error("wrong source address: expected {expected}, found {found}")]
    SourceAddress { expected: Address, found: Address },

    #[error("missing STX (found 0x{0:02X})")]
    ContentMarker(u8),

    #[error("wrong command: expected 0x{expected:02X}, found 0x{found:02X}")]
    Command { expected: u8, found: u8 },

    #[error("wrong command version: expected 0x{expected:02X}, found 0x{found:02X}")]
    CommandVersion { expected: u8, found: u8 },

    #[error("unknown value type 0x{0:02X}")]
    UnknownValueType(u8),

    #[error("payload too short: need {needed} bytes, got {available}")]
    PayloadTooShort { needed: usize, available: usize },
}

/// Result type alias for UMB Station
pub type Result<T> = std::result::Result<T, UmbError>;
