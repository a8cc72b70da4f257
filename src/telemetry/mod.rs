//! # Telemetry Module
//!
//! Persists weather records as JSONL (JSON Lines).
//!
//! This module handles:
//! - Writing one record per line
//! - Rotating files after a fixed number of records
//! - Retaining only the newest files

pub mod logger;

pub use logger::TelemetryLogger;
