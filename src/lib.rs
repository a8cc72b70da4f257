//! # UMB Station Library
//!
//! Read measurement values from Lufft weather stations over the UMB binary
//! protocol on a serial (RS-485) link.
//!
//! This library provides frame encoding and validation, the serial link,
//! a request/response client, channel polling and JSONL persistence.

pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod serial;
pub mod telemetry;
pub mod umb;
