//! # UMB Protocol Module
//!
//! Implementation of the Lufft UMB binary protocol (header version 1.0).
//!
//! This module handles:
//! - Request frame encoding (online data query, command 0x23)
//! - Response frame validation and typed value decoding
//! - CRC-16/CCITT checksum calculation
//! - Device status code lookup

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod crc;
pub mod status;
pub mod channels;
