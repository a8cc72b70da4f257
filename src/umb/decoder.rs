//! # UMB Frame Decoder
//!
//! Validates response frames and decodes online data readings.
//!
//! Validation is fail-fast and runs in a fixed order: checksum, length
//! field, then every fixed header field. Only a frame that passes all of
//! them has its status and typed value extracted.

use bytes::Buf;
use tracing::trace;

use super::crc::crc16;
use super::protocol::*;
use crate::error::FrameError;
use crate::umb::status::DeviceStatus;

/// Structurally valid response frame, borrowed from the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFrame<'a> {
    /// Receiving address (the controller)
    pub to: Address,

    /// Sending address (the device)
    pub from: Address,

    /// Echoed command code
    pub command: u8,

    /// Echoed command version
    pub command_version: u8,

    /// Bytes between command version and ETX
    pub payload: &'a [u8],
}

/// Verify the checksum of a received frame
///
/// The checksum field sits in the second- and third-from-last bytes and
/// covers everything before it.
///
/// # Errors
///
/// * [`FrameError::TooShort`] - fewer bytes than the trailer itself
/// * [`FrameError::Checksum`] - calculated and received checksum differ
pub fn verify_checksum(frame: &[u8]) -> Result<(), FrameError> {
    if frame.len() < UMB_TRAILER_SIZE {
        return Err(FrameError::TooShort {
            len: frame.len(),
            min: UMB_TRAILER_SIZE,
        });
    }

    let split = frame.len() - UMB_TRAILER_SIZE;
    let calculated = crc16(&frame[..split]);
    let received = u16::from_le_bytes([frame[split], frame[split + 1]]);

    if calculated != received {
        return Err(FrameError::Checksum {
            calculated,
            received,
        });
    }

    Ok(())
}

/// Validate a response frame against the request that produced it
///
/// The response direction is reversed: it must be addressed to the
/// controller and come from the request's destination, echoing the
/// request's command and command version.
///
/// # Arguments
///
/// * `frame` - Raw bytes as delimited by the transport
/// * `request` - The request this frame answers
///
/// # Returns
///
/// * `Result<ResponseFrame>` - Header fields and payload slice
///
/// # Errors
///
/// One distinct [`FrameError`] per failed check, in this order: checksum,
/// length, SOH, EOT, version, destination, source, STX, command, command
/// version.
pub fn decode_response<'a>(
    frame: &'a [u8],
    request: &RequestFrame,
) -> Result<ResponseFrame<'a>, FrameError> {
    verify_checksum(frame)?;

    let length = match frame.get(UMB_OFFSET_LENGTH) {
        Some(&length) => length,
        None => return Err(FrameError::Length { length: 0 }),
    };
    // ETX sits exactly at 8 + length, directly before the trailer
    let etx_index = frame.len() - UMB_TRAILER_SIZE - 1;
    if length < 2
        || UMB_OFFSET_COMMAND + length as usize != etx_index
        || frame[etx_index] != UMB_ETX
    {
        return Err(FrameError::Length { length });
    }

    if frame[0] != UMB_SOH {
        return Err(FrameError::StartMarker(frame[0]));
    }

    let eot = frame[frame.len() - 1];
    if eot != UMB_EOT {
        return Err(FrameError::EndMarker(eot));
    }

    if frame[UMB_OFFSET_VERSION] != UMB_PROTOCOL_VERSION {
        return Err(FrameError::ProtocolVersion(frame[UMB_OFFSET_VERSION]));
    }

    let to = Address::from_bytes([frame[UMB_OFFSET_TO], frame[UMB_OFFSET_TO + 1]]);
    if to != Address::CONTROLLER {
        return Err(FrameError::DestinationAddress {
            expected: Address::CONTROLLER,
            found: to,
        });
    }

    let from = Address::from_bytes([frame[UMB_OFFSET_FROM], frame[UMB_OFFSET_FROM + 1]]);
    if from != request.destination {
        return Err(FrameError::SourceAddress {
            expected: request.destination,
            found: from,
        });
    }

    if frame[UMB_OFFSET_STX] != UMB_STX {
        return Err(FrameError::ContentMarker(frame[UMB_OFFSET_STX]));
    }

    let command = frame[UMB_OFFSET_COMMAND];
    if command != request.command {
        return Err(FrameError::Command {
            expected: request.command,
            found: command,
        });
    }

    let command_version = frame[UMB_OFFSET_COMMAND_VERSION];
    if command_version != request.command_version {
        return Err(FrameError::CommandVersion {
            expected: request.command_version,
            found: command_version,
        });
    }

    Ok(ResponseFrame {
        to,
        from,
        command,
        command_version,
        payload: &frame[UMB_OFFSET_PAYLOAD..etx_index],
    })
}

/// Decode a typed value from the bytes following a type tag
///
/// # Errors
///
/// * [`FrameError::UnknownValueType`] - tag is not one of 0x10..=0x17
/// * [`FrameError::PayloadTooShort`] - fewer bytes than the type needs
///
/// # Examples
///
/// ```
/// use umb_station::umb::decoder::decode_value;
/// use umb_station::umb::protocol::Value;
///
/// assert_eq!(decode_value(22, &[0x00, 0x00, 0x80, 0x3F]), Ok(Value::F32(1.0)));
/// assert_eq!(decode_value(18, &[0x64, 0x00]), Ok(Value::U16(100)));
/// assert_eq!(decode_value(17, &[0xFF]), Ok(Value::I8(-1)));
/// ```
pub fn decode_value(tag: u8, bytes: &[u8]) -> Result<Value, FrameError> {
    let value_type = ValueType::try_from(tag)?;
    if bytes.len() < value_type.width() {
        return Err(FrameError::PayloadTooShort {
            needed: value_type.width(),
            available: bytes.len(),
        });
    }

    let mut buf = bytes;
    let value = match value_type {
        ValueType::UnsignedChar => Value::U8(buf.get_u8()),
        ValueType::SignedChar => Value::I8(buf.get_i8()),
        ValueType::UnsignedShort => Value::U16(buf.get_u16_le()),
        ValueType::SignedShort => Value::I16(buf.get_i16_le()),
        ValueType::UnsignedLong => Value::U32(buf.get_u32_le()),
        ValueType::SignedLong => Value::I32(buf.get_i32_le()),
        ValueType::Float => Value::F32(buf.get_f32_le()),
        ValueType::Double => Value::F64(buf.get_f64_le()),
    };

    Ok(value)
}

/// Decode the payload of an online data response
///
/// Layout: status(1), channel(2, LE), type tag(1), value. The status is
/// returned as data whatever its value. With a non-zero status the device
/// may stop after the status or the channel; whatever is missing or
/// undecodable is left out of the reading instead of failing it.
///
/// # Errors
///
/// * [`FrameError::PayloadTooShort`] - empty payload, or a success status
///   without the full header and value
/// * [`FrameError::UnknownValueType`] - success status with an unknown tag
pub fn decode_online_data(payload: &[u8]) -> Result<Reading, FrameError> {
    let mut buf = payload;
    if !buf.has_remaining() {
        return Err(FrameError::PayloadTooShort {
            needed: 1,
            available: 0,
        });
    }
    let status = DeviceStatus::from(buf.get_u8());

    if !status.is_success() {
        let channel = (buf.remaining() >= 2).then(|| buf.get_u16_le());
        let value = match (channel, buf.split_first()) {
            (Some(_), Some((&tag, bytes))) => decode_value(tag, bytes).ok(),
            _ => None,
        };
        return Ok(Reading {
            channel,
            status,
            value,
        });
    }

    if payload.len() < UMB_ONLINE_DATA_HEADER_SIZE {
        return Err(FrameError::PayloadTooShort {
            needed: UMB_ONLINE_DATA_HEADER_SIZE,
            available: payload.len(),
        });
    }

    let channel = buf.get_u16_le();
    let tag = buf.get_u8();
    let value = decode_value(tag, buf)?;

    Ok(Reading {
        channel: Some(channel),
        status,
        value: Some(value),
    })
}

/// Validate a raw response and extract its reading
///
/// # Examples
///
/// ```
/// use umb_station::umb::decoder::parse_response;
/// use umb_station::umb::protocol::{RequestFrame, Value};
///
/// let request = RequestFrame::online_data(1, 100);
/// let response = [
///     0x01, 0x10, 0x01, 0xF0, 0x01, 0x70, 0x0A, 0x02, 0x23, 0x10, 0x00, 0x64, 0x00,
///     0x16, 0x00, 0x00, 0xC8, 0x41, 0x03, 0xBD, 0x07, 0x04,
/// ];
///
/// let reading = parse_response(&response, &request).unwrap();
/// assert_eq!(reading.value, Some(Value::F32(25.0)));
/// assert_eq!(reading.status.code(), 0);
/// ```
pub fn parse_response(frame: &[u8], request: &RequestFrame) -> Result<Reading, FrameError> {
    let response = decode_response(frame, request)?;
    trace!(
        "Valid response from {} ({} payload bytes)",
        response.from,
        response.payload.len()
    );
    decode_online_data(response.payload)
}
