//! # UMB Frame Encoder
//!
//! Builds complete UMB frames: header, content, ETX, checksum and EOT.

use bytes::{BufMut, BytesMut};

use super::crc::crc16;
use super::protocol::*;
use crate::error::FrameError;
use crate::umb::status::DeviceStatus;

/// Encode a complete UMB frame
///
/// The checksum is computed over SOH through ETX inclusive, then appended
/// little-endian followed by EOT.
///
/// # Arguments
///
/// * `to` - Receiving address
/// * `from` - Sending address
/// * `command` - Command code
/// * `command_version` - Command version
/// * `payload` - Command-specific payload (max 253 bytes)
///
/// # Errors
///
/// Returns [`FrameError::PayloadTooLarge`] if the payload does not fit the
/// one-byte length field.
pub fn encode_frame(
    to: Address,
    from: Address,
    command: u8,
    command_version: u8,
    payload: &[u8],
) -> Result<Vec<u8>, FrameError> {
    if payload.len() > UMB_MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge {
            len: payload.len(),
            max: UMB_MAX_PAYLOAD_SIZE,
        });
    }

    let mut frame = BytesMut::with_capacity(UMB_FRAME_OVERHEAD + payload.len());
    frame.put_u8(UMB_SOH);
    frame.put_u8(UMB_PROTOCOL_VERSION);
    frame.put_slice(&to.to_bytes());
    frame.put_slice(&from.to_bytes());
    frame.put_u8((2 + payload.len()) as u8);
    frame.put_u8(UMB_STX);
    frame.put_u8(command);
    frame.put_u8(command_version);
    frame.put_slice(payload);
    frame.put_u8(UMB_ETX);

    let crc = crc16(&frame);
    frame.put_u16_le(crc);
    frame.put_u8(UMB_EOT);

    Ok(frame.to_vec())
}

/// Encode a request from the controller address to its destination device
///
/// # Examples
///
/// ```
/// use umb_station::umb::encoder::encode_request;
/// use umb_station::umb::protocol::RequestFrame;
///
/// let frame = encode_request(&RequestFrame::online_data(1, 100)).unwrap();
/// assert_eq!(frame.len(), 16);
/// assert_eq!(frame[0], 0x01);
/// assert_eq!(*frame.last().unwrap(), 0x04);
/// ```
pub fn encode_request(request: &RequestFrame) -> Result<Vec<u8>, FrameError> {
    encode_frame(
        request.destination,
        Address::CONTROLLER,
        request.command,
        request.command_version,
        &request.payload,
    )
}

/// Encode an online data request for one channel of device `receiver_id`
pub fn encode_online_data_request(receiver_id: u8, channel: u16) -> Result<Vec<u8>, FrameError> {
    encode_request(&RequestFrame::online_data(receiver_id, channel))
}

/// Encode the device side answer to an online data request
///
/// Payload layout: status, channel (u16 LE), type tag, value bytes. Used by
/// device simulators and tests.
pub fn encode_online_data_response(
    receiver_id: u8,
    status: DeviceStatus,
    channel: u16,
    value: Value,
) -> Result<Vec<u8>, FrameError> {
    let mut payload = BytesMut::with_capacity(UMB_ONLINE_DATA_HEADER_SIZE + 8);
    payload.put_u8(status.code());
    payload.put_u16_le(channel);
    payload.put_u8(value.value_type().tag());
    payload.put_slice(&value.to_le_bytes());

    encode_frame(
        Address::CONTROLLER,
        Address::device(receiver_id),
        UMB_CMD_ONLINE_DATA,
        UMB_CMD_ONLINE_DATA_VERSION,
        &payload,
    )
}
