//! # UMB Protocol Constants and Types
//!
//! Core protocol definitions for UMB binary frames.
//!
//! ```text
//! SOH VER TO TO_CLASS FROM FROM_CLASS LEN STX CMD VERC [PAYLOAD] ETX CRC_LO CRC_HI EOT
//!  0   1   2     3      4       5      6   7   8   9    10..       8+LEN
//! ```

use std::fmt;

use crate::error::FrameError;
use crate::umb::status::DeviceStatus;

/// Start of frame
pub const UMB_SOH: u8 = 0x01;

/// Start of content
pub const UMB_STX: u8 = 0x02;

/// End of content, the last byte covered by the checksum
pub const UMB_ETX: u8 = 0x03;

/// End of frame
pub const UMB_EOT: u8 = 0x04;

/// Protocol header version 1.0
pub const UMB_PROTOCOL_VERSION: u8 = 0x10;

/// Address class byte of measurement devices (WS-series stations)
pub const UMB_CLASS_DEVICE: u8 = 0x70;

/// Address class byte of the requesting master
pub const UMB_CLASS_CONTROLLER: u8 = 0xF0;

/// Device id the controller always sends from
pub const UMB_CONTROLLER_ID: u8 = 0x01;

/// Online data request command
pub const UMB_CMD_ONLINE_DATA: u8 = 0x23; // 35

/// Online data request command version
pub const UMB_CMD_ONLINE_DATA_VERSION: u8 = 0x10; // 16

/// Byte offsets of the fixed frame fields
pub const UMB_OFFSET_VERSION: usize = 1;
pub const UMB_OFFSET_TO: usize = 2;
pub const UMB_OFFSET_FROM: usize = 4;
pub const UMB_OFFSET_LENGTH: usize = 6;
pub const UMB_OFFSET_STX: usize = 7;
pub const UMB_OFFSET_COMMAND: usize = 8;
pub const UMB_OFFSET_COMMAND_VERSION: usize = 9;
pub const UMB_OFFSET_PAYLOAD: usize = 10;

/// Checksum (2 bytes) plus EOT trailing ETX
pub const UMB_TRAILER_SIZE: usize = 3;

/// Fixed bytes around the payload: header(8) + cmd + verc + ETX + crc(2) + EOT
pub const UMB_FRAME_OVERHEAD: usize = 14;

/// Largest payload whose length field (`2 + payload`) still fits one byte
pub const UMB_MAX_PAYLOAD_SIZE: usize = u8::MAX as usize - 2;

/// Online data response payload: status(1) + channel(2) + type(1), value follows
pub const UMB_ONLINE_DATA_HEADER_SIZE: usize = 4;

/// Two-byte UMB address: device id plus class byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    /// Device id within its class
    pub id: u8,

    /// Class byte (device role)
    pub class: u8,
}

impl Address {
    /// The fixed address requests originate from
    pub const CONTROLLER: Address = Address {
        id: UMB_CONTROLLER_ID,
        class: UMB_CLASS_CONTROLLER,
    };

    /// Address of the measurement device with the given id
    pub const fn device(id: u8) -> Self {
        Self {
            id,
            class: UMB_CLASS_DEVICE,
        }
    }

    /// Wire order: id first, class second
    pub const fn to_bytes(self) -> [u8; 2] {
        [self.id, self.class]
    }

    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self {
            id: bytes[0],
            class: bytes[1],
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}{:02X}", self.class, self.id)
    }
}

/// Wire encoding of a measurement value, selected by the type tag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    UnsignedChar = 0x10,
    SignedChar = 0x11,
    UnsignedShort = 0x12,
    SignedShort = 0x13,
    UnsignedLong = 0x14,
    SignedLong = 0x15,
    Float = 0x16,
    Double = 0x17,
}

impl ValueType {
    /// Type tag byte as transmitted
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Number of value bytes following the tag
    pub const fn width(self) -> usize {
        match self {
            ValueType::UnsignedChar | ValueType::SignedChar => 1,
            ValueType::UnsignedShort | ValueType::SignedShort => 2,
            ValueType::UnsignedLong | ValueType::SignedLong | ValueType::Float => 4,
            ValueType::Double => 8,
        }
    }
}

impl TryFrom<u8> for ValueType {
    type Error = FrameError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0x10 => Ok(ValueType::UnsignedChar),
            0x11 => Ok(ValueType::SignedChar),
            0x12 => Ok(ValueType::UnsignedShort),
            0x13 => Ok(ValueType::SignedShort),
            0x14 => Ok(ValueType::UnsignedLong),
            0x15 => Ok(ValueType::SignedLong),
            0x16 => Ok(ValueType::Float),
            0x17 => Ok(ValueType::Double),
            other => Err(FrameError::UnknownValueType(other)),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::UnsignedChar => "UNSIGNED_CHAR",
            ValueType::SignedChar => "SIGNED_CHAR",
            ValueType::UnsignedShort => "UNSIGNED_SHORT",
            ValueType::SignedShort => "SIGNED_SHORT",
            ValueType::UnsignedLong => "UNSIGNED_LONG",
            ValueType::SignedLong => "SIGNED_LONG",
            ValueType::Float => "FLOAT",
            ValueType::Double => "DOUBLE",
        };
        f.write_str(name)
    }
}

/// Decoded measurement value, one variant per wire encoding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::U8(_) => ValueType::UnsignedChar,
            Value::I8(_) => ValueType::SignedChar,
            Value::U16(_) => ValueType::UnsignedShort,
            Value::I16(_) => ValueType::SignedShort,
            Value::U32(_) => ValueType::UnsignedLong,
            Value::I32(_) => ValueType::SignedLong,
            Value::F32(_) => ValueType::Float,
            Value::F64(_) => ValueType::Double,
        }
    }

    /// Widen to `f64`; lossless for every variant
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::U8(v) => v as f64,
            Value::I8(v) => v as f64,
            Value::U16(v) => v as f64,
            Value::I16(v) => v as f64,
            Value::U32(v) => v as f64,
            Value::I32(v) => v as f64,
            Value::F32(v) => v as f64,
            Value::F64(v) => v,
        }
    }

    /// Little-endian value bytes as they follow the type tag
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match *self {
            Value::U8(v) => vec![v],
            Value::I8(v) => v.to_le_bytes().to_vec(),
            Value::U16(v) => v.to_le_bytes().to_vec(),
            Value::I16(v) => v.to_le_bytes().to_vec(),
            Value::U32(v) => v.to_le_bytes().to_vec(),
            Value::I32(v) => v.to_le_bytes().to_vec(),
            Value::F32(v) => v.to_le_bytes().to_vec(),
            Value::F64(v) => v.to_le_bytes().to_vec(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
        }
    }
}

/// Result of an online data query
///
/// A non-zero `status` is a condition reported by the device, not a frame
/// error. Channel and value are always present on success; error responses
/// may carry neither.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Channel echoed by the device
    pub channel: Option<u16>,

    /// Device-reported command status
    pub status: DeviceStatus,

    /// Measurement value
    pub value: Option<Value>,
}

/// Outgoing UMB request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    /// Target device
    pub destination: Address,

    /// Command code
    pub command: u8,

    /// Command version
    pub command_version: u8,

    /// Command-specific payload
    pub payload: Vec<u8>,
}

impl RequestFrame {
    /// Create a new request frame
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PayloadTooLarge`] if the payload would overflow
    /// the one-byte length field (more than 253 bytes).
    pub fn new(
        destination: Address,
        command: u8,
        command_version: u8,
        payload: Vec<u8>,
    ) -> Result<Self, FrameError> {
        if payload.len() > UMB_MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge {
                len: payload.len(),
                max: UMB_MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            destination,
            command,
            command_version,
            payload,
        })
    }

    /// Online data request (command 35, version 16) for one channel
    pub fn online_data(receiver_id: u8, channel: u16) -> Self {
        Self {
            destination: Address::device(receiver_id),
            command: UMB_CMD_ONLINE_DATA,
            command_version: UMB_CMD_ONLINE_DATA_VERSION,
            payload: channel.to_le_bytes().to_vec(),
        }
    }

    /// Length field value (command + command version + payload)
    ///
    /// Cannot overflow since the payload is validated to be ≤ 253 bytes
    pub fn length(&self) -> u8 {
        (2 + self.payload.len()) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_constants() {
        assert_eq!(UMB_SOH, 0x01);
        assert_eq!(UMB_STX, 0x02);
        assert_eq!(UMB_ETX, 0x03);
        assert_eq!(UMB_EOT, 0x04);
        assert_eq!(UMB_PROTOCOL_VERSION, 0x10);
        assert_eq!(UMB_CMD_ONLINE_DATA, 35);
        assert_eq!(UMB_CMD_ONLINE_DATA_VERSION, 16);
    }

    #[test]
    fn test_address_wire_order() {
        assert_eq!(Address::device(1).to_bytes(), [0x01, 0x70]);
        assert_eq!(Address::CONTROLLER.to_bytes(), [0x01, 0xF0]);
        assert_eq!(Address::from_bytes([0x05, 0x70]), Address::device(5));
        assert_eq!(Address::device(1).to_string(), "0x7001");
    }

    #[test]
    fn test_value_type_tags() {
        for tag in 0x10..=0x17u8 {
            let value_type = ValueType::try_from(tag).unwrap();
            assert_eq!(value_type.tag(), tag);
        }
        assert_eq!(ValueType::Double.width(), 8);
        assert_eq!(ValueType::SignedShort.width(), 2);
    }

    #[test]
    fn test_value_type_unknown_tag() {
        assert_eq!(ValueType::try_from(99), Err(FrameError::UnknownValueType(99)));
        assert_eq!(ValueType::try_from(0x18), Err(FrameError::UnknownValueType(0x18)));
    }

    #[test]
    fn test_value_widening() {
        assert_eq!(Value::I8(-1).as_f64(), -1.0);
        assert_eq!(Value::U32(u32::MAX).as_f64(), 4_294_967_295.0);
        assert_eq!(Value::F32(25.0).as_f64(), 25.0);
        assert_eq!(Value::I16(-40).value_type(), ValueType::SignedShort);
    }

    #[test]
    fn test_value_bytes_width_matches_type() {
        let values = [
            Value::U8(1),
            Value::I8(-1),
            Value::U16(100),
            Value::I16(-100),
            Value::U32(7),
            Value::I32(-7),
            Value::F32(1.5),
            Value::F64(-2.5),
        ];
        for value in values {
            assert_eq!(value.to_le_bytes().len(), value.value_type().width());
        }
        assert_eq!(Value::F32(25.0).to_le_bytes(), vec![0x00, 0x00, 0xC8, 0x41]);
    }

    #[test]
    fn test_request_frame() {
        let frame = RequestFrame::online_data(1, 100);
        assert_eq!(frame.destination, Address::device(1));
        assert_eq!(frame.payload, vec![0x64, 0x00]);
        assert_eq!(frame.length(), 4);
    }

    #[test]
    fn test_request_frame_payload_too_large() {
        let result = RequestFrame::new(Address::device(1), 0x23, 0x10, vec![0u8; 254]);
        assert_eq!(
            result,
            Err(FrameError::PayloadTooLarge { len: 254, max: 253 })
        );
    }

    #[test]
    fn test_request_frame_max_payload() {
        let frame = RequestFrame::new(Address::device(1), 0x23, 0x10, vec![0u8; 253]).unwrap();
        assert_eq!(frame.length(), 255);
    }
}
