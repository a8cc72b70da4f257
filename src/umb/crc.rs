//! # CRC-16 Implementation
//!
//! CRC-16/CCITT checksum in the reflected form used by UMB frames.
//!
//! **Polynomial**: 0x8408 (0x1021 bit-reversed)
//! **Initial Value**: 0xFFFF
//! **Final XOR**: none
//!
//! The checksum covers every byte from SOH through ETX inclusive and is
//! transmitted little-endian.

/// Reflected CRC-16/CCITT polynomial
const CRC16_POLY: u16 = 0x8408;

/// Accumulator seed, also the checksum of an empty input
pub const CRC16_INIT: u16 = 0xFFFF;

/// Precomputed CRC16 lookup table for fast calculation
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u16;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x0001) != 0 {
                crc = (crc >> 1) ^ CRC16_POLY;
            } else {
                crc >>= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate the UMB CRC-16 checksum using the lookup table (fast)
///
/// Produces exactly the same result as [`crc16_bitwise`] for every input.
///
/// # Arguments
///
/// * `data` - Frame bytes from SOH through ETX
///
/// # Returns
///
/// * `u16` - Calculated checksum
///
/// # Examples
///
/// ```
/// use umb_station::umb::crc::crc16;
///
/// assert_eq!(crc16(b"123456789"), 0x6F91);
/// assert_eq!(crc16(&[]), 0xFFFF);
/// ```
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = CRC16_INIT;

    for &byte in data {
        crc = (crc >> 8) ^ CRC16_TABLE[((crc ^ byte as u16) & 0x00FF) as usize];
    }

    crc
}

/// Calculate the UMB CRC-16 checksum one bit at a time
///
/// For each data bit, LSB first: if the accumulator's low bit differs from
/// the data bit the shifted accumulator is XORed with the polynomial,
/// otherwise it is only shifted. This is the reference form of the
/// algorithm and is used to verify the lookup table.
pub fn crc16_bitwise(data: &[u8]) -> u16 {
    data.iter().fold(CRC16_INIT, |crc, &byte| crc16_next_byte(crc, byte))
}

/// Feed one byte through the bit-serial accumulator
fn crc16_next_byte(mut crc: u16, mut byte: u8) -> u16 {
    for _ in 0..8 {
        let feedback = if (crc & 0x0001) ^ (byte as u16 & 0x0001) != 0 {
            CRC16_POLY
        } else {
            0x0000
        };
        crc = (crc >> 1) ^ feedback;
        byte >>= 1;
    }

    crc
}
