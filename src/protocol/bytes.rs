//! Fixed-offset binary field access for the Solarman wire format
//!
//! All multi-byte fields on the wire are little-endian unless a caller
//! passes [`ByteOrder::BigEndian`] explicitly (the acknowledgment header
//! words are the only big-endian fields in the protocol). Read offsets are
//! guaranteed by the caller to lie within the buffer; an out-of-range
//! access is a programming error, not a recoverable condition.

use chrono::TimeZone;
use thiserror::Error;

/// Byte order for multi-byte field writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Most significant byte first (used by the ack header words)
    BigEndian,
    /// Least significant byte first (protocol default)
    LittleEndian,
}

/// Packed timestamp fields do not form a valid calendar date
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("packed timestamp does not form a valid calendar date")]
pub struct InvalidTimestamp;

/// Read an unsigned byte at `offset`
pub fn read_u8(buf: &[u8], offset: usize) -> u8 {
    buf[offset]
}

/// Read a little-endian u16 at `offset`
pub fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

/// Read a little-endian u32 at `offset`
pub fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// Read a fixed-length string field, stopping at the first NUL byte
pub fn read_string(buf: &[u8], offset: usize, max_len: usize) -> String {
    let span = &buf[offset..offset + max_len];
    let end = span.iter().position(|&b| b == 0x00).unwrap_or(max_len);
    String::from_utf8_lossy(&span[..end]).into_owned()
}

/// Read `len` bytes as a lowercase hex string
///
/// Model and firmware codes are stored in reverse byte order on the wire;
/// `reverse` flips the span before encoding.
pub fn read_hex(buf: &[u8], offset: usize, len: usize, reverse: bool) -> String {
    let span = &buf[offset..offset + len];
    if reverse {
        let reversed: Vec<u8> = span.iter().rev().copied().collect();
        hex::encode(reversed)
    } else {
        hex::encode(span)
    }
}

/// Decode the packed date/time at `offset` into epoch seconds
///
/// The field is six consecutive little-endian u16 values: year (offset by
/// 2000), month, day, hour, minute, second, interpreted in the given
/// timezone. Production code passes `chrono::Local`; tests pass a fixed
/// offset for determinism.
pub fn read_timestamp<Tz: TimeZone>(
    buf: &[u8],
    offset: usize,
    tz: &Tz,
) -> Result<i64, InvalidTimestamp> {
    let year = 2000 + i32::from(read_u16_le(buf, offset));
    let month = u32::from(read_u16_le(buf, offset + 2));
    let day = u32::from(read_u16_le(buf, offset + 4));
    let hour = u32::from(read_u16_le(buf, offset + 6));
    let minute = u32::from(read_u16_le(buf, offset + 8));
    let second = u32::from(read_u16_le(buf, offset + 10));

    tz.with_ymd_and_hms(year, month, day, hour, minute, second)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or(InvalidTimestamp)
}

/// Write an unsigned byte at `offset`
pub fn write_u8(buf: &mut [u8], offset: usize, value: u8) {
    buf[offset] = value;
}

/// Write a u16 at `offset` in the given byte order
pub fn write_u16(buf: &mut [u8], offset: usize, value: u16, order: ByteOrder) {
    let bytes = match order {
        ByteOrder::BigEndian => value.to_be_bytes(),
        ByteOrder::LittleEndian => value.to_le_bytes(),
    };
    buf[offset..offset + 2].copy_from_slice(&bytes);
}

/// Write a u32 at `offset` in the given byte order
pub fn write_u32(buf: &mut [u8], offset: usize, value: u32, order: ByteOrder) {
    let bytes = match order {
        ByteOrder::BigEndian => value.to_be_bytes(),
        ByteOrder::LittleEndian => value.to_le_bytes(),
    };
    buf[offset..offset + 4].copy_from_slice(&bytes);
}

/// Additive checksum over `[start, end)`: sum of bytes mod 256
pub fn checksum(buf: &[u8], start: usize, end: usize) -> u8 {
    buf[start..end].iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_integer_reads() {
        let buf = [0xA5, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u8(&buf, 0), 0xA5);
        assert_eq!(read_u16_le(&buf, 1), 0x1234);
        assert_eq!(read_u32_le(&buf, 3), 0x12345678);
    }

    #[test]
    fn test_integer_writes_byte_order() {
        let mut buf = [0u8; 6];
        write_u16(&mut buf, 0, 0x1234, ByteOrder::LittleEndian);
        assert_eq!(&buf[..2], &[0x34, 0x12]);
        write_u16(&mut buf, 0, 0x1234, ByteOrder::BigEndian);
        assert_eq!(&buf[..2], &[0x12, 0x34]);

        write_u32(&mut buf, 2, 0x12345678, ByteOrder::LittleEndian);
        assert_eq!(&buf[2..], &[0x78, 0x56, 0x34, 0x12]);
        write_u32(&mut buf, 2, 0x12345678, ByteOrder::BigEndian);
        assert_eq!(&buf[2..], &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_read_string_nul_terminated() {
        let buf = b"ME_08_0501\x00\x00\x00\x00\x00";
        assert_eq!(read_string(buf, 0, 15), "ME_08_0501");
    }

    #[test]
    fn test_read_string_full_width() {
        let buf = b"192.168.001.002!";
        assert_eq!(read_string(buf, 0, 16), "192.168.001.002!");
    }

    #[test]
    fn test_read_hex() {
        let buf = [0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(read_hex(&buf, 0, 4, false), "deadbeef");
        assert_eq!(read_hex(&buf, 0, 4, true), "efbeadde");
        // 2-byte model codes are stored reversed on the wire
        assert_eq!(read_hex(&buf, 2, 2, true), "efbe");
    }

    #[test]
    fn test_read_timestamp() {
        // 2021-05-01 12:30:45
        let mut buf = [0u8; 12];
        write_u16(&mut buf, 0, 21, ByteOrder::LittleEndian);
        write_u16(&mut buf, 2, 5, ByteOrder::LittleEndian);
        write_u16(&mut buf, 4, 1, ByteOrder::LittleEndian);
        write_u16(&mut buf, 6, 12, ByteOrder::LittleEndian);
        write_u16(&mut buf, 8, 30, ByteOrder::LittleEndian);
        write_u16(&mut buf, 10, 45, ByteOrder::LittleEndian);

        let utc = FixedOffset::east_opt(0).unwrap();
        let expected = Utc
            .with_ymd_and_hms(2021, 5, 1, 12, 30, 45)
            .unwrap()
            .timestamp();
        assert_eq!(read_timestamp(&buf, 0, &utc), Ok(expected));

        // An hour east shifts the epoch back by an hour
        let cet = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(read_timestamp(&buf, 0, &cet), Ok(expected - 3600));
    }

    #[test]
    fn test_read_timestamp_invalid_date() {
        let mut buf = [0u8; 12];
        write_u16(&mut buf, 0, 21, ByteOrder::LittleEndian);
        write_u16(&mut buf, 2, 13, ByteOrder::LittleEndian); // month 13
        write_u16(&mut buf, 4, 1, ByteOrder::LittleEndian);

        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(read_timestamp(&buf, 0, &utc), Err(InvalidTimestamp));
    }

    #[test]
    fn test_checksum() {
        let buf = [0xA5, 0x01, 0x02, 0x03, 0xFF, 0x15];
        assert_eq!(checksum(&buf, 1, 5), 0x05); // 0x01 + 0x02 + 0x03 + 0xFF mod 256
        assert_eq!(checksum(&buf, 1, 1), 0x00); // empty range
    }
}
