//! Solarman frame envelope validation and field access
//!
//! A frame is one unit of the wire protocol, bounded by the start marker
//! (0xA5) and end marker (0x15) with an additive checksum in the
//! next-to-last byte. Validation happens once, up front; on success the
//! [`Frame`] owns the raw buffer and exposes the header fields through
//! computed accessors, without copying anything.

use bytes::Bytes;
use thiserror::Error;

use super::bytes::{checksum, read_u16_le, read_u32_le, read_u8};

/// Frame start marker
pub const START_MARKER: u8 = 0xA5;
/// Frame end marker
pub const END_MARKER: u8 = 0x15;

/// Information frame: logger/network identity report
pub const FRAME_TYPE_INFORMATION: u8 = 0x01;
/// Data frame: inverter telemetry report
pub const FRAME_TYPE_DATA: u8 = 0x02;

/// Envelope fields occupy the first 13 bytes; the declared payload length
/// excludes them.
const HEADER_AND_TRAILER_LEN: usize = 13;

/// Frame envelope validation errors
///
/// Checks are applied in declaration order and short-circuit on the first
/// failure, so every invalid buffer maps to exactly one variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("no data")]
    EmptyFrame,

    #[error("invalid start marker: 0x{0:02x}")]
    InvalidStartMarker(u8),

    #[error("declared payload length {declared} does not fit frame of {frame_len} bytes")]
    InvalidLength { declared: u16, frame_len: usize },

    #[error("checksum mismatch: expected 0x{expected:02x}, got 0x{actual:02x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("invalid end marker: 0x{0:02x}")]
    InvalidEndMarker(u8),
}

/// One validated wire frame
#[derive(Debug, Clone)]
pub struct Frame {
    raw: Bytes,
}

impl Frame {
    /// Validate a received buffer and wrap it as a [`Frame`]
    ///
    /// Steps, in order: non-empty, start marker, declared length fits,
    /// checksum, end marker. The first failing check wins.
    pub fn validate(raw: Bytes) -> Result<Self, FrameError> {
        let len = raw.len();
        if len == 0 {
            return Err(FrameError::EmptyFrame);
        }

        if raw[0] != START_MARKER {
            return Err(FrameError::InvalidStartMarker(raw[0]));
        }

        if len < HEADER_AND_TRAILER_LEN {
            return Err(FrameError::InvalidLength {
                declared: 0,
                frame_len: len,
            });
        }
        let declared = read_u16_le(&raw, 1);
        if usize::from(declared) > len - HEADER_AND_TRAILER_LEN {
            return Err(FrameError::InvalidLength {
                declared,
                frame_len: len,
            });
        }

        let expected = checksum(&raw, 1, len - 2);
        let actual = raw[len - 2];
        if actual != expected {
            return Err(FrameError::ChecksumMismatch { expected, actual });
        }

        if raw[len - 1] != END_MARKER {
            return Err(FrameError::InvalidEndMarker(raw[len - 1]));
        }

        Ok(Self { raw })
    }

    /// The validated wire bytes
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Frame type: low nibble of byte 4
    pub fn frame_type(&self) -> u8 {
        read_u8(&self.raw, 4) & 0x0F
    }

    /// Protocol version: high nibble of byte 3
    pub fn protocol_version(&self) -> u8 {
        (read_u8(&self.raw, 3) & 0xF0) >> 4
    }

    /// Command type byte, echoed back in the acknowledgment
    pub fn command_type(&self) -> u8 {
        read_u8(&self.raw, 11)
    }

    /// Sequence value chosen by the logger
    pub fn client_sequence(&self) -> u8 {
        read_u8(&self.raw, 6)
    }

    /// Data logger serial number
    pub fn logger_serial(&self) -> u32 {
        read_u32_le(&self.raw, 7)
    }

    /// Whether the logger expects an acknowledgment (bit 6 of byte 4)
    pub fn response_required(&self) -> bool {
        read_u8(&self.raw, 4) & 0b0100_0000 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::testkit::FrameBuilder;

    #[test]
    fn test_empty_frame() {
        match Frame::validate(Bytes::new()) {
            Err(FrameError::EmptyFrame) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_start_marker() {
        let mut raw = FrameBuilder::information().build();
        raw[0] = 0xA6;
        match Frame::validate(Bytes::from(raw)) {
            Err(FrameError::InvalidStartMarker(0xA6)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_declared_length() {
        let raw = FrameBuilder::information().declared_length(9999).build();
        match Frame::validate(Bytes::from(raw)) {
            Err(FrameError::InvalidLength { declared: 9999, .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_short_frame_rejected() {
        let raw = vec![START_MARKER, 0x00, 0x00];
        match Frame::validate(Bytes::from(raw)) {
            Err(FrameError::InvalidLength { frame_len: 3, .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut raw = FrameBuilder::information().build();
        let len = raw.len();
        raw[len - 2] = raw[len - 2].wrapping_add(1);
        match Frame::validate(Bytes::from(raw)) {
            Err(FrameError::ChecksumMismatch { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_corrupted_payload_byte_fails_checksum() {
        // Flipping any payload byte without recomputing the checksum must
        // always be caught.
        let raw = FrameBuilder::information().build();
        for offset in 12..raw.len() - 2 {
            let mut corrupted = raw.clone();
            corrupted[offset] = corrupted[offset].wrapping_add(1);
            match Frame::validate(Bytes::from(corrupted)) {
                Err(FrameError::ChecksumMismatch { .. }) => {}
                other => panic!("offset {}: unexpected result: {:?}", offset, other),
            }
        }
    }

    #[test]
    fn test_invalid_end_marker() {
        let mut raw = FrameBuilder::information().build();
        let len = raw.len();
        raw[len - 1] = 0x16;
        // The checksum does not cover the end byte, so only the marker check fails
        match Frame::validate(Bytes::from(raw)) {
            Err(FrameError::InvalidEndMarker(0x16)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_valid_frame_accessors() {
        let raw = FrameBuilder::information()
            .protocol_version(0x02)
            .client_sequence(0x42)
            .logger_serial(1_234_567_890)
            .command_type(0x81)
            .response_required(true)
            .build();
        let frame = Frame::validate(Bytes::from(raw)).unwrap();

        assert_eq!(frame.frame_type(), FRAME_TYPE_INFORMATION);
        assert_eq!(frame.protocol_version(), 0x02);
        assert_eq!(frame.client_sequence(), 0x42);
        assert_eq!(frame.logger_serial(), 1_234_567_890);
        assert_eq!(frame.command_type(), 0x81);
        assert!(frame.response_required());
    }

    #[test]
    fn test_response_flag_unset() {
        let raw = FrameBuilder::data().build();
        let frame = Frame::validate(Bytes::from(raw)).unwrap();
        assert!(!frame.response_required());
        assert_eq!(frame.frame_type(), FRAME_TYPE_DATA);
    }
}
