//! Frame fixture builders shared by unit and integration tests
//!
//! Builds protocol-correct frames: header fields are written at their wire
//! offsets and the checksum/end marker are computed last, so a built frame
//! always passes envelope validation unless a test corrupts it afterwards.

use super::bytes::{checksum, write_u16, write_u32, write_u8, ByteOrder};
use super::frame::{END_MARKER, FRAME_TYPE_DATA, FRAME_TYPE_INFORMATION, START_MARKER};

/// Smallest frame that carries every information-payload field
pub const INFORMATION_FRAME_LEN: usize = 94;
/// Smallest frame that carries every data-payload field
pub const DATA_FRAME_LEN: usize = 246;

/// Builder for test frames of a given type and size
pub struct FrameBuilder {
    buf: Vec<u8>,
}

impl FrameBuilder {
    /// Start a frame of `len` bytes with the given frame type nibble
    pub fn new(frame_type: u8, len: usize) -> Self {
        let mut buf = vec![0u8; len];
        buf[0] = START_MARKER;
        write_u16(&mut buf, 1, (len - 13) as u16, ByteOrder::LittleEndian);
        buf[4] = frame_type & 0x0F;
        Self { buf }
    }

    /// An information frame sized to hold all its fields
    pub fn information() -> Self {
        Self::new(FRAME_TYPE_INFORMATION, INFORMATION_FRAME_LEN)
    }

    /// A data frame sized to hold all its fields
    pub fn data() -> Self {
        Self::new(FRAME_TYPE_DATA, DATA_FRAME_LEN)
    }

    /// Override the declared payload length (for invalid-length fixtures)
    pub fn declared_length(mut self, declared: u16) -> Self {
        write_u16(&mut self.buf, 1, declared, ByteOrder::LittleEndian);
        self
    }

    pub fn protocol_version(mut self, version: u8) -> Self {
        self.buf[3] = (self.buf[3] & 0x0F) | (version << 4);
        self
    }

    pub fn response_required(mut self, required: bool) -> Self {
        if required {
            self.buf[4] |= 0b0100_0000;
        } else {
            self.buf[4] &= !0b0100_0000;
        }
        self
    }

    pub fn client_sequence(mut self, seq: u8) -> Self {
        self.buf[6] = seq;
        self
    }

    pub fn logger_serial(mut self, serial: u32) -> Self {
        write_u32(&mut self.buf, 7, serial, ByteOrder::LittleEndian);
        self
    }

    pub fn command_type(mut self, command: u8) -> Self {
        self.buf[11] = command;
        self
    }

    /// Write a raw byte at a payload offset
    pub fn u8_at(mut self, offset: usize, value: u8) -> Self {
        write_u8(&mut self.buf, offset, value);
        self
    }

    /// Write a little-endian u16 at a payload offset
    pub fn u16_at(mut self, offset: usize, value: u16) -> Self {
        write_u16(&mut self.buf, offset, value, ByteOrder::LittleEndian);
        self
    }

    /// Write a little-endian u32 at a payload offset
    pub fn u32_at(mut self, offset: usize, value: u32) -> Self {
        write_u32(&mut self.buf, offset, value, ByteOrder::LittleEndian);
        self
    }

    /// Write a string field at a payload offset (remaining width stays NUL)
    pub fn str_at(mut self, offset: usize, value: &str) -> Self {
        self.buf[offset..offset + value.len()].copy_from_slice(value.as_bytes());
        self
    }

    /// Write raw bytes at a payload offset
    pub fn bytes_at(mut self, offset: usize, value: &[u8]) -> Self {
        self.buf[offset..offset + value.len()].copy_from_slice(value);
        self
    }

    /// Write a packed timestamp (six u16 LE fields) at a payload offset
    #[allow(clippy::too_many_arguments)]
    pub fn timestamp_at(
        mut self,
        offset: usize,
        year: u16,
        month: u16,
        day: u16,
        hour: u16,
        minute: u16,
        second: u16,
    ) -> Self {
        for (idx, field) in [year, month, day, hour, minute, second].iter().enumerate() {
            write_u16(&mut self.buf, offset + idx * 2, *field, ByteOrder::LittleEndian);
        }
        self
    }

    /// Finalize: compute the checksum and place the end marker
    pub fn build(mut self) -> Vec<u8> {
        let len = self.buf.len();
        self.buf[len - 2] = checksum(&self.buf, 1, len - 2);
        self.buf[len - 1] = END_MARKER;
        self.buf
    }
}
