//! Acknowledgment frame synthesis
//!
//! When an inbound frame has the response-required bit set, the logger
//! expects a fixed 23-byte acknowledgment echoing its identity fields and
//! carrying the server-side sequence value plus the current wall clock.
//! The two header words at offsets 3 and 5 are big-endian; everything else
//! follows the protocol's little-endian default.

use chrono::{DateTime, FixedOffset, Local};

use super::bytes::{checksum, write_u16, write_u32, write_u8, ByteOrder};
use super::frame::{Frame, END_MARKER, START_MARKER};
use super::sequence::SequenceTracker;

/// Acknowledgment frames are always exactly this long
pub const RESPONSE_LEN: usize = 23;

/// Declared payload length of an acknowledgment
const RESPONSE_PAYLOAD_LEN: u16 = 0x0A;

/// Wall-clock source for acknowledgment timestamps
///
/// Injected so tests can pin the instant and UTC offset; production uses
/// [`SystemClock`].
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The local system clock with its current UTC offset
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Build the acknowledgment for a validated frame
///
/// Returns `None` when the frame does not request a response. Advances the
/// sequence tracker for the frame's logger serial as a side effect.
pub fn build_response(
    frame: &Frame,
    tracker: &SequenceTracker,
    clock: &dyn Clock,
) -> Option<[u8; RESPONSE_LEN]> {
    if !frame.response_required() {
        return None;
    }

    let now = clock.now();
    let sequence = tracker.next(frame.logger_serial());
    let mut buf = [0u8; RESPONSE_LEN];

    write_u8(&mut buf, 0, START_MARKER);
    write_u16(&mut buf, 1, RESPONSE_PAYLOAD_LEN, ByteOrder::LittleEndian);
    write_u16(
        &mut buf,
        3,
        (u16::from(frame.protocol_version()) << 12) | (1 << 4) | u16::from(frame.frame_type()),
        ByteOrder::BigEndian,
    );
    write_u16(
        &mut buf,
        5,
        (u16::from(sequence) << 8) | u16::from(frame.client_sequence()),
        ByteOrder::BigEndian,
    );
    write_u32(&mut buf, 7, frame.logger_serial(), ByteOrder::LittleEndian);
    write_u8(&mut buf, 11, frame.command_type());
    write_u8(&mut buf, 12, 0x01);
    write_u32(&mut buf, 13, now.timestamp() as u32, ByteOrder::LittleEndian);
    let tz_minutes = (now.offset().local_minus_utc() / 60) as i16;
    write_u16(&mut buf, 17, tz_minutes as u16, ByteOrder::LittleEndian);
    write_u16(&mut buf, 19, 0x00, ByteOrder::LittleEndian);
    let cs = checksum(&buf, 1, 21);
    write_u8(&mut buf, 21, cs);
    write_u8(&mut buf, 22, END_MARKER);

    Some(buf)
}
