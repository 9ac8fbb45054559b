//! Structured payload extraction from validated frames
//!
//! Exactly two frame kinds are understood: the information frame (0x01)
//! reporting logger identity, and the data frame (0x02) reporting inverter
//! telemetry. Field offsets are fixed positions inside the raw frame.
//!
//! Scaling note: the analog channels are tenths (`/10`), grid frequency is
//! hundredths (`/100`), `kwh_today` is `/100` and `kwh_total`/`kwh_yesterday`
//! are `/10`, while the month/year energy counters are raw register values
//! with no scaling. The asymmetry matches the device registers and is
//! intentional.

use chrono::TimeZone;
use serde::Serialize;
use thiserror::Error;

use super::bytes::{read_hex, read_string, read_timestamp, read_u16_le, read_u32_le, read_u8};
use super::frame::{Frame, FRAME_TYPE_DATA, FRAME_TYPE_INFORMATION};

/// Highest offset (exclusive) read by the information decoder
const INFORMATION_FIELD_SPAN: usize = 92;
/// Highest offset (exclusive) read by the data decoder
const DATA_FIELD_SPAN: usize = 244;

/// Payload decoding errors
///
/// All of these are recoverable at the connection level: publishing is
/// skipped but an acknowledgment is still attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("unsupported frame type: 0x{0:02x}")]
    UnsupportedFrameType(u8),

    #[error("frame too short for frame type 0x{frame_type:02x}: {len} bytes")]
    Truncated { frame_type: u8, len: usize },

    #[error("invalid timestamp in data frame")]
    InvalidTimestamp,
}

/// Whether a data frame carries a live or a backfilled reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    #[serde(rename = "real-time")]
    RealTime,
    #[serde(rename = "historical")]
    Historical,
}

/// Logger identity snapshot (frame type 0x01)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InformationPayload {
    pub data_logger_sn: String,
    pub total_working_time: u32,
    pub signal_quality: u8,
    pub firmware: String,
    pub mac_address: String,
    pub ip_address: String,
}

/// Inverter telemetry snapshot (frame type 0x02)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPayload {
    pub dts: i64,
    pub data_type: DataType,
    pub data_logger_sn: String,
    pub total_working_time: u32,
    pub inverter_sn: String,
    pub temperature: f64,
    pub v_dc1: f64,
    pub i_dc1: f64,
    pub v_dc2: f64,
    pub i_dc2: f64,
    pub v_ac1: f64,
    pub i_ac1: f64,
    pub v_ac2: f64,
    pub i_ac2: f64,
    pub v_ac3: f64,
    pub i_ac3: f64,
    pub f_grid: f64,
    pub power: u16,
    pub kwh_today: f64,
    pub kwh_yesterday: f64,
    pub kwh_this_month: u32,
    pub kwh_last_month: u32,
    pub kwh_this_year: u32,
    pub kwh_last_year: u32,
    pub kwh_total: f64,
    pub inverter_model: String,
    pub firmware_slave: String,
    pub firmware_main: String,
    pub status: u16,
}

/// Decoded frame payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Information(InformationPayload),
    Data(DataPayload),
}

impl Payload {
    /// Topic segment used when publishing this payload
    pub fn topic_suffix(&self) -> &'static str {
        match self {
            Payload::Information(_) => "information",
            Payload::Data(_) => "data",
        }
    }
}

/// Decode a validated frame into a structured payload
///
/// The timezone is used to interpret the packed timestamp of a data frame;
/// production passes `chrono::Local`. Decoding is pure: the same frame and
/// timezone always produce the same payload.
pub fn decode<Tz: TimeZone>(frame: &Frame, tz: &Tz) -> Result<Payload, PayloadError> {
    match frame.frame_type() {
        FRAME_TYPE_INFORMATION => decode_information(frame).map(Payload::Information),
        FRAME_TYPE_DATA => decode_data(frame, tz).map(Payload::Data),
        other => Err(PayloadError::UnsupportedFrameType(other)),
    }
}

fn decode_information(frame: &Frame) -> Result<InformationPayload, PayloadError> {
    let raw = check_span(frame, INFORMATION_FIELD_SPAN)?;

    Ok(InformationPayload {
        data_logger_sn: frame.logger_serial().to_string(),
        total_working_time: read_u32_le(raw, 12),
        signal_quality: read_u8(raw, 28),
        firmware: read_string(raw, 30, 15),
        mac_address: read_hex(raw, 70, 6, false),
        ip_address: read_string(raw, 76, 16),
    })
}

fn decode_data<Tz: TimeZone>(frame: &Frame, tz: &Tz) -> Result<DataPayload, PayloadError> {
    let raw = check_span(frame, DATA_FIELD_SPAN)?;

    let dts = read_timestamp(raw, 146, tz).map_err(|_| PayloadError::InvalidTimestamp)?;
    let data_type = if frame.command_type() & 0b1000_0000 != 0 {
        DataType::Historical
    } else {
        DataType::RealTime
    };

    Ok(DataPayload {
        dts,
        data_type,
        data_logger_sn: frame.logger_serial().to_string(),
        total_working_time: read_u32_le(raw, 14),
        inverter_sn: read_string(raw, 32, 15),
        temperature: f64::from(read_u16_le(raw, 48)) / 10.0,
        v_dc1: f64::from(read_u16_le(raw, 50)) / 10.0,
        i_dc1: f64::from(read_u16_le(raw, 54)) / 10.0,
        v_dc2: f64::from(read_u16_le(raw, 52)) / 10.0,
        i_dc2: f64::from(read_u16_le(raw, 56)) / 10.0,
        v_ac1: f64::from(read_u16_le(raw, 64)) / 10.0,
        i_ac1: f64::from(read_u16_le(raw, 58)) / 10.0,
        v_ac2: f64::from(read_u16_le(raw, 66)) / 10.0,
        i_ac2: f64::from(read_u16_le(raw, 60)) / 10.0,
        v_ac3: f64::from(read_u16_le(raw, 68)) / 10.0,
        i_ac3: f64::from(read_u16_le(raw, 62)) / 10.0,
        f_grid: f64::from(read_u16_le(raw, 70)) / 100.0,
        power: read_u16_le(raw, 72),
        kwh_today: f64::from(read_u32_le(raw, 76)) / 100.0,
        kwh_yesterday: f64::from(read_u16_le(raw, 128)) / 10.0,
        kwh_this_month: read_u32_le(raw, 120),
        kwh_last_month: read_u32_le(raw, 124),
        kwh_this_year: read_u32_le(raw, 130),
        kwh_last_year: read_u32_le(raw, 134),
        kwh_total: f64::from(read_u32_le(raw, 80)) / 10.0,
        inverter_model: read_hex(raw, 158, 2, true),
        firmware_slave: read_hex(raw, 160, 2, true),
        firmware_main: read_hex(raw, 162, 2, true),
        status: read_u16_le(raw, 242),
    })
}

fn check_span(frame: &Frame, span: usize) -> Result<&[u8], PayloadError> {
    let raw = frame.raw();
    if raw.len() < span {
        return Err(PayloadError::Truncated {
            frame_type: frame.frame_type(),
            len: raw.len(),
        });
    }
    Ok(raw)
}
