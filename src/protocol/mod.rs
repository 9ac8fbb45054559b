//! Solarman V5-style wire protocol: envelope validation, payload decoding
//! and acknowledgment synthesis

pub mod bytes;
pub mod frame;
pub mod payload;
pub mod response;
pub mod sequence;
pub mod testkit;

pub use frame::{Frame, FrameError, FRAME_TYPE_DATA, FRAME_TYPE_INFORMATION};
pub use payload::{decode, DataPayload, DataType, InformationPayload, Payload, PayloadError};
pub use response::{build_response, Clock, SystemClock, RESPONSE_LEN};
pub use sequence::SequenceTracker;
