//! Video channel control bytes and image framing
//!
//! # Wire Protocol
//!
//! Every message on the video channel starts with a single control byte.
//! An `IMAGE_DATA` byte is followed by a fixed-width header and the encoded
//! image payload:
//!
//! ```text
//! ┌──────────────┬──────────────────┬───────────────┬────────────────┬──────────┐
//! │ Control byte │ Length (4 bytes) │ Width (2 B)   │ Height (2 B)   │ Payload  │
//! │ IMAGE_DATA   │ Big-endian u32   │ Big-endian u16│ Big-endian u16 │ variable │
//! └──────────────┴──────────────────┴───────────────┴────────────────┴──────────┘
//! ```
//!
//! All other control bytes stand alone. Length prefix and dimensions use
//! network byte order (big-endian); the payload is capped at 1 MiB and
//! oversized frames close the connection.
//!
//! # Control Planes
//!
//! Two flow-control planes share the byte stream:
//!
//! | Plane | Bytes | Initiator |
//! |-------|-------|-----------|
//! | Receiver pacing | `ACK_SEND_NEXT`, `ACK_WAIT` | Frame consumer |
//! | Sender pacing | `FLOW_CONTROL_WAIT`, `FLOW_CONTROL_CONTINUE` | Frame producer |
//!
//! `STREAM_CONTROL_END` from either side closes the stream.
//! `SIGNAL_UNRECOGNIZED` is a deliberate "not a known message" sentinel; it
//! is a defined protocol value, distinct from transport garbage, though both
//! currently receive the same defensive resynchronization downstream.

use crate::error::{Error, Result};
use crate::types::{Frame, FrameSize};
use std::io::Write;

/// Either side is done; close the stream
pub const STREAM_CONTROL_END: u8 = 0x01;
/// Receiver is ready for the next frame
pub const ACK_SEND_NEXT: u8 = 0x02;
/// Receiver's consumer is still busy; sender must hold
pub const ACK_WAIT: u8 = 0x03;
/// Sender is pausing its own transmission
pub const FLOW_CONTROL_WAIT: u8 = 0x04;
/// Sender is resuming transmission
pub const FLOW_CONTROL_CONTINUE: u8 = 0x05;
/// An image header and payload follow
pub const IMAGE_DATA: u8 = 0x06;
/// Deliberate "not a known message" sentinel
pub const SIGNAL_UNRECOGNIZED: u8 = 0xFF;

/// Maximum accepted image payload (DoS protection)
pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// Decoded control byte
///
/// Closed set with an explicit unrecognized variant carrying the raw byte,
/// so channel state machines stay exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlByte {
    EndStream,
    AckSendNext,
    AckWait,
    FlowWait,
    FlowContinue,
    ImageData,
    Unrecognized(u8),
}

impl From<u8> for ControlByte {
    fn from(byte: u8) -> Self {
        match byte {
            STREAM_CONTROL_END => ControlByte::EndStream,
            ACK_SEND_NEXT => ControlByte::AckSendNext,
            ACK_WAIT => ControlByte::AckWait,
            FLOW_CONTROL_WAIT => ControlByte::FlowWait,
            FLOW_CONTROL_CONTINUE => ControlByte::FlowContinue,
            IMAGE_DATA => ControlByte::ImageData,
            other => ControlByte::Unrecognized(other),
        }
    }
}

impl ControlByte {
    pub fn as_byte(self) -> u8 {
        match self {
            ControlByte::EndStream => STREAM_CONTROL_END,
            ControlByte::AckSendNext => ACK_SEND_NEXT,
            ControlByte::AckWait => ACK_WAIT,
            ControlByte::FlowWait => FLOW_CONTROL_WAIT,
            ControlByte::FlowContinue => FLOW_CONTROL_CONTINUE,
            ControlByte::ImageData => IMAGE_DATA,
            ControlByte::Unrecognized(_) => SIGNAL_UNRECOGNIZED,
        }
    }
}

/// Whether a byte is a defined protocol value
///
/// True for the six message constants and for the deliberate unrecognized
/// sentinel; false for anything else on the wire. This is the
/// collaborator-facing predicate; the channel state machines themselves
/// decode through [`ControlByte`], whose exhaustive match carries the same
/// set.
pub fn is_valid(byte: u8) -> bool {
    matches!(
        byte,
        STREAM_CONTROL_END
            | ACK_SEND_NEXT
            | ACK_WAIT
            | FLOW_CONTROL_WAIT
            | FLOW_CONTROL_CONTINUE
            | IMAGE_DATA
            | SIGNAL_UNRECOGNIZED
    )
}

/// Size of the fixed header that follows an `IMAGE_DATA` control byte
pub const IMAGE_HEADER_LEN: usize = 8;

/// Write an `IMAGE_DATA` control byte, header, and payload.
///
/// Frames that cannot be represented on the wire (payload over the cap,
/// dimensions beyond u16) are rejected here rather than silently truncated
/// by the header casts.
pub fn write_image_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    if frame.bytes.len() > MAX_IMAGE_BYTES {
        return Err(Error::InvalidParameter(format!(
            "image payload too large for wire: {} bytes",
            frame.bytes.len()
        )));
    }
    if frame.size.width > u16::MAX as u32 || frame.size.height > u16::MAX as u32 {
        return Err(Error::InvalidParameter(format!(
            "frame dimensions {}x{} exceed wire limit",
            frame.size.width, frame.size.height
        )));
    }

    writer.write_all(&[IMAGE_DATA])?;
    writer.write_all(&(frame.bytes.len() as u32).to_be_bytes())?;
    writer.write_all(&(frame.size.width as u16).to_be_bytes())?;
    writer.write_all(&(frame.size.height as u16).to_be_bytes())?;
    writer.write_all(&frame.bytes)?;
    Ok(())
}

/// Parse the fixed header that follows an `IMAGE_DATA` control byte,
/// yielding the payload length and frame dimensions.
pub fn parse_image_header(header: [u8; IMAGE_HEADER_LEN]) -> Result<(usize, FrameSize)> {
    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    if len > MAX_IMAGE_BYTES {
        return Err(Error::Protocol(format!(
            "image payload too large: {} bytes",
            len
        )));
    }
    let width = u16::from_be_bytes([header[4], header[5]]);
    let height = u16::from_be_bytes([header[6], header[7]]);

    Ok((len, FrameSize::new(width as u32, height as u32)))
}
