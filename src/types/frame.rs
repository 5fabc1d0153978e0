//! Video frame types

/// Pixel dimensions of a video frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build from raw signed values, normalizing negatives to zero.
    pub fn from_raw(width: i32, height: i32) -> Self {
        Self {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }
    }
}

/// An encoded video frame as received off the wire
///
/// The byte payload is opaque to the networking core; decoding is the
/// consumer's concern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub bytes: Vec<u8>,
    pub size: FrameSize,
}

impl Frame {
    pub fn new(bytes: Vec<u8>, size: FrameSize) -> Self {
        Self { bytes, size }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
