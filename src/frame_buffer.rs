//! Double-buffered video frame monitor
//!
//! The video channel's I/O thread publishes the most recent frame here and
//! the render/vision thread drains it at its own cadence. The hand-off is a
//! double buffer expressed through ownership: `publish` moves the new frame
//! into the published slot under the lock and hands the superseded frame
//! back to the producer for reuse, so the producer never mutates a buffer
//! the consumer might be mid-read on.
//!
//! Guarantees:
//! - `latest` never blocks and never observes a partially written frame
//!   (the critical section is a pointer swap or a clone, no I/O under the
//!   lock).
//! - Last-writer-wins recency only; no ordering stronger than "most
//!   recently published at time of read".

use crate::types::{Frame, FrameSize};
use parking_lot::Mutex;

#[derive(Default)]
struct Published {
    frame: Option<Frame>,
    /// Set on publish, cleared by the first `latest` that observes the
    /// frame. Drives the video channel's ACK_WAIT pacing.
    unread: bool,
}

/// Thread-safe holder for the most recent decoded video frame
#[derive(Default)]
pub struct FrameBuffer {
    published: Mutex<Published>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new frame, superseding the previous one.
    ///
    /// Called by the video channel only, on its I/O thread. Returns the
    /// superseded frame so the producer can reuse its allocation.
    pub fn publish(&self, frame: Frame) -> Option<Frame> {
        let mut slot = self.published.lock();
        let previous = slot.frame.replace(frame);
        slot.unread = true;
        previous
    }

    /// Most recently published frame, or `None` before the first publish.
    ///
    /// Never blocks; returns a copy the caller owns outright.
    pub fn latest(&self) -> Option<Frame> {
        let mut slot = self.published.lock();
        slot.unread = false;
        slot.frame.clone()
    }

    /// Dimensions of the most recently published frame (zero before the
    /// first publish).
    pub fn dimensions(&self) -> FrameSize {
        self.published
            .lock()
            .frame
            .as_ref()
            .map(|f| f.size)
            .unwrap_or_default()
    }

    /// Whether the published frame has not yet been observed by `latest`.
    pub fn has_unread(&self) -> bool {
        self.published.lock().unread
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn frame_of(value: u8, len: usize) -> Frame {
        Frame::new(vec![value; len], FrameSize::new(320, 240))
    }

    #[test]
    fn test_empty_before_first_publish() {
        let buffer = FrameBuffer::new();
        assert!(buffer.latest().is_none());
        assert_eq!(buffer.dimensions(), FrameSize::default());
        assert!(!buffer.has_unread());
    }

    #[test]
    fn test_last_writer_wins() {
        let buffer = FrameBuffer::new();
        buffer.publish(frame_of(1, 16));
        buffer.publish(frame_of(2, 16));
        assert_eq!(buffer.latest().unwrap().bytes, vec![2u8; 16]);
    }

    #[test]
    fn test_publish_returns_superseded_frame() {
        let buffer = FrameBuffer::new();
        assert!(buffer.publish(frame_of(1, 16)).is_none());
        let old = buffer.publish(frame_of(2, 16)).unwrap();
        assert_eq!(old.bytes, vec![1u8; 16]);
    }

    #[test]
    fn test_unread_flag_lifecycle() {
        let buffer = FrameBuffer::new();
        buffer.publish(frame_of(1, 16));
        assert!(buffer.has_unread());
        buffer.latest();
        assert!(!buffer.has_unread());
    }

    #[test]
    fn test_no_torn_reads_under_concurrency() {
        let buffer = Arc::new(FrameBuffer::new());
        let writer_buffer = Arc::clone(&buffer);

        // Every published frame is uniform, so a torn read would show up
        // as a frame containing more than one distinct byte value.
        let writer = thread::spawn(move || {
            for i in 0..2000u32 {
                writer_buffer.publish(frame_of((i % 256) as u8, 1024));
            }
        });

        let mut observed = 0;
        while observed < 2000 {
            if let Some(frame) = buffer.latest() {
                let first = frame.bytes[0];
                assert!(
                    frame.bytes.iter().all(|&b| b == first),
                    "torn frame observed"
                );
                assert_eq!(frame.size, FrameSize::new(320, 240));
            }
            observed += 1;
        }

        writer.join().unwrap();
        let last = buffer.latest().unwrap();
        assert_eq!(last.bytes[0], (1999 % 256) as u8);
    }
}
