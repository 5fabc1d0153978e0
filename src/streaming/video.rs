//! Flow-controlled video transport channel
//!
//! Accepts one TCP client for the lifetime of the channel and receives
//! framed encoded video from it under explicit flow control, publishing
//! each frame to the shared [`FrameBuffer`].
//!
//! # State machine
//!
//! ```text
//! LISTENING --accept--> CONNECTED --IMAGE_DATA--> STREAMING
//! STREAMING --consumer busy--> WAITING (ACK_WAIT sent, hold sender)
//! any state --STREAM_CONTROL_END / IO error / shutdown--> CLOSED
//! ```
//!
//! # Flow control
//!
//! Two independent planes share the stream (see [`protocol`]):
//!
//! - Receiver pacing: this channel answers each frame with `ACK_SEND_NEXT`,
//!   or `ACK_WAIT` first if the consumer has not yet drained the previous
//!   frame.
//! - Sender pacing: the peer may signal `FLOW_CONTROL_WAIT` /
//!   `FLOW_CONTROL_CONTINUE` around its own transmission gaps (encoder
//!   backpressure); this side only tracks and logs them.
//!
//! An unrecognized control byte is a protocol violation handled locally:
//! the current exchange is abandoned and the loop resynchronizes on the
//! next recognized control byte. It never tears down the connection or the
//! thread.

use crate::error::Result;
use crate::frame_buffer::FrameBuffer;
use crate::streaming::{
    accept_single_client, protocol, read_byte_timeout, read_exact_cancellable, ChannelEvent,
    ControlByte, VIDEO_CHANNEL,
};
use crate::types::Frame;
use crossbeam_channel::Sender;
use log::{debug, info, warn};
use std::io::Write;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Poll interval while holding the sender for a busy consumer
const CONSUMER_POLL: Duration = Duration::from_millis(5);

/// Single-client video receiver
pub struct VideoChannel {
    frame_buffer: Arc<FrameBuffer>,
    running: Arc<AtomicBool>,
    events: Sender<ChannelEvent>,
}

impl VideoChannel {
    pub fn new(
        frame_buffer: Arc<FrameBuffer>,
        running: Arc<AtomicBool>,
        events: Sender<ChannelEvent>,
    ) -> Self {
        Self {
            frame_buffer,
            running,
            events,
        }
    }

    /// Accept one client and serve it until end-of-stream, error, or
    /// shutdown. The socket is closed on every exit path.
    pub fn run(&self, listener: TcpListener) -> Result<()> {
        let Some(mut stream) = accept_single_client(&listener, &self.running)? else {
            return Ok(());
        };

        let _ = self.events.send(ChannelEvent::Connected {
            channel: VIDEO_CHANNEL,
        });

        let result = self.serve(&mut stream);
        let _ = stream.shutdown(Shutdown::Both);
        info!("Video channel closed");
        result
    }

    fn serve(&self, stream: &mut TcpStream) -> Result<()> {
        // Kick off streaming: tell the peer we are ready for the first frame
        stream.write_all(&[protocol::ACK_SEND_NEXT])?;

        let mut frames_received = 0u64;
        let mut sender_paused = false;

        loop {
            if !self.running.load(Ordering::Relaxed) {
                break;
            }

            let Some(byte) = read_byte_timeout(stream)? else {
                continue;
            };

            match ControlByte::from(byte) {
                ControlByte::ImageData => {
                    if sender_paused {
                        warn!("Frame received while sender signalled pause");
                    }
                    // The body may trickle in slower than the socket read
                    // timeout; only shutdown or a real I/O error ends the
                    // session here
                    let mut header = [0u8; protocol::IMAGE_HEADER_LEN];
                    if !read_exact_cancellable(stream, &mut header, &self.running)? {
                        break;
                    }
                    let (len, size) = protocol::parse_image_header(header)?;
                    let mut bytes = vec![0u8; len];
                    if !read_exact_cancellable(stream, &mut bytes, &self.running)? {
                        break;
                    }
                    let frame = Frame::new(bytes, size);
                    debug!(
                        "Frame received: {} bytes, {}x{}",
                        frame.bytes.len(),
                        frame.size.width,
                        frame.size.height
                    );

                    let consumer_busy = self.frame_buffer.has_unread();
                    self.frame_buffer.publish(frame);
                    frames_received += 1;

                    if consumer_busy {
                        stream.write_all(&[protocol::ACK_WAIT])?;
                        self.hold_for_consumer();
                    }
                    stream.write_all(&[protocol::ACK_SEND_NEXT])?;
                }
                ControlByte::EndStream => {
                    info!("Peer ended video stream ({} frames received)", frames_received);
                    return Ok(());
                }
                ControlByte::FlowWait => {
                    debug!("Peer paused transmission");
                    sender_paused = true;
                }
                ControlByte::FlowContinue => {
                    debug!("Peer resumed transmission");
                    sender_paused = false;
                }
                ControlByte::AckSendNext | ControlByte::AckWait => {
                    // Receiver-plane bytes are ours to send, not the peer's
                    debug!("Ignoring receiver-plane byte {:#04x} from peer", byte);
                }
                ControlByte::Unrecognized(raw) => {
                    warn!(
                        "Unrecognized control byte {:#04x}, resynchronizing on next message",
                        raw
                    );
                }
            }
        }

        // Shutdown path: best effort goodbye to the peer
        let _ = stream.write_all(&[protocol::STREAM_CONTROL_END]);
        Ok(())
    }

    /// Hold the sender until the consumer drains the published frame.
    fn hold_for_consumer(&self) {
        while self.running.load(Ordering::Relaxed) && self.frame_buffer.has_unread() {
            thread::sleep(CONSUMER_POLL);
        }
    }
}
