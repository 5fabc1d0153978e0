//! Network-facing components: discovery beacon, video transport, robot
//! control link.
//!
//! Each component runs on its own dedicated thread. The video and control
//! channels accept exactly one TCP client apiece for their lifetime; a
//! second connection is never accepted because the accept loop hands off to
//! the session loop after the first client attaches.

pub mod control;
pub mod discovery;
pub mod protocol;
pub mod video;

pub use control::ControlChannel;
pub use discovery::{BeaconState, DiscoveryBeacon, ANNOUNCEMENT};
pub use protocol::ControlByte;
pub use video::VideoChannel;

use crate::error::Result;
use std::io;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Name the video channel reports through connection events
pub const VIDEO_CHANNEL: &str = "video";
/// Name the control channel reports through connection events
pub const CONTROL_CHANNEL: &str = "control";

/// Poll interval while waiting for a client to attach
const ACCEPT_POLL: Duration = Duration::from_millis(10);
/// Read timeout so session loops can observe the shutdown flag
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Events emitted by channel threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel's single client attached. Fired exactly once per
    /// channel instance.
    Connected { channel: &'static str },
}

/// Collaborator-supplied callback invoked once per channel when its single
/// client attaches.
pub trait ConnectionListener: Send + Sync {
    fn on_channel_connected(&self, channel: &str);
}

/// Wait for a channel's single client, cancellable via the shutdown flag.
///
/// The listener is polled non-blocking so a stop request never hangs in
/// `accept()`. Returns `None` if shutdown was requested before a client
/// attached. The accepted stream is switched back to blocking mode with a
/// read timeout for shutdown-aware session loops.
pub(crate) fn accept_single_client(
    listener: &TcpListener,
    running: &AtomicBool,
) -> Result<Option<TcpStream>> {
    listener.set_nonblocking(true)?;

    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                stream.set_nonblocking(false)?;
                stream.set_read_timeout(Some(READ_TIMEOUT))?;
                log::info!("Client connected: {}", addr);
                return Ok(Some(stream));
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(None)
}

/// Read one byte, treating a read timeout as "nothing yet".
pub(crate) fn read_byte_timeout(stream: &mut TcpStream) -> Result<Option<u8>> {
    use std::io::Read;

    let mut byte = [0u8; 1];
    match stream.read_exact(&mut byte) {
        Ok(()) => Ok(Some(byte[0])),
        Err(ref e)
            if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut =>
        {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Fill `buf` from the stream, tolerating read timeouts while the shutdown
/// flag is clear.
///
/// A slow peer stalling mid-frame is not a protocol violation, so timeouts
/// only surface as shutdown checks here. Partial progress is kept across
/// timeouts (plain `read`, not `read_exact`), so a stall never
/// desynchronizes the stream. Returns `false` if shutdown was requested
/// before the buffer filled.
pub(crate) fn read_exact_cancellable(
    stream: &mut TcpStream,
    buf: &mut [u8],
    running: &AtomicBool,
) -> Result<bool> {
    use std::io::Read;

    let mut filled = 0;
    while filled < buf.len() {
        if !running.load(Ordering::Relaxed) {
            return Ok(false);
        }
        match stream.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            Ok(n) => filled += n,
            Err(ref e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut
                    || e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}
