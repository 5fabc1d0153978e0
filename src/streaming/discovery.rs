//! Service discovery beacon
//!
//! Announces the server's presence over UDP multicast until a client
//! attaches to both channels. Clients listen on the discovery port, note
//! the announcement's source address, and connect to the video and control
//! ports directly.
//!
//! Termination is cooperative: `finish()` flips the state under the lock
//! and the send loop observes it on its next iteration, so worst-case stop
//! latency equals the beacon interval.

use crate::error::Result;
use log::{debug, error, info};
use parking_lot::Mutex;
use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

/// Fixed ASCII announcement payload
pub const ANNOUNCEMENT: &[u8] = b"DrishtiLink server here!";

/// Beacon lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconState {
    Running,
    Stopping,
    Stopped,
}

/// Periodic UDP announcement of service presence
pub struct DiscoveryBeacon {
    state: Mutex<BeaconState>,
    target: SocketAddr,
    interval: Duration,
}

impl DiscoveryBeacon {
    pub fn new(target: SocketAddr, interval: Duration) -> Self {
        Self {
            state: Mutex::new(BeaconState::Running),
            target,
            interval,
        }
    }

    /// Send announcements until stopped.
    ///
    /// A bind failure is fatal to the beacon: the error is returned before
    /// any announcement is sent. A send failure terminates the loop without
    /// retry; this is a best-effort beacon, not a reliable link.
    pub fn run(&self) -> Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_multicast_ttl_v4(1)?;

        info!(
            "Discovery beacon announcing to {} every {:?}",
            self.target, self.interval
        );

        loop {
            {
                let mut state = self.state.lock();
                if *state != BeaconState::Running {
                    *state = BeaconState::Stopped;
                    break;
                }
            }

            if let Err(e) = socket.send_to(ANNOUNCEMENT, self.target) {
                error!("Beacon send failed: {}", e);
                *self.state.lock() = BeaconState::Stopped;
                return Err(e.into());
            }
            debug!("Announcement sent to {}", self.target);

            thread::sleep(self.interval);
        }

        info!("Discovery beacon stopped");
        Ok(())
    }

    /// Request cooperative termination.
    ///
    /// Observed by the send loop on its next iteration.
    pub fn finish(&self) {
        let mut state = self.state.lock();
        if *state == BeaconState::Running {
            *state = BeaconState::Stopping;
        }
    }

    pub fn state(&self) -> BeaconState {
        *self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_before_run() {
        let beacon = DiscoveryBeacon::new(
            "127.0.0.1:19988".parse().unwrap(),
            Duration::from_millis(10),
        );
        assert_eq!(beacon.state(), BeaconState::Running);
        beacon.finish();
        assert_eq!(beacon.state(), BeaconState::Stopping);

        // Loop observes the stop request before sending anything else
        beacon.run().unwrap();
        assert_eq!(beacon.state(), BeaconState::Stopped);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let beacon = DiscoveryBeacon::new(
            "127.0.0.1:19988".parse().unwrap(),
            Duration::from_millis(10),
        );
        beacon.finish();
        beacon.finish();
        assert_eq!(beacon.state(), BeaconState::Stopping);
    }
}
