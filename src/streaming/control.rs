//! Robot control channel
//!
//! Accepts one TCP client (the robot link) and drains the shared
//! [`CommandQueue`] to it. Each drained command is written as its 2-byte
//! wire form; the peer answers with a 1-byte receipt, after which an ack
//! carrying the local queue's saturation flag is delivered to the
//! enqueuing side. Saturation is the only backpressure signal the control
//! link exposes.
//!
//! The loop terminates on socket error or shutdown; queued-but-undelivered
//! commands are dropped. The game recomputes desired motor state each tick
//! rather than relying on delivery of every historical command, so dropped
//! commands are acceptable.

use crate::command_queue::CommandQueue;
use crate::error::Result;
use crate::streaming::{
    accept_single_client, read_byte_timeout, ChannelEvent, CONTROL_CHANNEL,
};
use crate::types::MotorCommandAck;
use crossbeam_channel::Sender;
use log::{debug, info};
use std::io::Write;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Bounded wait per drain attempt so the shutdown flag stays observable
const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(100);

/// Single-client motor command transmitter
pub struct ControlChannel {
    queue: Arc<CommandQueue>,
    running: Arc<AtomicBool>,
    events: Sender<ChannelEvent>,
    acks: Sender<MotorCommandAck>,
}

impl ControlChannel {
    pub fn new(
        queue: Arc<CommandQueue>,
        running: Arc<AtomicBool>,
        events: Sender<ChannelEvent>,
        acks: Sender<MotorCommandAck>,
    ) -> Self {
        Self {
            queue,
            running,
            events,
            acks,
        }
    }

    /// Accept one client and drain commands to it until error or shutdown.
    pub fn run(&self, listener: TcpListener) -> Result<()> {
        let Some(mut stream) = accept_single_client(&listener, &self.running)? else {
            return Ok(());
        };

        let _ = self.events.send(ChannelEvent::Connected {
            channel: CONTROL_CHANNEL,
        });

        let result = self.serve(&mut stream);
        let _ = stream.shutdown(Shutdown::Both);
        info!("Control channel closed");
        result
    }

    fn serve(&self, stream: &mut TcpStream) -> Result<()> {
        let mut commands_sent = 0u64;

        while self.running.load(Ordering::Relaxed) {
            let Some(command) = self.queue.dequeue_timeout(DEQUEUE_TIMEOUT) else {
                continue;
            };

            stream.write_all(&command.encode())?;
            commands_sent += 1;
            debug!("Sent {:?}", command);

            // Wait for the peer's receipt before acking the enqueuer
            let receipt = loop {
                if !self.running.load(Ordering::Relaxed) {
                    info!("Shutdown while awaiting receipt; dropping in-flight command");
                    return Ok(());
                }
                if let Some(byte) = read_byte_timeout(stream)? {
                    break byte;
                }
            };
            debug!("Receipt {:#04x} for {:?}", receipt, command);

            let ack = MotorCommandAck {
                queue_saturated: self.queue.is_saturated(),
            };
            // The enqueuing side may be slow or gone; that only degrades
            // backpressure reporting, never command delivery
            let _ = self.acks.try_send(ack);
        }

        info!("Control channel stopping ({} commands sent)", commands_sent);
        Ok(())
    }
}
