//! Blocking FIFO monitor for motor commands
//!
//! The game/UI side enqueues commands; the control channel drains them with
//! a cooperative blocking wait. Strict FIFO is the only ordering guarantee;
//! duplicate selectors are not coalesced and there is no priority.
//!
//! The queue is unbounded (bounded only by memory), so `enqueue` never
//! blocks or rejects. Backpressure is advisory: once the queue length
//! crosses [`HIGH_WATER_MARK`] the per-command acks report saturation and
//! the enqueuing side is expected to throttle.

use crate::types::MotorCommand;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Queue length at which the saturation flag trips
pub const HIGH_WATER_MARK: usize = 32;

/// Thread-safe blocking FIFO of motor commands
#[derive(Default)]
pub struct CommandQueue {
    commands: Mutex<VecDeque<MotorCommand>>,
    available: Condvar,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command to the tail and wake one waiting consumer.
    pub fn enqueue(&self, command: MotorCommand) {
        self.commands.lock().push_back(command);
        self.available.notify_one();
    }

    /// Remove and return the head, suspending until one is available.
    pub fn dequeue_blocking(&self) -> MotorCommand {
        let mut commands = self.commands.lock();
        while commands.is_empty() {
            self.available.wait(&mut commands);
        }
        commands.pop_front().expect("queue non-empty after wait")
    }

    /// Like [`dequeue_blocking`](Self::dequeue_blocking) but gives up after
    /// `timeout`, so channel threads can observe their shutdown flag.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Option<MotorCommand> {
        let deadline = Instant::now() + timeout;
        let mut commands = self.commands.lock();
        while commands.is_empty() {
            if self.available.wait_until(&mut commands, deadline).timed_out() {
                break;
            }
        }
        commands.pop_front()
    }

    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }

    /// Whether the queue length has crossed the high-water mark.
    pub fn is_saturated(&self) -> bool {
        self.len() >= HIGH_WATER_MARK
    }
}
