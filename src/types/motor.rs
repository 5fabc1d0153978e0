//! Motor command types for the robot control link

use crate::error::{Error, Result};

/// Minimum motor power
pub const MIN_POWER: i8 = -100;
/// Maximum motor power
pub const MAX_POWER: i8 = 100;

/// Motor selector carried in the first byte of a wire command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motor {
    /// No motor selected (stop / idle command)
    None,
    MotorA,
    MotorB,
    MotorC,
    /// A and C driven together (tank drive)
    MotorAC,
    /// Recenter the camera mount
    Recenter,
    /// Rotate the camera mount 90 degrees
    Rotate90,
}

impl Motor {
    /// Stable wire ordinal
    pub fn ordinal(self) -> u8 {
        match self {
            Motor::None => 0,
            Motor::MotorA => 1,
            Motor::MotorB => 2,
            Motor::MotorC => 3,
            Motor::MotorAC => 4,
            Motor::Recenter => 5,
            Motor::Rotate90 => 6,
        }
    }

    /// Decode a wire ordinal
    pub fn from_ordinal(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Motor::None),
            1 => Some(Motor::MotorA),
            2 => Some(Motor::MotorB),
            3 => Some(Motor::MotorC),
            4 => Some(Motor::MotorAC),
            5 => Some(Motor::Recenter),
            6 => Some(Motor::Rotate90),
            _ => None,
        }
    }
}

/// A single motor command awaiting delivery to the robot
///
/// Power outside [-100, 100] is rejected at construction and never reaches
/// the queue or the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCommand {
    motor: Motor,
    power: i8,
}

impl MotorCommand {
    pub fn new(motor: Motor, power: i8) -> Result<Self> {
        if !(MIN_POWER..=MAX_POWER).contains(&power) {
            return Err(Error::InvalidParameter(format!(
                "motor power {} outside [{}, {}]",
                power, MIN_POWER, MAX_POWER
            )));
        }
        Ok(Self { motor, power })
    }

    /// Stop command (no motor, zero power)
    pub fn stop() -> Self {
        Self {
            motor: Motor::None,
            power: 0,
        }
    }

    pub fn motor(&self) -> Motor {
        self.motor
    }

    pub fn power(&self) -> i8 {
        self.power
    }

    /// Wire encoding: selector ordinal followed by signed power byte
    pub fn encode(&self) -> [u8; 2] {
        [self.motor.ordinal(), self.power as u8]
    }

    /// Decode the 2-byte wire form
    pub fn decode(bytes: [u8; 2]) -> Result<Self> {
        let motor = Motor::from_ordinal(bytes[0])
            .ok_or_else(|| Error::Protocol(format!("unknown motor ordinal {:#04x}", bytes[0])))?;
        Self::new(motor, bytes[1] as i8)
    }
}

/// Per-command acknowledgement delivered back to the enqueuing side
///
/// `queue_saturated` is the only backpressure signal the control link
/// exposes: it tells the sender to throttle further enqueues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCommandAck {
    pub queue_saturated: bool,
}

impl MotorCommandAck {
    pub fn as_byte(self) -> u8 {
        self.queue_saturated as u8
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            queue_saturated: byte != 0,
        }
    }
}
