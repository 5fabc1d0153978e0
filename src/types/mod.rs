//! Core data types for frames and motor commands.

pub mod frame;
pub mod motor;

pub use frame::{Frame, FrameSize};
pub use motor::{Motor, MotorCommand, MotorCommandAck, MAX_POWER, MIN_POWER};
