//! DrishtiLink - networking core for an augmented-reality robot game
//!
//! This library moves two data streams between a game client and a remote
//! camera-and-robot host:
//!
//! - **Video**: a flow-controlled TCP channel receives framed encoded video
//!   and publishes each frame to a double-buffered [`FrameBuffer`] the
//!   render thread drains at its own cadence.
//! - **Motor control**: the game enqueues [`MotorCommand`]s into a blocking
//!   [`CommandQueue`]; a second TCP channel drains them to the robot link
//!   and reports queue saturation back as the only backpressure signal.
//!
//! A UDP multicast discovery beacon announces the server until both
//! channels have a client attached. Rendering, vision, and game logic are
//! external collaborators reached only through the monitor types and the
//! connection-listener callback.

pub mod app;
pub mod command_queue;
pub mod config;
pub mod error;
pub mod frame_buffer;
pub mod streaming;
pub mod types;

// Re-export commonly used types
pub use app::LinkApp;
pub use command_queue::{CommandQueue, HIGH_WATER_MARK};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use frame_buffer::FrameBuffer;
pub use types::{Frame, FrameSize, Motor, MotorCommand, MotorCommandAck};
