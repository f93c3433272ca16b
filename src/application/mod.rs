//! Application layer - Use cases and port interfaces
//!
//! Contains the session controller, the task that owns it,
//! and trait definitions for external system interactions.

pub mod bridge;
pub mod controller;
pub mod ports;
pub mod ticker;

// Re-export use cases
pub use bridge::{spawn_session, BridgeError, InterruptionSender, RecorderBridge};
pub use controller::{
    ControllerConfig, SessionController, SessionSnapshot, PAUSED_MESSAGE, RESUMED_MESSAGE,
};
pub use ticker::{ProgressTicker, TickId};
