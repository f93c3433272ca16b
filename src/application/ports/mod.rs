//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod events;
pub mod keep_alive;
pub mod permission;
pub mod recorder;
pub mod storage;

// Re-export common types
pub use config::ConfigStore;
pub use events::{EmitError, EventEmitter};
pub use keep_alive::{KeepAlive, KeepAliveError};
pub use permission::{PermissionAuthority, PermissionStatus};
pub use recorder::{Recorder, RecorderError};
pub use storage::PathResolver;
