//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces, integrating with
//! the audio device, the filesystem and the desktop notification service.

pub mod config;
pub mod events;
pub mod keep_alive;
pub mod permission;
pub mod recording;
pub mod storage;

// Re-export adapters
pub use config::XdgConfigStore;
pub use events::{ChannelEmitter, JsonLinesEmitter};
pub use keep_alive::{create_keep_alive, NoOpKeepAlive, NotifyRustKeepAlive};
pub use permission::DevicePermission;
pub use recording::{create_recorder, CpalRecorder};
pub use storage::CacheDirResolver;
