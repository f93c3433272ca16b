//! recorder-bridge - pausable audio recording sessions for host applications
//!
//! A single recording session is driven by host commands (start, pause, resume, stop),
//! by OS interruption events (audio focus loss, phone calls, route changes) and by a
//! periodic progress ticker reporting position and input level.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Session state machine, interruption arbitration, encoding options, errors
//! - **Application**: Port traits, the session controller and the bridge task that owns it
//! - **Infrastructure**: Adapters (cpal capture, FLAC output, notifications, config files)
//! - **CLI**: Foreground recorder, control daemon and config management

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
