//! IPC (Inter-Process Communication) module for daemon control
//!
//! The daemon listens on a Unix domain socket. Every connection carries a single
//! [`ControlCommand`] line and receives a single [`ControlReply`] line.

mod protocol;
mod unix_socket;

pub use protocol::{ControlCommand, ControlParseError, ControlReply};
pub use unix_socket::{SocketPath, UnixSocketClient, UnixSocketServer};

use tracing::debug;

use crate::application::{BridgeError, InterruptionSender, RecorderBridge};
use crate::domain::recording::{EncodingOptions, DEFAULT_DESTINATION};

/// Reply body for queued interruption events
pub const QUEUED: &str = "queued";

/// Session handles a control connection acts on
#[derive(Clone)]
pub struct ControlTarget {
    pub bridge: RecorderBridge,
    pub interruptions: InterruptionSender,
    /// Metering used by `start` when the command does not say
    pub metering: bool,
}

impl ControlTarget {
    /// Run one command against the session
    pub async fn execute(&self, command: ControlCommand) -> ControlReply {
        debug!(%command, "Control command");
        let result = match command {
            ControlCommand::Start { path, metering } => {
                self.bridge
                    .start_with_options(
                        path.as_deref().unwrap_or(DEFAULT_DESTINATION),
                        EncodingOptions::default(),
                        metering.unwrap_or(self.metering),
                    )
                    .await
            }
            ControlCommand::Pause => self.bridge.pause_recorder().await,
            ControlCommand::Resume => self.bridge.resume_recorder().await,
            ControlCommand::Stop => self.bridge.stop_recorder().await,
            ControlCommand::Status => self.bridge.status().await.map(|snapshot| {
                serde_json::to_string(&snapshot).unwrap_or_else(|_| snapshot.state.clone())
            }),
            ControlCommand::Interval(secs) => self.bridge.set_subscription_duration(secs).await,
            ControlCommand::Interrupt(event) => {
                if self.interruptions.send(event) {
                    Ok(QUEUED.to_string())
                } else {
                    Err(BridgeError::Closed)
                }
            }
        };

        match result {
            Ok(body) => ControlReply::Ok(body),
            Err(e) => ControlReply::error(e.code(), &e),
        }
    }

    /// Parse and run one command line
    pub async fn execute_line(&self, line: &str) -> ControlReply {
        match line.parse::<ControlCommand>() {
            Ok(command) => self.execute(command).await,
            Err(e) => ControlReply::error(ControlParseError::CODE, e),
        }
    }
}
