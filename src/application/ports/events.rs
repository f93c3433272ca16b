//! Progress event sink port interface

use thiserror::Error;

use crate::domain::session::ProgressEvent;

/// Event delivery errors
#[derive(Debug, Clone, Error)]
pub enum EmitError {
    #[error("Event receiver is gone")]
    Disconnected,

    #[error("Failed to deliver event: {0}")]
    DeliveryFailed(String),
}

/// Port for delivering progress events to the host.
///
/// Called from the session owner task, so implementations must not block.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: &ProgressEvent) -> Result<(), EmitError>;
}
