//! Keep-alive port interface
//!
//! A keep-alive service keeps the process visible (and alive) while a session records,
//! and shows the current status to the person using the device.

use async_trait::async_trait;
use thiserror::Error;

/// Keep-alive errors
#[derive(Debug, Clone, Error)]
pub enum KeepAliveError {
    #[error("Keep-alive service unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to update keep-alive status: {0}")]
    UpdateFailed(String),
}

/// Port for the foreground-liveness service
#[async_trait]
pub trait KeepAlive: Send + Sync {
    /// A session started recording.
    async fn notify_started(&self) -> Result<(), KeepAliveError>;

    /// The session ended. Called once per started session.
    async fn notify_stopped(&self) -> Result<(), KeepAliveError>;

    /// Replace the visible status line.
    async fn update_status_text(&self, text: &str) -> Result<(), KeepAliveError>;
}

/// Blanket implementation for boxed keep-alive types
#[async_trait]
impl KeepAlive for Box<dyn KeepAlive> {
    async fn notify_started(&self) -> Result<(), KeepAliveError> {
        self.as_ref().notify_started().await
    }

    async fn notify_stopped(&self) -> Result<(), KeepAliveError> {
        self.as_ref().notify_stopped().await
    }

    async fn update_status_text(&self, text: &str) -> Result<(), KeepAliveError> {
        self.as_ref().update_status_text(text).await
    }
}
