//! No-op keep-alive adapter
//!
//! Used when notifications are disabled.

use async_trait::async_trait;
use tracing::trace;

use crate::application::ports::{KeepAlive, KeepAliveError};

/// Keep-alive that only traces calls
#[derive(Debug, Default)]
pub struct NoOpKeepAlive;

impl NoOpKeepAlive {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl KeepAlive for NoOpKeepAlive {
    async fn notify_started(&self) -> Result<(), KeepAliveError> {
        trace!("keep-alive: started");
        Ok(())
    }

    async fn notify_stopped(&self) -> Result<(), KeepAliveError> {
        trace!("keep-alive: stopped");
        Ok(())
    }

    async fn update_status_text(&self, text: &str) -> Result<(), KeepAliveError> {
        trace!(text, "keep-alive: status");
        Ok(())
    }
}
