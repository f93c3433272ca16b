//! Shutdown signal handling for foreground and daemon modes

use std::io;

use tracing::info;

/// Wait for Ctrl+C
pub async fn ctrl_c() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// SIGINT/SIGTERM listener for daemon mode
#[cfg(unix)]
pub struct ShutdownSignals {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Install the handlers. Must be called inside the runtime.
    pub fn new() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for the next shutdown signal and return its name
    pub async fn recv(&mut self) -> &'static str {
        let name = tokio::select! {
            _ = self.sigint.recv() => "SIGINT",
            _ = self.sigterm.recv() => "SIGTERM",
        };
        info!(signal = name, "Shutdown requested");
        name
    }
}
