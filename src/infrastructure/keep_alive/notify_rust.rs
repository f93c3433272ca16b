//! Keep-alive adapter using desktop notifications (notify-rust)
//!
//! Works on Windows, macOS, and Linux. On freedesktop servers the session keeps a single
//! notification that status updates replace in place and stop closes.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use notify_rust::Notification;

use crate::application::ports::{KeepAlive, KeepAliveError};

/// Freedesktop icon shown while recording
const RECORDING_ICON: &str = "audio-input-microphone";

/// Id of the notification currently on screen
#[derive(Debug, Default, Clone)]
struct NotificationSlot(Arc<Mutex<Option<u32>>>);

impl NotificationSlot {
    fn current(&self) -> Option<u32> {
        self.0.lock().ok().and_then(|id| *id)
    }

    fn remember(&self, id: u32) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(id);
        }
    }

    fn take(&self) -> Option<u32> {
        self.0.lock().ok().and_then(|mut id| id.take())
    }
}

/// Keep-alive that surfaces session status as desktop notifications
pub struct NotifyRustKeepAlive {
    app_name: String,
    slot: NotificationSlot,
}

impl NotifyRustKeepAlive {
    pub fn new() -> Self {
        Self::with_app_name("Recorder")
    }

    /// Create with custom app name
    pub fn with_app_name(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            slot: NotificationSlot::default(),
        }
    }

    async fn show(&self, body: &str) -> Result<(), KeepAliveError> {
        let app_name = self.app_name.clone();
        let body = body.to_owned();
        let slot = self.slot.clone();

        // notify-rust can block on the session bus
        tokio::task::spawn_blocking(move || display(&app_name, &body, &slot))
            .await
            .map_err(|e| KeepAliveError::UpdateFailed(format!("Task join error: {}", e)))?
    }

    async fn dismiss(&self, id: u32) -> Result<(), KeepAliveError> {
        let app_name = self.app_name.clone();
        tokio::task::spawn_blocking(move || close(&app_name, id))
            .await
            .map_err(|e| KeepAliveError::UpdateFailed(format!("Task join error: {}", e)))?
    }
}

impl Default for NotifyRustKeepAlive {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeepAlive for NotifyRustKeepAlive {
    async fn notify_started(&self) -> Result<(), KeepAliveError> {
        self.show("Recording").await
    }

    async fn notify_stopped(&self) -> Result<(), KeepAliveError> {
        match self.slot.take() {
            Some(id) => self.dismiss(id).await,
            None => self.show("Recording stopped").await,
        }
    }

    async fn update_status_text(&self, text: &str) -> Result<(), KeepAliveError> {
        self.show(text).await
    }
}

fn notification(app_name: &str, body: &str) -> Notification {
    let mut notification = Notification::new();
    notification
        .appname(app_name)
        .summary(app_name)
        .body(body)
        .icon(RECORDING_ICON);
    notification
}

#[cfg(all(unix, not(target_os = "macos")))]
fn display(app_name: &str, body: &str, slot: &NotificationSlot) -> Result<(), KeepAliveError> {
    let mut notification = notification(app_name, body);
    if let Some(id) = slot.current() {
        notification.id(id);
    }
    let handle = notification
        .show()
        .map_err(|e| KeepAliveError::Unavailable(e.to_string()))?;
    slot.remember(handle.id());
    Ok(())
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn display(app_name: &str, body: &str, _slot: &NotificationSlot) -> Result<(), KeepAliveError> {
    notification(app_name, body)
        .show()
        .map(|_| ())
        .map_err(|e| KeepAliveError::Unavailable(e.to_string()))
}

#[cfg(all(unix, not(target_os = "macos")))]
fn close(app_name: &str, id: u32) -> Result<(), KeepAliveError> {
    let mut notification = notification(app_name, "Recording stopped");
    notification.id(id);
    let handle = notification
        .show()
        .map_err(|e| KeepAliveError::Unavailable(e.to_string()))?;
    handle.close();
    Ok(())
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn close(_app_name: &str, _id: u32) -> Result<(), KeepAliveError> {
    Ok(())
}
