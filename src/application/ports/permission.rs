//! Permission authority port interface

use async_trait::async_trait;

/// Outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Port for microphone and storage permission
#[async_trait]
pub trait PermissionAuthority: Send + Sync {
    /// Ask for capture and storage access. May wait on the user.
    async fn request_microphone_and_storage(&self) -> PermissionStatus;
}
