//! Desktop permission authority
//!
//! Desktop systems have no runtime permission dialog for audio capture here, so access
//! is granted when an input device exists and the recording directory is writable.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cpal::traits::HostTrait;
use tracing::{debug, warn};

use crate::application::ports::{PermissionAuthority, PermissionStatus};

const PROBE_FILE: &str = ".write-probe";

/// Permission authority backed by device and filesystem checks
pub struct DevicePermission {
    storage_dir: PathBuf,
}

impl DevicePermission {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    fn has_input_device() -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn is_writable(dir: &Path) -> bool {
        if let Err(e) = std::fs::create_dir_all(dir) {
            debug!(dir = %dir.display(), "Cannot create storage dir: {}", e);
            return false;
        }
        let probe = dir.join(PROBE_FILE);
        match std::fs::write(&probe, b"") {
            Ok(()) => {
                let _ = std::fs::remove_file(&probe);
                true
            }
            Err(e) => {
                debug!(dir = %dir.display(), "Storage dir not writable: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl PermissionAuthority for DevicePermission {
    async fn request_microphone_and_storage(&self) -> PermissionStatus {
        let dir = self.storage_dir.clone();
        let checked = tokio::task::spawn_blocking(move || {
            (Self::has_input_device(), Self::is_writable(&dir))
        })
        .await;

        match checked {
            Ok((true, true)) => PermissionStatus::Granted,
            Ok((device, writable)) => {
                warn!(
                    input_device = device,
                    storage_writable = writable,
                    "Recording not permitted"
                );
                PermissionStatus::Denied
            }
            Err(e) => {
                warn!("Permission check failed: {}", e);
                PermissionStatus::Denied
            }
        }
    }
}
