//! PID file guarding against a second daemon

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use thiserror::Error;

const PID_FILE_NAME: &str = "recorder-bridge.pid";

/// PID file errors
#[derive(Debug, Error)]
pub enum PidFileError {
    #[error("Another daemon is already running (PID: {0})")]
    AlreadyRunning(u32),

    #[error("Failed to write PID file {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    #[error("Failed to remove PID file {path}: {source}")]
    RemoveFailed { path: PathBuf, source: io::Error },
}

/// PID file for daemon mode, removed on drop
pub struct PidFile {
    path: PathBuf,
    owned: bool,
}

impl PidFile {
    /// PID file next to the control socket
    pub fn new() -> Self {
        let dir = std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Self::with_path(dir.join(PID_FILE_NAME))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PID of a live daemon recorded in the file, if any. Stale files are removed.
    pub fn running_pid(&self) -> Option<u32> {
        let pid: u32 = fs::read_to_string(&self.path).ok()?.trim().parse().ok()?;
        let raw = i32::try_from(pid).ok()?;

        match kill(Pid::from_raw(raw), None) {
            Ok(()) | Err(Errno::EPERM) => Some(pid),
            Err(_) => {
                let _ = fs::remove_file(&self.path);
                None
            }
        }
    }

    /// Record this process, failing if another daemon is alive
    pub fn acquire(&mut self) -> Result<(), PidFileError> {
        if let Some(pid) = self.running_pid() {
            return Err(PidFileError::AlreadyRunning(pid));
        }
        fs::write(&self.path, process::id().to_string()).map_err(|source| {
            PidFileError::WriteFailed {
                path: self.path.clone(),
                source,
            }
        })?;
        self.owned = true;
        Ok(())
    }

    pub fn release(&mut self) -> Result<(), PidFileError> {
        if !self.owned {
            return Ok(());
        }
        self.owned = false;
        match fs::remove_file(&self.path) {
            Err(source) if source.kind() != io::ErrorKind::NotFound => {
                Err(PidFileError::RemoveFailed {
                    path: self.path.clone(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }
}

impl Default for PidFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = PidFile::with_path(dir.path().join("none.pid"));
        assert!(pid_file.running_pid().is_none());
    }

    #[test]
    fn acquire_writes_and_drop_removes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        {
            let mut pid_file = PidFile::with_path(&path);
            pid_file.acquire().unwrap();
            assert_eq!(
                fs::read_to_string(&path).unwrap(),
                process::id().to_string()
            );
        }
        assert!(!path.exists());
    }

    #[test]
    fn live_pid_blocks_second_daemon() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        fs::write(&path, process::id().to_string()).unwrap();

        let mut pid_file = PidFile::with_path(&path);
        assert!(matches!(
            pid_file.acquire(),
            Err(PidFileError::AlreadyRunning(pid)) if pid == process::id()
        ));
        drop(pid_file);
        assert!(path.exists());
    }

    #[test]
    fn garbage_contents_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        fs::write(&path, "not a pid").unwrap();
        assert!(PidFile::with_path(&path).running_pid().is_none());
    }
}
