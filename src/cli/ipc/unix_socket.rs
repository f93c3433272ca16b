//! Unix Domain Socket transport for daemon control

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, warn};

use super::{ControlCommand, ControlReply, ControlTarget};

const SOCKET_NAME: &str = "recorder-bridge.sock";

/// Socket path resolver
#[derive(Debug, Clone)]
pub struct SocketPath {
    path: PathBuf,
}

impl SocketPath {
    /// Create socket path, preferring XDG_RUNTIME_DIR
    pub fn new() -> Self {
        let dir = std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Self {
            path: dir.join(SOCKET_NAME),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove socket file if it exists
    pub fn cleanup(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

impl Default for SocketPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Control socket server
pub struct UnixSocketServer {
    socket_path: SocketPath,
    listener: Option<UnixListener>,
}

impl UnixSocketServer {
    pub fn new(socket_path: SocketPath) -> Self {
        Self {
            socket_path,
            listener: None,
        }
    }

    /// Bind the listener, replacing a stale socket file
    pub fn bind(&mut self) -> io::Result<()> {
        self.socket_path.cleanup()?;
        self.listener = Some(UnixListener::bind(self.socket_path.path())?);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.socket_path.path()
    }

    /// Accept connections until the task is dropped, one handler task per connection
    pub async fn run(&self, target: ControlTarget) -> io::Result<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "Socket not bound"))?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let target = target.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &target).await {
                            warn!("Control connection error: {}", e);
                        }
                    });
                }
                Err(e) => warn!("Control socket accept error: {}", e),
            }
        }
    }

    pub fn cleanup(&self) {
        let _ = self.socket_path.cleanup();
    }
}

impl Drop for UnixSocketServer {
    fn drop(&mut self) {
        if self.listener.is_some() {
            self.cleanup();
        }
    }
}

async fn handle_connection(stream: UnixStream, target: &ControlTarget) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let reply = target.execute_line(&line).await;
    debug!(command = line.trim(), %reply, "Control reply");

    writer.write_all(format!("{}\n", reply).as_bytes()).await?;
    writer.flush().await
}

/// Control socket client
pub struct UnixSocketClient {
    socket_path: SocketPath,
}

impl UnixSocketClient {
    pub fn new(socket_path: SocketPath) -> Self {
        Self { socket_path }
    }

    /// Check if daemon appears to be running (socket exists)
    pub fn is_daemon_running(&self) -> bool {
        self.socket_path.exists()
    }

    /// Send a command and read the raw reply line
    pub async fn send_command(&self, command: &ControlCommand) -> io::Result<String> {
        let stream = UnixStream::connect(self.socket_path.path()).await?;
        let (reader, mut writer) = stream.into_split();

        writer.write_all(format!("{}\n", command).as_bytes()).await?;
        writer.flush().await?;

        let mut reader = BufReader::new(reader);
        let mut response = String::new();
        reader.read_line(&mut response).await?;
        Ok(response)
    }

    /// Send a command and parse the reply
    pub async fn request(&self, command: &ControlCommand) -> io::Result<ControlReply> {
        let line = self.send_command(command).await?;
        line.parse::<ControlReply>()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_uses_runtime_dir_or_temp() {
        let dir = std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        assert_eq!(SocketPath::new().path(), dir.join(SOCKET_NAME).as_path());
    }

    #[test]
    fn cleanup_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = SocketPath::with_path(dir.path().join("missing.sock"));
        assert!(path.cleanup().is_ok());
    }

    #[tokio::test]
    async fn bind_replaces_stale_socket_file() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("stale.sock");
        std::fs::write(&socket, b"").unwrap();

        let mut server = UnixSocketServer::new(SocketPath::with_path(&socket));
        server.bind().unwrap();
        assert!(socket.exists());

        drop(server);
        assert!(!socket.exists());
    }

    #[tokio::test]
    async fn client_reports_missing_daemon() {
        let dir = tempfile::tempdir().unwrap();
        let client = UnixSocketClient::new(SocketPath::with_path(dir.path().join("none.sock")));
        assert!(!client.is_daemon_running());
        assert!(client.request(&ControlCommand::Status).await.is_err());
    }
}
