//! Daemon app runner
//!
//! Hosts one recorder session behind the control socket. Progress events are written
//! to stdout as JSON lines for the host process; human-readable status goes to stderr.

use std::process::ExitCode;

use tracing::{info, warn};

use crate::application::ControllerConfig;
use crate::domain::session::SessionState;
use crate::infrastructure::JsonLinesEmitter;

use super::app::{spawn_desktop_session, EXIT_ERROR, EXIT_SUCCESS};
use super::args::DaemonOptions;
use super::ipc::{ControlTarget, SocketPath, UnixSocketServer};
use super::pid_file::PidFile;
use super::presenter::Presenter;
use super::signals::ShutdownSignals;

/// Run daemon mode
pub async fn run_daemon(options: DaemonOptions, config: ControllerConfig) -> ExitCode {
    let presenter = Presenter::new();

    let mut pid_file = PidFile::new();
    if let Err(e) = pid_file.acquire() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let mut signals = match ShutdownSignals::new() {
        Ok(s) => s,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let socket_path = SocketPath::new();
    let mut server = UnixSocketServer::new(socket_path.clone());
    if let Err(e) = server.bind() {
        presenter.error(&format!("Failed to bind socket: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let (bridge, interruptions, session) =
        spawn_desktop_session(config, options.notify, JsonLinesEmitter::stdout());
    let target = ControlTarget {
        bridge: bridge.clone(),
        interruptions,
        metering: options.metering,
    };
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run(target).await {
            warn!("Control socket stopped: {}", e);
        }
    });

    presenter.daemon_status("Started, waiting for commands...");
    presenter.info(&format!(
        "PID: {} | Socket: {} | SIGINT: exit",
        std::process::id(),
        socket_path.path().display()
    ));

    let signal = signals.recv().await;
    presenter.daemon_status(&format!("Received {}, shutting down...", signal));

    // Dropping the server task's future removes the socket file
    server_task.abort();
    let _ = server_task.await;

    let mut ok = true;
    match bridge.status().await {
        Ok(snapshot) if snapshot.state != SessionState::Idle.to_string() => {
            match bridge.stop_recorder().await {
                Ok(uri) => presenter.success(&format!("Recording saved: {}", uri)),
                Err(e) => {
                    presenter.error(&format!("Failed to stop recording: {}", e));
                    ok = false;
                }
            }
        }
        Ok(_) => {}
        Err(e) => {
            presenter.error(&e.to_string());
            ok = false;
        }
    }

    drop(bridge);
    let _ = session.await;
    if let Err(e) = pid_file.release() {
        presenter.warn(&e.to_string());
    }
    info!("Daemon stopped");

    if ok {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
