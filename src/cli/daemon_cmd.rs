//! Daemon command handler - sends commands to running daemon via IPC

use crate::domain::session::InterruptionEvent;

use super::args::DaemonAction;
use super::ipc::{ControlCommand, ControlReply, SocketPath, UnixSocketClient};
use super::presenter::Presenter;

/// Translate a CLI action into a control command
pub fn control_command(action: DaemonAction) -> ControlCommand {
    match action {
        DaemonAction::Start { path, no_metering } => ControlCommand::Start {
            path,
            metering: no_metering.then_some(false),
        },
        DaemonAction::Pause => ControlCommand::Pause,
        DaemonAction::Resume => ControlCommand::Resume,
        DaemonAction::Stop => ControlCommand::Stop,
        DaemonAction::Status => ControlCommand::Status,
        DaemonAction::Interval { seconds } => ControlCommand::Interval(seconds),
        DaemonAction::InterruptBegin => {
            ControlCommand::Interrupt(InterruptionEvent::InterruptionBegan)
        }
        DaemonAction::InterruptEnd { no_resume } => {
            ControlCommand::Interrupt(InterruptionEvent::InterruptionEnded {
                resume_permitted: !no_resume,
            })
        }
        DaemonAction::Call { state } => {
            ControlCommand::Interrupt(InterruptionEvent::CallStateChanged(state))
        }
        DaemonAction::Route { reason } => {
            ControlCommand::Interrupt(InterruptionEvent::RouteChanged(reason))
        }
    }
}

/// Handle daemon subcommand
pub async fn handle_daemon_command(
    action: DaemonAction,
    presenter: &Presenter,
) -> Result<(), String> {
    let client = UnixSocketClient::new(SocketPath::new());
    if !client.is_daemon_running() {
        return Err("No daemon running. Start with: recorder-bridge --daemon".to_string());
    }

    let command = control_command(action);
    let reply = client
        .request(&command)
        .await
        .map_err(|e| format!("Failed to communicate with daemon: {}", e))?;

    match reply {
        ControlReply::Ok(body) => {
            presenter.output(&body);
            Ok(())
        }
        ControlReply::Error { code, message } => Err(format!("{} ({})", message, code)),
    }
}
