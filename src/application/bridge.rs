//! Host-facing bridge
//!
//! [`spawn_session`] moves a [`SessionController`] into its own task. Host commands reach
//! it through a cloneable [`RecorderBridge`]; OS callbacks, from any thread, push events
//! through an [`InterruptionSender`]. Together with progress ticks, everything is handled
//! one message at a time by that task.

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::error::SessionError;
use crate::domain::recording::EncodingOptions;
use crate::domain::session::{InterruptionEvent, Origin};

use super::controller::{SessionController, SessionSnapshot};
use super::ports::{EventEmitter, KeepAlive, PathResolver, PermissionAuthority, Recorder};

const COMMAND_QUEUE_DEPTH: usize = 32;

/// Errors returned to the host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Rejected(#[from] SessionError),

    #[error("Recorder session is not running")]
    Closed,
}

impl BridgeError {
    /// Stable rejection code reported to the host
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Rejected(e) => e.code(),
            Self::Closed => "BridgeClosed",
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

enum Command {
    Start {
        destination: String,
        options: EncodingOptions,
        metering: bool,
        reply: Reply<String>,
    },
    Pause {
        reply: Reply<String>,
    },
    Resume {
        reply: Reply<String>,
    },
    Stop {
        reply: Reply<String>,
    },
    SetSubscriptionDuration {
        secs: f64,
        reply: oneshot::Sender<String>,
    },
    Status {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Cloneable handle for host commands
#[derive(Clone)]
pub struct RecorderBridge {
    commands: mpsc::Sender<Command>,
}

impl RecorderBridge {
    /// Start recording. Resolves with the output `file://` URI.
    ///
    /// `options` is the host's loose option map; unknown keys are ignored.
    pub async fn start_recorder(
        &self,
        path: &str,
        options: &Map<String, Value>,
        metering_enabled: bool,
    ) -> Result<String, BridgeError> {
        let options = EncodingOptions::from_map(options)?;
        self.start_with_options(path, options, metering_enabled).await
    }

    /// Start recording with already-typed options
    pub async fn start_with_options(
        &self,
        path: &str,
        options: EncodingOptions,
        metering_enabled: bool,
    ) -> Result<String, BridgeError> {
        self.request(|reply| Command::Start {
            destination: path.to_string(),
            options,
            metering: metering_enabled,
            reply,
        })
        .await?
        .map_err(BridgeError::from)
    }

    pub async fn pause_recorder(&self) -> Result<String, BridgeError> {
        self.request(|reply| Command::Pause { reply })
            .await?
            .map_err(BridgeError::from)
    }

    pub async fn resume_recorder(&self) -> Result<String, BridgeError> {
        self.request(|reply| Command::Resume { reply })
            .await?
            .map_err(BridgeError::from)
    }

    /// Stop recording. Resolves with the output `file://` URI.
    pub async fn stop_recorder(&self) -> Result<String, BridgeError> {
        self.request(|reply| Command::Stop { reply })
            .await?
            .map_err(BridgeError::from)
    }

    /// Set the progress interval in seconds. Invalid values clamp to the minimum.
    pub async fn set_subscription_duration(&self, secs: f64) -> Result<String, BridgeError> {
        self.request(|reply| Command::SetSubscriptionDuration { secs, reply })
            .await
    }

    pub async fn status(&self) -> Result<SessionSnapshot, BridgeError> {
        self.request(|reply| Command::Status { reply }).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, BridgeError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| BridgeError::Closed)?;
        rx.await.map_err(|_| BridgeError::Closed)
    }
}

/// Thread-safe feed for OS interruption events
#[derive(Clone)]
pub struct InterruptionSender {
    events: mpsc::UnboundedSender<InterruptionEvent>,
}

impl InterruptionSender {
    /// Queue an event. Returns false if the session task has exited.
    pub fn send(&self, event: InterruptionEvent) -> bool {
        self.events.send(event).is_ok()
    }
}

/// Spawn the session task.
///
/// The task runs until every [`RecorderBridge`] clone is dropped, then stops any active
/// session and exits.
pub fn spawn_session<R, P, K, S, E>(
    controller: SessionController<R, P, K, S, E>,
) -> (RecorderBridge, InterruptionSender, JoinHandle<()>)
where
    R: Recorder + 'static,
    P: PermissionAuthority + 'static,
    K: KeepAlive + 'static,
    S: PathResolver + 'static,
    E: EventEmitter + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(run_session(controller, command_rx, event_rx));

    (
        RecorderBridge {
            commands: command_tx,
        },
        InterruptionSender { events: event_tx },
        handle,
    )
}

async fn run_session<R, P, K, S, E>(
    mut controller: SessionController<R, P, K, S, E>,
    mut commands: mpsc::Receiver<Command>,
    mut interruptions: mpsc::UnboundedReceiver<InterruptionEvent>,
) where
    R: Recorder,
    P: PermissionAuthority,
    K: KeepAlive,
    S: PathResolver,
    E: EventEmitter,
{
    info!("Recorder session task started");
    let mut interruptions_open = true;

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                dispatch(&mut controller, command).await;
            }
            event = interruptions.recv(), if interruptions_open => {
                match event {
                    Some(event) => controller.handle_interruption(event).await,
                    None => {
                        debug!("Interruption feed closed");
                        interruptions_open = false;
                    }
                }
            }
            Some(id) = controller.next_tick() => {
                controller.on_tick(id).await;
            }
        }
    }

    controller.shutdown().await;
    info!("Recorder session task stopped");
}

async fn dispatch<R, P, K, S, E>(
    controller: &mut SessionController<R, P, K, S, E>,
    command: Command,
)
where
    R: Recorder,
    P: PermissionAuthority,
    K: KeepAlive,
    S: PathResolver,
    E: EventEmitter,
{
    // A dropped reply receiver means the caller gave up; the command still ran.
    match command {
        Command::Start {
            destination,
            options,
            metering,
            reply,
        } => {
            let _ = reply.send(controller.start(&destination, options, metering).await);
        }
        Command::Pause { reply } => {
            let _ = reply.send(controller.pause(Origin::User).await);
        }
        Command::Resume { reply } => {
            let _ = reply.send(controller.resume(Origin::User).await);
        }
        Command::Stop { reply } => {
            let _ = reply.send(controller.stop().await);
        }
        Command::SetSubscriptionDuration { secs, reply } => {
            let _ = reply.send(controller.set_subscription_duration(secs));
        }
        Command::Status { reply } => {
            let _ = reply.send(controller.snapshot());
        }
    }
}
