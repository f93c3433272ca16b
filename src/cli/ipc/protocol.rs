//! Line protocol spoken over the daemon control socket
//!
//! Each connection carries one command line and one reply line:
//!
//! ```text
//! start [metering|no-metering] [PATH]     ok file:///.../sound.flac
//! pause                                   ok Recorder paused.
//! status                                  ok {"state":"recording",...}
//! call offhook                            ok queued
//! stop                                    error NotRecording: Recorder is not recording
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::session::{CallState, InterruptionEvent, RouteChangeReason};

/// Control protocol parse errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: \"{0}\"")]
    UnknownCommand(String),

    #[error("Missing argument for \"{0}\"")]
    MissingArgument(&'static str),

    #[error("Invalid argument for \"{command}\": {message}")]
    InvalidArgument {
        command: &'static str,
        message: String,
    },

    #[error("Malformed reply: \"{0}\"")]
    MalformedReply(String),
}

impl ControlParseError {
    /// Rejection code sent back for commands that do not parse
    pub const CODE: &'static str = "InvalidCommand";
}

/// A command sent to the daemon
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Start {
        path: Option<String>,
        /// `None` uses the daemon's configured default
        metering: Option<bool>,
    },
    Pause,
    Resume,
    Stop,
    Status,
    /// Progress interval in seconds
    Interval(f64),
    Interrupt(InterruptionEvent),
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start { path, metering } => {
                write!(f, "start")?;
                match metering {
                    Some(true) => write!(f, " metering")?,
                    Some(false) => write!(f, " no-metering")?,
                    None => {}
                }
                if let Some(path) = path {
                    write!(f, " {}", path)?;
                }
                Ok(())
            }
            Self::Pause => write!(f, "pause"),
            Self::Resume => write!(f, "resume"),
            Self::Stop => write!(f, "stop"),
            Self::Status => write!(f, "status"),
            Self::Interval(secs) => write!(f, "interval {}", secs),
            Self::Interrupt(InterruptionEvent::InterruptionBegan) => write!(f, "interrupt-begin"),
            Self::Interrupt(InterruptionEvent::InterruptionEnded { resume_permitted }) => {
                if *resume_permitted {
                    write!(f, "interrupt-end")
                } else {
                    write!(f, "interrupt-end no-resume")
                }
            }
            Self::Interrupt(InterruptionEvent::CallStateChanged(state)) => {
                write!(f, "call {}", state)
            }
            Self::Interrupt(InterruptionEvent::RouteChanged(reason)) => {
                write!(f, "route {}", reason)
            }
        }
    }
}

impl FromStr for ControlCommand {
    type Err = ControlParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ControlParseError::Empty);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_lowercase().as_str() {
            "start" => Ok(parse_start(rest)),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "stop" => Ok(Self::Stop),
            "status" => Ok(Self::Status),
            "interval" => {
                let secs = required(rest, "interval")?
                    .parse::<f64>()
                    .map_err(|e| ControlParseError::InvalidArgument {
                        command: "interval",
                        message: e.to_string(),
                    })?;
                Ok(Self::Interval(secs))
            }
            "interrupt-begin" => Ok(Self::Interrupt(InterruptionEvent::InterruptionBegan)),
            "interrupt-end" => {
                let resume_permitted = match rest {
                    "" | "resume" => true,
                    "no-resume" => false,
                    other => {
                        return Err(ControlParseError::InvalidArgument {
                            command: "interrupt-end",
                            message: format!("expected \"no-resume\", got \"{}\"", other),
                        })
                    }
                };
                Ok(Self::Interrupt(InterruptionEvent::InterruptionEnded {
                    resume_permitted,
                }))
            }
            "call" => {
                let state = required(rest, "call")?.parse::<CallState>().map_err(|e| {
                    ControlParseError::InvalidArgument {
                        command: "call",
                        message: e.to_string(),
                    }
                })?;
                Ok(Self::Interrupt(InterruptionEvent::CallStateChanged(state)))
            }
            "route" => {
                let reason = required(rest, "route")?
                    .parse::<RouteChangeReason>()
                    .map_err(|e| ControlParseError::InvalidArgument {
                        command: "route",
                        message: e.to_string(),
                    })?;
                Ok(Self::Interrupt(InterruptionEvent::RouteChanged(reason)))
            }
            _ => Err(ControlParseError::UnknownCommand(word.to_string())),
        }
    }
}

fn parse_start(rest: &str) -> ControlCommand {
    let (first, tail) = match rest.split_once(char::is_whitespace) {
        Some((first, tail)) => (first, tail.trim()),
        None => (rest, ""),
    };
    let (metering, path) = match first {
        "metering" => (Some(true), tail),
        "no-metering" => (Some(false), tail),
        _ => (None, rest),
    };
    ControlCommand::Start {
        path: (!path.is_empty()).then(|| path.to_string()),
        metering,
    }
}

fn required<'a>(rest: &'a str, command: &'static str) -> Result<&'a str, ControlParseError> {
    if rest.is_empty() {
        Err(ControlParseError::MissingArgument(command))
    } else {
        Ok(rest)
    }
}

/// The daemon's reply to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlReply {
    Ok(String),
    Error { code: String, message: String },
}

impl ControlReply {
    pub fn error(code: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Error {
            code: code.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ControlReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok(body) => write!(f, "ok {}", body),
            Self::Error { code, message } => write!(f, "error {}: {}", code, message),
        }
    }
}

impl FromStr for ControlReply {
    type Err = ControlParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if let Some(body) = line.strip_prefix("ok") {
            return Ok(Self::Ok(body.trim().to_string()));
        }
        line.strip_prefix("error ")
            .and_then(|rest| rest.split_once(": "))
            .map(|(code, message)| Self::error(code.trim(), message.trim()))
            .ok_or_else(|| ControlParseError::MalformedReply(line.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_commands() {
        assert_eq!("pause".parse::<ControlCommand>(), Ok(ControlCommand::Pause));
        assert_eq!(" RESUME \n".parse::<ControlCommand>(), Ok(ControlCommand::Resume));
        assert_eq!("status".parse::<ControlCommand>(), Ok(ControlCommand::Status));
    }

    #[test]
    fn start_with_path_containing_spaces() {
        assert_eq!(
            "start no-metering /tmp/my take.flac".parse::<ControlCommand>(),
            Ok(ControlCommand::Start {
                path: Some("/tmp/my take.flac".to_string()),
                metering: Some(false),
            })
        );
        assert_eq!(
            "start".parse::<ControlCommand>(),
            Ok(ControlCommand::Start {
                path: None,
                metering: None,
            })
        );
    }

    #[test]
    fn interruption_commands() {
        assert_eq!(
            "interrupt-end no-resume".parse::<ControlCommand>(),
            Ok(ControlCommand::Interrupt(InterruptionEvent::InterruptionEnded {
                resume_permitted: false
            }))
        );
        assert_eq!(
            "call off-hook".parse::<ControlCommand>(),
            Ok(ControlCommand::Interrupt(InterruptionEvent::CallStateChanged(
                CallState::OffHook
            )))
        );
        assert_eq!(
            "route old-device".parse::<ControlCommand>(),
            Ok(ControlCommand::Interrupt(InterruptionEvent::RouteChanged(
                RouteChangeReason::OldDeviceUnavailable
            )))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!("".parse::<ControlCommand>(), Err(ControlParseError::Empty));
        assert_eq!(
            "toggle".parse::<ControlCommand>(),
            Err(ControlParseError::UnknownCommand("toggle".to_string()))
        );
        assert_eq!(
            "call".parse::<ControlCommand>(),
            Err(ControlParseError::MissingArgument("call"))
        );
        assert!(matches!(
            "interval soon".parse::<ControlCommand>(),
            Err(ControlParseError::InvalidArgument { command: "interval", .. })
        ));
    }

    #[test]
    fn command_lines_parse_back() {
        let commands = [
            ControlCommand::Start {
                path: Some("/tmp/a.flac".to_string()),
                metering: Some(true),
            },
            ControlCommand::Interval(0.25),
            ControlCommand::Interrupt(InterruptionEvent::InterruptionEnded {
                resume_permitted: false,
            }),
            ControlCommand::Interrupt(InterruptionEvent::CallStateChanged(CallState::Ringing)),
        ];
        for command in commands {
            assert_eq!(command.to_string().parse::<ControlCommand>(), Ok(command));
        }
    }

    #[test]
    fn replies() {
        assert_eq!(
            "ok Recorder paused.".parse::<ControlReply>(),
            Ok(ControlReply::Ok("Recorder paused.".to_string()))
        );
        let reply: ControlReply = "error NotRecording: Recorder is not recording"
            .parse()
            .unwrap();
        assert_eq!(
            reply,
            ControlReply::error("NotRecording", "Recorder is not recording")
        );
        assert_eq!(
            reply.to_string(),
            "error NotRecording: Recorder is not recording"
        );
        assert!("garbage".parse::<ControlReply>().is_err());
    }
}
