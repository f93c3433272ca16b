//! Domain error types

use thiserror::Error;

/// Error when parsing a duration string
#[derive(Debug, Clone, Error)]
#[error("Invalid duration format: \"{input}\". Expected format: <number>ms, <number>s, <number>m or <number>m<number>s (e.g., 500ms, 0.5s, 30s, 2m30s)")]
pub struct DurationParseError {
    pub input: String,
}

/// Error when a name does not match any known variant
#[derive(Debug, Clone, Error)]
#[error("Unknown {kind}: \"{input}\"")]
pub struct UnknownValueError {
    pub kind: &'static str,
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}

/// Failures surfaced to the host by the session controller.
///
/// Every variant maps to a stable rejection code via [`SessionError::code`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Capture or storage permission was not granted. The caller may retry.
    #[error("Record permission not granted. Try again after granting permission.")]
    PermissionDenied,

    /// The capture device could not be configured or started.
    #[error("Error occurred while initiating recorder: {0}")]
    RecorderInitError(String),

    /// Pause, resume or stop was called without an active recording.
    #[error("Recorder is not recording")]
    NotRecording,

    /// Resume was called on a session that is already recording.
    #[error("Recorder is already recording")]
    AlreadyRecording,

    /// Resume was blocked by an OS interruption or call that still owns the session.
    #[error("Recorder is held by a system interruption; wait for it to end")]
    InterruptActive,

    /// The recorder failed to finalize. Local state has been released anyway.
    #[error("Failed to stop recorder: {0}")]
    StopFailure(String),

    /// The recorder failed mid-session. The session has been torn down.
    #[error("Recorder failed: {0}")]
    RecorderFault(String),
}

impl SessionError {
    /// Stable rejection code reported to the host
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "PermissionDenied",
            Self::RecorderInitError(_) => "RecorderInitError",
            Self::NotRecording => "NotRecording",
            Self::AlreadyRecording => "AlreadyRecording",
            Self::InterruptActive => "InterruptActive",
            Self::StopFailure(_) => "StopFailure",
            Self::RecorderFault(_) => "RecorderFault",
        }
    }

    /// Whether the caller can reasonably retry the same command later
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::InterruptActive)
    }
}
