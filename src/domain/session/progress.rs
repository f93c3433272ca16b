//! Progress event payloads delivered to the host

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the single event channel progress is delivered on
pub const PROGRESS_EVENT: &str = "rn-recordback";

/// Status transition attached to a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordStatus {
    /// Input went silent (e.g. the OS silenced this client)
    Paused,
    /// Input came back after a silent stretch
    Resume,
    /// The arbiter paused the session for an interruption
    PausedByNative,
    /// The arbiter resumed the session after an interruption
    ResumeByNative,
    /// The interruption ended but the session cannot resume by itself
    FailResumeByNative,
}

impl RecordStatus {
    /// Get the wire representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paused => "paused",
            Self::Resume => "resume",
            Self::PausedByNative => "pausedByNative",
            Self::ResumeByNative => "resumeByNative",
            Self::FailResumeByNative => "failResumeByNative",
        }
    }

    /// Text shown by the keep-alive service for this transition
    pub const fn status_text(&self) -> &'static str {
        match self {
            Self::Paused => "No input",
            Self::Resume | Self::ResumeByNative => "Recording",
            Self::PausedByNative => "Paused by system",
            Self::FailResumeByNative => "Paused, tap to resume",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One progress event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Elapsed recording position in milliseconds, pauses excluded
    pub current_position: u64,
    /// Input level in dBFS, present when metering is enabled
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub current_metering: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<RecordStatus>,
}

impl ProgressEvent {
    /// A periodic tick
    pub fn tick(current_position: u64, current_metering: Option<f64>) -> Self {
        Self {
            current_position,
            current_metering,
            status: None,
        }
    }

    /// An ad hoc status transition
    pub fn status(current_position: u64, status: RecordStatus) -> Self {
        Self {
            current_position,
            current_metering: None,
            status: Some(status),
        }
    }

    pub fn with_status(mut self, status: Option<RecordStatus>) -> Self {
        self.status = status;
        self
    }

    /// Serialize to the JSON body delivered to the host
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!("{{\"currentPosition\":{}}}", self.current_position)
        })
    }
}
