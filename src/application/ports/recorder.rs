//! Recorder port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::{OutputTarget, RecorderSettings};

/// Recorder errors
#[derive(Debug, Clone, Error)]
pub enum RecorderError {
    #[error("No audio input device available")]
    NoAudioDevice,

    #[error("Unsupported recorder configuration: {0}")]
    Unsupported(String),

    #[error("Failed to configure recorder: {0}")]
    PrepareFailed(String),

    #[error("Failed to start recording: {0}")]
    StartFailed(String),

    #[error("Recorder is not prepared")]
    NotPrepared,

    #[error("Recording failed: {0}")]
    RecordingFailed(String),

    #[error("Failed to write recording: {0}")]
    WriteFailed(String),

    #[error("Metering unavailable: {0}")]
    MeteringUnavailable(String),
}

/// Port for a pausable capture device writing to one output target at a time
#[async_trait]
pub trait Recorder: Send + Sync {
    /// Configure the device for `target` with resolved `settings`.
    async fn prepare(
        &self,
        target: &OutputTarget,
        settings: &RecorderSettings,
    ) -> Result<(), RecorderError>;

    /// Start capturing into the prepared target.
    async fn start(&self) -> Result<(), RecorderError>;

    /// Stop feeding captured audio into the output, keeping the device open.
    async fn pause(&self) -> Result<(), RecorderError>;

    async fn resume(&self) -> Result<(), RecorderError>;

    /// Stop capturing and finalize the output file.
    async fn stop(&self) -> Result<(), RecorderError>;

    /// Stop capturing and discard the output.
    async fn cancel(&self) -> Result<(), RecorderError>;

    /// Peak amplitude since the previous call, on a 16-bit scale (0..=32767).
    fn max_amplitude(&self) -> Result<f64, RecorderError>;
}
