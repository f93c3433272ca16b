//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::recording::{
    AudioEncoder, Duration, EncodingOptions, OutputFormat, DEFAULT_BIT_RATE, DEFAULT_CHANNELS,
    DEFAULT_FILE_STEM, DEFAULT_SAMPLE_RATE, DEFAULT_SILENCE_THRESHOLD,
};

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub subscription_duration: Option<String>,
    pub silence_threshold: Option<u32>,
    pub default_file_name: Option<String>,
    pub output_format: Option<String>,
    pub audio_encoder: Option<String>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub bit_rate: Option<u32>,
    pub metering: Option<bool>,
    pub permission_timeout: Option<String>,
    pub notify: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            subscription_duration: Some("500ms".to_string()),
            silence_threshold: Some(DEFAULT_SILENCE_THRESHOLD),
            default_file_name: None,
            output_format: Some("flac".to_string()),
            audio_encoder: Some("flac".to_string()),
            sample_rate: Some(DEFAULT_SAMPLE_RATE),
            channels: Some(DEFAULT_CHANNELS),
            bit_rate: Some(DEFAULT_BIT_RATE),
            metering: Some(true),
            permission_timeout: Some("30s".to_string()),
            notify: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            subscription_duration: other.subscription_duration.or(self.subscription_duration),
            silence_threshold: other.silence_threshold.or(self.silence_threshold),
            default_file_name: other.default_file_name.or(self.default_file_name),
            output_format: other.output_format.or(self.output_format),
            audio_encoder: other.audio_encoder.or(self.audio_encoder),
            sample_rate: other.sample_rate.or(self.sample_rate),
            channels: other.channels.or(self.channels),
            bit_rate: other.bit_rate.or(self.bit_rate),
            metering: other.metering.or(self.metering),
            permission_timeout: other.permission_timeout.or(self.permission_timeout),
            notify: other.notify.or(self.notify),
        }
    }

    /// Metering interval, clamped to the minimum, or default if not set/invalid
    pub fn subscription_duration_or_default(&self) -> Duration {
        self.subscription_duration
            .as_ref()
            .and_then(|s| s.parse::<Duration>().ok())
            .map(Duration::clamp_to_metering)
            .unwrap_or_else(Duration::default_metering_interval)
    }

    pub fn silence_threshold_or_default(&self) -> u32 {
        self.silence_threshold.unwrap_or(DEFAULT_SILENCE_THRESHOLD)
    }

    /// Output format, or the platform default if not set/invalid
    pub fn output_format_or_default(&self) -> OutputFormat {
        self.output_format
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn audio_encoder_or_default(&self) -> AudioEncoder {
        self.audio_encoder
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// File name used for the default destination, derived from the output format when unset
    pub fn default_file_name_or_default(&self) -> String {
        self.default_file_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                format!("{}.{}", DEFAULT_FILE_STEM, self.output_format_or_default().extension())
            })
    }

    pub fn metering_or_default(&self) -> bool {
        self.metering.unwrap_or(true)
    }

    /// Get permission_timeout as parsed Duration, or default if not set/invalid
    pub fn permission_timeout_or_default(&self) -> Duration {
        self.permission_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_permission_timeout)
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    /// Encoding options carried by this config, used as the base for host-supplied ones
    pub fn encoding_options(&self) -> EncodingOptions {
        EncodingOptions {
            output_format: self.output_format.as_ref().and_then(|s| s.parse().ok()),
            audio_encoder: self.audio_encoder.as_ref().and_then(|s| s.parse().ok()),
            sample_rate: self.sample_rate,
            channels: self.channels,
            bit_rate: self.bit_rate,
            ..EncodingOptions::default()
        }
    }
}
