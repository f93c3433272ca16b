//! Encoding options value objects
//!
//! Hosts pass a loose map of named options. Every option is optional; unknown keys are
//! ignored and unknown enum values fall back to the platform default when resolved into
//! [`RecorderSettings`].

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::{SessionError, UnknownValueError};

/// Default encoder bit rate (128 kbps)
pub const DEFAULT_BIT_RATE: u32 = 128_000;

/// Default PCM bit depth
pub const DEFAULT_BIT_DEPTH: u16 = 16;

/// Default capture sample rate for the current platform
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
#[cfg(not(any(target_os = "macos", target_os = "ios")))]
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Default channel count for the current platform
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub const DEFAULT_CHANNELS: u16 = 2;
#[cfg(not(any(target_os = "macos", target_os = "ios")))]
pub const DEFAULT_CHANNELS: u16 = 1;

/// Input source requested from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    #[default]
    Mic,
    Camcorder,
    VoiceRecognition,
    VoiceCommunication,
    VoiceCall,
    VoiceUplink,
    VoiceDownlink,
    Unprocessed,
    #[serde(other)]
    Unknown,
}

/// Output container format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "mp4", alias = "m4a")]
    Mpeg4,
    #[serde(alias = "3gp")]
    ThreeGpp,
    AacAdts,
    AmrNb,
    AmrWb,
    Ogg,
    Webm,
    Flac,
    Wav,
    #[serde(other)]
    Unknown,
}

impl OutputFormat {
    /// File extension used for default file names
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mpeg4 | Self::Unknown => "mp4",
            Self::ThreeGpp => "3gp",
            Self::AacAdts => "aac",
            Self::AmrNb | Self::AmrWb => "amr",
            Self::Ogg => "ogg",
            Self::Webm => "webm",
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }

    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mpeg4 => "mpeg4",
            Self::ThreeGpp => "three_gpp",
            Self::AacAdts => "aac_adts",
            Self::AmrNb => "amr_nb",
            Self::AmrWb => "amr_wb",
            Self::Ogg => "ogg",
            Self::Webm => "webm",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_known(s, Self::Unknown, "output format")
    }
}

/// Audio codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoder {
    #[default]
    #[serde(alias = "mp4")]
    Aac,
    HeAac,
    AacEld,
    AmrNb,
    AmrWb,
    Vorbis,
    Opus,
    Flac,
    Alac,
    Lpcm,
    Ima4,
    Ulaw,
    Alaw,
    Mp1,
    Mp2,
    #[serde(alias = "MAC3")]
    Mace3,
    #[serde(alias = "MAC6")]
    Mace6,
    #[serde(other)]
    Unknown,
}

impl AudioEncoder {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::HeAac => "he_aac",
            Self::AacEld => "aac_eld",
            Self::AmrNb => "amr_nb",
            Self::AmrWb => "amr_wb",
            Self::Vorbis => "vorbis",
            Self::Opus => "opus",
            Self::Flac => "flac",
            Self::Alac => "alac",
            Self::Lpcm => "lpcm",
            Self::Ima4 => "ima4",
            Self::Ulaw => "ulaw",
            Self::Alaw => "alaw",
            Self::Mp1 => "mp1",
            Self::Mp2 => "mp2",
            Self::Mace3 => "mace3",
            Self::Mace6 => "mace6",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AudioEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AudioEncoder {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_known(s, Self::Unknown, "audio encoder")
    }
}

/// Parse a name through the serde representation, rejecting the catch-all variant
fn parse_known<T>(s: &str, unknown: T, kind: &'static str) -> Result<T, UnknownValueError>
where
    T: DeserializeOwned + PartialEq,
{
    serde_json::from_value::<T>(Value::String(s.trim().to_lowercase()))
        .ok()
        .filter(|v| *v != unknown)
        .ok_or_else(|| UnknownValueError {
            kind,
            input: s.to_string(),
        })
}

/// Audio session mode hint for platforms that support one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Default,
    Measurement,
    GameChat,
    MoviePlayback,
    SpokenAudio,
    VideoChat,
    VideoRecording,
    VoiceChat,
    VoicePrompt,
    #[serde(other)]
    Unknown,
}

/// Options as supplied by the host. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncodingOptions {
    #[serde(alias = "AudioSourceAndroid")]
    pub audio_source: Option<AudioSource>,
    #[serde(alias = "OutputFormatAndroid")]
    pub output_format: Option<OutputFormat>,
    #[serde(alias = "AudioEncoderAndroid", alias = "AVFormatIDKeyIOS")]
    pub audio_encoder: Option<AudioEncoder>,
    #[serde(alias = "AudioEncodingBitRateAndroid")]
    pub bit_rate: Option<u32>,
    #[serde(alias = "AudioSamplingRateAndroid", alias = "AVSampleRateKeyIOS")]
    pub sample_rate: Option<u32>,
    #[serde(alias = "AudioChannelsAndroid", alias = "AVNumberOfChannelsKeyIOS")]
    pub channels: Option<u16>,
    #[serde(alias = "AVLinearPCMBitDepthKeyIOS")]
    pub bit_depth: Option<u16>,
    #[serde(alias = "AVLinearPCMIsBigEndianKeyIOS")]
    pub big_endian: Option<bool>,
    #[serde(alias = "AVLinearPCMIsFloatKeyIOS")]
    pub is_float: Option<bool>,
    #[serde(alias = "AVLinearPCMIsNonInterleavedIOS")]
    pub non_interleaved: Option<bool>,
    #[serde(alias = "AVModeIOS")]
    pub session_mode: Option<SessionMode>,
}

impl EncodingOptions {
    /// Parse options from a host-supplied JSON object.
    ///
    /// Unknown keys are ignored. A recognized key with a value of the wrong type is a
    /// configuration error the recorder cannot honor.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, SessionError> {
        serde_json::from_value(Value::Object(map.clone()))
            .map_err(|e| {
                SessionError::RecorderInitError(format!("invalid encoding options: {}", e))
            })
    }

    /// Resolve every option to a concrete value, filling platform defaults
    pub fn resolve(&self) -> RecorderSettings {
        RecorderSettings {
            audio_source: known_or_default(self.audio_source, AudioSource::Unknown),
            output_format: known_or_default(self.output_format, OutputFormat::Unknown),
            audio_encoder: known_or_default(self.audio_encoder, AudioEncoder::Unknown),
            bit_rate: positive_or(self.bit_rate, DEFAULT_BIT_RATE),
            sample_rate: positive_or(self.sample_rate, DEFAULT_SAMPLE_RATE),
            channels: self
                .channels
                .filter(|c| *c > 0)
                .unwrap_or(DEFAULT_CHANNELS),
            bit_depth: self
                .bit_depth
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_BIT_DEPTH),
            big_endian: self.big_endian.unwrap_or(false),
            is_float: self.is_float.unwrap_or(false),
            non_interleaved: self.non_interleaved.unwrap_or(false),
            session_mode: known_or_default(self.session_mode, SessionMode::Unknown),
        }
    }

    /// Later values override earlier ones, field by field
    pub fn merge(self, other: Self) -> Self {
        Self {
            audio_source: other.audio_source.or(self.audio_source),
            output_format: other.output_format.or(self.output_format),
            audio_encoder: other.audio_encoder.or(self.audio_encoder),
            bit_rate: other.bit_rate.or(self.bit_rate),
            sample_rate: other.sample_rate.or(self.sample_rate),
            channels: other.channels.or(self.channels),
            bit_depth: other.bit_depth.or(self.bit_depth),
            big_endian: other.big_endian.or(self.big_endian),
            is_float: other.is_float.or(self.is_float),
            non_interleaved: other.non_interleaved.or(self.non_interleaved),
            session_mode: other.session_mode.or(self.session_mode),
        }
    }
}

fn known_or_default<T: Default + PartialEq>(value: Option<T>, unknown: T) -> T {
    match value {
        Some(v) if v != unknown => v,
        _ => T::default(),
    }
}

fn positive_or(value: Option<u32>, default: u32) -> u32 {
    value.filter(|v| *v > 0).unwrap_or(default)
}

/// Fully resolved recorder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderSettings {
    pub audio_source: AudioSource,
    pub output_format: OutputFormat,
    pub audio_encoder: AudioEncoder,
    pub bit_rate: u32,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub big_endian: bool,
    pub is_float: bool,
    pub non_interleaved: bool,
    pub session_mode: SessionMode,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        EncodingOptions::default().resolve()
    }
}
