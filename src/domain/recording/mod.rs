//! Recording value objects: durations, encoding options, destinations and metering

mod duration;
mod encoding;
mod metering;
mod target;

pub use duration::{
    Duration, DEFAULT_METERING_INTERVAL_MS, DEFAULT_PERMISSION_TIMEOUT_SECS,
    MIN_METERING_INTERVAL_MS,
};
pub use encoding::{
    AudioEncoder, AudioSource, EncodingOptions, OutputFormat, RecorderSettings, SessionMode,
    DEFAULT_BIT_DEPTH, DEFAULT_BIT_RATE, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE,
};
pub use metering::{
    amplitude_to_db, SilenceDetector, SilenceTransition, DEFAULT_SILENCE_THRESHOLD,
    FULL_SCALE_AMPLITUDE, METERING_FLOOR_DB, NEAR_FLOOR_DB,
};
pub use target::{Destination, OutputTarget, DEFAULT_DESTINATION, DEFAULT_FILE_STEM};
