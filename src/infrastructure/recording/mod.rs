//! Recording infrastructure module
//!
//! Provides cross-platform audio capture using cpal. Captured audio is resampled
//! with rubato and written as FLAC.

mod cpal_recorder;
mod flac_encoder;
mod resample;

pub use cpal_recorder::CpalRecorder;
pub use flac_encoder::{encode_to_flac, interleave_mono, EncodingError};
pub use resample::resample_mono;

/// Create the default recorder for the current platform
pub fn create_recorder() -> CpalRecorder {
    CpalRecorder::new()
}
