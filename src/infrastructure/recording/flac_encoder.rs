//! FLAC encoder for the desktop recorder
//!
//! Takes interleaved 16-bit PCM at the session's sample rate and channel count.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

/// Bits per sample (16-bit audio)
pub const BITS_PER_SAMPLE: usize = 16;

/// FLAC encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("FLAC config error: {0}")]
    Config(String),

    #[error("FLAC encoding failed: {0}")]
    Encode(String),

    #[error("FLAC write failed: {0}")]
    Write(String),

    #[error("Invalid PCM layout: {0}")]
    Layout(String),
}

/// Encode interleaved PCM samples to FLAC bytes
pub fn encode_to_flac(
    interleaved: &[i16],
    channels: u16,
    sample_rate: u32,
) -> Result<Vec<u8>, EncodingError> {
    if channels == 0 || sample_rate == 0 {
        return Err(EncodingError::Layout(format!(
            "{} channel(s) at {} Hz",
            channels, sample_rate
        )));
    }
    if interleaved.len() % channels as usize != 0 {
        return Err(EncodingError::Layout(format!(
            "{} samples do not divide into {} channels",
            interleaved.len(),
            channels
        )));
    }

    let samples: Vec<i32> = interleaved.iter().map(|&s| i32::from(s)).collect();

    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| EncodingError::Config(format!("{:?}", e)))?;

    let source = MemSource::from_samples(
        &samples,
        channels as usize,
        BITS_PER_SAMPLE,
        sample_rate as usize,
    );

    let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| EncodingError::Encode(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|e| EncodingError::Write(e.to_string()))?;

    Ok(sink.into_inner())
}

/// Duplicate or average mono samples into `channels` interleaved channels
pub fn interleave_mono(mono: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return mono.to_vec();
    }
    mono.iter()
        .flat_map(|&s| std::iter::repeat(s).take(channels as usize))
        .collect()
}
