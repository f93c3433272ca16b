//! Sample rate conversion with rubato

use rubato::{FftFixedIn, Resampler};

use crate::application::ports::RecorderError;

const CHUNK_FRAMES: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Convert mono 16-bit samples from `source_rate` to `target_rate`
pub fn resample_mono(
    samples: &[i16],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<i16>, RecorderError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let input: Vec<f32> = samples.iter().map(|&s| f32::from(s) / 32768.0).collect();
    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let output_len = (input.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_FRAMES,
        SUB_CHUNKS,
        1,
    )
    .map_err(|e| RecorderError::WriteFailed(format!("resampler init failed: {}", e)))?;

    let mut output = Vec::with_capacity(output_len + CHUNK_FRAMES);
    let mut position = 0;

    while position < input.len() {
        let needed = resampler.input_frames_next();
        let end = (position + needed).min(input.len());
        let mut chunk = input[position..end].to_vec();
        chunk.resize(needed, 0.0);
        let frames = vec![chunk];

        let resampled = resampler
            .process(&frames, None)
            .map_err(|e| RecorderError::WriteFailed(format!("resampling failed: {}", e)))?;

        output.extend(
            resampled[0]
                .iter()
                .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16),
        );
        position = end;
    }

    output.truncate(output_len);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_passthrough() {
        let samples = vec![1i16, -2, 3];
        assert_eq!(resample_mono(&samples, 48_000, 48_000).unwrap(), samples);
    }

    #[test]
    fn downsample_halves_length() {
        let samples = vec![0i16; 48_000];
        let out = resample_mono(&samples, 48_000, 24_000).unwrap();
        assert_eq!(out.len(), 24_000);
    }

    #[test]
    fn upsample_scales_length() {
        let samples = vec![100i16; 16_000];
        let out = resample_mono(&samples, 16_000, 44_100).unwrap();
        assert_eq!(out.len(), 44_100);
    }
}
