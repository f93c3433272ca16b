//! Cross-platform audio recorder using cpal
//!
//! Captures mono 16-bit PCM from the default input device on a dedicated thread
//! (cpal streams are not `Send`). Pausing gates the capture callback while the stream
//! keeps running. On stop the buffer is resampled to the requested rate and written
//! as FLAC.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, SizedSample, StreamConfig};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::flac_encoder::{encode_to_flac, interleave_mono};
use super::resample::resample_mono;
use crate::application::ports::{Recorder, RecorderError};
use crate::domain::recording::{OutputFormat, OutputTarget, RecorderSettings};

/// How often the capture thread checks whether it should exit
const CAPTURE_POLL: std::time::Duration = std::time::Duration::from_millis(20);

/// State shared with the capture callback
#[derive(Clone, Default)]
struct Capture {
    buffer: Arc<StdMutex<Vec<i16>>>,
    capturing: Arc<AtomicBool>,
    peak: Arc<AtomicU32>,
}

impl Capture {
    /// Mix a callback block down to mono and append it, tracking the peak
    fn push(&self, interleaved: &[i16], channels: u16) {
        if !self.capturing.load(Ordering::Acquire) {
            return;
        }
        let mono = mix_to_mono(interleaved, channels);
        let block_peak = mono
            .iter()
            .map(|s| u32::from(s.unsigned_abs()))
            .max()
            .unwrap_or(0);
        self.peak.fetch_max(block_peak, Ordering::AcqRel);
        lock(&self.buffer).extend_from_slice(&mono);
    }
}

struct Prepared {
    path: PathBuf,
    settings: RecorderSettings,
}

struct CaptureThread {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    device_rate: u32,
}

/// Audio recorder using cpal
pub struct CpalRecorder {
    capture: Capture,
    prepared: StdMutex<Option<Prepared>>,
    thread: StdMutex<Option<CaptureThread>>,
}

impl CpalRecorder {
    pub fn new() -> Self {
        Self {
            capture: Capture::default(),
            prepared: StdMutex::new(None),
            thread: StdMutex::new(None),
        }
    }

    fn input_device() -> Result<cpal::Device, RecorderError> {
        cpal::default_host()
            .default_input_device()
            .ok_or(RecorderError::NoAudioDevice)
    }

    /// Pick an i16 or f32 input config, preferring fewer channels and `preferred_rate`
    fn input_config(
        device: &cpal::Device,
        preferred_rate: u32,
    ) -> Result<(StreamConfig, SampleFormat), RecorderError> {
        let supported = device
            .supported_input_configs()
            .map_err(|e| RecorderError::PrepareFailed(format!("failed to query configs: {}", e)))?;

        let includes = |range: &cpal::SupportedStreamConfigRange| {
            range.min_sample_rate().0 <= preferred_rate
                && range.max_sample_rate().0 >= preferred_rate
        };

        let best = supported
            .filter(|range| {
                matches!(range.sample_format(), SampleFormat::I16 | SampleFormat::F32)
            })
            .min_by_key(|range| (!includes(range), range.channels()))
            .ok_or_else(|| RecorderError::PrepareFailed("no suitable input config".into()))?;

        let sample_rate = if includes(&best) {
            SampleRate(preferred_rate)
        } else {
            best.max_sample_rate()
        };

        let config = StreamConfig {
            channels: best.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };
        Ok((config, best.sample_format()))
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &StreamConfig,
        capture: Capture,
        to_i16: fn(T) -> i16,
    ) -> Result<cpal::Stream, RecorderError>
    where
        T: SizedSample + Send + 'static,
    {
        let channels = config.channels;
        device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    let block: Vec<i16> = data.iter().map(|&s| to_i16(s)).collect();
                    capture.push(&block, channels);
                },
                |err| warn!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| RecorderError::StartFailed(e.to_string()))
    }

    /// Body of the capture thread. Reports startup through `ready`, then holds the
    /// stream open until `running` is cleared.
    fn capture_loop(
        preferred_rate: u32,
        capture: Capture,
        running: Arc<AtomicBool>,
        ready: oneshot::Sender<Result<u32, RecorderError>>,
    ) {
        let opened = Self::input_device().and_then(|device| {
            let (config, format) = Self::input_config(&device, preferred_rate)?;
            let stream = match format {
                SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, capture, |s| s)?,
                SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, capture, |s| {
                    (s.clamp(-1.0, 1.0) * 32767.0) as i16
                })?,
                other => {
                    return Err(RecorderError::Unsupported(format!(
                        "sample format {:?}",
                        other
                    )))
                }
            };
            stream
                .play()
                .map_err(|e| RecorderError::StartFailed(e.to_string()))?;
            Ok((stream, config.sample_rate.0))
        });

        let stream = match opened {
            Ok((stream, rate)) => {
                let _ = ready.send(Ok(rate));
                stream
            }
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };

        while running.load(Ordering::Acquire) {
            std::thread::sleep(CAPTURE_POLL);
        }
        drop(stream);
    }

    /// Stop the capture thread and wait for it to release the device
    async fn shut_down_thread(&self) -> Option<u32> {
        let thread = lock(&self.thread).take()?;
        self.capture.capturing.store(false, Ordering::Release);
        thread.running.store(false, Ordering::Release);

        let device_rate = thread.device_rate;
        if let Err(e) = tokio::task::spawn_blocking(move || thread.handle.join()).await {
            warn!("Capture thread join failed: {}", e);
        }
        Some(device_rate)
    }
}

impl Default for CpalRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Recorder for CpalRecorder {
    async fn prepare(
        &self,
        target: &OutputTarget,
        settings: &RecorderSettings,
    ) -> Result<(), RecorderError> {
        if settings.output_format != OutputFormat::Flac {
            return Err(RecorderError::Unsupported(format!(
                "output format {} (this recorder writes flac)",
                settings.output_format
            )));
        }
        if settings.bit_depth != 16 || settings.is_float {
            return Err(RecorderError::Unsupported(format!(
                "{}-bit{} samples",
                settings.bit_depth,
                if settings.is_float { " float" } else { "" }
            )));
        }
        if settings.channels > 2 {
            return Err(RecorderError::Unsupported(format!(
                "{} channels",
                settings.channels
            )));
        }

        Self::input_device()?;

        if let Some(parent) = target.path().parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RecorderError::PrepareFailed(e.to_string()))?;
        }

        lock(&self.capture.buffer).clear();
        self.capture.peak.store(0, Ordering::Release);
        *lock(&self.prepared) = Some(Prepared {
            path: target.path().to_path_buf(),
            settings: *settings,
        });
        debug!(path = %target, "Recorder prepared");
        Ok(())
    }

    async fn start(&self) -> Result<(), RecorderError> {
        let preferred_rate = lock(&self.prepared)
            .as_ref()
            .map(|p| p.settings.sample_rate)
            .ok_or(RecorderError::NotPrepared)?;

        if lock(&self.thread).is_some() {
            return Err(RecorderError::StartFailed("recording already in progress".into()));
        }

        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = oneshot::channel();
        let capture = self.capture.clone();
        let thread_running = Arc::clone(&running);

        self.capture.capturing.store(true, Ordering::Release);
        let handle = std::thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || Self::capture_loop(preferred_rate, capture, thread_running, ready_tx))
            .map_err(|e| RecorderError::StartFailed(e.to_string()))?;

        let device_rate = match ready_rx.await {
            Ok(Ok(rate)) => rate,
            Ok(Err(e)) => {
                self.capture.capturing.store(false, Ordering::Release);
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                self.capture.capturing.store(false, Ordering::Release);
                return Err(RecorderError::StartFailed("capture thread exited".into()));
            }
        };

        debug!(device_rate, "Capture started");
        *lock(&self.thread) = Some(CaptureThread {
            running,
            handle,
            device_rate,
        });
        Ok(())
    }

    async fn pause(&self) -> Result<(), RecorderError> {
        if lock(&self.thread).is_none() {
            return Err(RecorderError::NotPrepared);
        }
        self.capture.capturing.store(false, Ordering::Release);
        Ok(())
    }

    async fn resume(&self) -> Result<(), RecorderError> {
        if lock(&self.thread).is_none() {
            return Err(RecorderError::NotPrepared);
        }
        self.capture.capturing.store(true, Ordering::Release);
        Ok(())
    }

    async fn stop(&self) -> Result<(), RecorderError> {
        let device_rate = self
            .shut_down_thread()
            .await
            .ok_or(RecorderError::NotPrepared)?;
        let prepared = lock(&self.prepared)
            .take()
            .ok_or(RecorderError::NotPrepared)?;
        let samples = std::mem::take(&mut *lock(&self.capture.buffer));

        if samples.is_empty() {
            return Err(RecorderError::WriteFailed("no audio data captured".into()));
        }

        let settings = prepared.settings;
        let encoded = tokio::task::spawn_blocking(move || {
            let mono = resample_mono(&samples, device_rate, settings.sample_rate)?;
            let interleaved = interleave_mono(&mono, settings.channels);
            encode_to_flac(&interleaved, settings.channels, settings.sample_rate)
                .map_err(|e| RecorderError::WriteFailed(e.to_string()))
        })
        .await
        .map_err(|e| RecorderError::WriteFailed(format!("encode task failed: {}", e)))??;

        tokio::fs::write(&prepared.path, encoded)
            .await
            .map_err(|e| RecorderError::WriteFailed(e.to_string()))?;
        debug!(path = %prepared.path.display(), "Recording written");
        Ok(())
    }

    async fn cancel(&self) -> Result<(), RecorderError> {
        self.shut_down_thread().await;
        lock(&self.prepared).take();
        lock(&self.capture.buffer).clear();
        self.capture.peak.store(0, Ordering::Release);
        Ok(())
    }

    fn max_amplitude(&self) -> Result<f64, RecorderError> {
        if lock(&self.thread).is_none() {
            return Err(RecorderError::MeteringUnavailable("not recording".into()));
        }
        Ok(f64::from(self.capture.peak.swap(0, Ordering::AcqRel)))
    }
}

/// Average interleaved channels into one
fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
