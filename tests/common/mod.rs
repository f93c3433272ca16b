//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use recorder_bridge::application::ports::{
    KeepAlive, KeepAliveError, PathResolver, PermissionAuthority, PermissionStatus, Recorder,
    RecorderError,
};
use recorder_bridge::application::{
    spawn_session, ControllerConfig, InterruptionSender, RecorderBridge, SessionController,
    SessionSnapshot,
};
use recorder_bridge::domain::recording::{Duration, OutputTarget, RecorderSettings};
use recorder_bridge::domain::session::{ProgressEvent, RecordStatus};
use recorder_bridge::infrastructure::ChannelEmitter;

pub const TICK_MS: u64 = 100;

#[derive(Default)]
pub struct FakeRecorder {
    calls: Mutex<Vec<&'static str>>,
}

impl FakeRecorder {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: &'static str) -> Result<(), RecorderError> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

/// Handle the session owns while the test keeps inspecting the same recorder
pub struct SharedRecorder(pub Arc<FakeRecorder>);

#[async_trait]
impl Recorder for SharedRecorder {
    async fn prepare(
        &self,
        _target: &OutputTarget,
        _settings: &RecorderSettings,
    ) -> Result<(), RecorderError> {
        self.0.record("prepare")
    }

    async fn start(&self) -> Result<(), RecorderError> {
        self.0.record("start")
    }

    async fn pause(&self) -> Result<(), RecorderError> {
        self.0.record("pause")
    }

    async fn resume(&self) -> Result<(), RecorderError> {
        self.0.record("resume")
    }

    async fn stop(&self) -> Result<(), RecorderError> {
        self.0.record("stop")
    }

    async fn cancel(&self) -> Result<(), RecorderError> {
        self.0.record("cancel")
    }

    fn max_amplitude(&self) -> Result<f64, RecorderError> {
        Ok(8_000.0)
    }
}

pub struct Granted;

#[async_trait]
impl PermissionAuthority for Granted {
    async fn request_microphone_and_storage(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }
}

#[derive(Default)]
pub struct CountingKeepAlive {
    pub started: AtomicUsize,
    pub stopped: AtomicUsize,
    pub texts: Mutex<Vec<String>>,
}

pub struct SharedKeepAlive(pub Arc<CountingKeepAlive>);

#[async_trait]
impl KeepAlive for SharedKeepAlive {
    async fn notify_started(&self) -> Result<(), KeepAliveError> {
        self.0.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn notify_stopped(&self) -> Result<(), KeepAliveError> {
        self.0.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_status_text(&self, text: &str) -> Result<(), KeepAliveError> {
        self.0.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub struct TempPaths(pub PathBuf);

impl PathResolver for TempPaths {
    fn resolve_default_cache_path(&self, file_name: &str) -> PathBuf {
        self.0.join(file_name)
    }
}

pub struct TestSession {
    pub bridge: RecorderBridge,
    pub interruptions: InterruptionSender,
    pub events: UnboundedReceiver<ProgressEvent>,
    pub recorder: Arc<FakeRecorder>,
    pub keep_alive: Arc<CountingKeepAlive>,
    pub handle: JoinHandle<()>,
}

impl TestSession {
    pub fn spawn() -> Self {
        let recorder = Arc::new(FakeRecorder::default());
        let keep_alive = Arc::new(CountingKeepAlive::default());
        let (emitter, events) = ChannelEmitter::channel();
        let controller = SessionController::new(
            SharedRecorder(recorder.clone()),
            Granted,
            SharedKeepAlive(keep_alive.clone()),
            TempPaths(PathBuf::from("/cache")),
            emitter,
            ControllerConfig {
                metering_interval: Duration::from_millis(TICK_MS),
                ..ControllerConfig::default()
            },
        );
        let (bridge, interruptions, handle) = spawn_session(controller);
        Self {
            bridge,
            interruptions,
            events,
            recorder,
            keep_alive,
            handle,
        }
    }

    /// Everything emitted so far
    pub fn drain(&mut self) -> Vec<ProgressEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    /// Poll the session until `check` holds. Interruption events travel on their own
    /// channel, so commands sent afterwards may overtake them.
    pub async fn wait_for(&self, check: impl Fn(&SessionSnapshot) -> bool) -> SessionSnapshot {
        for _ in 0..100 {
            let snapshot = self.bridge.status().await.unwrap();
            if check(&snapshot) {
                return snapshot;
            }
            tokio::time::sleep(StdDuration::from_millis(1)).await;
        }
        panic!("session never reached the expected state");
    }
}

pub fn statuses(events: &[ProgressEvent]) -> Vec<RecordStatus> {
    events.iter().filter_map(|e| e.status).collect()
}
