//! Session controller use case
//!
//! Owns the single [`RecordingSession`] and every side effect on the recorder, the
//! keep-alive service and the progress ticker. It is driven by one owner task (see
//! [`crate::application::bridge`]), so it needs no locking.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::error::SessionError;
use crate::domain::recording::{
    amplitude_to_db, Destination, Duration, EncodingOptions, OutputTarget, RecorderSettings,
    SilenceDetector, SilenceTransition, DEFAULT_FILE_STEM, DEFAULT_SILENCE_THRESHOLD,
    METERING_FLOOR_DB,
};
use crate::domain::session::{
    arbitrate, ArbiterAction, Arbitration, InterruptFlags, InterruptionEvent, Origin,
    PauseOutcome, ProgressEvent, RecordStatus, RecordingSession, SessionState,
};

use super::ports::{EventEmitter, KeepAlive, PathResolver, PermissionAuthority, Recorder};
use super::ticker::{ProgressTicker, TickId, TickReceiver};

/// Confirmation returned by a successful pause
pub const PAUSED_MESSAGE: &str = "Recorder paused.";

/// Confirmation returned by a successful resume
pub const RESUMED_MESSAGE: &str = "Recorder resumed.";

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Initial progress interval
    pub metering_interval: Duration,
    /// Consecutive near-floor samples before silence is reported
    pub silence_threshold: u32,
    /// File name for the default destination; derived from the output format when unset
    pub default_file_name: Option<String>,
    /// Options host-supplied ones are layered over
    pub base_options: EncodingOptions,
    /// Upper bound on the permission wait
    pub permission_timeout: Option<Duration>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            metering_interval: Duration::default_metering_interval(),
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            default_file_name: None,
            base_options: EncodingOptions::default(),
            permission_timeout: Some(Duration::default_permission_timeout()),
        }
    }
}

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: String,
    pub current_position: u64,
    pub metering_enabled: bool,
    pub subscription_duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub user_paused: bool,
    pub interrupt_paused: bool,
    pub interrupt_active: bool,
    pub call_active: bool,
    pub fail_resume: bool,
}

/// Recording session controller
pub struct SessionController<R, P, K, S, E>
where
    R: Recorder,
    P: PermissionAuthority,
    K: KeepAlive,
    S: PathResolver,
    E: EventEmitter,
{
    recorder: R,
    permission: P,
    keep_alive: K,
    paths: S,
    emitter: E,
    config: ControllerConfig,
    session: RecordingSession,
    ticker: ProgressTicker,
    ticks: TickReceiver,
    metering_enabled: bool,
    silence: SilenceDetector,
    keep_alive_started: bool,
}

impl<R, P, K, S, E> SessionController<R, P, K, S, E>
where
    R: Recorder,
    P: PermissionAuthority,
    K: KeepAlive,
    S: PathResolver,
    E: EventEmitter,
{
    /// Create a new controller with an idle session
    pub fn new(
        recorder: R,
        permission: P,
        keep_alive: K,
        paths: S,
        emitter: E,
        config: ControllerConfig,
    ) -> Self {
        let (ticker, ticks) = ProgressTicker::channel(config.metering_interval.clamp_to_metering());
        let silence = SilenceDetector::new(config.silence_threshold);
        Self {
            recorder,
            permission,
            keep_alive,
            paths,
            emitter,
            config,
            session: RecordingSession::new(),
            ticker,
            ticks,
            metering_enabled: false,
            silence,
            keep_alive_started: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn flags(&self) -> InterruptFlags {
        self.session.flags()
    }

    pub fn metering_interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Whether the progress ticker is running
    pub fn is_emitting(&self) -> bool {
        self.ticker.is_running()
    }

    /// Current position in milliseconds, pauses excluded
    pub fn position_ms(&self) -> u64 {
        let elapsed = self.session.elapsed(now());
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let flags = self.session.flags();
        SessionSnapshot {
            state: self.session.state().to_string(),
            current_position: self.position_ms(),
            metering_enabled: self.metering_enabled,
            subscription_duration_ms: self.ticker.interval().as_millis(),
            uri: self.session.target().map(OutputTarget::uri),
            user_paused: flags.user_paused,
            interrupt_paused: flags.interrupt_paused,
            interrupt_active: flags.interrupt_active,
            call_active: flags.call_active,
            fail_resume: flags.fail_resume,
        }
    }

    /// Start a new session recording into `destination`.
    ///
    /// Any session already in progress is discarded first. Resolves with the
    /// `file://` URI of the output.
    pub async fn start(
        &mut self,
        destination: &str,
        options: EncodingOptions,
        metering_enabled: bool,
    ) -> Result<String, SessionError> {
        if self.session.is_active() {
            info!(state = %self.session.state(), "Discarding active session before restart");
            self.teardown().await;
        }

        self.request_permission().await?;

        let settings = self.config.base_options.clone().merge(options).resolve();
        let default_file_name = self.default_file_name(&settings);
        let target = Destination::parse(destination).resolve(&default_file_name, |name| {
            self.paths.resolve_default_cache_path(name)
        })?;

        self.session
            .prepare(target.clone())
            .map_err(|e| SessionError::RecorderInitError(e.to_string()))?;
        debug!(target = %target, state = %self.session.state(), "Session preparing");

        if let Err(e) = self.launch(&target, &settings).await {
            warn!("Recorder failed to start: {}", e);
            self.teardown().await;
            return Err(SessionError::RecorderInitError(e.to_string()));
        }

        if let Err(e) = self.session.begin_recording(now()) {
            self.teardown().await;
            return Err(SessionError::RecorderInitError(e.to_string()));
        }

        match self.keep_alive.notify_started().await {
            Ok(()) => self.keep_alive_started = true,
            Err(e) => warn!("Keep-alive start notification failed: {}", e),
        }

        self.metering_enabled = metering_enabled;
        self.silence.reset();
        self.ticker.schedule().await;

        info!(
            uri = %target.uri(),
            format = %settings.output_format,
            encoder = %settings.audio_encoder,
            sample_rate = settings.sample_rate,
            channels = settings.channels,
            metering = metering_enabled,
            "Recording started"
        );
        Ok(target.uri())
    }

    /// Pause on behalf of `origin`
    pub async fn pause(&mut self, origin: Origin) -> Result<String, SessionError> {
        let outcome = self.session.pause(origin, now())?;
        debug!(%origin, state = %self.session.state(), "Session paused");

        if outcome == PauseOutcome::AlreadyHeld {
            return Ok(PAUSED_MESSAGE.to_string());
        }

        self.ticker.cancel().await;
        if let Err(e) = self.recorder.pause().await {
            warn!("Recorder failed to pause, tearing session down: {}", e);
            self.teardown().await;
            return Err(SessionError::RecorderFault(e.to_string()));
        }
        Ok(PAUSED_MESSAGE.to_string())
    }

    /// Resume on behalf of `origin`
    pub async fn resume(&mut self, origin: Origin) -> Result<String, SessionError> {
        self.session.check_resume(origin)?;

        if let Err(e) = self.recorder.resume().await {
            warn!("Recorder failed to resume, tearing session down: {}", e);
            self.teardown().await;
            return Err(SessionError::RecorderFault(e.to_string()));
        }
        self.session.resume(origin, now())?;
        self.ticker.schedule().await;

        debug!(
            %origin,
            paused_total_ms = self.session.accumulated_pause().as_millis() as u64,
            "Session resumed"
        );
        Ok(RESUMED_MESSAGE.to_string())
    }

    /// Stop the session and finalize the output.
    ///
    /// Local state is released even when the recorder fails to finalize.
    pub async fn stop(&mut self) -> Result<String, SessionError> {
        if !self.session.is_active() {
            return Err(SessionError::NotRecording);
        }

        self.ticker.cancel().await;
        let position = self.position_ms();
        let finalized = self.recorder.stop().await;
        let target = self.release().await;

        match (finalized, target) {
            (Ok(()), Some(target)) => {
                info!(uri = %target.uri(), position_ms = position, "Recording stopped");
                Ok(target.uri())
            }
            (Ok(()), None) => Err(SessionError::NotRecording),
            (Err(e), _) => {
                warn!("Recorder failed to finalize: {}", e);
                Err(SessionError::StopFailure(e.to_string()))
            }
        }
    }

    /// Change the progress interval from fractional seconds.
    ///
    /// Never fails; out-of-range values clamp to the minimum.
    pub fn set_subscription_duration(&mut self, secs: f64) -> String {
        let interval = Duration::metering_from_secs_f64(secs);
        self.ticker.set_interval(interval);
        debug!(%interval, "Progress interval changed");
        format!("setSubscriptionDuration: {}", interval)
    }

    /// Apply one OS interruption event
    pub async fn handle_interruption(&mut self, event: InterruptionEvent) {
        if !self.session.is_active() {
            debug!(%event, "No active session, dropping interruption event");
            return;
        }

        let Arbitration { flags, actions } =
            arbitrate(self.session.state(), self.session.flags(), event);
        debug!(%event, state = %self.session.state(), ?flags, "Interruption arbitrated");
        self.session.track(flags);

        for action in actions {
            if !self.session.is_active() {
                break;
            }
            match action {
                ArbiterAction::Pause => {
                    if let Err(e) = self.pause(Origin::System).await {
                        warn!(%event, "System pause failed: {}", e);
                    }
                }
                ArbiterAction::Resume => {
                    if let Err(e) = self.resume(Origin::System).await {
                        warn!(%event, "System resume failed: {}", e);
                    }
                }
                ArbiterAction::ReleaseInterruptHold => self.session.release_interrupt_hold(),
                ArbiterAction::HandOverToUser => {
                    if self.session.hand_over_to_user() {
                        debug!("Interrupt pause handed over to user");
                    }
                }
                ArbiterAction::Notify(status) => self.emit_status(status).await,
                ArbiterAction::LogRoute(reason) => {
                    info!(%reason, "Audio route changed: {}", reason.description());
                }
            }
        }
    }

    /// Wait for the next tick from the progress ticker
    pub async fn next_tick(&mut self) -> Option<TickId> {
        self.ticks.recv().await
    }

    /// Emit one progress event, unless the tick is stale
    pub async fn on_tick(&mut self, id: TickId) {
        if !self.ticker.is_current(id) || !self.session.is_recording() {
            debug!(tick_run = id, "Discarding stale tick");
            return;
        }

        let position = self.position_ms();
        let (metering, status) = if self.metering_enabled {
            self.sample_level()
        } else {
            (None, None)
        };

        self.emit(&ProgressEvent::tick(position, metering).with_status(status));
        if let Some(status) = status {
            self.update_status_text(status).await;
        }
    }

    /// Release everything when the owner shuts down
    pub async fn shutdown(&mut self) {
        if self.session.is_active() {
            info!("Stopping active session on shutdown");
            if let Err(e) = self.stop().await {
                warn!("Stop on shutdown failed: {}", e);
            }
        }
    }

    async fn request_permission(&self) -> Result<(), SessionError> {
        let request = self.permission.request_microphone_and_storage();
        let status = match self.config.permission_timeout {
            Some(limit) => match tokio::time::timeout(limit.as_std(), request).await {
                Ok(status) => status,
                Err(_) => {
                    warn!(timeout = %limit, "Permission request timed out");
                    return Err(SessionError::PermissionDenied);
                }
            },
            None => request.await,
        };

        if status.is_granted() {
            Ok(())
        } else {
            info!("Record permission denied");
            Err(SessionError::PermissionDenied)
        }
    }

    async fn launch(
        &self,
        target: &OutputTarget,
        settings: &RecorderSettings,
    ) -> Result<(), super::ports::RecorderError> {
        self.recorder.prepare(target, settings).await?;
        self.recorder.start().await
    }

    fn default_file_name(&self, settings: &RecorderSettings) -> String {
        self.config
            .default_file_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                format!("{}.{}", DEFAULT_FILE_STEM, settings.output_format.extension())
            })
    }

    fn sample_level(&mut self) -> (Option<f64>, Option<RecordStatus>) {
        match self.recorder.max_amplitude() {
            Ok(amplitude) => {
                let level = amplitude_to_db(amplitude);
                let status = self.silence.observe(level).map(|transition| match transition {
                    SilenceTransition::Silenced => RecordStatus::Paused,
                    SilenceTransition::Restored => RecordStatus::Resume,
                });
                (Some(level), status)
            }
            Err(e) => {
                debug!("Metering sample failed: {}", e);
                (Some(METERING_FLOOR_DB), None)
            }
        }
    }

    async fn emit_status(&mut self, status: RecordStatus) {
        self.emit(&ProgressEvent::status(self.position_ms(), status));
        self.update_status_text(status).await;
    }

    fn emit(&self, event: &ProgressEvent) {
        if let Err(e) = self.emitter.emit(event) {
            warn!("Failed to emit progress event: {}", e);
        }
    }

    async fn update_status_text(&self, status: RecordStatus) {
        if let Err(e) = self.keep_alive.update_status_text(status.status_text()).await {
            warn!(%status, "Keep-alive status update failed: {}", e);
        }
    }

    /// Discard the session without finalizing the output
    async fn teardown(&mut self) {
        self.ticker.cancel().await;
        if let Err(e) = self.recorder.cancel().await {
            warn!("Recorder failed to cancel: {}", e);
        }
        self.release().await;
    }

    async fn release(&mut self) -> Option<OutputTarget> {
        let target = self.session.finish();
        self.metering_enabled = false;
        self.silence.reset();
        if self.keep_alive_started {
            self.keep_alive_started = false;
            if let Err(e) = self.keep_alive.notify_stopped().await {
                warn!("Keep-alive stop notification failed: {}", e);
            }
        }
        debug!(state = %self.session.state(), "Session released");
        target
    }
}

/// Monotonic now, following tokio's clock so paused-time tests control it
fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        EmitError, KeepAliveError, PermissionStatus, RecorderError,
    };
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration as StdDuration;

    #[derive(Default)]
    struct MockRecorder {
        calls: Mutex<Vec<&'static str>>,
        fail_start: AtomicBool,
        fail_stop: AtomicBool,
        fail_pause: AtomicBool,
        amplitude: Mutex<f64>,
    }

    impl MockRecorder {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl Recorder for Arc<MockRecorder> {
        async fn prepare(
            &self,
            _target: &OutputTarget,
            _settings: &RecorderSettings,
        ) -> Result<(), RecorderError> {
            self.record("prepare");
            Ok(())
        }

        async fn start(&self) -> Result<(), RecorderError> {
            self.record("start");
            if self.fail_start.load(Ordering::SeqCst) {
                return Err(RecorderError::StartFailed("device busy".into()));
            }
            Ok(())
        }

        async fn pause(&self) -> Result<(), RecorderError> {
            self.record("pause");
            if self.fail_pause.load(Ordering::SeqCst) {
                return Err(RecorderError::RecordingFailed("stream lost".into()));
            }
            Ok(())
        }

        async fn resume(&self) -> Result<(), RecorderError> {
            self.record("resume");
            Ok(())
        }

        async fn stop(&self) -> Result<(), RecorderError> {
            self.record("stop");
            if self.fail_stop.load(Ordering::SeqCst) {
                return Err(RecorderError::WriteFailed("disk full".into()));
            }
            Ok(())
        }

        async fn cancel(&self) -> Result<(), RecorderError> {
            self.record("cancel");
            Ok(())
        }

        fn max_amplitude(&self) -> Result<f64, RecorderError> {
            Ok(*self.amplitude.lock().unwrap())
        }
    }

    struct MockPermission(PermissionStatus);

    #[async_trait]
    impl PermissionAuthority for MockPermission {
        async fn request_microphone_and_storage(&self) -> PermissionStatus {
            self.0
        }
    }

    struct HangingPermission;

    #[async_trait]
    impl PermissionAuthority for HangingPermission {
        async fn request_microphone_and_storage(&self) -> PermissionStatus {
            std::future::pending().await
        }
    }

    #[derive(Default)]
    struct MockKeepAlive {
        started: AtomicUsize,
        stopped: AtomicUsize,
    }

    #[async_trait]
    impl KeepAlive for Arc<MockKeepAlive> {
        async fn notify_started(&self) -> Result<(), KeepAliveError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn notify_stopped(&self) -> Result<(), KeepAliveError> {
            self.stopped.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn update_status_text(&self, _text: &str) -> Result<(), KeepAliveError> {
            Err(KeepAliveError::UpdateFailed("no service".into()))
        }
    }

    struct CachePaths;

    impl PathResolver for CachePaths {
        fn resolve_default_cache_path(&self, file_name: &str) -> PathBuf {
            PathBuf::from("/cache").join(file_name)
        }
    }

    #[derive(Default, Clone)]
    struct CollectingEmitter(Arc<Mutex<Vec<ProgressEvent>>>);

    impl CollectingEmitter {
        fn events(&self) -> Vec<ProgressEvent> {
            self.0.lock().unwrap().clone()
        }
    }

    impl EventEmitter for CollectingEmitter {
        fn emit(&self, event: &ProgressEvent) -> Result<(), EmitError> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    type TestController<P> = SessionController<
        Arc<MockRecorder>,
        P,
        Arc<MockKeepAlive>,
        CachePaths,
        CollectingEmitter,
    >;

    struct Harness<P: PermissionAuthority> {
        controller: TestController<P>,
        recorder: Arc<MockRecorder>,
        keep_alive: Arc<MockKeepAlive>,
        events: CollectingEmitter,
    }

    fn harness_with<P: PermissionAuthority>(permission: P, config: ControllerConfig) -> Harness<P> {
        let recorder = Arc::new(MockRecorder::default());
        let keep_alive = Arc::new(MockKeepAlive::default());
        let events = CollectingEmitter::default();
        let controller = SessionController::new(
            recorder.clone(),
            permission,
            keep_alive.clone(),
            CachePaths,
            events.clone(),
            config,
        );
        Harness {
            controller,
            recorder,
            keep_alive,
            events,
        }
    }

    fn harness() -> Harness<MockPermission> {
        harness_with(
            MockPermission(PermissionStatus::Granted),
            ControllerConfig {
                metering_interval: Duration::from_millis(100),
                silence_threshold: 2,
                ..ControllerConfig::default()
            },
        )
    }

    async fn drive_ticks<P: PermissionAuthority>(h: &mut Harness<P>, count: usize) {
        for _ in 0..count {
            let id = h.controller.next_tick().await.unwrap();
            h.controller.on_tick(id).await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_resolves_default_uri() {
        let mut h = harness();
        let uri = h
            .controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap();

        assert_eq!(uri, "file:///cache/sound.mp4");
        assert_eq!(h.controller.state(), SessionState::Recording);
        assert!(h.controller.is_emitting());
        assert_eq!(h.recorder.calls(), vec!["prepare", "start"]);
        assert_eq!(h.keep_alive.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_denied_leaves_session_idle() {
        let mut h = harness_with(
            MockPermission(PermissionStatus::Denied),
            ControllerConfig::default(),
        );
        let err = h
            .controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap_err();

        assert_eq!(err, SessionError::PermissionDenied);
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert!(h.recorder.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn permission_wait_times_out() {
        let mut h = harness_with(
            HangingPermission,
            ControllerConfig {
                permission_timeout: Some(Duration::from_secs(5)),
                ..ControllerConfig::default()
            },
        );
        let err = h
            .controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::PermissionDenied);
    }

    #[tokio::test(start_paused = true)]
    async fn start_failure_tears_down() {
        let mut h = harness();
        h.recorder.fail_start.store(true, Ordering::SeqCst);

        let err = h
            .controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "RecorderInitError");
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert!(!h.controller.is_emitting());
        assert_eq!(h.recorder.calls(), vec!["prepare", "start", "cancel"]);
        assert_eq!(h.keep_alive.started.load(Ordering::SeqCst), 0);
        assert_eq!(h.keep_alive.stopped.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_destination_is_rejected() {
        let mut h = harness();
        let err = h
            .controller
            .start("https://example.com/a.mp4", EncodingOptions::default(), false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "RecorderInitError");
        assert!(h.recorder.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_discards_previous_session() {
        let mut h = harness();
        h.controller
            .start("first.flac", EncodingOptions::default(), false)
            .await
            .unwrap();
        let uri = h
            .controller
            .start("second.flac", EncodingOptions::default(), false)
            .await
            .unwrap();

        assert_eq!(uri, "file:///cache/second.flac");
        assert_eq!(
            h.recorder.calls(),
            vec!["prepare", "start", "cancel", "prepare", "start"]
        );
        assert_eq!(h.keep_alive.stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_cancels_ticker_and_pauses_recorder() {
        let mut h = harness();
        h.controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap();

        let message = h.controller.pause(Origin::User).await.unwrap();
        assert_eq!(message, PAUSED_MESSAGE);
        assert_eq!(h.controller.state(), SessionState::PausedByUser);
        assert!(!h.controller.is_emitting());
        assert!(h.recorder.calls().contains(&"pause"));
    }

    #[tokio::test(start_paused = true)]
    async fn pause_without_session_is_rejected() {
        let mut h = harness();
        assert_eq!(
            h.controller.pause(Origin::User).await,
            Err(SessionError::NotRecording)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn recorder_pause_failure_is_a_fault() {
        let mut h = harness();
        h.controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap();
        h.recorder.fail_pause.store(true, Ordering::SeqCst);

        let err = h.controller.pause(Origin::User).await.unwrap_err();
        assert_eq!(err.code(), "RecorderFault");
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(h.keep_alive.stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn resume_while_recording_is_rejected() {
        let mut h = harness();
        h.controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap();
        assert_eq!(
            h.controller.resume(Origin::User).await,
            Err(SessionError::AlreadyRecording)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn user_resume_during_interruption_does_not_touch_recorder() {
        let mut h = harness();
        h.controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap();
        h.controller
            .handle_interruption(InterruptionEvent::InterruptionBegan)
            .await;
        let before = h.recorder.calls();

        let err = h.controller.resume(Origin::User).await.unwrap_err();
        assert_eq!(err, SessionError::InterruptActive);
        assert_eq!(h.recorder.calls(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_twice_rejects_second() {
        let mut h = harness();
        h.controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap();

        assert!(h.controller.stop().await.is_ok());
        assert_eq!(h.controller.stop().await, Err(SessionError::NotRecording));
        assert_eq!(h.keep_alive.stopped.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.recorder.calls().iter().filter(|c| **c == "stop").count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_failure_still_releases() {
        let mut h = harness();
        h.controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap();
        h.recorder.fail_stop.store(true, Ordering::SeqCst);

        let err = h.controller.stop().await.unwrap_err();
        assert_eq!(err.code(), "StopFailure");
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(h.controller.flags(), InterruptFlags::default());
        assert!(!h.controller.is_emitting());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_carry_position_and_metering() {
        let mut h = harness();
        *h.recorder.amplitude.lock().unwrap() = 32767.0;
        h.controller
            .start("DEFAULT", EncodingOptions::default(), true)
            .await
            .unwrap();

        drive_ticks(&mut h, 3).await;

        let events = h.events.events();
        assert_eq!(events.len(), 3);
        let positions: Vec<u64> = events.iter().map(|e| e.current_position).collect();
        assert_eq!(positions, vec![100, 200, 300]);
        assert!(events.iter().all(|e| e.current_metering == Some(0.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_without_metering_omit_level() {
        let mut h = harness();
        h.controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap();
        drive_ticks(&mut h, 1).await;
        assert_eq!(h.events.events()[0].current_metering, None);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_is_flagged_after_threshold_and_cleared() {
        let mut h = harness();
        h.controller
            .start("DEFAULT", EncodingOptions::default(), true)
            .await
            .unwrap();

        drive_ticks(&mut h, 3).await;
        *h.recorder.amplitude.lock().unwrap() = 1000.0;
        drive_ticks(&mut h, 1).await;

        let statuses: Vec<Option<RecordStatus>> =
            h.events.events().iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![None, Some(RecordStatus::Paused), None, Some(RecordStatus::Resume)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_tick_after_pause_is_discarded() {
        let mut h = harness();
        h.controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap();
        let id = h.controller.next_tick().await.unwrap();
        h.controller.pause(Origin::User).await.unwrap();

        h.controller.on_tick(id).await;
        assert!(h.events.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_excludes_pause() {
        let mut h = harness();
        h.controller
            .start("DEFAULT", EncodingOptions::default(), false)
            .await
            .unwrap();

        tokio::time::advance(StdDuration::from_millis(1000)).await;
        h.controller.pause(Origin::User).await.unwrap();
        tokio::time::advance(StdDuration::from_millis(5000)).await;
        assert_eq!(h.controller.position_ms(), 1000);
        h.controller.resume(Origin::User).await.unwrap();
        tokio::time::advance(StdDuration::from_millis(500)).await;

        assert_eq!(h.controller.position_ms(), 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn subscription_duration_clamps() {
        let mut h = harness();
        let message = h.controller.set_subscription_duration(-1.0);
        assert!(message.contains("10ms"));
        assert_eq!(h.controller.metering_interval().as_millis(), 10);

        h.controller.set_subscription_duration(0.25);
        assert_eq!(h.controller.metering_interval().as_millis(), 250);
    }

    #[tokio::test(start_paused = true)]
    async fn interruption_without_session_is_dropped() {
        let mut h = harness();
        h.controller
            .handle_interruption(InterruptionEvent::InterruptionBegan)
            .await;
        assert_eq!(h.controller.state(), SessionState::Idle);
        assert_eq!(h.controller.flags(), InterruptFlags::default());
        assert!(h.events.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_reports_session() {
        let mut h = harness();
        h.controller
            .start("take.flac", EncodingOptions::default(), true)
            .await
            .unwrap();
        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.state, "recording");
        assert_eq!(snapshot.uri.as_deref(), Some("file:///cache/take.flac"));
        assert!(snapshot.metering_enabled);
        assert_eq!(snapshot.subscription_duration_ms, 100);
    }
}
