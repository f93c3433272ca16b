//! Recording session state machine

use std::fmt;
use std::time::{Duration as StdDuration, Instant};

use thiserror::Error;

use crate::domain::error::SessionError;
use crate::domain::recording::OutputTarget;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Preparing,
    Recording,
    PausedByUser,
    PausedByInterrupt,
    Stopped,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Recording => "recording",
            Self::PausedByUser => "paused-by-user",
            Self::PausedByInterrupt => "paused-by-interrupt",
            Self::Stopped => "stopped",
        }
    }

    /// Whether a session currently owns an output target
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Stopped)
    }

    pub const fn is_paused(&self) -> bool {
        matches!(self, Self::PausedByUser | Self::PausedByInterrupt)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who asked for a pause or resume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The host application
    User,
    /// The interruption arbiter
    System,
}

impl Origin {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pause and interruption bookkeeping for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterruptFlags {
    pub user_paused: bool,
    pub interrupt_paused: bool,
    pub interrupt_active: bool,
    pub call_active: bool,
    pub fail_resume: bool,
}

impl InterruptFlags {
    /// Whether the system still holds the session, so the user may not resume
    pub const fn blocks_user_resume(&self) -> bool {
        self.interrupt_paused || self.interrupt_active || self.call_active || self.fail_resume
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: String,
}

/// Result of a successful pause request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    /// The session was recording; the recorder must be paused
    RecorderPaused,
    /// The recorder was already held by an interruption; only ownership changed
    AlreadyHeld,
}

/// Recording session entity.
///
/// State machine:
///   IDLE -> PREPARING (prepare)
///   PREPARING -> RECORDING (begin_recording)
///   RECORDING -> PAUSED_BY_USER | PAUSED_BY_INTERRUPT (pause)
///   PAUSED_BY_INTERRUPT -> PAUSED_BY_USER (user pause, hand_over_to_user)
///   PAUSED_* -> RECORDING (resume)
///   any active -> STOPPED -> IDLE (finish)
///
/// Time is passed in by the caller so the entity never reads a clock.
#[derive(Debug, Default)]
pub struct RecordingSession {
    state: SessionState,
    target: Option<OutputTarget>,
    start_epoch: Option<Instant>,
    paused_at: Option<Instant>,
    accumulated_pause: StdDuration,
    flags: InterruptFlags,
}

impl RecordingSession {
    /// Create a new session in idle state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn flags(&self) -> InterruptFlags {
        self.flags
    }

    pub fn target(&self) -> Option<&OutputTarget> {
        self.target.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn accumulated_pause(&self) -> StdDuration {
        self.accumulated_pause
    }

    /// Transition from IDLE to PREPARING, taking ownership of the target
    pub fn prepare(&mut self, target: OutputTarget) -> Result<(), InvalidStateTransition> {
        if self.state.is_active() {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "prepare a recording".to_string(),
            });
        }
        *self = Self {
            state: SessionState::Preparing,
            target: Some(target),
            ..Self::default()
        };
        Ok(())
    }

    /// Transition from PREPARING to RECORDING and start the clock
    pub fn begin_recording(&mut self, now: Instant) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Preparing {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "begin recording".to_string(),
            });
        }
        self.state = SessionState::Recording;
        self.start_epoch = Some(now);
        self.paused_at = None;
        self.accumulated_pause = StdDuration::ZERO;
        Ok(())
    }

    /// Pause on behalf of `origin`.
    ///
    /// A user pause over an interrupt-held session only transfers ownership.
    pub fn pause(&mut self, origin: Origin, now: Instant) -> Result<PauseOutcome, SessionError> {
        match (self.state, origin) {
            (SessionState::Recording, Origin::User) => {
                self.state = SessionState::PausedByUser;
                self.flags.user_paused = true;
                self.paused_at = Some(now);
                Ok(PauseOutcome::RecorderPaused)
            }
            (SessionState::Recording, Origin::System) => {
                self.state = SessionState::PausedByInterrupt;
                self.flags.interrupt_paused = true;
                self.paused_at = Some(now);
                Ok(PauseOutcome::RecorderPaused)
            }
            (SessionState::PausedByInterrupt, Origin::User) => {
                self.state = SessionState::PausedByUser;
                self.flags.user_paused = true;
                Ok(PauseOutcome::AlreadyHeld)
            }
            _ => Err(SessionError::NotRecording),
        }
    }

    /// Validate a resume request without mutating anything
    pub fn check_resume(&self, origin: Origin) -> Result<(), SessionError> {
        if !self.state.is_active() || self.state == SessionState::Preparing {
            return Err(SessionError::NotRecording);
        }
        if origin == Origin::User && self.flags.blocks_user_resume() {
            return Err(SessionError::InterruptActive);
        }
        if self.state == SessionState::Recording {
            return Err(SessionError::AlreadyRecording);
        }
        if origin == Origin::System && self.state != SessionState::PausedByInterrupt {
            return Err(SessionError::NotRecording);
        }
        Ok(())
    }

    /// Resume on behalf of `origin`, folding the pause into the accumulated total
    pub fn resume(&mut self, origin: Origin, now: Instant) -> Result<(), SessionError> {
        self.check_resume(origin)?;
        if let Some(paused_at) = self.paused_at.take() {
            self.accumulated_pause += now.saturating_duration_since(paused_at);
        }
        self.flags.user_paused = false;
        self.flags.interrupt_paused = false;
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Replace the interruption tracking flags decided by the arbiter.
    ///
    /// Pause ownership flags stay under the session's control.
    pub fn track(&mut self, flags: InterruptFlags) {
        self.flags.interrupt_active = flags.interrupt_active;
        self.flags.call_active = flags.call_active;
        self.flags.fail_resume = flags.fail_resume;
    }

    /// Drop the interrupt hold on a session the user also paused
    pub fn release_interrupt_hold(&mut self) {
        self.flags.interrupt_paused = false;
    }

    /// Turn an interrupt pause into a user pause so an explicit resume is possible
    pub fn hand_over_to_user(&mut self) -> bool {
        if self.state != SessionState::PausedByInterrupt {
            return false;
        }
        self.state = SessionState::PausedByUser;
        self.flags.interrupt_paused = false;
        self.flags.user_paused = true;
        true
    }

    /// Recording duration excluding pauses. Frozen while paused.
    pub fn elapsed(&self, now: Instant) -> StdDuration {
        let Some(start) = self.start_epoch else {
            return StdDuration::ZERO;
        };
        let end = self.paused_at.unwrap_or(now);
        end.saturating_duration_since(start)
            .saturating_sub(self.accumulated_pause)
    }

    /// Tear the session down, passing through STOPPED back to IDLE.
    ///
    /// Returns the released target, if any.
    pub fn finish(&mut self) -> Option<OutputTarget> {
        self.state = SessionState::Stopped;
        let target = self.target.take();
        *self = Self::default();
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(at: Instant) -> RecordingSession {
        let mut session = RecordingSession::new();
        session.prepare(OutputTarget::new("/tmp/sound.flac")).unwrap();
        session.begin_recording(at).unwrap();
        session
    }

    fn secs(n: u64) -> StdDuration {
        StdDuration::from_secs(n)
    }

    #[test]
    fn new_session_is_idle_without_target() {
        let session = RecordingSession::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.target().is_none());
        assert_eq!(session.flags(), InterruptFlags::default());
    }

    #[test]
    fn prepare_then_begin() {
        let t0 = Instant::now();
        let session = recording(t0);
        assert!(session.is_recording());
        assert!(session.target().is_some());
    }

    #[test]
    fn prepare_while_active_fails() {
        let mut session = recording(Instant::now());
        let err = session.prepare(OutputTarget::new("/tmp/b.flac")).unwrap_err();
        assert_eq!(err.current_state, SessionState::Recording);
        assert!(err.to_string().contains("recording"));
    }

    #[test]
    fn begin_without_prepare_fails() {
        let mut session = RecordingSession::new();
        let err = session.begin_recording(Instant::now()).unwrap_err();
        assert_eq!(err.current_state, SessionState::Idle);
    }

    #[test]
    fn user_pause_sets_only_user_flag() {
        let t0 = Instant::now();
        let mut session = recording(t0);
        let outcome = session.pause(Origin::User, t0 + secs(1)).unwrap();
        assert_eq!(outcome, PauseOutcome::RecorderPaused);
        assert_eq!(session.state(), SessionState::PausedByUser);
        assert!(session.flags().user_paused);
        assert!(!session.flags().interrupt_paused);
    }

    #[test]
    fn system_pause_sets_only_interrupt_flag() {
        let t0 = Instant::now();
        let mut session = recording(t0);
        session.pause(Origin::System, t0).unwrap();
        assert_eq!(session.state(), SessionState::PausedByInterrupt);
        assert!(session.flags().interrupt_paused);
        assert!(!session.flags().user_paused);
    }

    #[test]
    fn user_pause_over_interrupt_does_not_touch_recorder() {
        let t0 = Instant::now();
        let mut session = recording(t0);
        session.pause(Origin::System, t0).unwrap();
        let outcome = session.pause(Origin::User, t0 + secs(1)).unwrap();
        assert_eq!(outcome, PauseOutcome::AlreadyHeld);
        assert_eq!(session.state(), SessionState::PausedByUser);
        assert!(session.flags().user_paused && session.flags().interrupt_paused);
    }

    #[test]
    fn pause_when_not_recording_fails() {
        let mut idle = RecordingSession::new();
        assert_eq!(
            idle.pause(Origin::User, Instant::now()),
            Err(SessionError::NotRecording)
        );

        let t0 = Instant::now();
        let mut paused = recording(t0);
        paused.pause(Origin::User, t0).unwrap();
        assert_eq!(paused.pause(Origin::User, t0), Err(SessionError::NotRecording));
        assert_eq!(paused.pause(Origin::System, t0), Err(SessionError::NotRecording));
    }

    #[test]
    fn resume_rejections_in_order() {
        let idle = RecordingSession::new();
        assert_eq!(idle.check_resume(Origin::User), Err(SessionError::NotRecording));

        let t0 = Instant::now();
        let session = recording(t0);
        assert_eq!(
            session.check_resume(Origin::User),
            Err(SessionError::AlreadyRecording)
        );

        let mut held = recording(t0);
        held.track(InterruptFlags {
            interrupt_active: true,
            ..InterruptFlags::default()
        });
        assert_eq!(held.check_resume(Origin::User), Err(SessionError::InterruptActive));
    }

    #[test]
    fn user_resume_blocked_while_interrupt_paused() {
        let t0 = Instant::now();
        let mut session = recording(t0);
        session.pause(Origin::System, t0).unwrap();
        assert_eq!(
            session.resume(Origin::User, t0 + secs(1)),
            Err(SessionError::InterruptActive)
        );
        assert_eq!(session.state(), SessionState::PausedByInterrupt);
    }

    #[test]
    fn system_resume_of_user_pause_fails() {
        let t0 = Instant::now();
        let mut session = recording(t0);
        session.pause(Origin::User, t0).unwrap();
        assert_eq!(
            session.check_resume(Origin::System),
            Err(SessionError::NotRecording)
        );
    }

    #[test]
    fn elapsed_excludes_pauses() {
        let t0 = Instant::now();
        let mut session = recording(t0);
        session.pause(Origin::User, t0 + secs(2)).unwrap();
        assert_eq!(session.elapsed(t0 + secs(5)), secs(2));
        session.resume(Origin::User, t0 + secs(5)).unwrap();
        assert_eq!(session.accumulated_pause(), secs(3));
        assert_eq!(session.elapsed(t0 + secs(7)), secs(4));
    }

    #[test]
    fn hand_over_moves_interrupt_pause_to_user() {
        let t0 = Instant::now();
        let mut session = recording(t0);
        session.pause(Origin::System, t0).unwrap();
        assert!(session.hand_over_to_user());
        assert_eq!(session.state(), SessionState::PausedByUser);
        assert!(!session.flags().interrupt_paused);
        assert!(session.resume(Origin::User, t0 + secs(1)).is_ok());
    }

    #[test]
    fn hand_over_is_noop_while_recording() {
        let mut session = recording(Instant::now());
        assert!(!session.hand_over_to_user());
        assert!(session.is_recording());
    }

    #[test]
    fn finish_releases_target_once() {
        let mut session = recording(Instant::now());
        assert!(session.finish().is_some());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.finish().is_none());
        assert_eq!(session.flags(), InterruptFlags::default());
    }

    #[test]
    fn fresh_session_after_finish() {
        let t0 = Instant::now();
        let mut session = recording(t0);
        session.pause(Origin::User, t0 + secs(1)).unwrap();
        session.finish();

        session.prepare(OutputTarget::new("/tmp/next.flac")).unwrap();
        session.begin_recording(t0 + secs(10)).unwrap();
        assert_eq!(session.accumulated_pause(), StdDuration::ZERO);
        assert_eq!(session.elapsed(t0 + secs(11)), secs(1));
    }

    #[test]
    fn state_display() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        assert_eq!(SessionState::PausedByInterrupt.to_string(), "paused-by-interrupt");
        assert!(SessionState::Preparing.is_active());
        assert!(!SessionState::Stopped.is_active());
    }
}
