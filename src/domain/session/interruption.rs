//! OS interruption events and the arbiter deciding how they affect a session

use std::fmt;
use std::str::FromStr;

use super::progress::RecordStatus;
use super::state::{InterruptFlags, SessionState};
use crate::domain::error::UnknownValueError;

/// Telephony call state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallState {
    Idle,
    Ringing,
    OffHook,
}

impl CallState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ringing => "ringing",
            Self::OffHook => "offhook",
        }
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CallState {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "idle" | "ended" => Ok(Self::Idle),
            "ringing" => Ok(Self::Ringing),
            "offhook" | "off-hook" | "active" => Ok(Self::OffHook),
            _ => Err(UnknownValueError {
                kind: "call state",
                input: s.to_string(),
            }),
        }
    }
}

/// Why the audio route changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteChangeReason {
    NewDeviceAvailable,
    OldDeviceUnavailable,
    CategoryChange,
    Override,
    WakeFromSleep,
    NoSuitableRouteForCategory,
    RouteConfigurationChange,
    Unknown,
}

impl RouteChangeReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NewDeviceAvailable => "new-device-available",
            Self::OldDeviceUnavailable => "old-device-unavailable",
            Self::CategoryChange => "category-change",
            Self::Override => "override",
            Self::WakeFromSleep => "wake-from-sleep",
            Self::NoSuitableRouteForCategory => "no-suitable-route",
            Self::RouteConfigurationChange => "route-configuration-change",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable explanation for logs
    pub const fn description(&self) -> &'static str {
        match self {
            Self::NewDeviceAvailable => {
                "A new audio device became available (e.g. headphones plugged in)"
            }
            Self::OldDeviceUnavailable => {
                "The previous audio device became unavailable (e.g. headphones unplugged)"
            }
            Self::CategoryChange => "The audio session category changed",
            Self::Override => "The audio route was overridden",
            Self::WakeFromSleep => "The device woke from sleep",
            Self::NoSuitableRouteForCategory => "No suitable route exists for the current category",
            Self::RouteConfigurationChange => "The route configuration changed",
            Self::Unknown => "The route changed for an unknown reason",
        }
    }
}

impl fmt::Display for RouteChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RouteChangeReason {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new-device-available" | "new-device" => Ok(Self::NewDeviceAvailable),
            "old-device-unavailable" | "old-device" => Ok(Self::OldDeviceUnavailable),
            "category-change" => Ok(Self::CategoryChange),
            "override" => Ok(Self::Override),
            "wake-from-sleep" => Ok(Self::WakeFromSleep),
            "no-suitable-route" => Ok(Self::NoSuitableRouteForCategory),
            "route-configuration-change" => Ok(Self::RouteConfigurationChange),
            "unknown" => Ok(Self::Unknown),
            _ => Err(UnknownValueError {
                kind: "route change reason",
                input: s.to_string(),
            }),
        }
    }
}

/// OS-reported event affecting audio input ownership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptionEvent {
    InterruptionBegan,
    InterruptionEnded { resume_permitted: bool },
    RouteChanged(RouteChangeReason),
    CallStateChanged(CallState),
}

impl fmt::Display for InterruptionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InterruptionBegan => write!(f, "interruption began"),
            Self::InterruptionEnded { resume_permitted } => {
                write!(f, "interruption ended (resume permitted: {})", resume_permitted)
            }
            Self::RouteChanged(reason) => write!(f, "route changed ({})", reason),
            Self::CallStateChanged(state) => write!(f, "call state {}", state),
        }
    }
}

/// Side effect the controller carries out for an arbitration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterAction {
    /// Pause the session on behalf of the system
    Pause,
    /// Resume a session the system paused
    Resume,
    /// Keep a user-paused session paused but drop the system's hold on it
    ReleaseInterruptHold,
    /// Convert the system pause into a user pause
    HandOverToUser,
    /// Emit an ad hoc progress status
    Notify(RecordStatus),
    /// Record the route change
    LogRoute(RouteChangeReason),
}

/// Outcome of one arbitration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arbitration {
    pub flags: InterruptFlags,
    pub actions: Vec<ArbiterAction>,
}

impl Arbitration {
    fn new(flags: InterruptFlags) -> Self {
        Self {
            flags,
            actions: Vec::new(),
        }
    }

    fn then(mut self, action: ArbiterAction) -> Self {
        self.actions.push(action);
        self
    }
}

/// Decide how `event` affects a session in `state` with `flags`.
///
/// Events arriving without an active session change nothing.
pub fn arbitrate(
    state: SessionState,
    flags: InterruptFlags,
    event: InterruptionEvent,
) -> Arbitration {
    if !state.is_active() {
        return Arbitration::new(flags);
    }

    let mut next = flags;
    match event {
        InterruptionEvent::InterruptionBegan => {
            next.interrupt_active = true;
            let outcome = Arbitration::new(next);
            if state == SessionState::Recording {
                return system_pause(outcome);
            }
            outcome
        }
        InterruptionEvent::InterruptionEnded {
            resume_permitted: true,
        } => {
            next.interrupt_active = false;
            let outcome = Arbitration::new(next);
            if !next.interrupt_paused {
                return outcome;
            }
            if next.user_paused {
                return outcome.then(ArbiterAction::ReleaseInterruptHold);
            }
            if !next.call_active && !next.fail_resume {
                return system_resume(outcome);
            }
            outcome
        }
        InterruptionEvent::InterruptionEnded {
            resume_permitted: false,
        } => {
            next.interrupt_active = false;
            next.fail_resume = true;
            Arbitration::new(next)
        }
        InterruptionEvent::CallStateChanged(CallState::OffHook) => {
            next.call_active = true;
            let outcome = Arbitration::new(next);
            if state == SessionState::Recording {
                return system_pause(outcome);
            }
            outcome
        }
        InterruptionEvent::CallStateChanged(CallState::Idle) => {
            next.call_active = false;
            if next.fail_resume {
                next.fail_resume = false;
                let outcome = Arbitration::new(next);
                if next.user_paused {
                    if next.interrupt_paused && !next.interrupt_active {
                        return outcome.then(ArbiterAction::ReleaseInterruptHold);
                    }
                    return outcome;
                }
                return outcome
                    .then(ArbiterAction::HandOverToUser)
                    .then(ArbiterAction::Notify(RecordStatus::FailResumeByNative));
            }

            let outcome = Arbitration::new(next);
            if next.interrupt_paused && !next.interrupt_active {
                if next.user_paused {
                    return outcome.then(ArbiterAction::ReleaseInterruptHold);
                }
                return system_resume(outcome);
            }
            outcome
        }
        InterruptionEvent::CallStateChanged(CallState::Ringing) => Arbitration::new(next),
        InterruptionEvent::RouteChanged(reason) => {
            Arbitration::new(next).then(ArbiterAction::LogRoute(reason))
        }
    }
}

fn system_pause(outcome: Arbitration) -> Arbitration {
    outcome
        .then(ArbiterAction::Pause)
        .then(ArbiterAction::Notify(RecordStatus::PausedByNative))
}

fn system_resume(outcome: Arbitration) -> Arbitration {
    outcome
        .then(ArbiterAction::Resume)
        .then(ArbiterAction::Notify(RecordStatus::ResumeByNative))
}
