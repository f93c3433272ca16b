//! Recording session: state machine, interruption arbitration and progress events

mod interruption;
mod progress;
mod state;

pub use interruption::{
    arbitrate, ArbiterAction, Arbitration, CallState, InterruptionEvent, RouteChangeReason,
};
pub use progress::{ProgressEvent, RecordStatus, PROGRESS_EVENT};
pub use state::{
    InterruptFlags, InvalidStateTransition, Origin, PauseOutcome, RecordingSession, SessionState,
};
