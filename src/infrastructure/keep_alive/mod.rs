//! Keep-alive infrastructure module

mod noop;
mod notify_rust;

pub use noop::NoOpKeepAlive;
pub use notify_rust::NotifyRustKeepAlive;

use crate::application::ports::KeepAlive;

/// Create the keep-alive for the current run
///
/// Desktop notifications when `notify` is set, otherwise a silent no-op.
pub fn create_keep_alive(notify: bool) -> Box<dyn KeepAlive> {
    if notify {
        Box::new(NotifyRustKeepAlive::new())
    } else {
        Box::new(NoOpKeepAlive::new())
    }
}
