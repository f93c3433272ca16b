//! In-process event emitter over a tokio channel

use tokio::sync::mpsc;

use crate::application::ports::{EmitError, EventEmitter};
use crate::domain::session::ProgressEvent;

/// Forwards progress events to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelEmitter {
    /// Create an emitter and the receiving half for the host
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventEmitter for ChannelEmitter {
    fn emit(&self, event: &ProgressEvent) -> Result<(), EmitError> {
        self.tx
            .send(event.clone())
            .map_err(|_| EmitError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::RecordStatus;

    #[test]
    fn forwards_events_in_order() {
        let (emitter, mut rx) = ChannelEmitter::channel();
        emitter.emit(&ProgressEvent::tick(500, Some(-20.0))).unwrap();
        emitter
            .emit(&ProgressEvent::status(500, RecordStatus::Paused))
            .unwrap();

        assert_eq!(rx.try_recv().unwrap().current_position, 500);
        assert_eq!(rx.try_recv().unwrap().status, Some(RecordStatus::Paused));
    }

    #[test]
    fn dropped_receiver_is_disconnected() {
        let (emitter, rx) = ChannelEmitter::channel();
        drop(rx);
        assert!(matches!(
            emitter.emit(&ProgressEvent::tick(0, None)),
            Err(EmitError::Disconnected)
        ));
    }
}
