//! Cancellable periodic ticker driving progress events

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::recording::Duration;

/// Identifies the ticker run that produced a tick
pub type TickId = u64;

/// Receiving end of the tick channel, drained by the session owner
pub type TickReceiver = mpsc::UnboundedReceiver<TickId>;

struct ActiveRun {
    id: TickId,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic task that sends its run id into a channel every interval.
///
/// The interval is re-read before every sleep, so changes apply from the next tick.
/// Ticks are only delivered to the owner, who checks [`ProgressTicker::is_current`];
/// a tick still queued when its run is cancelled is therefore discarded.
pub struct ProgressTicker {
    ticks: mpsc::UnboundedSender<TickId>,
    interval: watch::Sender<Duration>,
    next_id: TickId,
    active: Option<ActiveRun>,
}

impl ProgressTicker {
    /// Create a ticker and the receiver its ticks arrive on
    pub fn channel(interval: Duration) -> (Self, TickReceiver) {
        let (ticks, rx) = mpsc::unbounded_channel();
        let (interval, _) = watch::channel(interval);
        let ticker = Self {
            ticks,
            interval,
            next_id: 0,
            active: None,
        };
        (ticker, rx)
    }

    pub fn interval(&self) -> Duration {
        *self.interval.borrow()
    }

    /// Change the period; a running ticker picks it up after its current sleep
    pub fn set_interval(&self, interval: Duration) {
        self.interval.send_replace(interval);
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Whether `id` belongs to the run currently scheduled
    pub fn is_current(&self, id: TickId) -> bool {
        self.active.as_ref().is_some_and(|run| run.id == id)
    }

    /// Start a new run, cancelling any previous one first
    pub async fn schedule(&mut self) -> TickId {
        self.cancel().await;

        self.next_id = self.next_id.wrapping_add(1);
        let id = self.next_id;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            id,
            self.interval.subscribe(),
            self.ticks.clone(),
            cancel.clone(),
        ));

        debug!(tick_run = id, interval = %self.interval(), "Progress ticker scheduled");
        self.active = Some(ActiveRun { id, cancel, handle });
        id
    }

    /// Stop the current run and wait until its task has exited.
    ///
    /// No tick from the cancelled run is accepted afterwards.
    pub async fn cancel(&mut self) {
        let Some(run) = self.active.take() else {
            return;
        };
        run.cancel.cancel();
        if let Err(e) = run.handle.await {
            warn!(tick_run = run.id, "Progress ticker task failed: {}", e);
        }
        debug!(tick_run = run.id, "Progress ticker cancelled");
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        if let Some(run) = self.active.take() {
            run.cancel.cancel();
        }
    }
}

async fn run(
    id: TickId,
    interval: watch::Receiver<Duration>,
    ticks: mpsc::UnboundedSender<TickId>,
    cancel: CancellationToken,
) {
    loop {
        let period = interval.borrow().clamp_to_metering().as_std();
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(period) => {
                if ticks.send(id).is_err() {
                    break;
                }
            }
        }
    }
}
