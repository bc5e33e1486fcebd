//! Trailing-edge debouncer.
//!
//! # Responsibility
//! - Coalesce a burst of triggers into one delivery after a quiet period.
//!
//! # Invariants
//! - At most one timer is pending per debouncer.
//! - A delivered value is always the most recent one triggered.
//! - Dropping the debouncer cancels its pending timer.
//!
//! Timers run on the ambient tokio runtime, so `trigger` must be called from
//! within one.

use log::trace;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Delivers the last triggered value once triggers stop for `quiet_period`.
pub struct Debouncer<T> {
    quiet_period: Duration,
    sender: UnboundedSender<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Creates a debouncer and the receiver its fired values arrive on.
    pub fn new(quiet_period: Duration) -> (Self, UnboundedReceiver<T>) {
        let (sender, receiver) = unbounded_channel();
        (
            Self {
                quiet_period,
                sender,
                pending: None,
            },
            receiver,
        )
    }

    /// Restarts the quiet period with `value` as the pending delivery.
    pub fn trigger(&mut self, value: T) {
        self.cancel();

        let sender = self.sender.clone();
        let deadline = Instant::now() + self.quiet_period;
        self.pending = Some(tokio::spawn(async move {
            sleep_until(deadline).await;
            // Receiver gone means the consumer shut down.
            let _ = sender.send(value);
        }));
    }

    /// Drops the pending delivery. Returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let was_waiting = !handle.is_finished();
                handle.abort();
                if was_waiting {
                    trace!("event=debounce_cancel module=debounce status=ok");
                }
                was_waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
