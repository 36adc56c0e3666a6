//! Cancellable delayed tasks.
//!
//! A [DelayedTask] runs a closure once after a delay on its own thread unless it is cancelled
//! first. [TimerSlot] holds at most one pending task of a logical timer and cancels the previous
//! instance whenever it is rearmed.
//!
//! The key sequence debounce and the status message expiry are both driven through a [TimerSlot].
//! A task that was cancelled while its deadline was already passing may still run, so callbacks
//! carry a generation number and the owner ignores stale ones.

use crossbeam_channel::{Sender, after, bounded, select};

use std::thread;
use std::time::Duration;

/// A closure scheduled to run once after a delay.
///
/// Dropping the handle cancels the task.
pub(crate) struct DelayedTask {
    cancel_tx: Option<Sender<()>>,
}

impl DelayedTask {
    pub(crate) fn schedule<F>(delay: Duration, task: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = bounded::<()>(0);

        thread::spawn(move || {
            let deadline = after(delay);
            select! {
                // disconnected on cancel
                recv(cancel_rx) -> _ => {}
                recv(deadline) -> _ => task(),
            }
        });

        Self {
            cancel_tx: Some(cancel_tx),
        }
    }

    pub(crate) fn cancel(&mut self) {
        self.cancel_tx.take();
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Holds the single pending instance of one logical timer.
#[derive(Default)]
pub(crate) struct TimerSlot {
    task: Option<DelayedTask>,
}

impl TimerSlot {
    /// Cancels any pending instance and schedules `task` after `delay`.
    pub(crate) fn arm<F>(&mut self, delay: Duration, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.task = Some(DelayedTask::schedule(delay, task));
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(mut task) = self.task.take() {
            task.cancel();
        }
    }
}
