//! Redraw scheduling for fe.
//!
//! Every state mutation marks the session dirty and asks for a refresh. Requests go through a
//! channel of capacity one, so a burst of mutations between two frames queues at most a single
//! extra redraw on top of the steady render tick.

use crossbeam_channel::{Receiver, Sender, bounded};

use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) struct RenderScheduler {
    dirty: AtomicBool,
    refresh_tx: Sender<()>,
    refresh_rx: Receiver<()>,
}

impl RenderScheduler {
    /// Starts dirty so the first tick paints the initial frame.
    pub(crate) fn new() -> Self {
        let (refresh_tx, refresh_rx) = bounded(1);
        Self {
            dirty: AtomicBool::new(true),
            refresh_tx,
            refresh_rx,
        }
    }

    /// Marks the session dirty and queues a refresh unless one is already pending.
    pub(crate) fn request(&self) {
        self.dirty.store(true, Ordering::Release);
        // full means a refresh is already queued
        let _ = self.refresh_tx.try_send(());
    }

    /// Marks the session dirty without waking the render loop.
    pub(crate) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Reads and clears the dirty flag. Only the render step calls this.
    pub(crate) fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn refresh_rx(&self) -> &Receiver<()> {
        &self.refresh_rx
    }
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_dirty() {
        let scheduler = RenderScheduler::new();
        assert!(scheduler.take_dirty());
        assert!(!scheduler.take_dirty());
    }

    #[test]
    fn bursts_coalesce_into_one_refresh() {
        let scheduler = RenderScheduler::new();
        scheduler.take_dirty();

        for _ in 0..50 {
            scheduler.request();
        }

        assert_eq!(scheduler.refresh_rx().len(), 1);
        assert!(scheduler.refresh_rx().try_recv().is_ok());
        assert!(scheduler.refresh_rx().try_recv().is_err());
        assert!(scheduler.take_dirty());
    }

    #[test]
    fn mark_dirty_does_not_queue_refresh() {
        let scheduler = RenderScheduler::new();
        scheduler.mark_dirty();
        assert!(scheduler.is_dirty());
        assert!(scheduler.refresh_rx().is_empty());
    }
}
