//! Background workers for fe.
//!
//! Two long-running threads feed the dispatch loop:
//! - the directory watcher re-lists the working directory every second, or right away when the
//!   session navigates, and swaps the new listing into the shared [DirSnapshot].
//! - the event poller reads terminal input through an [EventSource] and hands each event to the
//!   dispatch loop over a rendezvous channel.
//!
//! Both observe the one-shot [QuitSignal]. The signal is a channel that never carries a message:
//! triggering it drops the only sender, which wakes every listener at once.
//!
//! # Caution:
//! The watcher is the only writer of the snapshot. Everything else reads it under the lock.

use crate::core::fm::{DirSnapshot, SharedSnapshot, browse_dir};
use crate::core::redraw::RenderScheduler;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, TryRecvError, select, tick, unbounded};
use crossterm::event::{self, Event};

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often the watcher re-lists the working directory on its own.
pub const RESCAN_INTERVAL: Duration = Duration::from_secs(1);

/// How long a single input poll may block before the poller rechecks the quit signal.
const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// One-shot broadcast cancellation.
///
/// Cannot be reset once triggered.
pub struct QuitSignal {
    trigger: Option<Sender<()>>,
    listener: Receiver<()>,
}

impl QuitSignal {
    pub fn new() -> Self {
        let (trigger, listener) = crossbeam_channel::bounded(0);
        Self {
            trigger: Some(trigger),
            listener,
        }
    }

    pub fn trigger(&mut self) {
        if self.trigger.take().is_some() {
            log::info!("quit signal broadcast");
        }
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.trigger.is_none()
    }

    /// A receiver that becomes ready (disconnected) once the signal triggers.
    pub fn listener(&self) -> Receiver<()> {
        self.listener.clone()
    }
}

impl Default for QuitSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn quit_observed(quit: &Receiver<()>) -> bool {
    matches!(quit.try_recv(), Err(TryRecvError::Disconnected))
}

/// Handle to the directory watcher thread.
pub(crate) struct DirWatcher {
    rescan_tx: Sender<PathBuf>,
    handle: Option<JoinHandle<()>>,
}

impl DirWatcher {
    /// Spawns the watcher for `dir`.
    ///
    /// A failed listing is fatal: the error goes to `fatal_tx` and the thread stops.
    pub(crate) fn spawn(
        dir: PathBuf,
        show_hidden: bool,
        snapshot: SharedSnapshot,
        render: Arc<RenderScheduler>,
        fatal_tx: Sender<anyhow::Error>,
        quit: Receiver<()>,
    ) -> Self {
        let (rescan_tx, rescan_rx) = unbounded::<PathBuf>();

        let handle = thread::spawn(move || {
            let ticker = tick(RESCAN_INTERVAL);
            let mut dir = dir;

            let update = |dir: &PathBuf| -> anyhow::Result<()> {
                let entries = browse_dir(dir, show_hidden)
                    .with_context(|| format!("cannot list `{}`", dir.display()))?;
                let count = entries.len();
                {
                    let mut guard = snapshot.lock().unwrap_or_else(PoisonError::into_inner);
                    *guard = DirSnapshot::new(dir.clone(), entries);
                }
                log::trace!("rescanned {} ({} entries)", dir.display(), count);
                render.request();
                Ok(())
            };

            loop {
                let result = select! {
                    recv(ticker) -> _ => update(&dir),
                    recv(rescan_rx) -> path => match path {
                        Ok(path) => {
                            dir = path;
                            update(&dir)
                        }
                        Err(_) => return,
                    },
                    recv(quit) -> _ => return,
                };

                if let Err(err) = result {
                    log::error!("directory watcher failed: {err:#}");
                    let _ = fatal_tx.send(err.context("updating dir"));
                    return;
                }
            }
        });

        Self {
            rescan_tx,
            handle: Some(handle),
        }
    }

    /// Asks the watcher to switch to `dir` and list it now.
    pub(crate) fn rescan(&self, dir: PathBuf) {
        if self.rescan_tx.send(dir).is_err() {
            log::warn!("directory watcher is not running");
        }
    }

    /// Waits for the thread after the quit signal triggered.
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::error!("directory watcher panicked");
        }
    }
}

/// Outcome of a single input poll.
#[derive(Debug)]
pub enum Polled {
    Event(Event),
    Timeout,
    /// The source has no more events.
    Closed,
}

/// A blocking source of terminal events, owned by the event poller thread.
pub trait EventSource: Send + 'static {
    fn poll_event(&mut self, timeout: Duration) -> io::Result<Polled>;
}

/// Reads events from the real terminal through crossterm.
#[derive(Debug, Default)]
pub struct CrosstermSource;

impl EventSource for CrosstermSource {
    fn poll_event(&mut self, timeout: Duration) -> io::Result<Polled> {
        if event::poll(timeout)? {
            Ok(Polled::Event(event::read()?))
        } else {
            Ok(Polled::Timeout)
        }
    }
}

/// Starts the event poller thread.
///
/// Each event blocks the poller until the dispatch loop accepts it. The thread ends when the
/// quit signal triggers, the source closes or fails, or the dispatch loop drops its receiver.
/// Ending drops `event_tx`, which the dispatch loop reads as end of input.
pub(crate) fn spawn_event_poller<S: EventSource>(
    mut source: S,
    event_tx: Sender<Event>,
    quit: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            if quit_observed(&quit) {
                return;
            }
            match source.poll_event(INPUT_POLL_TIMEOUT) {
                Ok(Polled::Event(ev)) => {
                    select! {
                        send(event_tx, ev) -> res => if res.is_err() { return },
                        recv(quit) -> _ => return,
                    }
                }
                Ok(Polled::Timeout) => {}
                Ok(Polled::Closed) => {
                    log::info!("input source closed");
                    return;
                }
                Err(e) => {
                    log::error!("reading terminal input failed: {e}");
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::collections::VecDeque;
    use std::fs::{self, File};
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct Scripted(VecDeque<Event>);

    impl EventSource for Scripted {
        fn poll_event(&mut self, _timeout: Duration) -> io::Result<Polled> {
            Ok(match self.0.pop_front() {
                Some(ev) => Polled::Event(ev),
                None => Polled::Closed,
            })
        }
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn quit_signal_wakes_all_listeners() {
        let mut quit = QuitSignal::new();
        let a = quit.listener();
        let b = quit.listener();
        assert!(!quit_observed(&a));

        quit.trigger();
        quit.trigger();
        assert!(quit.is_triggered());
        assert!(quit_observed(&a));
        assert!(b.recv().is_err());
    }

    #[test]
    fn poller_forwards_in_order_then_closes() {
        let quit = QuitSignal::new();
        let (tx, rx) = crossbeam_channel::bounded(0);
        let source = Scripted(VecDeque::from(vec![key('a'), key('b')]));

        let handle = spawn_event_poller(source, tx, quit.listener());

        assert_eq!(rx.recv().ok(), Some(key('a')));
        assert_eq!(rx.recv().ok(), Some(key('b')));
        assert!(rx.recv().is_err(), "closed source must end the stream");
        assert!(handle.join().is_ok());
    }

    #[test]
    fn poller_stops_on_quit_while_blocked() {
        let mut quit = QuitSignal::new();
        let (tx, rx) = crossbeam_channel::bounded(0);
        let source = Scripted(VecDeque::from(vec![key('x')]));

        let handle = spawn_event_poller(source, tx, quit.listener());
        // nobody receives, the poller is stuck in send until quit
        thread::sleep(Duration::from_millis(50));
        quit.trigger();

        assert!(handle.join().is_ok());
        drop(rx);
    }

    #[test]
    fn watcher_rescan_replaces_snapshot() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub)?;
        File::create(sub.join("inner.txt"))?;

        let snapshot: SharedSnapshot = Arc::new(Mutex::new(DirSnapshot::default()));
        let render = Arc::new(RenderScheduler::new());
        render.take_dirty();
        let (fatal_tx, fatal_rx) = unbounded();
        let mut quit = QuitSignal::new();

        let mut watcher = DirWatcher::spawn(
            tmp.path().to_path_buf(),
            true,
            Arc::clone(&snapshot),
            Arc::clone(&render),
            fatal_tx,
            quit.listener(),
        );
        watcher.rescan(sub.clone());

        render.refresh_rx().recv_timeout(Duration::from_secs(2))?;
        {
            let guard = snapshot.lock().map_err(|_| "poisoned")?;
            assert_eq!(guard.dir(), sub.as_path());
            assert_eq!(guard.entries().len(), 1);
            assert_eq!(guard.entries()[0].name_str(), "inner.txt");
        }
        assert!(render.is_dirty());
        assert!(fatal_rx.try_recv().is_err());

        quit.trigger();
        watcher.join();
        Ok(())
    }

    #[test]
    fn watcher_reports_unreadable_directory() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        let gone = tmp.path().join("gone");

        let snapshot: SharedSnapshot = Arc::new(Mutex::new(DirSnapshot::default()));
        let (fatal_tx, fatal_rx) = unbounded();
        let quit = QuitSignal::new();

        let mut watcher = DirWatcher::spawn(
            tmp.path().to_path_buf(),
            true,
            snapshot,
            Arc::new(RenderScheduler::new()),
            fatal_tx,
            quit.listener(),
        );
        watcher.rescan(gone);

        let err = fatal_rx.recv_timeout(Duration::from_secs(2))?;
        assert!(format!("{err:#}").contains("gone"));
        watcher.join();
        Ok(())
    }
}
