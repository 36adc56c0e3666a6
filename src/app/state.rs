//! Session state and the dispatch point for fe.
//!
//! [AppState] is the single record of the browsing session. The dispatch loop owns it and is the
//! only code that reads and writes the working directory, the selection and the key sequence, so
//! those fields need no locking. Two fields are written from other threads and sit behind their
//! own locks:
//! - the directory snapshot, replaced by the directory watcher.
//! - the status message, cleared by its expiry timer.
//!
//! The dirty flag lives in the shared [RenderScheduler]; any mutation sets it and only the render
//! step clears it.

use crate::app::keymap::{KeySequence, Resolution, TimerEvent, key_token};
use crate::app::message::{ERROR_MESSAGE_DURATION, SEQUENCE_MESSAGE_DURATION, StatusLine};
use crate::config::Config;
use crate::core::fm::{DirSnapshot, FileEntry, SharedSnapshot, browse_dir};
use crate::core::redraw::RenderScheduler;
use crate::core::worker::{DirWatcher, QuitSignal};

use anyhow::Context;
use crossbeam_channel::{Receiver, unbounded};
use crossterm::event::KeyEvent;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub struct AppState<'a> {
    pub(super) config: &'a Config,

    pub(super) working_dir: PathBuf,
    pub(super) selected: usize,
    pub(super) scroll: usize,
    pub(super) sequence: KeySequence,

    pub(super) snapshot: SharedSnapshot,
    pub(super) status: Arc<StatusLine>,
    pub(super) render: Arc<RenderScheduler>,

    pub(super) watcher: DirWatcher,
    pub(super) timer_rx: Receiver<TimerEvent>,
    pub(super) fatal_rx: Receiver<anyhow::Error>,
    pub(super) quit: QuitSignal,
    pub(super) exit_cd: Option<PathBuf>,
    pub(super) ended_by_quit: bool,
}

impl<'a> AppState<'a> {
    /// Lists `dir` once and starts the directory watcher on it.
    ///
    /// Fails if the directory cannot be listed.
    pub fn new(config: &'a Config, dir: &Path) -> anyhow::Result<Self> {
        let working_dir = std::path::absolute(dir).context("getting absolute path")?;
        let show_hidden = config.options().show_hidden();

        let entries = browse_dir(&working_dir, show_hidden)
            .with_context(|| format!("initializing contents of `{}`", working_dir.display()))?;
        let snapshot: SharedSnapshot =
            Arc::new(Mutex::new(DirSnapshot::new(working_dir.clone(), entries)));

        let render = Arc::new(RenderScheduler::new());
        let status = StatusLine::new(Arc::clone(&render));
        let quit = QuitSignal::new();
        let (timer_tx, timer_rx) = unbounded();
        let (fatal_tx, fatal_rx) = unbounded();

        let watcher = DirWatcher::spawn(
            working_dir.clone(),
            show_hidden,
            Arc::clone(&snapshot),
            Arc::clone(&render),
            fatal_tx,
            quit.listener(),
        );

        if let Some(first) = config.diagnostics().first() {
            let more = config.diagnostics().len() - 1;
            let msg = if more > 0 {
                format!("config: {first} (+{more} more)")
            } else {
                format!("config: {first}")
            };
            status.set(msg, ERROR_MESSAGE_DURATION);
        }

        log::info!("session started in {}", working_dir.display());

        Ok(Self {
            config,
            working_dir,
            selected: 0,
            scroll: 0,
            sequence: KeySequence::new(config.options().keybind_duration(), timer_tx),
            snapshot,
            status,
            render,
            watcher,
            timer_rx,
            fatal_rx,
            quit,
            exit_cd: None,
            ended_by_quit: false,
        })
    }

    // Getters/ accessors

    #[inline]
    pub fn config(&self) -> &Config {
        self.config
    }

    #[inline]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The selection clamped to the current listing, `0` when it is empty.
    pub fn selected_idx(&self) -> usize {
        self.selected.min(self.entry_count().saturating_sub(1))
    }

    pub fn status_text(&self) -> String {
        self.status.text()
    }

    pub fn key_sequence(&self) -> &[String] {
        self.sequence.tokens()
    }

    /// Whether the quit signal went out, either from a quit action or from [AppState::shutdown].
    #[inline]
    pub fn is_quitting(&self) -> bool {
        self.quit.is_triggered()
    }

    /// Whether `#quit` or `#quit_cd` ended the session.
    #[inline]
    pub fn ended_by_quit(&self) -> bool {
        self.ended_by_quit
    }

    /// Directory to `cd` into after the terminal is released, set by `#quit_cd`.
    #[inline]
    pub fn exit_cd(&self) -> Option<&Path> {
        self.exit_cd.as_deref()
    }

    #[inline]
    pub(crate) fn timer_rx(&self) -> &Receiver<TimerEvent> {
        &self.timer_rx
    }

    #[inline]
    pub(crate) fn fatal_rx(&self) -> &Receiver<anyhow::Error> {
        &self.fatal_rx
    }

    #[inline]
    pub(crate) fn refresh_rx(&self) -> &Receiver<()> {
        self.render.refresh_rx()
    }

    pub(crate) fn quit_listener(&self) -> Receiver<()> {
        self.quit.listener()
    }

    // Render scheduling

    /// Reads and clears the dirty flag. Only the render step calls this.
    pub fn take_dirty(&self) -> bool {
        self.render.take_dirty()
    }

    pub fn is_dirty(&self) -> bool {
        self.render.is_dirty()
    }

    pub(crate) fn mark_dirty(&self) {
        self.render.mark_dirty();
    }

    #[inline]
    pub(crate) fn scroll(&self) -> usize {
        self.scroll
    }

    #[inline]
    pub(crate) fn set_scroll(&mut self, offset: usize) {
        self.scroll = offset;
    }

    // Entry functions

    fn lock_snapshot(&self) -> MutexGuard<'_, DirSnapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the entries of the working directory while holding the snapshot lock.
    ///
    /// A snapshot that still lists the previous directory reads as empty.
    pub fn with_entries<R>(&self, f: impl FnOnce(&[FileEntry]) -> R) -> R {
        let guard = self.lock_snapshot();
        f(guard.entries_for(&self.working_dir))
    }

    pub fn entry_count(&self) -> usize {
        self.with_entries(<[FileEntry]>::len)
    }

    pub(crate) fn selected_entry_name(&self) -> Option<OsString> {
        let idx = self.selected_idx();
        self.with_entries(|entries| entries.get(idx).map(|e| e.name().to_os_string()))
    }

    // Dispatch

    /// Resolves one key press and runs whatever it triggers.
    pub fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<()> {
        let Some(token) = key_token(&key) else {
            return Ok(());
        };
        let config = self.config;

        match self.sequence.resolve(&token, config.keybinds()) {
            Resolution::Absolute(action) => {
                log::debug!("absolute `{token}` -> {action}");
                self.execute(action)?;
            }
            Resolution::Matched(action) => {
                log::debug!("sequence matched -> {action}");
                // drop the pending sequence; the action may set its own message
                self.status.clear();
                self.execute(action)?;
            }
            Resolution::Pending(typed) => {
                log::trace!("sequence pending `{typed}`");
                self.status.set(typed, SEQUENCE_MESSAGE_DURATION);
            }
        }
        Ok(())
    }

    /// Applies a timer message posted to the dispatch loop.
    pub fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::SequenceExpired { generation } => {
                if self.sequence.expire(generation) {
                    log::trace!("key sequence expired");
                }
            }
        }
    }

    /// Broadcasts quit and waits for the directory watcher to stop.
    pub fn shutdown(&mut self) {
        self.quit.trigger();
        self.watcher.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::actions::BuiltinAction;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};

    fn fixture() -> Result<TempDir, Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        fs::create_dir(tmp.path().join("docs"))?;
        File::create(tmp.path().join("README.md"))?;
        File::create(tmp.path().join("main.rs"))?;
        Ok(tmp)
    }

    fn index_of(app: &AppState, name: &str) -> Option<usize> {
        app.with_entries(|entries| entries.iter().position(|e| e.name() == name))
    }

    fn press(app: &mut AppState, code: KeyCode) -> anyhow::Result<()> {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn select_wraps_around_listing() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::default();
        let mut app = AppState::new(&config, tmp.path())?;
        assert_eq!(app.entry_count(), 3);

        app.dispatch(BuiltinAction::SelectUp)?;
        assert_eq!(app.selected_idx(), 2);
        app.dispatch(BuiltinAction::SelectDown)?;
        assert_eq!(app.selected_idx(), 0);

        app.shutdown();
        Ok(())
    }

    #[test]
    fn forwards_into_file_sets_message_only() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::default();
        let mut app = AppState::new(&config, tmp.path())?;

        app.selected = index_of(&app, "README.md").ok_or("README.md missing")?;
        let before = app.selected;
        app.dispatch(BuiltinAction::DirForwards)?;

        assert_eq!(app.working_dir(), std::path::absolute(tmp.path())?);
        assert_eq!(app.selected, before);
        assert!(app.status_text().contains("not a directory"));

        app.shutdown();
        Ok(())
    }

    #[test]
    fn forwards_and_backwards_change_directory() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        File::create(tmp.path().join("docs/guide.md"))?;
        let root = std::path::absolute(tmp.path())?;
        let config = Config::default();
        let mut app = AppState::new(&config, tmp.path())?;

        app.selected = index_of(&app, "docs").ok_or("docs missing")?;
        app.dispatch(BuiltinAction::DirForwards)?;
        assert_eq!(app.working_dir(), root.join("docs"));
        assert_eq!(app.selected, 0);

        // wait for the watcher to deliver the new listing
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while app.entry_count() != 1 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(index_of(&app, "guide.md"), Some(0));

        app.dispatch(BuiltinAction::DirBackwards)?;
        assert_eq!(app.working_dir(), root);
        assert_eq!(app.selected, 0);

        app.shutdown();
        Ok(())
    }

    #[test]
    fn forwards_into_vanished_entry_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::default();
        let mut app = AppState::new(&config, tmp.path())?;

        app.selected = index_of(&app, "docs").ok_or("docs missing")?;
        fs::remove_dir(tmp.path().join("docs"))?;

        let err = app.dispatch(BuiltinAction::DirForwards).unwrap_err();
        assert!(format!("{err:#}").contains("no such directory"));

        app.shutdown();
        Ok(())
    }

    #[test]
    fn clear_key_sequence_resets_buffer_and_message() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::from_toml_str("[keybinds]\n\"g+g\" = \"#select_up\"\n")?;
        let mut app = AppState::new(&config, tmp.path())?;

        press(&mut app, KeyCode::Char('g'))?;
        assert_eq!(app.key_sequence(), ["g"]);
        assert_eq!(app.status_text(), "g");

        press(&mut app, KeyCode::Esc)?;
        assert!(app.key_sequence().is_empty());
        assert_eq!(app.status_text(), "");

        app.shutdown();
        Ok(())
    }

    #[test]
    fn shutdown_alone_is_not_a_quit_action() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::default();
        let mut app = AppState::new(&config, tmp.path())?;

        app.shutdown();
        assert!(app.is_quitting());
        assert!(!app.ended_by_quit());
        assert_eq!(app.exit_cd(), None);
        Ok(())
    }

    #[test]
    fn matched_sequence_clears_pending_message() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::from_toml_str("[keybinds]\n\"g+g\" = \"#select_down\"\n")?;
        let mut app = AppState::new(&config, tmp.path())?;

        press(&mut app, KeyCode::Char('g'))?;
        assert_eq!(app.status_text(), "g");
        press(&mut app, KeyCode::Char('g'))?;

        assert!(app.key_sequence().is_empty());
        assert_eq!(app.status_text(), "");
        assert_eq!(app.selected_idx(), 1);

        app.shutdown();
        Ok(())
    }

    #[test]
    fn matched_action_keeps_its_own_message() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::from_toml_str("[keybinds]\n\"g+x\" = \"fe-no-such-program\"\n")?;
        let mut app = AppState::new(&config, tmp.path())?;

        press(&mut app, KeyCode::Char('g'))?;
        press(&mut app, KeyCode::Char('x'))?;
        assert!(app.status_text().contains("command not found"));

        app.shutdown();
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn selected_name_with_space_is_one_argument() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        File::create(tmp.path().join("my file.txt"))?;
        let config = Config::default();
        let mut app = AppState::new(&config, tmp.path())?;

        let out = app.execute("ls %(working_dir)s/%(selected_dir)s")?;
        let expected = std::path::absolute(tmp.path())?.join("my file.txt");
        assert_eq!(out.trim_end(), expected.display().to_string());
        assert_eq!(app.status_text(), "");

        app.shutdown();
        Ok(())
    }

    #[test]
    fn quit_cd_records_absolute_directory() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::default();
        let mut app = AppState::new(&config, tmp.path())?;

        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL))?;
        assert!(app.is_quitting());
        assert!(app.ended_by_quit());
        assert_eq!(app.exit_cd(), Some(std::path::absolute(tmp.path())?.as_path()));

        app.shutdown();
        Ok(())
    }

    #[test]
    fn command_then_tags_run_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::default();
        let mut app = AppState::new(&config, tmp.path())?;

        // unknown program: non-fatal, tags still run afterwards
        let out = app.execute("fe-no-such-program %(selected_dir)s #select_down #select_down")?;
        assert!(out.is_empty());
        assert!(app.status_text().contains("command not found"));
        assert_eq!(app.selected_idx(), 2);

        app.shutdown();
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn command_output_is_returned() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::default();
        let mut app = AppState::new(&config, tmp.path())?;

        let out = app.execute("echo %(working_dir)s")?;
        assert_eq!(
            out.trim_end(),
            std::path::absolute(tmp.path())?.display().to_string()
        );

        app.shutdown();
        Ok(())
    }

    #[test]
    fn empty_action_is_fatal_and_bad_template_is_not() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::default();
        let mut app = AppState::new(&config, tmp.path())?;

        assert!(app.execute("   ").is_err());

        let out = app.execute("open %(nowhere)s #quit")?;
        assert!(out.is_empty());
        assert!(!app.is_quitting());
        assert!(app.status_text().contains("nowhere"));

        assert!(app.execute("#no_such_builtin").is_err());

        app.shutdown();
        Ok(())
    }

    #[test]
    fn stale_timer_does_not_clear_fresh_sequence() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::from_toml_str(
            "[options]\nkeybind_duration = 40\n[keybinds]\n\"a+b+c\" = \"#select_down\"\n",
        )?;
        let mut app = AppState::new(&config, tmp.path())?;

        press(&mut app, KeyCode::Char('a'))?;
        let expired = app.timer_rx().recv_timeout(Duration::from_secs(2))?;
        press(&mut app, KeyCode::Char('b'))?;

        // the expiry for "a" arrives after "b" extended the sequence
        app.handle_timer(expired);
        assert_eq!(app.key_sequence(), ["a", "b"]);

        app.shutdown();
        Ok(())
    }

    #[test]
    fn diagnostics_show_as_first_message() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = fixture()?;
        let config = Config::from_toml_str("[keybinds]\nx = \"#warp\"\n")?;
        let mut app = AppState::new(&config, tmp.path())?;
        assert!(app.status_text().contains("#warp"));
        app.shutdown();
        Ok(())
    }
}
