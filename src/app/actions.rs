//! Builtin actions and their dispatcher.
//!
//! [BuiltinAction] is the closed set of state mutations a keybind can name with a `#tag`.
//! Tags are decoded through a static map when the config is loaded, so an unknown name is a
//! config diagnostic rather than a surprise at keypress time.
//!
//! Every action except the quit variants ends by marking the session dirty and requesting a
//! redraw.

use crate::app::message::HINT_MESSAGE_DURATION;
use crate::app::state::AppState;

use anyhow::{Context, anyhow};
use phf::phf_map;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BuiltinAction {
    SelectUp,
    SelectDown,
    DirForwards,
    DirBackwards,
    ClearKeySequence,
    Quit,
    QuitCd,
}

static BUILTIN_TAGS: phf::Map<&'static str, BuiltinAction> = phf_map! {
    "select_up" => BuiltinAction::SelectUp,
    "select_down" => BuiltinAction::SelectDown,
    "dir_forwards" => BuiltinAction::DirForwards,
    "dir_backwards" => BuiltinAction::DirBackwards,
    "clear_key_sequence" => BuiltinAction::ClearKeySequence,
    "quit" => BuiltinAction::Quit,
    "quit_cd" => BuiltinAction::QuitCd,
};

impl BuiltinAction {
    /// Decodes a tag name (without the leading `#`).
    #[inline]
    pub fn from_tag(tag: &str) -> Option<Self> {
        BUILTIN_TAGS.get(tag).copied()
    }

    pub fn tag(self) -> &'static str {
        match self {
            BuiltinAction::SelectUp => "select_up",
            BuiltinAction::SelectDown => "select_down",
            BuiltinAction::DirForwards => "dir_forwards",
            BuiltinAction::DirBackwards => "dir_backwards",
            BuiltinAction::ClearKeySequence => "clear_key_sequence",
            BuiltinAction::Quit => "quit",
            BuiltinAction::QuitCd => "quit_cd",
        }
    }
}

impl fmt::Display for BuiltinAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.tag())
    }
}

/// Index above `idx` in a list of `len`, wrapping to the last entry.
pub(crate) fn wrap_up(idx: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    match idx.min(len - 1) {
        0 => len - 1,
        i => i - 1,
    }
}

/// Index below `idx` in a list of `len`, wrapping to the first entry.
pub(crate) fn wrap_down(idx: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let i = idx.min(len - 1);
    if i == len - 1 { 0 } else { i + 1 }
}

impl AppState<'_> {
    /// Applies a builtin action to the session.
    ///
    /// Fails only on the fatal paths: a vanished or unreadable target directory, or a working
    /// directory that cannot be made absolute.
    pub fn dispatch(&mut self, action: BuiltinAction) -> anyhow::Result<()> {
        log::debug!("dispatch {action}");
        match action {
            BuiltinAction::SelectUp => {
                self.selected = wrap_up(self.selected, self.entry_count());
                self.render.request();
            }
            BuiltinAction::SelectDown => {
                self.selected = wrap_down(self.selected, self.entry_count());
                self.render.request();
            }
            BuiltinAction::DirForwards => self.dir_forwards()?,
            BuiltinAction::DirBackwards => {
                let parent = self
                    .working_dir
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.working_dir.clone());
                self.change_dir(parent);
            }
            BuiltinAction::ClearKeySequence => {
                self.sequence.clear();
                self.status.clear();
                self.render.request();
            }
            BuiltinAction::Quit => {
                self.ended_by_quit = true;
                self.quit.trigger();
            }
            BuiltinAction::QuitCd => {
                let abs = std::path::absolute(&self.working_dir).context("getting absolute path")?;
                self.ended_by_quit = true;
                self.quit.trigger();
                self.exit_cd = Some(abs);
            }
        }
        Ok(())
    }

    fn dir_forwards(&mut self) -> anyhow::Result<()> {
        let Some(name) = self.selected_entry_name() else {
            self.status.set("nothing selected", HINT_MESSAGE_DURATION);
            return Ok(());
        };
        let target = self.working_dir.join(name);

        let metadata = match fs::metadata(&target) {
            Ok(md) => md,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(anyhow!("no such directory: `{}`", target.display()))
                    .context("selecting the new directory");
            }
            Err(e) => return Err(e).context("selecting the new directory"),
        };

        if !metadata.is_dir() {
            self.status.set("not a directory", HINT_MESSAGE_DURATION);
            return Ok(());
        }
        self.change_dir(target);
        Ok(())
    }

    /// Moves the session to `dir`, resets the selection and asks the watcher to list it.
    fn change_dir(&mut self, dir: PathBuf) {
        log::info!("working dir -> {}", dir.display());
        self.working_dir = dir.clone();
        self.selected = 0;
        self.scroll = 0;
        self.watcher.rescan(dir);
        self.render.request();
    }
}
