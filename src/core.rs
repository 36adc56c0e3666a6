//! Core runtime logic for fe.
//!
//! This module contains the non-UI “engine” pieces used by the application:
//! - [fm]: directory listing and the shared directory snapshot.
//! - [formatter]: `%(name)s` templates and `#tag` extraction for keybind actions.
//! - [proc]: running the external command of a keybind action.
//! - [worker]: the directory watcher, the event poller and the quit signal.
//! - [timer]: cancellable one-shot timers.
//! - [redraw]: the dirty flag and coalesced redraw requests.
//! - [terminal]: terminal setup/teardown and the dispatch loop.

pub mod fm;
pub mod formatter;
pub mod proc;
pub(crate) mod redraw;
pub mod terminal;
pub(crate) mod timer;
pub mod worker;

pub use fm::{DirSnapshot, FileEntry, browse_dir};
pub use formatter::{FormatError, Formatted, named_format};
pub use proc::{CommandOutput, run_command};
pub use worker::{CrosstermSource, EventSource, Polled, QuitSignal};
