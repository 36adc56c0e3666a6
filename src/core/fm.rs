//! Directory listing logic for fe.
//!
//! Provides the [FileEntry] struct, the [DirSnapshot] shared between the directory watcher and
//! the session, and the [browse_dir] function which produces both.

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A single entry of a directory listing.
///
/// Holds the name and a small flag set. Entries are never sorted or styled here, the snapshot
/// keeps the order the filesystem reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    name: Box<OsStr>,
    flags: u8,
}

impl FileEntry {
    pub(crate) const IS_DIR: u8 = 1 << 0;
    pub(crate) const IS_HIDDEN: u8 = 1 << 1;
    pub(crate) const IS_SYMLINK: u8 = 1 << 2;

    pub fn new(name: OsString, flags: u8) -> Self {
        FileEntry {
            name: name.into_boxed_os_str(),
            flags,
        }
    }

    #[inline]
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    #[inline]
    pub fn name_str(&self) -> Cow<'_, str> {
        self.name.to_string_lossy()
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.flags & Self::IS_DIR != 0
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.flags & Self::IS_HIDDEN != 0
    }

    #[inline]
    pub fn is_symlink(&self) -> bool {
        self.flags & Self::IS_SYMLINK != 0
    }
}

/// The last listing of a directory.
///
/// Replaced wholesale by the directory watcher, never edited in place. `dir` records which
/// directory the entries belong to so a listing that predates a navigation is never read as the
/// contents of the new working directory.
#[derive(Debug, Clone, Default)]
pub struct DirSnapshot {
    dir: PathBuf,
    entries: Vec<FileEntry>,
}

pub(crate) type SharedSnapshot = Arc<Mutex<DirSnapshot>>;

impl DirSnapshot {
    pub fn new(dir: PathBuf, entries: Vec<FileEntry>) -> Self {
        Self { dir, entries }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// The entries if this snapshot lists `dir`, otherwise an empty slice.
    pub fn entries_for(&self, dir: &Path) -> &[FileEntry] {
        if self.dir == dir { &self.entries } else { &[] }
    }
}

/// Reads the contents of the provided directory in filesystem order.
///
/// Dot-entries are skipped when `show_hidden` is false. Entries whose type cannot be read are
/// skipped as well. Symlinks are reported as directories when their target is one.
pub fn browse_dir(path: &Path, show_hidden: bool) -> io::Result<Vec<FileEntry>> {
    let mut entries = Vec::with_capacity(64);

    for entry in fs::read_dir(path)? {
        let Ok(entry) = entry else {
            continue;
        };
        let Ok(ft) = entry.file_type() else {
            continue;
        };

        let name = entry.file_name();
        let mut flags = 0u8;

        if name.to_string_lossy().starts_with('.') {
            if !show_hidden {
                continue;
            }
            flags |= FileEntry::IS_HIDDEN;
        }

        if ft.is_dir() {
            flags |= FileEntry::IS_DIR;
        }
        if ft.is_symlink() {
            flags |= FileEntry::IS_SYMLINK;
            if fs::metadata(entry.path()).is_ok_and(|md| md.is_dir()) {
                flags |= FileEntry::IS_DIR;
            }
        }

        entries.push(FileEntry::new(name, flags));
    }
    Ok(entries)
}
