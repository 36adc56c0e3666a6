//! Helpers for fe.
//!
//! Small utilities shared by the binary and the config layer:
//! - Locating the home directory and expanding a leading `~`
//! - Validating the starting directory before the terminal is acquired
//! - Setting up the file logger

use anyhow::{Context, bail};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Retrieves the user's home directory using the dirs crate.
pub fn get_home() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Expands a leading `~` or `~/` to the home directory. Other paths are returned unchanged.
pub fn expand_home_path(path: &str) -> PathBuf {
    if path == "~" {
        return get_home().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = get_home()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Resolves the directory the session starts in.
///
/// Defaults to the current directory. The result is canonical, so `..` and symlinks are
/// resolved before the session starts. Fails if the target is missing, is not a directory or
/// cannot be listed.
pub fn resolve_start_dir(arg: Option<&str>) -> anyhow::Result<PathBuf> {
    let dir = match arg {
        Some(arg) => expand_home_path(arg),
        None => std::env::current_dir().context("getting current directory")?,
    };

    let metadata =
        fs::metadata(&dir).with_context(|| format!("opening `{}`", dir.display()))?;
    if !metadata.is_dir() {
        bail!("`{}` is not a directory", dir.display());
    }
    fs::read_dir(&dir).with_context(|| format!("reading `{}`", dir.display()))?;

    fs::canonicalize(&dir).with_context(|| format!("resolving `{}`", dir.display()))
}

/// Starts writing log records to `path`, truncating it.
///
/// A TUI owns the terminal, so logging is off unless a file is given.
pub fn init_logging(path: &Path, level: LevelFilter) -> anyhow::Result<()> {
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let log_file =
        File::create(path).with_context(|| format!("creating log file `{}`", path.display()))?;
    WriteLogger::init(level, log_config, log_file).context("installing logger")?;
    Ok(())
}
