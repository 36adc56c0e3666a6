//! Command-line argument parsing for fe.
//!
//! When invoked with no args (`fe`), fe browses the current directory with the config found at
//! [Config::default_path].

use crate::config::Config;

use clap::Parser;
use simplelog::LevelFilter;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "fe",
    version,
    about = "A small keyboard-driven terminal file browser"
)]
pub struct Args {
    /// Directory to start in (defaults to the current directory)
    pub path: Option<String>,

    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write a debug log to FILE
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Log verbosity when --log is given
    #[arg(long, value_name = "LEVEL", default_value = "debug")]
    pub log_level: LevelFilter,

    /// Write the default config file and exit
    #[arg(long)]
    pub init: bool,

    /// Print the resolved keybinds and exit
    #[arg(long)]
    pub keybinds: bool,
}

impl Args {
    /// The config file this run reads.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}

/// Prints both keybind tables of the resolved config, one bind per line.
pub fn print_keybinds(config: &Config) {
    println!("Keybinds (sequence):");
    for (keys, action) in config.keybinds().sorted_sequence() {
        println!("  {keys:<16} {action}");
    }
    println!();
    println!("Absolute keybinds:");
    for (key, action) in config.keybinds().sorted_absolute() {
        println!("  {key:<16} {action}");
    }
    for diagnostic in config.diagnostics() {
        eprintln!("warning: {diagnostic}");
    }
}

/// The line printed on `#quit_cd`, for a shell wrapper to `eval`.
///
/// The path is double-quoted with `"`, `\`, `$` and `` ` `` escaped, so the shell takes it as
/// one literal word.
pub fn cd_line(dir: &Path) -> String {
    let path = dir.to_string_lossy();
    let mut line = String::with_capacity(path.len() + 5);
    line.push_str("cd \"");
    for c in path.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            line.push('\\');
        }
        line.push(c);
    }
    line.push('"');
    line
}
