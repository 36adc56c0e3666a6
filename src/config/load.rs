//! The main config loading module for fe.
//!
//! Handles loading and deserializing settings from `config.toml`.
//!
//! The file is parsed into [RawConfig], whose fields are all optional, and then merged field by
//! field over the internal defaults into the resolved [Config]. A missing file simply yields the
//! defaults; a file that exists but cannot be read or parsed is an error.

use crate::config::general::{InternalOptions, Options};
use crate::config::input::{
    Keybinds, RawKeybinds, default_absolute_keybinds, default_keybinds, merge_keybinds,
};
use crate::utils::get_home;

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{fs, io};

/// Configuration as read from the toml file.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct RawConfig {
    options: Options,
    keybinds: RawKeybinds,
    absolute_keybinds: RawKeybinds,
}

/// Resolved configuration. Read-only for the whole session.
#[derive(Debug, Clone)]
pub struct Config {
    options: InternalOptions,
    keybinds: Keybinds,
    diagnostics: Vec<String>,
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        let mut diagnostics = Vec::new();
        let keybinds = Keybinds::compile(
            merge_keybinds(default_keybinds(), raw.keybinds),
            merge_keybinds(default_absolute_keybinds(), raw.absolute_keybinds),
            &mut diagnostics,
        );
        Self {
            options: raw.options.into(),
            keybinds,
            diagnostics,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

impl Config {
    /// Loads the config at `path`, or the defaults when no file exists there.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        log::info!("loading config from {}", path.display());
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        Ok(raw.into())
    }

    // Getters

    #[inline]
    pub fn options(&self) -> &InternalOptions {
        &self.options
    }

    #[inline]
    pub fn keybinds(&self) -> &Keybinds {
        &self.keybinds
    }

    /// Problems found while resolving the keybind tables.
    #[inline]
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Determine the default configuration file path.
    /// Checks the FE_CONFIG environment variable first,
    /// Checks for XDG_CONFIG_HOME after,
    /// then defaults to ~/.config/fe/config.toml,
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("FE_CONFIG") {
            return PathBuf::from(path);
        }

        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg_config).join("fe/config.toml");
        }

        if let Some(home) = get_home() {
            return home.join(".config/fe/config.toml");
        }
        PathBuf::from("config.toml")
    }

    /// Generate a default configuration file at the specified path.
    /// If the file already exists, returns an error.
    pub fn generate_default(path: &Path) -> io::Result<()> {
        if path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Config file already exists at {:?}", path),
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG)?;
        println!("Default config generated at {:?}", path);
        Ok(())
    }
}

pub(crate) const DEFAULT_CONFIG: &str = r##"# config.toml - default configuration for fe
#
# Actions are shell-free command templates:
#   %(working_dir)s   the current directory
#   %(selected_dir)s  the name of the selected entry
#   %%                a literal percent sign
#   #tag              a builtin action, run after the command in the order written
#
# Builtin actions: #select_up #select_down #dir_forwards #dir_backwards
#                  #clear_key_sequence #quit #quit_cd
#
# An empty action ("") unbinds a default key.

[options]
show_hidden = true
# how long a partial key sequence waits for the next key, in ms
keybind_duration = 600

# Fire after the key sequence is typed. Join keys with "+", e.g. "g+g".
[keybinds]
up = "#select_up"
down = "#select_down"
left = "#dir_backwards"
right = "#dir_forwards"
"ctrl+s" = "#quit_cd"
# "t+f" = "touch %(working_dir)s/new_file"

# Fire on a single key and skip sequence accumulation.
[absolute_keybinds]
q = "#quit"
esc = "#clear_key_sequence"
"##;
