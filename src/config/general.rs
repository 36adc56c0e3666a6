//! The general options for fe.
//!
//! This module defines the [Options] struct deserialized from the `[options]` table of the
//! config file and the resolved [InternalOptions] used at runtime. Every raw field is optional,
//! an unset field keeps the internal default.

use serde::Deserialize;
use std::time::Duration;

/// Default key sequence window in milliseconds.
pub const DEFAULT_KEYBIND_DURATION_MS: u64 = 600;

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Options {
    show_hidden: Option<bool>,
    keybind_duration: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InternalOptions {
    show_hidden: bool,
    keybind_duration: Duration,
}

impl Default for InternalOptions {
    fn default() -> Self {
        Self {
            show_hidden: true,
            keybind_duration: Duration::from_millis(DEFAULT_KEYBIND_DURATION_MS),
        }
    }
}

impl From<Options> for InternalOptions {
    fn from(raw: Options) -> Self {
        let defaults = Self::default();
        Self {
            show_hidden: raw.show_hidden.unwrap_or(defaults.show_hidden),
            // a zero window could never complete a sequence
            keybind_duration: raw
                .keybind_duration
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.keybind_duration),
        }
    }
}

impl InternalOptions {
    #[inline]
    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    /// How long a partial key sequence waits for its next key.
    #[inline]
    pub fn keybind_duration(&self) -> Duration {
        self.keybind_duration
    }
}
