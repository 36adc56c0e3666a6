//! Keybind configuration for fe.
//!
//! Two tables map keys to action strings:
//! - `[keybinds]`: key sequences such as `up` or `g+g`, resolved after debounced accumulation.
//! - `[absolute_keybinds]`: single keys that fire immediately and bypass accumulation.
//!
//! User tables are merged over the defaults key by key. Every action is checked once here: tags
//! must name a builtin action and placeholders must name data the session provides. Bindings
//! that fail the check are dropped with a diagnostic instead of failing at keypress time.

use crate::app::actions::BuiltinAction;
use crate::core::formatter::{DATA_KEYS, extract_tags, placeholders};

use std::collections::HashMap;

pub type RawKeybinds = HashMap<String, String>;

pub(crate) fn default_keybinds() -> RawKeybinds {
    [
        ("up", "#select_up"),
        ("down", "#select_down"),
        ("left", "#dir_backwards"),
        ("right", "#dir_forwards"),
        ("ctrl+s", "#quit_cd"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub(crate) fn default_absolute_keybinds() -> RawKeybinds {
    [("q", "#quit"), ("esc", "#clear_key_sequence")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Overlays `user` on `defaults`. Keys are lowercased to match key tokens.
pub(crate) fn merge_keybinds(defaults: RawKeybinds, user: RawKeybinds) -> RawKeybinds {
    let mut merged: RawKeybinds = defaults
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect();
    for (key, action) in user {
        merged.insert(key.to_lowercase(), action);
    }
    merged
}

/// Checks an action string, returning a description of the first problem found.
pub fn validate_action(action: &str) -> Result<(), String> {
    let (_, tags) = extract_tags(action);
    if let Some(tag) = tags.iter().find(|t| BuiltinAction::from_tag(t).is_none()) {
        return Err(format!("unknown action `#{tag}`"));
    }

    let names = placeholders(action).map_err(|e| e.to_string())?;
    if let Some(name) = names.iter().find(|n| !DATA_KEYS.contains(&n.as_str())) {
        return Err(format!("unknown placeholder `%({name})`"));
    }
    Ok(())
}

/// Resolved keybind tables.
#[derive(Debug, Clone, Default)]
pub struct Keybinds {
    sequence: HashMap<String, String>,
    absolute: HashMap<String, String>,
}

impl Keybinds {
    /// Validates both merged tables. Empty actions mean "unbound" and are dropped silently,
    /// invalid ones are dropped and described in `diagnostics`.
    pub fn compile(
        sequence: RawKeybinds,
        absolute: RawKeybinds,
        diagnostics: &mut Vec<String>,
    ) -> Self {
        let mut keep = |table: &str, raw: RawKeybinds| -> HashMap<String, String> {
            let mut out = HashMap::with_capacity(raw.len());
            for (key, action) in raw {
                if action.trim().is_empty() {
                    continue;
                }
                match validate_action(&action) {
                    Ok(()) => {
                        out.insert(key, action);
                    }
                    Err(problem) => {
                        let msg = format!("{table} `{key}`: {problem}");
                        log::warn!("dropping keybind: {msg}");
                        diagnostics.push(msg);
                    }
                }
            }
            out
        };

        let sequence = keep("keybind", sequence);
        let absolute = keep("absolute keybind", absolute);
        diagnostics.sort();

        Self { sequence, absolute }
    }

    /// Action bound to a single key token, if any.
    #[inline]
    pub fn absolute(&self, token: &str) -> Option<&str> {
        self.absolute.get(token).map(String::as_str)
    }

    /// Action bound to a `+`-joined key sequence, if any.
    #[inline]
    pub fn sequence(&self, keys: &str) -> Option<&str> {
        self.sequence.get(keys).map(String::as_str)
    }

    /// Sequence binds sorted by key.
    pub fn sorted_sequence(&self) -> Vec<(&str, &str)> {
        sorted(&self.sequence)
    }

    /// Absolute binds sorted by key.
    pub fn sorted_absolute(&self) -> Vec<(&str, &str)> {
        sorted(&self.absolute)
    }
}

fn sorted(map: &HashMap<String, String>) -> Vec<(&str, &str)> {
    let mut pairs: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    pairs.sort_unstable();
    pairs
}
