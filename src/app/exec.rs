//! Keybind command execution.
//!
//! An action string is formatted against the session data, the remaining words (if any) run as
//! an external command with each substituted value kept as a single argument, and the builtin
//! tags found in the string are dispatched afterwards in the order they were written. The
//! dispatch loop blocks while the command runs.

use crate::app::actions::BuiltinAction;
use crate::app::message::ERROR_MESSAGE_DURATION;
use crate::app::state::AppState;
use crate::core::formatter::{SELECTED_DIR, WORKING_DIR, named_format};
use crate::core::proc::run_command;

use anyhow::{Context, anyhow, bail};
use std::collections::HashMap;

impl AppState<'_> {
    /// Data available to `%(name)s` placeholders.
    pub(crate) fn format_data(&self) -> HashMap<&'static str, String> {
        let selected = self
            .selected_entry_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        HashMap::from([
            (WORKING_DIR, self.working_dir.display().to_string()),
            (SELECTED_DIR, selected),
        ])
    }

    /// Runs a keybind action and returns whatever the external command printed.
    ///
    /// Command failures and template errors become a status message. An empty action or a tag
    /// that names no builtin action is fatal.
    pub fn execute(&mut self, action: &str) -> anyhow::Result<String> {
        if action.split_whitespace().next().is_none() {
            bail!("executing formatted shell command: empty command");
        }

        let formatted = match named_format(action, &self.format_data()) {
            Ok(formatted) => formatted,
            Err(e) => {
                log::warn!("cannot format `{action}`: {e}");
                self.status
                    .set(format!("cannot format `{action}`: {e}"), ERROR_MESSAGE_DURATION);
                return Ok(String::new());
            }
        };

        let mut output = String::new();
        if let Some((program, rest)) = formatted.args.split_first() {
            let args: Vec<&str> = rest.iter().map(String::as_str).collect();
            log::debug!("running {program} {args:?}");
            match run_command(program, &args) {
                Ok(out) if out.success() => output = out.into_output(),
                Ok(out) => {
                    log::info!("command failed: {out}");
                    self.status.set(out.to_string(), ERROR_MESSAGE_DURATION);
                    output = out.into_output();
                }
                Err(e) => {
                    log::info!("command failed: {e}");
                    self.status.set(e.to_string(), ERROR_MESSAGE_DURATION);
                }
            }
        }

        for tag in &formatted.tags {
            if self.quit.is_triggered() {
                log::debug!("session quitting, skipping #{tag}");
                break;
            }
            let builtin = BuiltinAction::from_tag(tag)
                .ok_or_else(|| anyhow!("action `{tag}` does not exist"))
                .context("executing builtin keybind")?;
            self.dispatch(builtin)?;
        }

        Ok(output)
    }
}
