//! Key sequence resolution for fe.
//!
//! Turns key events into tokens and resolves them against the keybind tables:
//! 1. A token with a non-empty absolute bind fires that action at once. The pending sequence and
//!    its debounce timer are left alone.
//! 2. Otherwise the token is appended to the sequence and the debounce timer is rearmed.
//! 3. The `+`-joined sequence is looked up in the sequence table. A hit clears the sequence and
//!    fires the action, a miss leaves it pending.
//!
//! When the debounce timer fires it only posts a [TimerEvent] to the dispatch loop, which clears
//! the sequence if nothing was typed since.

use crate::config::Keybinds;
use crate::core::timer::TimerSlot;

use crossbeam_channel::Sender;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

/// Messages posted to the dispatch loop by timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    SequenceExpired { generation: u64 },
}

/// Normalizes a key event into a lowercase token such as `j`, `ctrl+s` or `pgdn`.
///
/// Returns `None` for keys that have no name.
pub fn key_token(key: &KeyEvent) -> Option<String> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    let (name, shift) = match key.code {
        // shift is already folded into the character
        KeyCode::Char(c) => (c.to_lowercase().collect::<String>(), false),
        KeyCode::Up => ("up".into(), shift),
        KeyCode::Down => ("down".into(), shift),
        KeyCode::Left => ("left".into(), shift),
        KeyCode::Right => ("right".into(), shift),
        KeyCode::Enter => ("enter".into(), shift),
        KeyCode::Esc => ("esc".into(), shift),
        KeyCode::Backspace => ("backspace".into(), shift),
        KeyCode::Tab => ("tab".into(), shift),
        KeyCode::BackTab => ("backtab".into(), false),
        KeyCode::Delete => ("delete".into(), shift),
        KeyCode::Insert => ("insert".into(), shift),
        KeyCode::Home => ("home".into(), shift),
        KeyCode::End => ("end".into(), shift),
        KeyCode::PageUp => ("pgup".into(), shift),
        KeyCode::PageDown => ("pgdn".into(), shift),
        KeyCode::F(n) => (format!("f{n}"), shift),
        _ => return None,
    };

    let mut token = String::with_capacity(name.len() + 12);
    if ctrl {
        token.push_str("ctrl+");
    }
    if alt {
        token.push_str("alt+");
    }
    if shift {
        token.push_str("shift+");
    }
    token.push_str(&name);
    Some(token)
}

/// What a single token resolved to.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution<'k> {
    /// An absolute bind fired.
    Absolute(&'k str),
    /// The accumulated sequence completed a sequence bind.
    Matched(&'k str),
    /// No bind yet. Carries the sequence typed so far for display.
    Pending(String),
}

/// The key sequence buffer and its debounce timer.
pub(crate) struct KeySequence {
    tokens: Vec<String>,
    generation: u64,
    timeout: Duration,
    debounce: TimerSlot,
    expired_tx: Sender<TimerEvent>,
}

impl KeySequence {
    pub(crate) fn new(timeout: Duration, expired_tx: Sender<TimerEvent>) -> Self {
        Self {
            tokens: Vec::new(),
            generation: 0,
            timeout,
            debounce: TimerSlot::default(),
            expired_tx,
        }
    }

    pub(crate) fn resolve<'k>(&mut self, token: &str, keys: &'k Keybinds) -> Resolution<'k> {
        if let Some(action) = keys.absolute(token).filter(|a| !a.is_empty()) {
            return Resolution::Absolute(action);
        }

        self.tokens.push(token.to_string());
        self.arm();

        let joined = self.joined();
        match keys.sequence(&joined) {
            Some(action) => {
                self.clear();
                Resolution::Matched(action)
            }
            None => Resolution::Pending(joined),
        }
    }

    fn arm(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let tx = self.expired_tx.clone();
        self.debounce.arm(self.timeout, move || {
            let _ = tx.send(TimerEvent::SequenceExpired { generation });
        });
    }

    /// Empties the buffer and cancels the debounce timer.
    pub(crate) fn clear(&mut self) {
        self.tokens.clear();
        self.debounce.cancel();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Handles a debounce expiry. Returns whether the buffer was cleared.
    pub(crate) fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.tokens.is_empty() {
            return false;
        }
        self.tokens.clear();
        true
    }

    pub(crate) fn joined(&self) -> String {
        self.tokens.join("+")
    }

    #[inline]
    pub(crate) fn tokens(&self) -> &[String] {
        &self.tokens
    }
}
