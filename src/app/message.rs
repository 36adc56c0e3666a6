//! Transient status message shown on the bottom row.
//!
//! The text is written by the dispatch loop and cleared by an expiry timer running on its own
//! thread, so it lives behind a mutex. Every [StatusLine::set] bumps a generation number and
//! rearms the expiry, an expiry carrying an older generation is ignored.

use crate::core::redraw::RenderScheduler;
use crate::core::timer::TimerSlot;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// How long a pending key sequence stays on screen.
pub(crate) const SEQUENCE_MESSAGE_DURATION: Duration = Duration::from_millis(800);
/// How long "not a directory" and similar hints stay on screen.
pub(crate) const HINT_MESSAGE_DURATION: Duration = Duration::from_millis(1500);
/// How long command and template errors stay on screen.
pub(crate) const ERROR_MESSAGE_DURATION: Duration = Duration::from_millis(2500);

#[derive(Default)]
struct MessageState {
    text: String,
    generation: u64,
    expiry: TimerSlot,
}

pub(crate) struct StatusLine {
    state: Mutex<MessageState>,
    render: Arc<RenderScheduler>,
}

impl StatusLine {
    pub(crate) fn new(render: Arc<RenderScheduler>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MessageState::default()),
            render,
        })
    }

    fn lock(&self) -> MutexGuard<'_, MessageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shows `msg` for `duration`, replacing and cancelling any previous message.
    pub(crate) fn set(self: &Arc<Self>, msg: impl Into<String>, duration: Duration) {
        let weak: Weak<Self> = Arc::downgrade(self);
        {
            let mut state = self.lock();
            state.generation = state.generation.wrapping_add(1);
            state.text = msg.into();

            let generation = state.generation;
            state.expiry.arm(duration, move || {
                if let Some(line) = weak.upgrade() {
                    line.expire(generation);
                }
            });
        }
        self.render.request();
    }

    /// Clears the message and cancels its pending expiry.
    pub(crate) fn clear(&self) {
        {
            let mut state = self.lock();
            state.generation = state.generation.wrapping_add(1);
            state.text.clear();
            state.expiry.cancel();
        }
        self.render.request();
    }

    fn expire(&self, generation: u64) {
        {
            let mut state = self.lock();
            if state.generation != generation {
                return;
            }
            state.text.clear();
        }
        self.render.request();
    }

    pub(crate) fn text(&self) -> String {
        self.lock().text.clone()
    }
}
