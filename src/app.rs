//! Application state and input handling for fe.
//!
//! - [state]: [AppState], the session record owned by the dispatch loop.
//! - [keymap]: key tokens and the multi-key sequence buffer.
//! - [exec]: running a keybind action, external command first, builtin tags after.
//! - [actions]: the builtin actions a `#tag` can name.
//! - [message]: the self-expiring status message.

pub mod actions;
pub mod exec;
pub mod keymap;
pub(crate) mod message;
pub mod state;

pub use actions::BuiltinAction;
pub use keymap::{Resolution, TimerEvent, key_token};
pub use state::AppState;
