//! Terminal UI for fe.
//!
//! [render] draws one frame from the [AppState](crate::app::AppState). It is only called by the
//! dispatch loop, and only when the session is dirty.

pub mod render;

pub use render::{clip_to_width, render, scroll_offset};
