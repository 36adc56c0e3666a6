//! Configuration for fe.
//!
//! - [load]: reads `config.toml` and merges it over the internal defaults into [Config].
//! - [input]: the sequence and absolute keybind tables and their load-time validation.
//! - [general]: the `[options]` table.
//!
//! The resolved [Config] is built once at startup and never mutated afterwards.

pub mod general;
pub mod input;
pub mod load;

pub use general::{InternalOptions, Options};
pub use input::{Keybinds, RawKeybinds};
pub use load::{Config, RawConfig};
