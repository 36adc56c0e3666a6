//! Miscellaneous utility functions for fe.
//!
//! - [cli]: command-line arguments.
//! - [helpers]: home directory lookup, start directory validation and logger setup.

pub mod cli;
pub mod helpers;

pub use helpers::{expand_home_path, get_home, init_logging, resolve_start_dir};
