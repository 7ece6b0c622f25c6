//! Parsing and validation of `sigflow.toml`.
//!
//! The file has three optional sections: `[check]` selects the width policy
//! and promotes or suppresses checker rules, `[sim]` bounds the scheduler
//! (delta-cycle watchdog, time limit), and `[trace]` configures the VCD
//! output. Every field has a default, so an empty file is valid.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
