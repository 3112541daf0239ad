//! Global configuration models for `.sequencer/config.toml`.
//!
//! This module defines the structure of the global configuration file that
//! controls how processes are persisted and how failures are reported.

use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;
use ts_rs::TS;

/// Default location of the JSON state file, relative to the project root.
pub const DEFAULT_STATE_FILE: &str = ".sequencer/state.json";

/// Represents global settings from `.sequencer/config.toml`.
///
/// # Example
///
/// ```toml
/// # .sequencer/config.toml
/// state_file = ".sequencer/state.json"
/// throw_error = false
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct GlobalConfig {
    /// File used by the JSON state provider.
    ///
    /// Relative paths are resolved against the project root.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Return step failures to the caller instead of only recording them.
    #[serde(default)]
    pub throw_error: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            throw_error: false,
        }
    }
}

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}
