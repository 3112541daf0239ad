//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines
//! global settings and process definitions into a single configuration
//! object.

use seq_protocol::config_models::GlobalConfig;
use seq_protocol::step_models::ProcessDefinition;
use std::path::{Path, PathBuf};

/// Unified application configuration loaded from `.sequencer/` directory.
///
/// This structure aggregates all configuration sources:
/// - `config.toml`: Global settings
/// - `processes/*.yaml`: Process definitions
///
/// # Example
///
/// ```rust,no_run
/// use seq_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} processes", config.processes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Global settings from `config.toml`.
    pub global: GlobalConfig,

    /// All process definitions loaded from `processes/*.yaml`, sorted by
    /// file name.
    pub processes: Vec<ProcessDefinition>,
}

impl AppConfig {
    /// Look up a process definition by name.
    pub fn process(&self, name: &str) -> Option<&ProcessDefinition> {
        self.processes.iter().find(|process| process.name == name)
    }

    /// Location of the state file; relative paths are taken from `root`.
    pub fn state_file(&self, root: &Path) -> PathBuf {
        if self.global.state_file.is_absolute() {
            self.global.state_file.clone()
        } else {
            root.join(&self.global.state_file)
        }
    }
}
