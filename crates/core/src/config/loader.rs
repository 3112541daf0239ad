//! Configuration file loader for `.sequencer/` directory structure.
//!
//! This module provides functionality to load and parse all configuration files
//! from the `.sequencer/` directory, including:
//! - `config.toml`: Global settings
//! - `processes/*.yaml`: Process definitions

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use seq_protocol::config_models::GlobalConfig;
use seq_protocol::step_models::ProcessDefinition;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Name of the configuration directory below the project root.
pub const CONFIG_DIR: &str = ".sequencer";

/// Loads all configuration from the `.sequencer/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.sequencer/` folder
///
/// # Returns
///
/// An `AppConfig` containing all loaded configuration. If directories or files
/// are missing, returns an empty/default configuration rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid syntax (TOML or YAML)
/// - Two process files declare the same process name
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let config_dir = root.join(CONFIG_DIR);

    if !config_dir.exists() {
        debug!(path = %config_dir.display(), "no configuration directory, using defaults");
        return Ok(AppConfig::default());
    }

    let global = load_global_config(&config_dir)?;
    let processes = load_processes(&config_dir)?;

    Ok(AppConfig { global, processes })
}

/// Loads global configuration from `config.toml`.
fn load_global_config(config_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = config_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let config: GlobalConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path,
            source,
        })?;

    Ok(config)
}

/// Loads all process definitions from `processes/*.yaml` and `*.yml`.
fn load_processes(config_dir: &Path) -> ConfigResult<Vec<ProcessDefinition>> {
    let processes_dir = config_dir.join("processes");

    if !processes_dir.exists() {
        return Ok(Vec::new());
    }

    let mut processes = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for entry in WalkDir::new(&processes_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: processes_dir.clone(),
            source,
        })?;

        let path = entry.path();

        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let process: ProcessDefinition =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?;

        if process.name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                reason: "process name must not be empty".to_string(),
            });
        }

        if let Some(first) = seen.insert(process.name.clone(), path.to_path_buf()) {
            return Err(ConfigError::DuplicateProcess {
                name: process.name,
                first,
                second: path.to_path_buf(),
            });
        }

        debug!(process = %process.name, path = %path.display(), "loaded process definition");
        processes.push(process);
    }

    Ok(processes)
}
