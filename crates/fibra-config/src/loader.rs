// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base values)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, FibraConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "fibra.toml";

/// Find the fibra configuration file
///
/// Search order:
/// 1. `FIBRA_CONFIG_PATH` environment variable
/// 2. Current working directory: `./fibra.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("FIBRA_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by FIBRA_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet FIBRA_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the config file is not found or contains invalid TOML.
/// Values are not validated here; see [`crate::validate_config`].
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<FibraConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config = load_config_from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Parse configuration from TOML text, without overrides
pub fn load_config_from_str(content: &str) -> ConfigResult<FibraConfig> {
    Ok(toml::from_str(content)?)
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `FIBRA_SEED` -> `system.seed`
/// - `FIBRA_PARALLEL` -> `system.parallel`
/// - `FIBRA_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut FibraConfig) {
    if let Ok(value) = env::var("FIBRA_SEED") {
        if let Ok(seed) = value.parse::<u64>() {
            config.system.seed = Some(seed);
        }
    }
    if let Ok(value) = env::var("FIBRA_PARALLEL") {
        config.system.parallel = parse_bool(&value);
    }
    if let Ok(value) = env::var("FIBRA_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of CLI arguments, e.g. `{"seed": "7", "pf_to_pc.affinity": "0.2"}`.
///   Per-connection keys take the form `<connection>.<affinity|resolution|voxel_size>`.
///   Values that fail to parse are ignored.
pub fn apply_cli_overrides(config: &mut FibraConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("seed") {
        if let Ok(seed) = value.parse::<u64>() {
            config.system.seed = Some(seed);
        }
    }
    if let Some(value) = cli_args.get("parallel") {
        config.system.parallel = parse_bool(value);
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }

    for (key, value) in cli_args {
        let Some((name, field)) = key.rsplit_once('.') else {
            continue;
        };
        let Some(connection) = config.connection_mut(name) else {
            continue;
        };
        let Ok(number) = value.parse::<f64>() else {
            continue;
        };
        match field {
            "affinity" => connection.affinity = number,
            "resolution" => connection.resolution = number,
            "voxel_size" => connection.voxel_size = number,
            _ => {}
        }
    }
}
