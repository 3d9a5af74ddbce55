// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Two tiers are applied in order:
//! 1. TOML file (base values, or built-in defaults when no file exists)
//! 2. Environment variables (runtime overrides)

use crate::{validate_config, ConfigError, ConfigResult, SailsimConfig};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name searched for in the working directory and its parents
pub const CONFIG_FILE_NAME: &str = "sailsim.toml";

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "SAILSIM_CONFIG_PATH";

/// Find the sailsim configuration file
///
/// Search order:
/// 1. `SAILSIM_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd;
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent.to_path_buf();
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from a TOML file, apply environment overrides and validate
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
pub fn load_config(config_path: Option<&Path>) -> ConfigResult<SailsimConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    debug!("[CONFIG] Loading {}", config_file.display());
    let content = fs::read_to_string(&config_file)?;
    let mut config: SailsimConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Like [`load_config`], but falls back to built-in defaults when no file is found
pub fn load_config_or_default() -> ConfigResult<SailsimConfig> {
    match load_config(None) {
        Err(ConfigError::FileNotFound(reason)) => {
            debug!("[CONFIG] No config file, using defaults ({})", reason);
            let mut config = SailsimConfig::default();
            apply_environment_overrides(&mut config);
            validate_config(&config)?;
            Ok(config)
        }
        other => other,
    }
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `SAILSIM_BACKEND_IMAGE` -> `backend.image_repository`
/// - `SAILSIM_BACKEND_HOST` -> `backend.host`
/// - `SAILSIM_RUNTIME_BINARY` -> `backend.runtime_binary`
/// - `SAILSIM_READY_SENTINEL` -> `readiness.sentinel`
/// - `SAILSIM_READY_TIMEOUT_SECS` -> `readiness.timeout_secs`
/// - `SAILSIM_IDLE_DELAY_MS` -> `suspension.idle_delay_ms`
/// - `SAILSIM_SUSPENSION_ENABLED` -> `suspension.enabled`
/// - `SAILSIM_KEEP_ALIVE` -> `teardown.keep_alive`
/// - `SAILSIM_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut SailsimConfig) {
    apply_overrides_from(config, |key| env::var(key).ok());
}

/// Override logic with an injectable lookup, so tests don't touch the process environment
pub(crate) fn apply_overrides_from<F>(config: &mut SailsimConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("SAILSIM_BACKEND_IMAGE") {
        config.backend.image_repository = value;
    }
    if let Some(value) = lookup("SAILSIM_BACKEND_HOST") {
        config.backend.host = value;
    }
    if let Some(value) = lookup("SAILSIM_RUNTIME_BINARY") {
        config.backend.runtime_binary = value;
    }
    if let Some(value) = lookup("SAILSIM_READY_SENTINEL") {
        config.readiness.sentinel = value;
    }
    if let Some(value) = lookup("SAILSIM_READY_TIMEOUT_SECS") {
        if let Ok(secs) = value.parse::<u64>() {
            config.readiness.timeout_secs = secs;
        }
    }
    if let Some(value) = lookup("SAILSIM_IDLE_DELAY_MS") {
        if let Ok(ms) = value.parse::<u64>() {
            config.suspension.idle_delay_ms = ms;
        }
    }
    if let Some(value) = lookup("SAILSIM_SUSPENSION_ENABLED") {
        config.suspension.enabled = parse_bool(&value);
    }
    if let Some(value) = lookup("SAILSIM_KEEP_ALIVE") {
        config.teardown.keep_alive = parse_bool(&value);
    }
    if let Some(value) = lookup("SAILSIM_LOG_LEVEL") {
        config.logging.level = value;
    }
}
