// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures values are non-empty and inside usable ranges before a session
//! tries to launch anything with them.

use crate::{ConfigError, ConfigResult, SailsimConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &SailsimConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_required_fields(config, &mut errors);
    validate_value_ranges(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_required_fields(config: &SailsimConfig, errors: &mut Vec<ConfigValidationError>) {
    let required = [
        ("backend.image_repository", &config.backend.image_repository),
        ("backend.container_prefix", &config.backend.container_prefix),
        ("backend.host", &config.backend.host),
        ("backend.runtime_binary", &config.backend.runtime_binary),
        ("readiness.sentinel", &config.readiness.sentinel),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        }
    }
}

fn validate_value_ranges(config: &SailsimConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.backend.internal_port == 0 {
        errors.push(invalid("backend.internal_port", "must be greater than 0"));
    }
    if config.readiness.poll_interval_ms == 0 {
        errors.push(invalid("readiness.poll_interval_ms", "must be greater than 0"));
    }
    if config.readiness.timeout_secs == 0 {
        errors.push(invalid("readiness.timeout_secs", "must be greater than 0"));
    }
    if config.ports.range_start == 0 {
        errors.push(invalid("ports.range_start", "must be greater than 0"));
    }
    if config.ports.range_start >= config.ports.range_end {
        errors.push(invalid(
            "ports.range_start",
            &format!(
                "must be lower than ports.range_end ({} >= {})",
                config.ports.range_start, config.ports.range_end
            ),
        ));
    }
    if config.ports.max_attempts == 0 {
        errors.push(invalid("ports.max_attempts", "must be greater than 0"));
    }
    if config.suspension.enabled && config.suspension.idle_delay_ms == 0 {
        errors.push(invalid(
            "suspension.idle_delay_ms",
            "must be greater than 0 while suspension is enabled",
        ));
    }
}

fn invalid(field: &str, reason: &str) -> ConfigValidationError {
    ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
