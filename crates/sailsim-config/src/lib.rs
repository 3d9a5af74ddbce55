// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # sailsim configuration
//!
//! Type-safe configuration for the sailboat simulation session manager:
//! - TOML file parsing (`sailsim.toml`)
//! - Environment variable overrides
//! - Validation of value ranges
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sailsim_config::load_config_or_default;
//!
//! let config = load_config_or_default().expect("invalid sailsim configuration");
//! println!("Backend image: {}:<tag>", config.backend.image_repository);
//! println!("Idle delay: {} ms", config.suspension.idle_delay_ms);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    apply_environment_overrides, find_config_file, load_config, load_config_or_default,
    CONFIG_FILE_NAME, CONFIG_PATH_ENV,
};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("sailsim.toml not found (searched {0})")]
    FileNotFound(String),

    #[error("Could not read sailsim.toml: {0}")]
    IoError(#[from] std::io::Error),

    #[error("sailsim.toml is not valid TOML: {0}")]
    ParseError(String),

    #[error("{0}")]
    ValidationError(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
