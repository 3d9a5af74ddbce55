// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Console logging initialisation

use sailsim_config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::CrateDebugFlags;

#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Initialize the global tracing subscriber
///
/// The filter is built from `RUST_LOG` when set, otherwise from the debug
/// flags on top of `logging.level`.
///
/// # Errors
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn init_logging(
    debug_flags: &CrateDebugFlags,
    logging: &LoggingConfig,
) -> Result<(), ObservabilityError> {
    let filter_string = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| debug_flags.to_filter_string(&logging.level));
    let env_filter =
        EnvFilter::try_new(&filter_string).map_err(|e| ObservabilityError::InvalidFilter {
            filter: filter_string.clone(),
            reason: e.to_string(),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_names(true);

    let result = match logging.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| ObservabilityError::SubscriberInit(e.to_string()))?;

    tracing::debug!("[OBSERVABILITY] Logging initialised with filter '{}'", filter_string);
    Ok(())
}

/// Initialize logging for tests; repeated calls are ignored
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("sailsim_session=debug,info"))
        .with_test_writer()
        .try_init();
}
