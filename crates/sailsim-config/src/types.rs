// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to one section of `sailsim.toml`. Every section is
//! `#[serde(default)]`, so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SailsimConfig {
    pub backend: BackendConfig,
    pub readiness: ReadinessConfig,
    pub ports: PortsConfig,
    pub suspension: SuspensionConfig,
    pub teardown: TeardownConfig,
    pub logging: LoggingConfig,
}

/// Backend image and container naming
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Image repository; the backend tag is appended as `:<tag>`
    pub image_repository: String,
    /// Container names are `<prefix>-<backend_tag>-<session_name>`
    pub container_prefix: String,
    /// Port the backend listens on inside its container
    pub internal_port: u16,
    /// Additional container ports published to random host ports
    pub extra_exposed_ports: Vec<u16>,
    /// Host used to reach the published port
    pub host: String,
    /// Hosting runtime executable
    pub runtime_binary: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            image_repository: "lucasmrdt/sailboat-sim-lsa-gym".to_string(),
            container_prefix: "sailboat-sim-lsa-gym".to_string(),
            internal_port: 5555,
            extra_exposed_ports: vec![22],
            host: "localhost".to_string(),
            runtime_binary: "docker".to_string(),
        }
    }
}

impl BackendConfig {
    /// Full image reference for a backend tag
    pub fn image_ref(&self, backend_tag: &str) -> String {
        format!("{}:{}", self.image_repository, backend_tag)
    }

    /// Canonical container name for a session identity
    pub fn container_name(&self, backend_tag: &str, session_name: &str) -> String {
        format!("{}-{}-{}", self.container_prefix, backend_tag, session_name)
    }
}

/// Readiness sentinel polling
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Marker the backend prints once it services requests
    pub sentinel: String,
    pub poll_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            sentinel: "INTENTIFIED CONTROL!".to_string(),
            poll_interval_ms: 1000,
            timeout_secs: 60,
        }
    }
}

impl ReadinessConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Host port allocation (ephemeral range, end exclusive)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PortsConfig {
    pub range_start: u16,
    pub range_end: u16,
    pub max_attempts: u32,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            range_start: 49152,
            range_end: 65535,
            max_attempts: 100,
        }
    }
}

/// Idle suspension of the backend container
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SuspensionConfig {
    pub enabled: bool,
    /// Quiet interval after the last exchange before the backend is paused
    pub idle_delay_ms: u64,
}

impl Default for SuspensionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            idle_delay_ms: 5000,
        }
    }
}

impl SuspensionConfig {
    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }
}

/// Shutdown policy
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TeardownConfig {
    /// Pause the backend right after a graceful `close()`
    pub pause_after_close: bool,
    /// Attempt a graceful `close()` before killing in `stop()`
    pub close_before_stop: bool,
    /// Leave the backend running when the session is torn down
    pub keep_alive: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}
