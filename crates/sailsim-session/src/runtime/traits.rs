// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Container runtime trait and the data it exchanges

use std::collections::HashMap;

use super::RuntimeResult;

/// Identity of a container known to the runtime
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    pub id: String,
    pub name: String,
}

/// Lifecycle state reported by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Exited { code: Option<i64> },
    Dead,
    Other(String),
}

impl ContainerStatus {
    /// Map a runtime status string (`running`, `paused`, ...)
    pub fn from_status(status: &str, exit_code: Option<i64>) -> Self {
        match status {
            "created" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "exited" => Self::Exited { code: exit_code },
            "dead" => Self::Dead,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Exited { .. } | Self::Dead)
    }
}

/// Snapshot of a container's runtime metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerInfo {
    pub handle: ContainerHandle,
    pub status: ContainerStatus,
    /// `"<container port>/tcp"` -> published host port
    pub published_ports: HashMap<String, u16>,
}

impl ContainerInfo {
    /// Host port bound to a TCP container port
    pub fn host_port(&self, container_port: u16) -> Option<u16> {
        self.published_ports
            .get(&format!("{}/tcp", container_port))
            .copied()
    }

    /// Paused containers are reported as not running
    pub fn is_running(&self) -> bool {
        self.status == ContainerStatus::Running
    }
}

/// One published port; `host_port: None` lets the runtime pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: Option<u16>,
}

/// Parameters for starting a new detached container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub image: String,
    pub name: String,
    pub ports: Vec<PortMapping>,
    /// Remove the container once it terminates
    pub auto_remove: bool,
}

/// Process-launch interface to the hosting runtime
///
/// All calls are blocking. Implementations must be shareable between the
/// caller's thread and the background suspension timer.
pub trait ContainerRuntime: Send + Sync {
    /// Look a container up by name or id; `Ok(None)` when it does not exist
    fn get(&self, name: &str) -> RuntimeResult<Option<ContainerInfo>>;

    /// Create and start a container, returning once the runtime accepted it
    fn run(&self, spec: &LaunchSpec) -> RuntimeResult<ContainerHandle>;

    fn pause(&self, container: &ContainerHandle) -> RuntimeResult<()>;

    fn unpause(&self, container: &ContainerHandle) -> RuntimeResult<()>;

    fn kill(&self, container: &ContainerHandle) -> RuntimeResult<()>;

    /// Full output (stdout and stderr) produced so far
    fn logs(&self, container: &ContainerHandle) -> RuntimeResult<String>;
}
