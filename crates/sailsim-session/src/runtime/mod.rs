// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Hosting runtime for the simulation backend
//!
//! The backend runs as a container. [`ContainerRuntime`] is the narrow
//! process-launch interface the launcher and the suspension manager need;
//! [`DockerCli`] implements it by shelling out to the `docker` binary.

pub mod docker;
pub mod traits;

pub use docker::DockerCli;
pub use traits::{ContainerHandle, ContainerInfo, ContainerRuntime, ContainerStatus, LaunchSpec, PortMapping};

/// Result type alias for hosting runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Hosting runtime failures
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Runtime binary missing or daemon not reachable
    #[error("Container runtime is not reachable: {0}. Please start docker and try again.")]
    Unavailable(String),

    #[error("Could not find image {0}. Please make sure the image exists and try again.")]
    ImageNotFound(String),

    #[error("Error communicating with the container runtime: {0}")]
    Api(String),

    #[error("No such container: {0}")]
    NotFound(String),

    #[error("Container {name} exited with status {code:?}. Please check the container logs for more information.")]
    Exited { name: String, code: Option<i64> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
