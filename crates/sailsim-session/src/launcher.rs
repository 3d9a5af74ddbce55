// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Backend locator and launcher
//!
//! A session identity maps to exactly one container name. An existing
//! container with that name is reused as-is; otherwise a free host port is
//! probed and a new self-removing container is started on it. Either way
//! the backend's log is polled for the readiness sentinel before the
//! backend is handed out.

use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use rand::Rng;
use sailsim_config::{PortsConfig, SailsimConfig};
use tracing::{debug, info};

use crate::error::{SessionError, SessionResult};
use crate::runtime::{ContainerHandle, ContainerRuntime, ContainerStatus, LaunchSpec, PortMapping, RuntimeError};

/// `(backend_tag, session_name)` pair naming one backend container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendIdentity {
    pub backend_tag: String,
    pub session_name: String,
}

impl BackendIdentity {
    pub fn new(backend_tag: impl Into<String>, session_name: impl Into<String>) -> Self {
        Self {
            backend_tag: backend_tag.into(),
            session_name: session_name.into(),
        }
    }
}

/// A located or freshly launched backend, ready to accept requests
#[derive(Debug, Clone, PartialEq)]
pub struct AcquiredBackend {
    pub container: ContainerHandle,
    /// Host port the backend's request socket is published on
    pub port: u16,
    /// False when the container was found paused
    pub is_running: bool,
    /// False when an existing container was reused
    pub newly_created: bool,
}

pub struct BackendLauncher {
    runtime: Arc<dyn ContainerRuntime>,
    config: SailsimConfig,
}

impl BackendLauncher {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: SailsimConfig) -> Self {
        Self { runtime, config }
    }

    /// Find the identity's container or start one, then wait for readiness
    pub fn acquire(&self, identity: &BackendIdentity) -> SessionResult<AcquiredBackend> {
        let backend = &self.config.backend;
        let name = backend.container_name(&identity.backend_tag, &identity.session_name);

        let acquired = match self.runtime.get(&name)? {
            Some(existing) => {
                let port = existing.host_port(backend.internal_port).ok_or_else(|| {
                    RuntimeError::Api(format!(
                        "Container {} does not publish port {}/tcp",
                        name, backend.internal_port
                    ))
                })?;
                info!(
                    "[LAUNCHER] Found existing backend {} on port {} ({:?})",
                    name, port, existing.status
                );
                AcquiredBackend {
                    is_running: existing.is_running(),
                    container: existing.handle,
                    port,
                    newly_created: false,
                }
            }
            None => {
                let port = allocate_port(&self.config.ports)?;
                let image = backend.image_ref(&identity.backend_tag);
                let mut ports = vec![PortMapping {
                    container_port: backend.internal_port,
                    host_port: Some(port),
                }];
                ports.extend(backend.extra_exposed_ports.iter().map(|&container_port| PortMapping {
                    container_port,
                    host_port: None,
                }));

                info!("[LAUNCHER] Launching {} from {} on port {}", name, image, port);
                let started = Instant::now();
                let container = self.runtime.run(&LaunchSpec {
                    image,
                    name: name.clone(),
                    ports,
                    auto_remove: true,
                })?;
                info!(
                    "[LAUNCHER] Launched {} ({}) in {:.2?}",
                    name,
                    container.id,
                    started.elapsed()
                );
                AcquiredBackend {
                    container,
                    port,
                    is_running: true,
                    newly_created: true,
                }
            }
        };

        self.wait_until_ready(&acquired.container)?;
        Ok(acquired)
    }

    /// Poll the container's output until the readiness sentinel shows up
    pub fn wait_until_ready(&self, container: &ContainerHandle) -> SessionResult<()> {
        let readiness = &self.config.readiness;
        let timeout = readiness.timeout();
        let interval = readiness.poll_interval();
        let started = Instant::now();
        let deadline = started + timeout;

        info!("[LAUNCHER] Waiting for {} to report readiness", container.name);
        loop {
            match self.runtime.get(&container.name)? {
                None => {
                    return Err(RuntimeError::Exited {
                        name: container.name.clone(),
                        code: None,
                    }
                    .into())
                }
                Some(info) if info.status.is_terminated() => {
                    let code = match info.status {
                        ContainerStatus::Exited { code } => code,
                        _ => None,
                    };
                    return Err(RuntimeError::Exited {
                        name: container.name.clone(),
                        code,
                    }
                    .into());
                }
                Some(_) => {}
            }

            if self.runtime.logs(container)?.contains(&readiness.sentinel) {
                info!(
                    "[LAUNCHER] {} ready after {:.2?}",
                    container.name,
                    started.elapsed()
                );
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(SessionError::ReadinessTimeout {
                    name: container.name.clone(),
                    waited: timeout,
                });
            }
            debug!("[LAUNCHER] {} not ready yet", container.name);
            thread::sleep(interval.min(deadline - now));
        }
    }
}

/// Probe random ports in the configured range until one binds
///
/// The port is released before the container claims it, so another process
/// may grab it in between.
pub fn allocate_port(ports: &PortsConfig) -> SessionResult<u16> {
    let mut rng = rand::thread_rng();
    for attempt in 1..=ports.max_attempts {
        let candidate = rng.gen_range(ports.range_start..ports.range_end);
        match TcpListener::bind(("0.0.0.0", candidate)) {
            Ok(listener) => {
                drop(listener);
                debug!("[LAUNCHER] Port {} is free (attempt {})", candidate, attempt);
                return Ok(candidate);
            }
            Err(e) => debug!("[LAUNCHER] Port {} unavailable: {}", candidate, e),
        }
    }
    Err(SessionError::PortExhausted {
        attempts: ports.max_attempts,
    })
}
