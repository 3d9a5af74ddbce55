// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulation session facade
//!
//! Ties the launcher, the RPC channel and the idle suspension manager into
//! the four consumer operations: `reset`, `step`, `close` and `stop`.
//! Every operation takes `&self`; a session can be shared (e.g. in an `Arc`)
//! so a shutdown path on another thread may `stop` or `teardown` it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use sailsim_config::{load_config_or_default, validate_config, SailsimConfig};
use tracing::{debug, info, warn};

use crate::channel::{RpcChannel, StepOutcome};
use crate::codec::{Action, Observation, ResetInfo};
use crate::error::{SessionError, SessionResult};
use crate::launcher::{BackendIdentity, BackendLauncher};
use crate::runtime::{ContainerHandle, ContainerRuntime, DockerCli, RuntimeError};
use crate::suspension::{IdleSuspensionManager, SuspensionStats};

/// Construction parameters for [`SimSession`]
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub identity: BackendIdentity,
    pub config: SailsimConfig,
    /// Run [`SimSession::teardown`] when the session is dropped
    pub teardown_on_drop: bool,
}

impl SessionOptions {
    pub fn new(backend_tag: impl Into<String>, session_name: impl Into<String>) -> Self {
        Self {
            identity: BackendIdentity::new(backend_tag, session_name),
            config: SailsimConfig::default(),
            teardown_on_drop: false,
        }
    }

    pub fn with_config(mut self, config: SailsimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_teardown_on_drop(mut self, enabled: bool) -> Self {
        self.teardown_on_drop = enabled;
        self
    }
}

/// One caller's connection to one backend container
pub struct SimSession {
    identity: BackendIdentity,
    config: SailsimConfig,
    runtime: Arc<dyn ContainerRuntime>,
    container: ContainerHandle,
    port: u16,
    manager: IdleSuspensionManager<RpcChannel>,
    closed: AtomicBool,
    stopped: AtomicBool,
    torn_down: AtomicBool,
    teardown_on_drop: bool,
}

impl SimSession {
    /// Connect through the local docker CLI using `sailsim.toml` (or defaults)
    pub fn connect(backend_tag: &str, session_name: &str) -> SessionResult<Self> {
        let config = load_config_or_default()?;
        let runtime = Arc::new(DockerCli::new(config.backend.runtime_binary.clone()));
        Self::with_runtime(
            SessionOptions::new(backend_tag, session_name).with_config(config),
            runtime,
        )
    }

    /// Acquire the backend, connect to it and leave it paused
    pub fn with_runtime(
        options: SessionOptions,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> SessionResult<Self> {
        let SessionOptions {
            identity,
            config,
            teardown_on_drop,
        } = options;
        validate_config(&config)?;

        let acquired = BackendLauncher::new(Arc::clone(&runtime), config.clone()).acquire(&identity)?;

        let context = Arc::new(zmq::Context::new());
        let channel = RpcChannel::connect(context, &config.backend.host, acquired.port)?;
        let manager = IdleSuspensionManager::new(
            channel,
            Arc::clone(&runtime),
            acquired.container.clone(),
            acquired.is_running,
            &config.suspension,
        )?;
        if config.suspension.enabled {
            manager.pause_now();
        }

        info!(
            "[SESSION] {}/{} connected to {} {} on {}:{}",
            identity.backend_tag,
            identity.session_name,
            if acquired.newly_created { "new" } else { "existing" },
            acquired.container.name,
            config.backend.host,
            acquired.port
        );

        Ok(Self {
            identity,
            config,
            runtime,
            container: acquired.container,
            port: acquired.port,
            manager,
            closed: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
            teardown_on_drop,
        })
    }

    /// Start (or restart) an episode
    pub fn reset(&self, wind: [f64; 2], rate: u32) -> SessionResult<(Observation, ResetInfo)> {
        self.ensure_open()?;
        debug!("[SESSION] reset wind={:?} rate={}", wind, rate);
        self.manager.with_active(|channel| channel.reset(wind, rate))
    }

    /// Apply one action and advance the simulation by one tick
    pub fn step(&self, action: impl Into<Action>) -> SessionResult<StepOutcome> {
        self.ensure_open()?;
        let action = action.into();
        self.manager.with_active(|channel| channel.step(&action))
    }

    /// Graceful shutdown handshake with the backend
    pub fn close(&self) -> SessionResult<()> {
        self.ensure_open()?;
        self.manager.with_active(|channel| channel.close())?;
        self.closed.store(true, Ordering::SeqCst);
        info!("[SESSION] Closed {}", self.container.name);

        if self.config.teardown.pause_after_close {
            self.manager.pause_now();
        }
        Ok(())
    }

    /// Kill the backend container without going through the protocol
    ///
    /// Idempotent. Only waits for an exchange in flight when
    /// `close_before_stop` asks for a graceful close first.
    pub fn stop(&self) -> SessionResult<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.manager.shutdown_timer();

        if self.config.teardown.close_before_stop && !self.closed.load(Ordering::SeqCst) {
            if let Err(e) = self.manager.with_active(|channel| channel.close()) {
                warn!("[SESSION] Graceful close before stop failed: {}", e);
            }
        }
        self.closed.store(true, Ordering::SeqCst);

        let started = Instant::now();
        info!("[SESSION] Stopping {}", self.container.name);
        match self.runtime.kill(&self.container) {
            Ok(()) => {
                info!(
                    "[SESSION] Stopped {} in {:.2?}",
                    self.container.name,
                    started.elapsed()
                );
                Ok(())
            }
            Err(RuntimeError::NotFound(message)) => {
                debug!("[SESSION] {} already gone: {}", self.container.name, message);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Single shutdown hook for the embedding application
    ///
    /// Stops the idle timer and then the backend. With `keep_alive` the
    /// backend is left paused for the next session instead. Safe to call any
    /// number of times.
    pub fn teardown(&self) -> SessionResult<()> {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.manager.shutdown_timer();
        if self.config.teardown.keep_alive {
            if self.config.suspension.enabled {
                self.manager.pause_now();
            }
            info!("[SESSION] Keeping {} alive", self.container.name);
            return Ok(());
        }
        self.stop()
    }

    pub fn identity(&self) -> &BackendIdentity {
        &self.identity
    }

    pub fn container(&self) -> &ContainerHandle {
        &self.container
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the backend is currently resumed (false when paused)
    pub fn is_running(&self) -> bool {
        self.manager.is_running()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> SuspensionStats {
        self.manager.stats()
    }

    pub fn config(&self) -> &SailsimConfig {
        &self.config
    }

    fn ensure_open(&self) -> SessionResult<()> {
        if self.closed.load(Ordering::SeqCst) || self.stopped.load(Ordering::SeqCst) {
            return Err(SessionError::Closed);
        }
        Ok(())
    }
}

impl Drop for SimSession {
    fn drop(&mut self) {
        if self.teardown_on_drop {
            if let Err(e) = self.teardown() {
                warn!("[SESSION] Teardown of {} failed: {}", self.container.name, e);
            }
        }
    }
}

impl std::fmt::Debug for SimSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimSession")
            .field("identity", &self.identity)
            .field("container", &self.container)
            .field("port", &self.port)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
