// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory container runtime whose `run` starts a fake simulation backend
//! (a ZMQ REP socket on the published host port)

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use sailsim_config::SailsimConfig;
use sailsim_session::runtime::{ContainerInfo, ContainerStatus, LaunchSpec, RuntimeResult};
use sailsim_session::{ContainerHandle, ContainerRuntime, RuntimeError};
use serde_json::{json, Value};

pub const SENTINEL: &str = "INTENTIFIED CONTROL!";

/// Rudder angle that makes the fake backend answer `{error: "boom"}`
pub const BOOM_RUDDER: f64 = 99.0;
/// Rudder angle that makes the fake backend drop `obs` from its reply
pub const NO_OBS_RUDDER: f64 = -99.0;
/// Rudder angle that makes the fake backend hold its reply for `SLOW_REPLY`
pub const SLOW_RUDDER: f64 = 42.0;
pub const SLOW_REPLY: Duration = Duration::from_millis(300);

/// What `run` does with the new container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchBehaviour {
    #[default]
    Healthy,
    /// Never prints the readiness sentinel
    Silent,
    /// Exits with status 1 right after starting
    Crashes,
    /// Image reference cannot be resolved
    MissingImage,
}

struct FakeContainer {
    handle: ContainerHandle,
    status: Arc<Mutex<ContainerStatus>>,
    ports: HashMap<String, u16>,
    logs: String,
    stop: Arc<AtomicBool>,
    backend: Option<JoinHandle<()>>,
}

pub struct FakeRuntime {
    pub behaviour: LaunchBehaviour,
    containers: Mutex<HashMap<String, FakeContainer>>,
    /// Every request the fake backends received, decoded
    pub requests: Arc<Mutex<Vec<Value>>>,
    /// Requests that reached a backend while its container was paused
    pub served_while_paused: Arc<AtomicUsize>,
    pub runs: AtomicUsize,
    pub pauses: AtomicUsize,
    pub unpauses: AtomicUsize,
    pub kills: AtomicUsize,
}

impl FakeRuntime {
    pub fn new(behaviour: LaunchBehaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            containers: Mutex::new(HashMap::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
            served_while_paused: Arc::new(AtomicUsize::new(0)),
            runs: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
            unpauses: AtomicUsize::new(0),
            kills: AtomicUsize::new(0),
        })
    }

    pub fn status_of(&self, name: &str) -> Option<ContainerStatus> {
        self.containers
            .lock()
            .get(name)
            .map(|container| container.status.lock().clone())
    }

    /// Make the container vanish as if the runtime removed it
    pub fn forget(&self, name: &str) {
        if let Some(container) = self.containers.lock().remove(name) {
            container.stop.store(true, Ordering::SeqCst);
        }
    }

    pub fn last_request(&self) -> Option<Value> {
        self.requests.lock().last().cloned()
    }

    fn find<'a>(
        containers: &'a HashMap<String, FakeContainer>,
        handle: &ContainerHandle,
    ) -> RuntimeResult<&'a FakeContainer> {
        containers
            .values()
            .find(|container| container.handle.id == handle.id)
            .ok_or_else(|| RuntimeError::NotFound(handle.name.clone()))
    }
}

impl ContainerRuntime for FakeRuntime {
    fn get(&self, name: &str) -> RuntimeResult<Option<ContainerInfo>> {
        Ok(self.containers.lock().get(name).map(|container| ContainerInfo {
            handle: container.handle.clone(),
            status: container.status.lock().clone(),
            published_ports: container.ports.clone(),
        }))
    }

    fn run(&self, spec: &LaunchSpec) -> RuntimeResult<ContainerHandle> {
        if self.behaviour == LaunchBehaviour::MissingImage {
            return Err(RuntimeError::ImageNotFound(spec.image.clone()));
        }
        let run_number = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = ContainerHandle {
            id: format!("fake-{}", run_number),
            name: spec.name.clone(),
        };

        let mut ports = HashMap::new();
        let mut backend_port = None;
        for mapping in &spec.ports {
            if let Some(host_port) = mapping.host_port {
                ports.insert(format!("{}/tcp", mapping.container_port), host_port);
                if mapping.container_port == 5555 {
                    backend_port = Some(host_port);
                }
            }
        }

        let status = Arc::new(Mutex::new(ContainerStatus::Running));
        let stop = Arc::new(AtomicBool::new(false));
        let mut logs = String::from("Starting simulation...\n");
        let mut backend = None;

        match self.behaviour {
            LaunchBehaviour::Crashes => {
                *status.lock() = ContainerStatus::Exited { code: Some(1) };
                logs.push_str("Traceback (most recent call last):\n");
            }
            LaunchBehaviour::Silent => {}
            _ => {
                let port = backend_port
                    .ok_or_else(|| RuntimeError::Api("backend port not published".to_string()))?;
                backend = Some(spawn_backend(
                    port,
                    Arc::clone(&status),
                    Arc::clone(&stop),
                    Arc::clone(&self.requests),
                    Arc::clone(&self.served_while_paused),
                ));
                logs.push_str(SENTINEL);
                logs.push('\n');
            }
        }

        self.containers.lock().insert(
            spec.name.clone(),
            FakeContainer {
                handle: handle.clone(),
                status,
                ports,
                logs,
                stop,
                backend,
            },
        );
        Ok(handle)
    }

    fn pause(&self, container: &ContainerHandle) -> RuntimeResult<()> {
        let containers = self.containers.lock();
        let found = Self::find(&containers, container)?;
        let mut status = found.status.lock();
        if *status != ContainerStatus::Running {
            return Err(RuntimeError::Api(format!("Container {} is not running", container.id)));
        }
        *status = ContainerStatus::Paused;
        self.pauses.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unpause(&self, container: &ContainerHandle) -> RuntimeResult<()> {
        let containers = self.containers.lock();
        let found = Self::find(&containers, container)?;
        let mut status = found.status.lock();
        if *status != ContainerStatus::Paused {
            return Err(RuntimeError::Api(format!("Container {} is not paused", container.id)));
        }
        *status = ContainerStatus::Running;
        self.unpauses.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn kill(&self, container: &ContainerHandle) -> RuntimeResult<()> {
        let removed = {
            let mut containers = self.containers.lock();
            let name = Self::find(&containers, container)?.handle.name.clone();
            containers.remove(&name)
        };
        if let Some(mut removed) = removed {
            removed.stop.store(true, Ordering::SeqCst);
            if let Some(backend) = removed.backend.take() {
                let _ = backend.join();
            }
        }
        self.kills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn logs(&self, container: &ContainerHandle) -> RuntimeResult<String> {
        let containers = self.containers.lock();
        Ok(Self::find(&containers, container)?.logs.clone())
    }
}

impl Drop for FakeRuntime {
    fn drop(&mut self) {
        for container in self.containers.lock().values() {
            container.stop.store(true, Ordering::SeqCst);
        }
    }
}

/// Config pointing at loopback with short timings
pub fn test_config() -> SailsimConfig {
    let mut config = SailsimConfig::default();
    config.backend.host = "127.0.0.1".to_string();
    config.backend.extra_exposed_ports = Vec::new();
    config.readiness.poll_interval_ms = 20;
    config.readiness.timeout_secs = 5;
    config.suspension.idle_delay_ms = 100;
    config
}

pub fn observation_json(wind: &Value, step: u64) -> Value {
    let x = step as f64 * 0.5;
    json!({
        "p_boat": {"x": x, "y": 0.0, "z": 0.0},
        "dt_p_boat": {"x": 0.5, "y": 0.0, "z": 0.0},
        "theta_boat": {"x": 0.0, "y": 0.0, "z": 0.1},
        "dt_theta_boat": {"x": 0.0, "y": 0.0, "z": 0.0},
        "theta_rudder": 0.0,
        "dt_theta_rudder": 0.0,
        "theta_sail": 0.2,
        "dt_theta_sail": 0.0,
        "wind": wind
    })
}

fn spawn_backend(
    port: u16,
    status: Arc<Mutex<ContainerStatus>>,
    stop: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<Value>>>,
    served_while_paused: Arc<AtomicUsize>,
) -> JoinHandle<()> {
    let context = zmq::Context::new();
    let socket = context.socket(zmq::REP).unwrap();
    socket.set_linger(0).unwrap();
    socket.set_rcvtimeo(50).unwrap();
    socket.bind(&format!("tcp://127.0.0.1:{}", port)).unwrap();

    thread::spawn(move || {
        let _context = context;
        let mut wind = json!({"x": 0.0, "y": 0.0});
        let mut steps = 0u64;

        while !stop.load(Ordering::SeqCst) {
            let raw = match socket.recv_bytes(0) {
                Ok(raw) => raw,
                Err(zmq::Error::EAGAIN) => continue,
                Err(_) => break,
            };
            if *status.lock() == ContainerStatus::Paused {
                served_while_paused.fetch_add(1, Ordering::SeqCst);
            }

            let request: Value = rmp_serde::from_slice(&raw).unwrap();
            requests.lock().push(request.clone());

            if request["action"]["theta_rudder"].as_f64() == Some(SLOW_RUDDER) {
                thread::sleep(SLOW_REPLY);
                // Deliver the reply even if the container is killed meanwhile
                let _ = socket.set_linger(1000);
            }

            let reply = if let Some(reset) = request.get("reset") {
                wind = reset["wind"].clone();
                steps = 0;
                json!({
                    "obs": observation_json(&wind, steps),
                    "info": {
                        "min_position": {"x": -50.0, "y": -50.0},
                        "max_position": {"x": 50.0, "y": 50.0}
                    }
                })
            } else if let Some(action) = request.get("action") {
                let rudder = action["theta_rudder"].as_f64().unwrap_or_default();
                if rudder == BOOM_RUDDER {
                    json!({"error": "boom"})
                } else if rudder == NO_OBS_RUDDER {
                    json!({"done": false, "info": {}})
                } else {
                    steps += 1;
                    json!({
                        "obs": observation_json(&wind, steps),
                        "done": steps >= 50,
                        "info": {"step": steps}
                    })
                }
            } else if request.get("close").is_some() {
                json!({})
            } else {
                json!({"error": "unknown request"})
            };

            let bytes = rmp_serde::to_vec_named(&reply).unwrap();
            if socket.send(bytes, 0).is_err() {
                break;
            }
        }
    })
}
