// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Docker implementation of [`ContainerRuntime`] driving the `docker` CLI

use std::collections::HashMap;
use std::io::ErrorKind;
use std::process::{Command, Output};

use serde::Deserialize;
use tracing::{debug, trace};

use super::traits::{ContainerHandle, ContainerInfo, ContainerRuntime, ContainerStatus, LaunchSpec};
use super::{RuntimeError, RuntimeResult};

/// Docker CLI wrapper
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run a docker command, returning its raw output whatever the exit status
    fn execute(&self, args: &[&str]) -> RuntimeResult<Output> {
        debug!("[DOCKER] Executing: {} {}", self.binary, args.join(" "));

        Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    RuntimeError::Unavailable(format!("'{}' executable not found", self.binary))
                }
                _ => RuntimeError::Io(e),
            })
    }

    /// Run a docker command and turn a non-zero exit into a classified error
    fn execute_checked(&self, args: &[&str], image: Option<&str>) -> RuntimeResult<String> {
        let output = self.execute(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr, image));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ContainerRuntime for DockerCli {
    fn get(&self, name: &str) -> RuntimeResult<Option<ContainerInfo>> {
        let output = self.execute(&["inspect", "--type", "container", name])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return match classify_failure(&stderr, None) {
                RuntimeError::NotFound(_) => Ok(None),
                other => Err(other),
            };
        }
        parse_inspect(&String::from_utf8_lossy(&output.stdout))
    }

    fn run(&self, spec: &LaunchSpec) -> RuntimeResult<ContainerHandle> {
        let port_args: Vec<String> = spec
            .ports
            .iter()
            .map(|mapping| match mapping.host_port {
                Some(host_port) => format!("{}:{}", host_port, mapping.container_port),
                None => mapping.container_port.to_string(),
            })
            .collect();

        let mut args = vec!["run", "--detach", "--name", spec.name.as_str()];
        if spec.auto_remove {
            args.push("--rm");
        }
        for port in &port_args {
            args.extend(["--publish", port.as_str()]);
        }
        args.push(spec.image.as_str());

        let stdout = self.execute_checked(&args, Some(&spec.image))?;
        // `docker run` may print pull progress before the id
        let id = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .ok_or_else(|| RuntimeError::Api("docker run returned no container id".to_string()))?;

        Ok(ContainerHandle {
            id: id.to_string(),
            name: spec.name.clone(),
        })
    }

    fn pause(&self, container: &ContainerHandle) -> RuntimeResult<()> {
        self.execute_checked(&["pause", &container.id], None).map(|_| ())
    }

    fn unpause(&self, container: &ContainerHandle) -> RuntimeResult<()> {
        self.execute_checked(&["unpause", &container.id], None).map(|_| ())
    }

    fn kill(&self, container: &ContainerHandle) -> RuntimeResult<()> {
        self.execute_checked(&["kill", &container.id], None).map(|_| ())
    }

    fn logs(&self, container: &ContainerHandle) -> RuntimeResult<String> {
        let output = self.execute(&["logs", &container.id])?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr, None));
        }
        let mut logs = String::from_utf8_lossy(&output.stdout).into_owned();
        logs.push_str(&String::from_utf8_lossy(&output.stderr));
        trace!("[DOCKER] {} bytes of logs for {}", logs.len(), container.name);
        Ok(logs)
    }
}

/// Map docker's stderr to an error kind
pub(crate) fn classify_failure(stderr: &str, image: Option<&str>) -> RuntimeError {
    let message = stderr.trim().to_string();
    let lower = message.to_lowercase();

    if lower.contains("cannot connect to the docker daemon")
        || lower.contains("is the docker daemon running")
        || lower.contains("permission denied while trying to connect")
    {
        return RuntimeError::Unavailable(message);
    }
    if lower.contains("no such image")
        || (lower.contains("unable to find image")
            && (lower.contains("pull access denied")
                || lower.contains("manifest unknown")
                || lower.contains("not found")))
    {
        return RuntimeError::ImageNotFound(image.map(str::to_string).unwrap_or(message));
    }
    if lower.contains("no such container") || lower.contains("no such object") {
        return RuntimeError::NotFound(message);
    }
    RuntimeError::Api(message)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectEntry {
    id: String,
    name: String,
    state: InspectState,
    #[serde(default)]
    network_settings: InspectNetwork,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectState {
    status: String,
    #[serde(default)]
    exit_code: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectNetwork {
    #[serde(default)]
    ports: Option<HashMap<String, Option<Vec<InspectPortBinding>>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectPortBinding {
    host_port: String,
}

/// Parse `docker inspect` JSON output
pub(crate) fn parse_inspect(json: &str) -> RuntimeResult<Option<ContainerInfo>> {
    let entries: Vec<InspectEntry> = serde_json::from_str(json)
        .map_err(|e| RuntimeError::Api(format!("Unreadable inspect output: {}", e)))?;
    let Some(entry) = entries.into_iter().next() else {
        return Ok(None);
    };

    let mut published_ports = HashMap::new();
    for (container_port, bindings) in entry.network_settings.ports.unwrap_or_default() {
        let host_port = bindings
            .unwrap_or_default()
            .iter()
            .find_map(|binding| binding.host_port.parse::<u16>().ok());
        if let Some(host_port) = host_port {
            published_ports.insert(container_port, host_port);
        }
    }

    Ok(Some(ContainerInfo {
        handle: ContainerHandle {
            id: entry.id,
            name: entry.name.trim_start_matches('/').to_string(),
        },
        status: ContainerStatus::from_status(&entry.state.status, entry.state.exit_code),
        published_ports,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSPECT_RUNNING: &str = r#"[{
        "Id": "4f1c2a",
        "Name": "/sailboat-sim-lsa-gym-mss1-default",
        "State": {"Status": "running", "Running": true, "Paused": false, "ExitCode": 0},
        "NetworkSettings": {
            "Ports": {
                "5555/tcp": [
                    {"HostIp": "0.0.0.0", "HostPort": "50123"},
                    {"HostIp": "::", "HostPort": "50123"}
                ],
                "22/tcp": null
            }
        }
    }]"#;

    #[test]
    fn test_parse_inspect_running() {
        let info = parse_inspect(INSPECT_RUNNING).unwrap().unwrap();
        assert_eq!(info.handle.id, "4f1c2a");
        assert_eq!(info.handle.name, "sailboat-sim-lsa-gym-mss1-default");
        assert!(info.is_running());
        assert_eq!(info.host_port(5555), Some(50123));
        assert_eq!(info.host_port(22), None);
    }

    #[test]
    fn test_parse_inspect_paused_and_empty() {
        let paused = INSPECT_RUNNING.replace("\"running\"", "\"paused\"");
        let info = parse_inspect(&paused).unwrap().unwrap();
        assert_eq!(info.status, ContainerStatus::Paused);
        assert!(!info.is_running());

        assert!(parse_inspect("[]").unwrap().is_none());
        assert!(matches!(parse_inspect("not json"), Err(RuntimeError::Api(_))));
    }

    #[test]
    fn test_classify_failures() {
        assert!(matches!(
            classify_failure(
                "Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?",
                None
            ),
            RuntimeError::Unavailable(_)
        ));
        match classify_failure(
            "Unable to find image 'lucasmrdt/sailboat-sim-lsa-gym:nope' locally\ndocker: Error response from daemon: manifest unknown.",
            Some("lucasmrdt/sailboat-sim-lsa-gym:nope"),
        ) {
            RuntimeError::ImageNotFound(image) => {
                assert_eq!(image, "lucasmrdt/sailboat-sim-lsa-gym:nope")
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(matches!(
            classify_failure("Error: No such container: sim", None),
            RuntimeError::NotFound(_)
        ));
        assert!(matches!(
            classify_failure("Error response from daemon: Conflict. The container name is already in use", None),
            RuntimeError::Api(_)
        ));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let docker = DockerCli::new("definitely-not-a-docker-binary-4242");
        assert!(matches!(docker.get("anything"), Err(RuntimeError::Unavailable(_))));
    }
}
