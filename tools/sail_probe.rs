// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Smoke-test a simulation backend from the command line.
//!
//! Acquires (or launches) the backend for a session identity, runs one
//! episode of a fixed action and prints every observation as a JSON line.

use std::env;
use std::process;

use sailsim::prelude::*;
use serde_json::json;

struct ProbeArgs {
    backend_tag: String,
    session_name: String,
    steps: u32,
    rudder: f64,
    sail: f64,
    stop: bool,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: sail_probe [--tag <backend_tag>] [--session <name>] [--steps <n>] \
         [--rudder <rad>] [--sail <rad>] [--stop] [--debug-<crate>|--debug-all]\n\n\
         Defaults:\n\
         - tag: mss1\n\
         - session: default\n\
         - steps: 20\n\
         - rudder / sail: 0.0 / 0.5\n\
         - --stop kills the backend afterwards instead of leaving it paused\n"
    );
    process::exit(2);
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<String>) -> T {
    let value = value.unwrap_or_else(|| usage_and_exit());
    value.parse().unwrap_or_else(|_| {
        eprintln!("Invalid value for {flag}: {value}");
        usage_and_exit();
    })
}

fn parse_args() -> ProbeArgs {
    let mut parsed = ProbeArgs {
        backend_tag: "mss1".to_string(),
        session_name: "default".to_string(),
        steps: 20,
        rudder: 0.0,
        sail: 0.5,
        stop: false,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--tag" => parsed.backend_tag = args.next().unwrap_or_else(|| usage_and_exit()),
            "--session" => parsed.session_name = args.next().unwrap_or_else(|| usage_and_exit()),
            "--steps" => parsed.steps = parse_number("--steps", args.next()),
            "--rudder" => parsed.rudder = parse_number("--rudder", args.next()),
            "--sail" => parsed.sail = parse_number("--sail", args.next()),
            "--stop" => parsed.stop = true,
            "-h" | "--help" => usage_and_exit(),
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    parsed
}

fn run(args: &ProbeArgs, mut config: SailsimConfig) -> Result<(), SessionError> {
    config.teardown.keep_alive = !args.stop;
    let runtime = std::sync::Arc::new(sailsim::session::DockerCli::new(
        config.backend.runtime_binary.clone(),
    ));
    let options = SessionOptions::new(&args.backend_tag, &args.session_name).with_config(config);
    let session = SimSession::with_runtime(options, runtime)?;

    let (obs, info) = session.reset([2.0, 0.0], 10)?;
    println!("{}", json!({"reset": {"obs": obs, "info": info}}));

    for step in 1..=args.steps {
        let outcome = session.step(Action::new(args.rudder, args.sail))?;
        println!(
            "{}",
            json!({
                "step": step,
                "obs": outcome.observation,
                "done": outcome.terminated,
                "info": outcome.info,
            })
        );
        if outcome.terminated {
            break;
        }
    }

    let stats = session.stats();
    eprintln!(
        "resumes={} pauses={} idle-timer schedules={} fired={}",
        stats.resumes, stats.pauses, stats.schedules, stats.fired
    );
    session.teardown()
}

fn main() {
    let args = parse_args();
    let config = load_config_or_default().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}");
        process::exit(2);
    });
    if let Err(e) = init_logging(&parse_debug_flags(), &config.logging) {
        eprintln!("Failed to initialise logging: {e}");
    }

    if let Err(e) = run(&args, config) {
        eprintln!("sail_probe failed: {e}");
        process::exit(1);
    }
}
