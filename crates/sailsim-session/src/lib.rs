// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # sailsim session manager
//!
//! Drives a sailboat physics simulation that runs as a container:
//! - locates or launches the backend container for a `(backend_tag, session_name)` pair
//! - talks to it over a ZMQ request/reply socket with msgpack messages
//! - pauses the container when idle and resumes it transparently on the next call
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sailsim_session::{Action, SimSession};
//!
//! let session = SimSession::connect("mss1", "default")?;
//! let (obs, bounds) = session.reset([2.0, 0.0], 10)?;
//! println!("start {:?} inside {:?}", obs.p_boat, bounds.map_bounds);
//!
//! let outcome = session.step(Action::new(0.1, -0.3))?;
//! if outcome.terminated {
//!     session.close()?;
//! }
//! session.teardown()?;
//! # Ok::<(), sailsim_session::SessionError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod channel;
pub mod codec;
pub mod error;
pub mod launcher;
pub mod runtime;
pub mod session;
pub mod suspension;
pub mod timer;
pub mod transport;

pub use channel::{RpcChannel, StepOutcome};
pub use codec::{Action, Observation, ResetInfo};
pub use error::{SessionError, SessionResult};
pub use launcher::{AcquiredBackend, BackendIdentity, BackendLauncher};
pub use runtime::{ContainerHandle, ContainerRuntime, DockerCli, RuntimeError};
pub use session::{SessionOptions, SimSession};
pub use suspension::{IdleSuspensionManager, SuspensionStats};
pub use timer::DebounceTimer;
pub use transport::{RequestReplyClient, Transport, TransportError, ZmqReq};
