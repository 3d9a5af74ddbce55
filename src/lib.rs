//! # sailsim - sailboat simulation session manager
//!
//! Runs a sailboat physics simulation backend as a container and drives it
//! through four calls: `reset`, `step`, `close` and `stop`. The backend is
//! paused while idle and resumed transparently on the next call.
//!
//! ## Feature Flags
//!
//! - **`session`** (default): launcher, RPC channel, idle suspension
//! - **`observability`** (default): `tracing` subscriber setup and debug flags
//!
//! Configuration (`sailsim-config`) is always available.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sailsim::prelude::*;
//!
//! let session = SimSession::connect("mss1", "default")?;
//! let (obs, info) = session.reset([2.0, 0.0], 10)?;
//! println!("boat at {:?}, map {:?}", obs.p_boat, info.map_bounds);
//!
//! for _ in 0..100 {
//!     let outcome = session.step(Action::new(0.05, 0.4))?;
//!     if outcome.terminated {
//!         break;
//!     }
//! }
//! session.close()?;
//! session.teardown()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: sailsim-config                             │
//! │  (sailsim.toml, env overrides, validation)              │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Session: sailsim-session                               │
//! │  (launcher, ZMQ channel, codec, idle suspension)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use sailsim_config as config;

#[cfg(feature = "observability")]
pub use sailsim_observability as observability;

#[cfg(feature = "session")]
pub use sailsim_session as session;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config_or_default, SailsimConfig};

    #[cfg(feature = "session")]
    pub use crate::session::{
        Action, Observation, ResetInfo, SessionError, SessionOptions, SessionResult, SimSession,
        StepOutcome,
    };

    #[cfg(feature = "observability")]
    pub use crate::observability::{init_logging, parse_debug_flags, CrateDebugFlags};
}
