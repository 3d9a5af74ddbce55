// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # sailsim-observability
//!
//! Logging setup shared by sailsim binaries and tests, with per-crate debug
//! flag support (`--debug-sailsim-session`, `SAILSIM_DEBUG=all`, ...).
//!
//! Library crates only emit `tracing` events; installing a subscriber is the
//! job of whatever process embeds them.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known sailsim crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &["sailsim", "sailsim-config", "sailsim-session"];
