// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the session manager

use std::time::Duration;

use crate::runtime::RuntimeError;
use crate::transport::TransportError;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Everything a session call can fail with
///
/// Only [`SessionError::Backend`] leaves the channel usable; every other
/// variant is fatal for the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Hosting runtime failure: unreachable, image absent, API error or container exited
    #[error("Hosting runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("No free host port found after {attempts} attempts")]
    PortExhausted { attempts: u32 },

    #[error("Backend '{name}' did not report readiness within {waited:?}")]
    ReadinessTimeout { name: String, waited: Duration },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Reply structurally missing the expected keys
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// `error` key returned by the backend, message kept verbatim
    #[error("{0}")]
    Backend(String),

    #[error("Message encoding error: {0}")]
    Codec(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Session is closed")]
    Closed,
}

impl SessionError {
    /// Whether the session must be considered unusable after this error
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Backend(_))
    }
}

impl From<rmp_serde::encode::Error> for SessionError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl From<rmp_serde::decode::Error> for SessionError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

impl From<sailsim_config::ConfigError> for SessionError {
    fn from(err: sailsim_config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_is_verbatim_and_recoverable() {
        let err = SessionError::Backend("boom".to_string());
        assert_eq!(err.to_string(), "boom");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_protocol_and_transport_errors_are_fatal() {
        assert!(SessionError::Protocol("missing obs".to_string()).is_fatal());
        assert!(SessionError::Transport(TransportError::NotConnected).is_fatal());
        assert!(SessionError::Closed.is_fatal());
    }
}
