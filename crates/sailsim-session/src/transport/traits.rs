// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transport trait definitions

use super::TransportResult;

/// Base transport trait - connection lifecycle
pub trait Transport: Send {
    /// Open the underlying socket and connect it
    fn start(&mut self) -> TransportResult<()>;

    /// Drop the underlying socket
    fn stop(&mut self) -> TransportResult<()>;

    fn is_running(&self) -> bool;

    /// Transport name, used in log lines
    fn transport_type(&self) -> &str;
}

/// Request-Reply pattern (client side)
///
/// Implementations must enforce turn-taking: one request, then exactly one
/// reply, before the next request is sent.
pub trait RequestReplyClient: Transport {
    /// Send a request and block until its reply arrives
    fn request(&mut self, data: &[u8]) -> TransportResult<Vec<u8>>;
}
