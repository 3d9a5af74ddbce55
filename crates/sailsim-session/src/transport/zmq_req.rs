// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! ZMQ REQ pattern (client-side request-reply)
//!
//! A REQ socket enforces strict send/recv alternation, which is exactly the
//! turn-taking the simulation backend expects. Receives block without a
//! timeout: progress depends on the backend answering.

use super::{RequestReplyClient, Transport, TransportError, TransportResult};
use std::sync::Arc;
use tracing::{debug, info};

/// ZMQ REQ socket implementation
pub struct ZmqReq {
    context: Arc<zmq::Context>,
    address: String,
    socket: Option<zmq::Socket>,
    linger_ms: i32,
}

impl ZmqReq {
    pub fn new(context: Arc<zmq::Context>, address: impl Into<String>) -> Self {
        Self {
            context,
            address: address.into(),
            socket: None,
            linger_ms: 0,
        }
    }

    /// Create with a private context
    pub fn with_address(address: impl Into<String>) -> Self {
        Self::new(Arc::new(zmq::Context::new()), address)
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Transport for ZmqReq {
    fn start(&mut self) -> TransportResult<()> {
        if self.socket.is_some() {
            return Err(TransportError::AlreadyConnected);
        }

        let socket = self.context.socket(zmq::REQ)?;
        // Pending requests are dropped on close instead of blocking shutdown
        socket.set_linger(self.linger_ms)?;
        socket
            .connect(&self.address)
            .map_err(|e| TransportError::ConnectFailed(format!("{}: {}", self.address, e)))?;

        self.socket = Some(socket);
        info!("[ZMQ-REQ] Connected to {}", self.address);
        Ok(())
    }

    fn stop(&mut self) -> TransportResult<()> {
        if self.socket.take().is_some() {
            debug!("[ZMQ-REQ] Disconnected from {}", self.address);
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.socket.is_some()
    }

    fn transport_type(&self) -> &str {
        "zmq-req"
    }
}

impl RequestReplyClient for ZmqReq {
    fn request(&mut self, data: &[u8]) -> TransportResult<Vec<u8>> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotConnected)?;

        socket
            .send(data, 0)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        socket
            .recv_bytes(0)
            .map_err(|e| TransportError::ReceiveFailed(e.to_string()))
    }
}
